//! Shared types and error definitions used across the triplecast
//! client and server.
//!
//! ## Submodules
//!
//! - [`codec`] - Fixed-width big-endian encoding of arbitrary-precision
//!   values.
//! - [`error`] - Centralized service error type used throughout request
//!   handling.
//! - [`types`] - Wire-width constant and the [`Triple`](types::Triple)
//!   domain type.

pub mod codec;
pub mod error;
pub mod types;

pub use error::{Error, Result};
