//! Serving logic for the triple distribution service.
//!
//! ## Structure
//!
//! - [`config`] - CLI/env arguments and validated runtime configuration.
//! - [`dataset`] - Dataset load and the cyclic cursor.
//! - [`registry`] - Live client-stream registrations.
//! - [`dispatch`] - Fetch-encode-send of columnar batches.
//! - [`scheduler`] - Interval-driven dispatch over registered clients.
//! - [`service`] - gRPC service entry points.
//! - [`telemetry`] - Structured logging setup.

pub mod config;
pub mod dataset;
pub mod dispatch;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod telemetry;
