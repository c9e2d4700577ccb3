//! gRPC service entry points.
//!
//! - [`handler`] - the `ComputationService` implementation: stream
//!   registration on open, drop-guarded unregistration, and result
//!   collection.

pub mod handler;
