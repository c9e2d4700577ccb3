//! Error types for the triple distribution service.
//!
//! This module defines the central `Error` enum covering the load-time
//! and per-request failure cases, and implements `From<Error>` for
//! `tonic::Status` so gRPC handlers can propagate them with `?`.
//!
//! An absent client stream is deliberately *not* represented here: it
//! is a normal outcome of a send, modeled as a `SendOutcome` by the
//! server's registry.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the triple distribution service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A dataset row contained a field that is not a base-10 integer.
    /// Fatal at load time.
    #[error("malformed dataset row at line {line}: {value:?}")]
    MalformedRow { line: usize, value: String },

    /// The dataset source contained no rows. Fatal at load time.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A value does not fit the fixed-width wire format.
    #[error("value of {bits} bits exceeds the 256-bit wire format")]
    EncodingOverflow { bits: u64 },

    /// Internal channel send/receive failure between tasks.
    #[error("channel error: {context}")]
    ChannelError { context: String },

    /// The client request was malformed.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Failed to read the dataset source.
    #[error("dataset io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::MalformedRow { .. } | Error::EmptyDataset | Error::Io(_) => {
                Status::failed_precondition(message)
            }
            Error::EncodingOverflow { .. } | Error::ChannelError { .. } => {
                Status::internal(message)
            }
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
        }
    }
}
