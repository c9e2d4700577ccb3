#![doc = include_str!("../README.md")]

mod common;
pub use common::*;

/// gRPC service and message definitions generated from
/// `proto/computation.proto`.
///
/// ## Service
///
/// - `InitializeDataStream` - opens the persistent outbound batch
///   stream for a named client.
/// - `ReceiveComputationResult` - unary submission of one computed
///   result pair, acknowledged with a boolean.
///
/// ## Message format
///
/// [`ComputationData`] is columnar: `scalar[i]`, `x[i]`, `y[i]`
/// together describe one triple. Every element is a 32-byte big-endian
/// unsigned integer produced by [`codec::encode`](crate::codec::encode).
///
/// [`ComputationData`]: crate::proto::ComputationData
pub mod proto {
    tonic::include_proto!("computation");
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("computation_descriptor");
}
