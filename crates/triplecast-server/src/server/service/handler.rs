//! gRPC service implementation for triple distribution and result
//! collection.
//!
//! `InitializeDataStream` registers a bounded outbound channel for the
//! requesting client id and returns its receiving half as the response
//! stream; dropping that stream (client cancel, disconnect, or server
//! teardown) unregisters exactly once, guarded by the registration
//! epoch. `ReceiveComputationResult` is independent of any stream
//! state: it decodes the submitted pair and always acknowledges a
//! well-formed request.

use crate::server::config::ServerConfig;
use crate::server::registry::ClientStreamRegistry;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tonic::{Request, Response, Status};
use tracing::info;
use triplecast_core::Error;
use triplecast_core::codec;
use triplecast_core::proto::{
    ComputationData, ComputationRequest, ComputationResult, ResultAck,
    computation_service_server::ComputationService,
};

/// Response stream that owns its registry entry: dropping it removes
/// the registration, but only while the epoch still matches, so a
/// replaced stream tearing down late cannot evict its replacement.
struct RegisteredStream {
    inner: ReceiverStream<Result<ComputationData, Status>>,
    registry: Arc<ClientStreamRegistry>,
    client_id: String,
    epoch: u64,
}

impl Stream for RegisteredStream {
    type Item = Result<ComputationData, Status>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for RegisteredStream {
    fn drop(&mut self) {
        if self.registry.unregister(&self.client_id, self.epoch) {
            info!(client_id = %self.client_id, "stream closed");
        }
    }
}

/// Concrete `ComputationService` implementation backed by the shared
/// stream registry.
#[derive(Clone)]
pub struct TriplecastService {
    registry: Arc<ClientStreamRegistry>,
    stream_buffer_size: usize,
}

impl TriplecastService {
    pub fn new(registry: Arc<ClientStreamRegistry>, config: &ServerConfig) -> Self {
        Self {
            registry,
            stream_buffer_size: config.stream_buffer_size,
        }
    }
}

#[tonic::async_trait]
impl ComputationService for TriplecastService {
    type InitializeDataStreamStream =
        Pin<Box<dyn Stream<Item = Result<ComputationData, Status>> + Send>>;

    /// Opens the persistent outbound stream for a client.
    ///
    /// Registration is a full replace when the id is already present;
    /// what happens to the displaced channel is the registry's
    /// configured replace policy.
    async fn initialize_data_stream(
        &self,
        request: Request<ComputationRequest>,
    ) -> Result<Response<Self::InitializeDataStreamStream>, Status> {
        let client_id = request.into_inner().client_id;
        if client_id.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "client_id must not be empty".to_string(),
            }
            .into());
        }

        let (tx, rx) = mpsc::channel(self.stream_buffer_size);
        let epoch = self.registry.register(&client_id, tx);
        info!(%client_id, "stream opened");

        let stream = RegisteredStream {
            inner: ReceiverStream::new(rx),
            registry: Arc::clone(&self.registry),
            client_id,
            epoch,
        };

        Ok(Response::new(Box::pin(stream)))
    }

    /// Accepts one computed result pair and acknowledges it.
    ///
    /// Decode is lenient about width, so a well-formed request cannot
    /// fail here; the decoded values are logged, not validated.
    async fn receive_computation_result(
        &self,
        request: Request<ComputationResult>,
    ) -> Result<Response<ResultAck>, Status> {
        let result = request.into_inner();
        let result_x = codec::decode(&result.result_x);
        let result_y = codec::decode(&result.result_y);

        info!(%result_x, %result_y, "received computation result");

        Ok(Response::new(ResultAck { success: true }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::ReplacePolicy;
    use crate::server::dataset::{Dataset, DatasetCursor};
    use crate::server::dispatch::Dispatcher;
    use crate::server::registry::SendOutcome;
    use futures::StreamExt;
    use num_bigint::BigUint;

    fn service() -> (TriplecastService, Arc<ClientStreamRegistry>, Arc<Dispatcher>) {
        let dataset =
            Dataset::from_rows([("1", "10", "20"), ("2", "11", "21"), ("3", "12", "22")]).unwrap();
        let cursor = Arc::new(DatasetCursor::new(dataset));
        let registry = Arc::new(ClientStreamRegistry::new(ReplacePolicy::Silent));
        let dispatcher = Arc::new(Dispatcher::new(cursor, Arc::clone(&registry)));
        let config = ServerConfig {
            dataset: String::new(),
            server_addr: String::new(),
            uds: false,
            stream_buffer_size: 4,
            dispatch_interval: None,
            triples_per_dispatch: 2,
            replace_policy: ReplacePolicy::Silent,
        };
        (
            TriplecastService::new(Arc::clone(&registry), &config),
            registry,
            dispatcher,
        )
    }

    #[tokio::test]
    async fn open_stream_then_dispatch_delivers_a_batch() {
        let (service, registry, dispatcher) = service();

        let response = service
            .initialize_data_stream(Request::new(ComputationRequest {
                client_id: "k".to_string(),
            }))
            .await
            .unwrap();
        let mut stream = response.into_inner();
        assert_eq!(registry.len(), 1);

        assert_eq!(
            dispatcher.dispatch("k", 2).unwrap(),
            SendOutcome::Delivered
        );

        let batch = stream.next().await.unwrap().unwrap();
        assert_eq!(codec::decode(&batch.scalar[0]), BigUint::from(1u8));
        assert_eq!(codec::decode(&batch.x[1]), BigUint::from(11u8));
    }

    #[tokio::test]
    async fn dropping_the_stream_unregisters_the_client() {
        let (service, registry, dispatcher) = service();

        let stream = service
            .initialize_data_stream(Request::new(ComputationRequest {
                client_id: "k".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();
        drop(stream);

        assert!(registry.is_empty());
        assert_eq!(
            dispatcher.dispatch("k", 1).unwrap(),
            SendOutcome::NoActiveStream
        );
    }

    #[tokio::test]
    async fn reopening_ends_the_previous_stream() {
        let (service, registry, _dispatcher) = service();

        let mut first = service
            .initialize_data_stream(Request::new(ComputationRequest {
                client_id: "k".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();
        let second = service
            .initialize_data_stream(Request::new(ComputationRequest {
                client_id: "k".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        // The replaced channel ends; the registry still holds one
        // entry for the new stream. The old stream dropping afterwards
        // is the late-teardown race and must not evict it.
        assert!(first.next().await.is_none());
        drop(first);
        assert_eq!(registry.len(), 1);
        drop(second);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn empty_client_id_is_rejected() {
        let (service, registry, _dispatcher) = service();

        let response = service
            .initialize_data_stream(Request::new(ComputationRequest {
                client_id: String::new(),
            }))
            .await;
        let Err(status) = response else {
            panic!("empty client_id must be rejected");
        };
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn submit_result_acknowledges_regardless_of_stream_state() {
        let (service, _registry, _dispatcher) = service();

        let request = ComputationResult {
            result_x: codec::encode(&BigUint::from(5u8)).unwrap().to_vec(),
            result_y: codec::encode(&BigUint::from(7u8)).unwrap().to_vec(),
        };
        let ack = service
            .receive_computation_result(Request::new(request))
            .await
            .unwrap()
            .into_inner();
        assert!(ack.success);
    }

    #[tokio::test]
    async fn submit_result_accepts_narrow_buffers() {
        let (service, _registry, _dispatcher) = service();

        let request = ComputationResult {
            result_x: vec![0x05],
            result_y: Vec::new(),
        };
        let ack = service
            .receive_computation_result(Request::new(request))
            .await
            .unwrap()
            .into_inner();
        assert!(ack.success);
    }
}
