use clap::Parser;
use futures::Stream;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::server::Connected;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use triplecast_core::proto::{
    FILE_DESCRIPTOR_SET, computation_service_server::ComputationServiceServer,
};
use triplecast_server::server::config::{CliArgs, ServerConfig};
use triplecast_server::server::dataset::{Dataset, DatasetCursor};
use triplecast_server::server::dispatch::Dispatcher;
use triplecast_server::server::registry::ClientStreamRegistry;
use triplecast_server::server::scheduler::run_dispatch_loop;
use triplecast_server::server::service::handler::TriplecastService;
use triplecast_server::server::telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry();

    // An invalid or empty dataset must abort startup, not serve.
    let dataset = Dataset::from_csv_path(&config.dataset)?;
    tracing::info!(rows = dataset.len(), path = %config.dataset, "dataset loaded");

    let cursor = Arc::new(DatasetCursor::new(dataset));
    let registry = Arc::new(ClientStreamRegistry::new(config.replace_policy));
    let dispatcher = Arc::new(Dispatcher::new(cursor, Arc::clone(&registry)));

    let shutdown_token = CancellationToken::new();
    if let Some(interval) = config.dispatch_interval {
        tokio::spawn(run_dispatch_loop(
            dispatcher,
            Arc::clone(&registry),
            interval,
            config.triples_per_dispatch,
            shutdown_token.clone(),
        ));
    } else {
        tracing::info!("built-in dispatch scheduler disabled");
    }

    let service = TriplecastService::new(registry, &config);

    if config.uds {
        #[cfg(unix)]
        {
            use tokio::net::UnixListener;
            use tokio_stream::wrappers::UnixListenerStream;
            let uds_path = config.server_addr.clone();
            let uds = UnixListener::bind(&uds_path)?;
            let incoming = UnixListenerStream::new(uds);
            log_startup_info(&uds_path, &config);
            let res = run_server_with_incoming(service, incoming, shutdown_token).await;
            // TODO: Best effort to clean up the socket file although a panic
            // might leave it behind.
            let _ = std::fs::remove_file(&uds_path);
            res
        }
        #[cfg(not(unix))]
        {
            anyhow::bail!("Unix domain sockets are not supported on this platform");
        }
    } else {
        let tcp_path = config.server_addr.clone();
        let tcp = TcpListener::bind(&tcp_path).await?;
        let incoming = TcpListenerStream::new(tcp);
        log_startup_info(&tcp_path, &config);
        run_server_with_incoming(service, incoming, shutdown_token).await
    }
}

async fn run_server_with_incoming<I, IO, IE>(
    service: TriplecastService,
    incoming: I,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()>
where
    I: Stream<Item = Result<IO, IE>>,
    IO: AsyncRead + AsyncWrite + Connected + Unpin + Send + 'static,
    IE: Into<tower::BoxError>,
{
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ComputationServiceServer<TriplecastService>>()
        .await;

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    Server::builder()
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_computation_service(service))
        .serve_with_incoming_shutdown(incoming, shutdown_signal(health_reporter, shutdown_token))
        .await?;

    tracing::info!("service shut down successfully");
    Ok(())
}

fn log_startup_info(addr: &str, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("starting triple distribution on {} with full config: {:#?}", addr, config);
    } else {
        tracing::info!("starting triple distribution on {}", addr);
    }
}

fn build_computation_service(
    service: TriplecastService,
) -> ComputationServiceServer<TriplecastService> {
    ComputationServiceServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
}

async fn shutdown_signal(health_reporter: HealthReporter, shutdown_token: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("received SIGTERM signal");
        },
    }

    tracing::info!("shutdown signal received, terminating gracefully...");

    // 1. Publish the status
    health_reporter
        .set_not_serving::<ComputationServiceServer<TriplecastService>>()
        .await;

    // 2. Stop the dispatch scheduler; in-flight streams end when the
    //    transport drains.
    shutdown_token.cancel();
}
