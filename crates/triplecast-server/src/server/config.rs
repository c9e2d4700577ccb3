use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;

/// What happens to an existing stream registration when the same
/// client id opens a new stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReplacePolicy {
    /// Last-writer-wins: the previous outbound channel is discarded
    /// without any signal. The transport has already invalidated the
    /// old connection when this happens under normal reconnects.
    Silent,
    /// Push an `aborted` status into the previous channel before
    /// discarding it, so a still-listening old stream observes an
    /// explicit end instead of silence.
    Close,
}

/// Runtime configuration for the `triplecast-server` binary.
///
/// All values are parsed from CLI arguments or environment variables,
/// with defaults suitable for a single-node deployment. Batch cadence
/// and size are deliberately configuration, not code: the serving core
/// only ever dispatches when told to.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "triplecast-server",
    version,
    about = "A gRPC service for streaming big-integer computation triples"
)]
pub struct CliArgs {
    /// Path to the CSV dataset (three base-10 columns per row:
    /// scalar, x, y). Loaded once at startup; a malformed or empty
    /// file aborts startup.
    ///
    /// Environment variable: `DATASET_PATH`
    #[arg(long, env = "DATASET_PATH", default_value_t = String::from("computationData.csv"))]
    pub dataset: String,

    /// Address to listen on (TCP, or a socket path with --uds).
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR`
    /// must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Capacity of each client's outbound batch channel.
    ///
    /// Lower values surface backpressure from slow clients sooner;
    /// higher values let dispatch run further ahead of the transport.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,

    /// Milliseconds between scheduled dispatch rounds over all
    /// registered clients. `0` disables the built-in scheduler so an
    /// external trigger can drive dispatch instead.
    ///
    /// Environment variable: `DISPATCH_INTERVAL_MS`
    #[arg(long, env = "DISPATCH_INTERVAL_MS", default_value_t = 1000)]
    pub dispatch_interval_ms: u64,

    /// Number of triples pulled from the dataset cursor per scheduled
    /// dispatch to each client.
    ///
    /// Environment variable: `TRIPLES_PER_DISPATCH`
    #[arg(long, env = "TRIPLES_PER_DISPATCH", default_value_t = 4)]
    pub triples_per_dispatch: usize,

    /// Behavior when a client id re-registers over a live stream.
    ///
    /// Environment variable: `REPLACE_POLICY`
    #[arg(long, env = "REPLACE_POLICY", value_enum, default_value = "silent")]
    pub replace_policy: ReplacePolicy,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub dataset: String,
    pub server_addr: String,
    pub uds: bool,
    pub stream_buffer_size: usize,
    /// `None` when the built-in scheduler is disabled.
    pub dispatch_interval: Option<Duration>,
    pub triples_per_dispatch: usize,
    pub replace_policy: ReplacePolicy,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        if args.triples_per_dispatch == 0 {
            bail!("TRIPLES_PER_DISPATCH must be greater than 0");
        }

        let dispatch_interval = (args.dispatch_interval_ms > 0)
            .then(|| Duration::from_millis(args.dispatch_interval_ms));

        Ok(Self {
            dataset: args.dataset,
            server_addr: args.server_addr,
            uds: args.uds,
            stream_buffer_size: args.stream_buffer_size,
            dispatch_interval,
            triples_per_dispatch: args.triples_per_dispatch,
            replace_policy: args.replace_policy,
        })
    }
}
