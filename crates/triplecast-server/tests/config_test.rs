//! Tests for CLI argument parsing and config validation.

use clap::Parser;
use core::time::Duration;
use triplecast_server::server::config::{CliArgs, ReplacePolicy, ServerConfig};

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("triplecast-server").chain(args.iter().copied()))
        .unwrap()
}

#[test]
fn defaults_produce_a_valid_config() {
    let config = ServerConfig::try_from(parse(&[])).unwrap();
    assert_eq!(config.server_addr, "0.0.0.0:50051");
    assert!(!config.uds);
    assert_eq!(config.stream_buffer_size, 8);
    assert_eq!(config.dispatch_interval, Some(Duration::from_millis(1000)));
    assert_eq!(config.triples_per_dispatch, 4);
    assert_eq!(config.replace_policy, ReplacePolicy::Silent);
}

#[test]
fn zero_interval_disables_the_scheduler() {
    let config = ServerConfig::try_from(parse(&["--dispatch-interval-ms", "0"])).unwrap();
    assert_eq!(config.dispatch_interval, None);
}

#[test]
fn zero_stream_buffer_is_rejected() {
    let err = ServerConfig::try_from(parse(&["--stream-buffer-size", "0"])).unwrap_err();
    assert!(err.to_string().contains("STREAM_BUFFER_SIZE"));
}

#[test]
fn zero_triples_per_dispatch_is_rejected() {
    let err = ServerConfig::try_from(parse(&["--triples-per-dispatch", "0"])).unwrap_err();
    assert!(err.to_string().contains("TRIPLES_PER_DISPATCH"));
}

#[test]
fn replace_policy_parses_from_the_cli() {
    let config = ServerConfig::try_from(parse(&["--replace-policy", "close"])).unwrap();
    assert_eq!(config.replace_policy, ReplacePolicy::Close);
}
