//! Interval-driven dispatch over all registered clients.
//!
//! The serving core never decides batch cadence on its own; this loop
//! is the deployable default trigger, configured by
//! `--dispatch-interval-ms` and `--triples-per-dispatch` and disabled
//! entirely when the interval is zero.

use crate::server::dispatch::Dispatcher;
use crate::server::registry::ClientStreamRegistry;
use core::time::Duration;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs until `shutdown` is cancelled, dispatching `batch_size`
/// triples to every registered client once per `interval`.
///
/// A failed dispatch is isolated to its client: the error is logged
/// and the round continues, leaving the cursor and the other clients
/// untouched. Dispatch never suspends, so a slow client with a full
/// outbound buffer cannot stall the round for anyone else.
pub async fn run_dispatch_loop(
    dispatcher: Arc<Dispatcher>,
    registry: Arc<ClientStreamRegistry>,
    interval: Duration,
    batch_size: usize,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                debug!("dispatch scheduler stopping");
                break;
            }
            _ = ticker.tick() => {
                for client_id in registry.client_ids() {
                    if let Err(e) = dispatcher.dispatch(&client_id, batch_size) {
                        warn!(%client_id, error = %e, "dispatch failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::ReplacePolicy;
    use crate::server::dataset::{Dataset, DatasetCursor};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn scheduler_pushes_batches_until_cancelled() {
        let dataset = Dataset::from_rows([("1", "2", "3")]).unwrap();
        let cursor = Arc::new(DatasetCursor::new(dataset));
        let registry = Arc::new(ClientStreamRegistry::new(ReplacePolicy::Silent));
        let dispatcher = Arc::new(Dispatcher::new(cursor, Arc::clone(&registry)));

        let (tx, mut rx) = mpsc::channel(8);
        registry.register("c1", tx);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_dispatch_loop(
            dispatcher,
            Arc::clone(&registry),
            Duration::from_millis(5),
            2,
            shutdown.clone(),
        ));

        let batch = rx.recv().await.unwrap().unwrap();
        assert_eq!(batch.scalar.len(), 2);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn slow_client_does_not_starve_the_others() {
        let dataset = Dataset::from_rows([("1", "2", "3")]).unwrap();
        let cursor = Arc::new(DatasetCursor::new(dataset));
        let registry = Arc::new(ClientStreamRegistry::new(ReplacePolicy::Silent));
        let dispatcher = Arc::new(Dispatcher::new(cursor, Arc::clone(&registry)));

        // The slow client's buffer fills after a single batch and is
        // never drained.
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        registry.register("slow", slow_tx);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        registry.register("fast", fast_tx);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(run_dispatch_loop(
            dispatcher,
            Arc::clone(&registry),
            Duration::from_millis(5),
            1,
            shutdown.clone(),
        ));

        // The fast client keeps receiving well past the point where
        // the slow client's buffer is full.
        for _ in 0..5 {
            let received = tokio::time::timeout(Duration::from_millis(500), fast_rx.recv())
                .await
                .expect("fast client stalled behind the slow one");
            assert!(received.unwrap().is_ok());
        }

        shutdown.cancel();
        handle.await.unwrap();
    }
}
