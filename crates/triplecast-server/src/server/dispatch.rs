//! Fetch-encode-send of columnar triple batches.
//!
//! A dispatch pulls the requested count from the cursor, encodes every
//! field into the fixed 32-byte wire form, assembles the columnar
//! batch, and hands it to the registry. Delivery is at-most-once and
//! best-effort: a missing stream drops the batch, while the cursor has
//! already advanced past the consumed triples either way.

use crate::server::dataset::DatasetCursor;
use crate::server::registry::{ClientStreamRegistry, SendOutcome};
use std::sync::Arc;
use tracing::{debug, trace};
use triplecast_core::codec;
use triplecast_core::error::Result;
use triplecast_core::proto::ComputationData;
use triplecast_core::types::Triple;

/// Assembles the columnar wire batch: index `i` across the three
/// arrays describes one triple.
fn encode_batch(triples: &[Triple]) -> Result<ComputationData> {
    let mut scalar = Vec::with_capacity(triples.len());
    let mut x = Vec::with_capacity(triples.len());
    let mut y = Vec::with_capacity(triples.len());

    for triple in triples {
        scalar.push(codec::encode(&triple.scalar)?.to_vec());
        x.push(codec::encode(&triple.x)?.to_vec());
        y.push(codec::encode(&triple.y)?.to_vec());
    }

    Ok(ComputationData { scalar, x, y })
}

/// Pushes dataset batches to individual client streams.
///
/// Holds the shared cursor and registry; when and how much to dispatch
/// is the caller's policy (see the scheduler and the binary's
/// configuration).
pub struct Dispatcher {
    cursor: Arc<DatasetCursor>,
    registry: Arc<ClientStreamRegistry>,
}

impl Dispatcher {
    pub fn new(cursor: Arc<DatasetCursor>, registry: Arc<ClientStreamRegistry>) -> Self {
        Self { cursor, registry }
    }

    /// Fetches `count` triples, encodes them, and sends the batch to
    /// `client_id`'s stream.
    ///
    /// A [`SendOutcome::NoActiveStream`] outcome is returned (and
    /// logged), not escalated: the batch is dropped, never retried or
    /// queued. A full outbound buffer also drops the batch but
    /// surfaces as an error so the caller can log the backpressure.
    /// An encoding failure aborts the dispatch before anything is
    /// sent - no partial batch goes out. Nothing here suspends, so a
    /// slow client cannot hold up a round over other clients.
    pub fn dispatch(&self, client_id: &str, count: usize) -> Result<SendOutcome> {
        let triples = self.cursor.fetch(count);
        let batch = encode_batch(&triples)?;

        let outcome = self.registry.send(client_id, batch)?;
        match outcome {
            SendOutcome::Delivered => {
                trace!(%client_id, count, "batch delivered");
            }
            SendOutcome::NoActiveStream => {
                debug!(%client_id, "no active stream; batch dropped");
            }
        }

        Ok(outcome)
    }
}
