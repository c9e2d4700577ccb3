//! Live client-stream registrations.
//!
//! Maps a client id to the sending half of its bounded outbound batch
//! channel. Registrations are epoch-tagged: a re-registration under
//! the same id replaces the old entry (last-registration-wins), and a
//! late disconnect of the replaced stream - which races the new
//! registration by design - only removes the entry when its epoch
//! still matches. Unregistering an absent or stale entry is a defined
//! no-op, never an error.

use crate::server::config::ReplacePolicy;
use core::sync::atomic::Ordering;
use parking_lot::RwLock;
use portable_atomic::AtomicU64;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tonic::Status;
use tracing::debug;
use triplecast_core::error::Error;
use triplecast_core::proto::ComputationData;

/// Sending half of one client's outbound batch channel. The receiving
/// half is the gRPC response stream, drained by the transport.
pub type BatchSender = mpsc::Sender<Result<ComputationData, Status>>;

/// Outcome of a send attempt. An absent stream is a normal, loggable
/// condition - the client is not currently listening - not an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    NoActiveStream,
}

struct Registration {
    epoch: u64,
    sender: BatchSender,
}

/// Concurrency-safe registry of open outbound streams, keyed by
/// client id.
pub struct ClientStreamRegistry {
    streams: RwLock<HashMap<String, Registration>>,
    next_epoch: AtomicU64,
    replace_policy: ReplacePolicy,
}

impl ClientStreamRegistry {
    pub fn new(replace_policy: ReplacePolicy) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            next_epoch: AtomicU64::new(0),
            replace_policy,
        }
    }

    /// Inserts or replaces the registration for `client_id` and
    /// returns its epoch, which the owning stream must present to
    /// [`unregister`](Self::unregister).
    ///
    /// Under [`ReplacePolicy::Close`] a displaced channel receives a
    /// best-effort `aborted` status first; under
    /// [`ReplacePolicy::Silent`] it is simply dropped.
    pub fn register(&self, client_id: &str, sender: BatchSender) -> u64 {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let previous = self
            .streams
            .write()
            .insert(client_id.to_owned(), Registration { epoch, sender });

        if let Some(old) = previous {
            debug!(%client_id, "replaced existing stream registration");
            if self.replace_policy == ReplacePolicy::Close {
                // The displaced channel may already be closed or full.
                let _ = old
                    .sender
                    .try_send(Err(Status::aborted("stream replaced by a newer registration")));
            }
        }

        epoch
    }

    /// Removes the registration for `client_id` if it still carries
    /// `epoch`. Returns whether an entry was removed; absent and stale
    /// entries are no-ops so duplicate cancellation signals are
    /// harmless.
    pub fn unregister(&self, client_id: &str, epoch: u64) -> bool {
        let mut streams = self.streams.write();
        match streams.get(client_id) {
            Some(registration) if registration.epoch == epoch => {
                streams.remove(client_id);
                true
            }
            _ => false,
        }
    }

    /// Pure read of the current sender for `client_id`.
    pub fn lookup(&self, client_id: &str) -> Option<BatchSender> {
        self.streams
            .read()
            .get(client_id)
            .map(|registration| registration.sender.clone())
    }

    /// Writes `batch` into the client's outbound channel without
    /// blocking.
    ///
    /// The sender is cloned out under the read lock and the send is a
    /// `try_send` after the lock is released: a slow client with a
    /// full buffer can never suspend the caller, and consequently can
    /// never delay delivery to any other client. A missing
    /// registration or a closed channel both report
    /// [`SendOutcome::NoActiveStream`]; a full buffer drops the batch
    /// and surfaces [`Error::ChannelError`].
    pub fn send(
        &self,
        client_id: &str,
        batch: ComputationData,
    ) -> Result<SendOutcome, Error> {
        let Some(sender) = self.lookup(client_id) else {
            return Ok(SendOutcome::NoActiveStream);
        };

        match sender.try_send(Ok(batch)) {
            Ok(()) => Ok(SendOutcome::Delivered),
            Err(TrySendError::Closed(_)) => Ok(SendOutcome::NoActiveStream),
            Err(TrySendError::Full(_)) => Err(Error::ChannelError {
                context: format!("outbound buffer full for client {client_id}"),
            }),
        }
    }

    /// Ids of all currently registered clients.
    pub fn client_ids(&self) -> Vec<String> {
        self.streams.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }
}
