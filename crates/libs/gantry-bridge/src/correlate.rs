use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::BridgeError;

type Outcome = Result<Value, BridgeError>;

/// A registered pending request, handed back to the caller to await on.
#[derive(Debug)]
pub struct PendingTicket {
    reference: String,
    rx: oneshot::Receiver<Outcome>,
}

struct PendingEntry {
    tx: oneshot::Sender<Outcome>,
    created_at: Instant,
}

/// Pairs tagged responses with the futures awaiting them.
///
/// Generalizes "send a command, wait for the message echoing my `ref`" into
/// a map of oneshots plus a bounded timeout. Entries settle exactly once:
/// on the matching response, or on timeout — whichever fires first. A late
/// response for a settled ref is an unknown ref, not an error.
#[derive(Default)]
pub struct CorrelationEngine {
    pending: Mutex<HashMap<String, PendingEntry>>,
}

impl CorrelationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending request. At most one entry may exist per
    /// reference; a duplicate registration is rejected rather than silently
    /// replacing the earlier caller's entry.
    pub fn register(&self, reference: &str) -> Result<PendingTicket, BridgeError> {
        let mut pending = self.lock();
        if pending.contains_key(reference) {
            return Err(BridgeError::invalid(format!(
                "a request with ref '{reference}' is already pending"
            )));
        }
        let (tx, rx) = oneshot::channel();
        pending.insert(
            reference.to_string(),
            PendingEntry { tx, created_at: Instant::now() },
        );
        Ok(PendingTicket { reference: reference.to_string(), rx })
    }

    /// Await the response for a ticket, up to `timeout`. On expiry the
    /// entry is removed so a late response falls into the unknown-ref path.
    pub async fn wait(&self, ticket: PendingTicket, timeout: Duration) -> Outcome {
        match tokio::time::timeout(timeout, ticket.rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                // Sender dropped without settling: the engine went away.
                self.lock().remove(&ticket.reference);
                Err(BridgeError::Disconnected)
            }
            Err(_) => {
                if let Some(entry) = self.lock().remove(&ticket.reference) {
                    log::debug!(
                        "correlate: '{}' timed out after {:?}",
                        ticket.reference,
                        entry.created_at.elapsed()
                    );
                }
                Err(BridgeError::timeout(&ticket.reference))
            }
        }
    }

    /// Settle the pending request for `reference`. Returns `false` — and
    /// has no other effect — when no such request is pending.
    pub fn complete(&self, reference: &str, outcome: Outcome) -> bool {
        let Some(entry) = self.lock().remove(reference) else {
            return false;
        };
        // The receiver may have just timed out; either way the entry is
        // consumed and a second response for this ref is unknown.
        let _ = entry.tx.send(outcome);
        true
    }

    /// Number of outstanding requests.
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PendingEntry>> {
        self.pending.lock().expect("pending mutex poisoned")
    }
}

/// Build a correlation token from a logical prefix and a high-resolution
/// timestamp, unique enough across concurrent requests in one client.
pub fn reference_id(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let unique = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    format!("{prefix}-{unique}")
}
