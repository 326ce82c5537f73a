//! Correlation table for in-flight RVI calls
//!
//! RVI has no request/response pairing: a call is fired at a remote
//! service and the answer, if any, arrives later on one of our own
//! registered services. Every outbound call therefore carries a
//! transaction id, and the table below remembers who is waiting for it.
//!
//! The table only supports insert-once (`create`) and remove-once
//! (`resolve`). Whoever removes an entry owns its [`CallerHandle`] and is
//! the only party allowed to complete it, which is what makes the reply
//! handler and the timeout task safe to race against each other.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::error::GatewayError;

/// Final result of a pending call
pub type CallOutcome = Result<Value, GatewayError>;

/// Identifier correlating one outbound call with its reply (UUID v4 string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Write side of a pending call.
///
/// Both completion methods consume the handle, so a call can be
/// completed at most once.
#[derive(Debug)]
pub struct CallerHandle {
    tx: oneshot::Sender<CallOutcome>,
}

impl CallerHandle {
    /// Create a handle together with the reply the caller waits on
    pub fn channel() -> (CallerHandle, PendingReply) {
        let (tx, rx) = oneshot::channel();
        (CallerHandle { tx }, PendingReply { rx })
    }

    /// Complete the call with a reply payload
    pub fn deliver(self, payload: Value) {
        if self.tx.send(Ok(payload)).is_err() {
            debug!("Caller went away before the reply was delivered");
        }
    }

    /// Complete the call with an error
    pub fn fail(self, error: GatewayError) {
        if self.tx.send(Err(error)).is_err() {
            debug!("Caller went away before the failure was delivered");
        }
    }
}

/// Read side of a pending call
#[derive(Debug)]
pub struct PendingReply {
    rx: oneshot::Receiver<CallOutcome>,
}

impl PendingReply {
    /// Wait until the call is delivered or failed.
    ///
    /// Returns [`GatewayError::Abandoned`] if the handle was dropped
    /// without being completed.
    pub async fn wait(self) -> CallOutcome {
        self.rx.await.unwrap_or(Err(GatewayError::Abandoned))
    }

    /// Non-blocking check for a completed outcome
    pub fn try_outcome(&mut self) -> Option<CallOutcome> {
        self.rx.try_recv().ok()
    }
}

/// Map of transaction id to the caller waiting on it
#[derive(Debug, Default)]
pub struct CorrelationTable {
    pending: Mutex<HashMap<String, CallerHandle>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a caller under a fresh transaction id
    pub fn create(&self, handle: CallerHandle) -> TransactionId {
        let mut pending = self.pending.lock();
        loop {
            let id = TransactionId::generate();
            // Never alias an entry that is still waiting
            if let Entry::Vacant(slot) = pending.entry(id.0.clone()) {
                slot.insert(handle);
                return id;
            }
        }
    }

    /// Remove and return the caller waiting on `transaction_id`, if any
    pub fn resolve(&self, transaction_id: &str) -> Option<CallerHandle> {
        self.pending.lock().remove(transaction_id)
    }

    /// Number of calls still waiting
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn contains(&self, transaction_id: &str) -> bool {
        self.pending.lock().contains_key(transaction_id)
    }
}
