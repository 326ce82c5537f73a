//! Per-call timeout task

use std::sync::Arc;
use std::time::Duration;

use rvi_core::{CorrelationTable, GatewayError, TransactionId};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Arms one timer per pending call and fails the caller on expiry
#[derive(Clone)]
pub struct TimeoutSupervisor {
    table: Arc<CorrelationTable>,
    window: Duration,
}

impl TimeoutSupervisor {
    pub fn new(table: Arc<CorrelationTable>, window: Duration) -> Self {
        Self { table, window }
    }

    /// Spawn the timer for `transaction_id`.
    ///
    /// The timer is never cancelled; firing after a reply is a no-op.
    pub fn arm(&self, transaction_id: TransactionId) -> JoinHandle<bool> {
        let supervisor = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(supervisor.window).await;
            supervisor.expire(transaction_id.as_str())
        })
    }

    /// Fail the caller of `transaction_id` if it is still pending.
    ///
    /// Returns `true` if a caller was failed.
    pub fn expire(&self, transaction_id: &str) -> bool {
        match self.table.resolve(transaction_id) {
            Some(handle) => {
                warn!(
                    %transaction_id,
                    timeout_ms = self.window.as_millis() as u64,
                    "RVI call timed out"
                );
                handle.fail(GatewayError::Timeout {
                    timeout_ms: self.window.as_millis() as u64,
                });
                true
            }
            None => {
                debug!(%transaction_id, "Timer fired after reply, nothing to do");
                false
            }
        }
    }
}
