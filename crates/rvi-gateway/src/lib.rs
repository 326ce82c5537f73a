//! rvi-gateway - Bridges synchronous requests onto asynchronous RVI calls
//!
//! RVI delivers replies out of band, on a service of our own, with no
//! request/response pairing. This crate adds the pairing:
//!
//! ```text
//!  HTTP request ──► RequestDispatcher ──► create() ──► CorrelationTable
//!                        │                                 ▲      ▲
//!                        ├── arm timer ──► TimeoutSupervisor ┘      │
//!                        │                   (fail on expiry)       │
//!                        └── call_service ──► RVI ──► reply handler ┘
//!                                                     (deliver on reply)
//! ```
//!
//! Whichever of the reply handler and the timer resolves a transaction
//! first completes the caller; the other finds nothing and does nothing.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rvi_gateway::{DispatchRequest, GatewayConfig, RviGateway};
//!
//! let gateway = RviGateway::new(transport, GatewayConfig::default());
//! gateway.register_endpoints(["/vehicles/{id}", "/vehicles/{id}/odometer"]).await?;
//!
//! let reply = gateway
//!     .call(DispatchRequest::new("/vehicles/{id}/odometer", "123"))
//!     .await?;
//! ```

mod config;
mod dispatcher;
mod registrar;
mod supervisor;

use std::sync::Arc;

pub use config::GatewayConfig;
pub use dispatcher::{DispatchRequest, RequestDispatcher};
pub use registrar::EndpointRegistrar;
pub use supervisor::TimeoutSupervisor;

// Re-export core types for convenience
pub use rvi_core::{CallOutcome, CallerHandle, GatewayError, PendingReply, TransactionId};

use rvi_core::CorrelationTable;
use rvi_transport::{RviTransport, TransportError};

/// Runtime context owning the correlation table and the components
/// sharing it
pub struct RviGateway {
    config: GatewayConfig,
    table: Arc<CorrelationTable>,
    transport: Arc<dyn RviTransport>,
    registrar: EndpointRegistrar,
    dispatcher: RequestDispatcher,
}

impl RviGateway {
    pub fn new(transport: Arc<dyn RviTransport>, config: GatewayConfig) -> Self {
        let table = Arc::new(CorrelationTable::new());
        let supervisor = TimeoutSupervisor::new(table.clone(), config.timeout());
        let registrar = EndpointRegistrar::new(table.clone(), config.scope.clone());
        let dispatcher = RequestDispatcher::new(
            table.clone(),
            transport.clone(),
            supervisor,
            config.target_host.clone(),
            config.scope.clone(),
        );

        Self {
            config,
            table,
            transport,
            registrar,
            dispatcher,
        }
    }

    /// Register reply handlers for every resource-scoped template.
    ///
    /// Returns the registered RVI service names.
    pub async fn register_endpoints<I, S>(
        &self,
        templates: I,
    ) -> Result<Vec<String>, TransportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registrar.register(self.transport.as_ref(), templates).await
    }

    /// Dispatch a request and wait for its reply or timeout
    pub async fn call(&self, request: DispatchRequest) -> CallOutcome {
        self.dispatcher.call(request).await
    }

    /// Dispatch a request, completing `handle` asynchronously
    pub async fn dispatch(&self, request: DispatchRequest, handle: CallerHandle) -> TransactionId {
        self.dispatcher.dispatch(request, handle).await
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Number of calls still waiting for a reply or timeout
    pub fn pending_calls(&self) -> usize {
        self.table.len()
    }

    /// Whether `transaction_id` is still waiting
    pub fn is_pending(&self, transaction_id: &str) -> bool {
        self.table.contains(transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use rvi_transport::MockTransport;
    use serde_json::json;

    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig {
            timeout_ms: 500,
            ..GatewayConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_completes_through_echo_transport() {
        let transport = Arc::new(MockTransport::new(&Default::default()));
        let gateway = RviGateway::new(transport.clone(), config());
        gateway
            .register_endpoints(["/vehicles/{id}/foo/bar"])
            .await
            .unwrap();

        let outcome = gateway
            .call(DispatchRequest::new("/vehicles/{id}/foo/bar", "123").with_body(json!({"x": 1})))
            .await;

        assert_eq!(outcome, Ok(json!({"x": 1})));
        assert_eq!(gateway.pending_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_times_out_without_reply() {
        let transport = Arc::new(MockTransport::silent());
        let gateway = RviGateway::new(transport.clone(), config());
        gateway
            .register_endpoints(["/vehicles/{id}/foo/bar"])
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        let outcome = gateway
            .call(DispatchRequest::new("/vehicles/{id}/foo/bar", "123"))
            .await;

        assert_eq!(outcome, Err(GatewayError::Timeout { timeout_ms: 500 }));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(510));
        assert_eq!(gateway.pending_calls(), 0);
    }
}
