//! Mock RVI transport for testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};

use super::{CallPayload, RviTransport, ServiceHandler, ServiceMessage, TransportError};
use crate::config::{MockConfig, RviNodeConfig};

/// A call captured by the mock transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub address: String,
    pub payload: CallPayload,
}

/// Mock transport that lets tests drive replies
///
/// With `echo` enabled every call is answered on the registered service
/// matching the called address, after the configured latency. Calls are
/// only kept when `record_calls` is set.
pub struct MockTransport {
    config: MockConfig,
    node: RviNodeConfig,
    connected: AtomicBool,
    handlers: Arc<RwLock<HashMap<String, ServiceHandler>>>,
    calls: RwLock<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new(config: &MockConfig) -> Self {
        Self::with_node(config, &RviNodeConfig::default())
    }

    pub fn with_node(config: &MockConfig, node: &RviNodeConfig) -> Self {
        Self {
            config: config.clone(),
            node: node.clone(),
            connected: AtomicBool::new(true),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Same as [`new`](Self::new), with call recording turned on
    pub fn recording(config: &MockConfig) -> Self {
        Self::new(&MockConfig {
            record_calls: true,
            ..config.clone()
        })
    }

    /// A silent mock: records calls, never replies on its own
    pub fn silent() -> Self {
        Self::recording(&MockConfig {
            echo: false,
            ..MockConfig::default()
        })
    }

    /// Set connection state; calls fail while disconnected
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Names of all registered services, sorted
    pub fn registered_services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.read().last().cloned()
    }

    /// Deliver a message to a registered service, as if it came from the peer
    pub fn invoke(&self, name: &str, params: Value) -> Result<(), TransportError> {
        let handler = self
            .handlers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TransportError::UnknownService(name.to_string()))?;
        handler(ServiceMessage::new(params));
        Ok(())
    }

    fn schedule_echo(&self, address: &str, payload: &CallPayload) {
        // Addresses are `host/path`; the host never contains a slash
        let Some(path) = address.find('/').map(|idx| &address[idx..]) else {
            tracing::debug!(%address, "Mock transport: no path to echo on");
            return;
        };
        let Some(service) = self.config.scope.relative_endpoint_of_path(path) else {
            tracing::debug!(%address, "Mock transport: address is not resource scoped");
            return;
        };

        let params = json!({
            "transactionId": payload.transaction_id,
            "data": payload.data.clone().unwrap_or_else(|| json!({"status": "success"})),
        });
        let handlers = self.handlers.clone();
        let latency = Duration::from_millis(self.config.latency_ms);

        tokio::spawn(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            let handler = handlers.read().get(&service).cloned();
            match handler {
                Some(handler) => handler(ServiceMessage::new(params)),
                None => tracing::debug!(%service, "Mock transport: no handler for echo"),
            }
        });
    }
}

#[async_trait]
impl RviTransport for MockTransport {
    async fn register_service(
        &self,
        name: &str,
        handler: ServiceHandler,
    ) -> Result<(), TransportError> {
        self.handlers.write().insert(name.to_string(), handler);
        tracing::debug!(%name, "Mock transport: registered service");
        Ok(())
    }

    async fn call_service(
        &self,
        address: &str,
        payload: CallPayload,
    ) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }

        tracing::debug!(%address, transaction_id = %payload.transaction_id, "Mock transport: call");
        if self.config.echo {
            self.schedule_echo(address, &payload);
        }
        if self.config.record_calls {
            self.calls.write().push(RecordedCall {
                address: address.to_string(),
                payload,
            });
        }
        Ok(())
    }

    fn node_address(&self) -> String {
        self.node.address()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use rvi_core::{CallerHandle, CorrelationTable};

    use super::*;

    fn collecting_handler() -> (ServiceHandler, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: ServiceHandler = Arc::new(move |msg: ServiceMessage| {
            sink.lock().unwrap().push(msg.params);
        });
        (handler, seen)
    }

    fn payload() -> CallPayload {
        let table = CorrelationTable::new();
        CallPayload {
            transaction_id: table.create(CallerHandle::channel().0),
            data: Some(json!({"a": 1})),
        }
    }

    #[tokio::test]
    async fn test_records_calls() {
        let transport = MockTransport::silent();
        let payload = payload();
        transport
            .call_service("genivi.org/vehicles/1/foo", payload.clone())
            .await
            .unwrap();

        assert_eq!(
            transport.calls(),
            vec![RecordedCall {
                address: "genivi.org/vehicles/1/foo".to_string(),
                payload,
            }]
        );
    }

    #[tokio::test]
    async fn test_disconnected_call_fails() {
        let transport = MockTransport::silent();
        transport.set_connected(false);
        let result = transport.call_service("genivi.org/vehicles/1", payload()).await;
        assert_eq!(result, Err(TransportError::ConnectionClosed));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_registered_service() {
        let transport = MockTransport::silent();
        let (handler, seen) = collecting_handler();
        transport.register_service("/foo", handler).await.unwrap();

        transport.invoke("/foo", json!({"transactionId": "x"})).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![json!({"transactionId": "x"})]);

        assert_eq!(
            transport.invoke("/bar", json!({})),
            Err(TransportError::UnknownService("/bar".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_echo_replies_on_matching_service() {
        let transport = MockTransport::new(&MockConfig {
            latency_ms: 100,
            ..MockConfig::default()
        });
        let (handler, seen) = collecting_handler();
        transport.register_service("/foo", handler).await.unwrap();

        let payload = payload();
        transport
            .call_service("genivi.org/vehicles/1/foo", payload.clone())
            .await
            .unwrap();
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![json!({"transactionId": payload.transaction_id, "data": {"a": 1}})]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_config_keeps_no_calls() {
        let transport = MockTransport::new(&MockConfig::default());
        let (handler, seen) = collecting_handler();
        transport.register_service("/foo", handler).await.unwrap();

        for _ in 0..100 {
            transport
                .call_service("genivi.org/vehicles/1/foo", payload())
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(seen.lock().unwrap().len(), 100);
        assert!(transport.calls().is_empty());
        assert_eq!(transport.last_call(), None);
    }

    #[tokio::test]
    async fn test_recording_keeps_calls() {
        let transport = MockTransport::recording(&MockConfig::default());
        transport
            .call_service("genivi.org/vehicles/1/foo", payload())
            .await
            .unwrap();
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_node_address() {
        let transport = MockTransport::with_node(
            &MockConfig::default(),
            &RviNodeConfig {
                host: "rvi.local".to_string(),
                port: 8807,
            },
        );
        assert_eq!(transport.node_address(), "rvi.local:8807");
    }
}
