//! Transport trait and message types

use std::sync::Arc;

use async_trait::async_trait;
use rvi_core::TransactionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TransportError;

/// Callback invoked when a message arrives on a registered service
pub type ServiceHandler = Arc<dyn Fn(ServiceMessage) + Send + Sync>;

/// Parameters sent with every outbound service call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallPayload {
    pub transaction_id: TransactionId,
    /// Request body, omitted when the HTTP request carried none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Message received on a registered service.
///
/// The parameters come from the remote peer and are not trusted; the
/// accessors return `None` for anything missing or of the wrong shape.
#[derive(Debug, Clone)]
pub struct ServiceMessage {
    /// Raw service parameters
    pub params: Value,
}

impl ServiceMessage {
    pub fn new(params: Value) -> Self {
        Self { params }
    }

    /// The `transactionId` parameter, if it is a string
    pub fn transaction_id(&self) -> Option<&str> {
        self.params.get("transactionId").and_then(Value::as_str)
    }

    /// The `data` parameter. An explicit `null` counts as present.
    pub fn data(&self) -> Option<&Value> {
        self.params.get("data")
    }

    /// Take the `data` parameter out of the message
    pub fn into_data(self) -> Option<Value> {
        match self.params {
            Value::Object(mut map) => map.remove("data"),
            _ => None,
        }
    }
}

/// The RVI capability the gateway consumes
///
/// Implementations must not block in `call_service` waiting for any
/// reply; replies arrive later through a handler registered with
/// `register_service`.
#[async_trait]
pub trait RviTransport: Send + Sync {
    /// Register a handler for a service name relative to this node
    async fn register_service(
        &self,
        name: &str,
        handler: ServiceHandler,
    ) -> Result<(), TransportError>;

    /// Fire a call at a fully qualified service address
    async fn call_service(&self, address: &str, payload: CallPayload)
        -> Result<(), TransportError>;

    /// `host:port` of the local RVI node
    fn node_address(&self) -> String;
}
