//! rvi-transport - Transport layer for RVI service calls
//!
//! RVI is consumed as an opaque capability with two primitives:
//! - register a named service and get called back when a message
//!   arrives on it
//! - fire a call at a remote service address, with no reply pairing
//!   and no delivery guarantee
//!
//! This crate defines that capability as the [`RviTransport`] trait and
//! ships a mock implementation used by tests and by the daemon's demo
//! mode.
//!
//! # Example
//!
//! ```ignore
//! use rvi_transport::{create_transport, RviTransport};
//! use rvi_transport::config::{RviNodeConfig, TransportConfig};
//!
//! let transport = create_transport(&TransportConfig::default(), &RviNodeConfig::default()).await?;
//! transport.call_service("genivi.org/vehicles/123/odometer", payload).await?;
//! ```

mod adapter;
pub mod config;
pub mod error;
pub mod mock;

pub use adapter::{CallPayload, RviTransport, ServiceHandler, ServiceMessage};
pub use config::{MockConfig, RviNodeConfig, TransportConfig};
pub use error::TransportError;
pub use mock::{MockTransport, RecordedCall};

use std::sync::Arc;

/// Create a transport based on configuration
pub async fn create_transport(
    config: &TransportConfig,
    node: &RviNodeConfig,
) -> Result<Arc<dyn RviTransport>, TransportError> {
    match config {
        TransportConfig::Mock(cfg) => {
            tracing::info!(node = %node.address(), "Using mock RVI transport");
            Ok(Arc::new(MockTransport::with_node(cfg, node)))
        }
    }
}
