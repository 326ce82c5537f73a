//! Application state for the RVI API

use std::sync::Arc;

use rvi_core::EndpointScope;
use rvi_gateway::RviGateway;

use crate::schema::PathSchema;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Correlation layer forwarding requests over RVI
    gateway: Arc<RviGateway>,
    /// Path templates served by this API
    schema: Arc<PathSchema>,
}

impl AppState {
    pub fn new(gateway: Arc<RviGateway>, schema: PathSchema) -> Self {
        Self {
            gateway,
            schema: Arc::new(schema),
        }
    }

    pub fn gateway(&self) -> &RviGateway {
        &self.gateway
    }

    pub fn schema(&self) -> &PathSchema {
        &self.schema
    }

    /// Resource-scoping prefix shared with the gateway
    pub fn scope(&self) -> &EndpointScope {
        &self.gateway.config().scope
    }
}
