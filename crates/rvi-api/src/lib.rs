//! rvi-api - HTTP API layer for the RVI gateway
//!
//! Serves the vehicle API described by a [`PathSchema`] and forwards
//! vehicle-scoped requests to the vehicle over RVI through an
//! [`rvi_gateway::RviGateway`].
//!
//! # Usage
//!
//! ```ignore
//! use rvi_api::{create_router, AppState, PathSchema};
//!
//! let gateway = Arc::new(RviGateway::new(transport, GatewayConfig::default()));
//! let schema = PathSchema::vehicle_default();
//! gateway.register_endpoints(schema.templates()).await?;
//! let router = create_router(AppState::new(gateway, schema));
//! ```

pub mod error;
pub mod handlers;
pub mod schema;
pub mod state;

pub use error::ApiError;
pub use schema::{PathEntry, PathSchema, SchemaError};
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Everything else is resolved against the path schema
        .fallback(handlers::forward::forward)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
