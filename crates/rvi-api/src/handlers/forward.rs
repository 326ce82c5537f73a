//! Forwarding handler
//!
//! Every request that is not a local route lands here. The path is
//! resolved against the schema, checked for an allowed method, and, if
//! it is scoped to a vehicle, forwarded over RVI. The response is
//! whatever JSON the vehicle replied with.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, Uri};
use axum::Json;
use rvi_gateway::DispatchRequest;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// Forward a vehicle request over RVI and wait for the reply
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let route = state
        .schema()
        .resolve(uri.path())
        .ok_or_else(ApiError::not_found)?;

    if !route.allows(&method) {
        tracing::debug!(%method, template = route.template(), "Method not allowed");
        return Err(ApiError::validation());
    }

    // Only vehicle-scoped templates go over RVI
    let scope = state.scope();
    if scope.relative_endpoint(route.template()).is_none() {
        return Err(ApiError::not_found());
    }
    let resource_id = route
        .param(&scope.placeholder)
        .ok_or_else(ApiError::not_found)?;

    let mut request = DispatchRequest::new(route.template(), resource_id);
    if let Some(body) = parse_body(&body)? {
        request = request.with_body(body);
    }

    tracing::debug!(template = %request.template, id = %request.resource_id, "Forwarding request");
    let reply = state.gateway().call(request).await?;
    Ok(Json(reply))
}

/// An empty body means no data; anything else must be JSON
fn parse_body(body: &[u8]) -> Result<Option<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        tracing::debug!(error = %e, "Invalid JSON body");
        ApiError::validation()
    })
}
