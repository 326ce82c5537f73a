//! RVI service registration and reply demultiplexing
//!
//! Every resource-scoped template of the path schema is also an RVI
//! service on which the remote peer answers. `/vehicles/{id}/odometer`
//! becomes the service `/odometer`, `/vehicles/{id}` becomes `/`.
//! Templates outside the scope (e.g. `/vehicles`) are served locally and
//! are never registered.

use std::collections::BTreeSet;
use std::sync::Arc;

use rvi_core::{CorrelationTable, EndpointScope};
use rvi_transport::{RviTransport, ServiceHandler, ServiceMessage, TransportError};
use tracing::{debug, info};

/// Derives RVI service names from the path schema and registers a reply
/// handler for each of them
#[derive(Clone)]
pub struct EndpointRegistrar {
    table: Arc<CorrelationTable>,
    scope: EndpointScope,
}

impl EndpointRegistrar {
    pub fn new(table: Arc<CorrelationTable>, scope: EndpointScope) -> Self {
        Self { table, scope }
    }

    /// RVI-relative service names for the given templates, sorted and
    /// without duplicates
    pub fn derive_endpoints<I, S>(&self, templates: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        templates
            .into_iter()
            .filter_map(|template| self.scope.relative_endpoint(template.as_ref()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Register a reply handler for every derived service name
    pub async fn register<I, S>(
        &self,
        transport: &dyn RviTransport,
        templates: I,
    ) -> Result<Vec<String>, TransportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoints = self.derive_endpoints(templates);
        for endpoint in &endpoints {
            transport
                .register_service(endpoint, self.reply_handler(endpoint))
                .await?;
        }
        info!(count = endpoints.len(), "Registered RVI services");
        Ok(endpoints)
    }

    /// Build the reply handler for one service name
    pub fn reply_handler(&self, endpoint: &str) -> ServiceHandler {
        let table = self.table.clone();
        let endpoint = endpoint.to_string();
        Arc::new(move |message: ServiceMessage| {
            demultiplex(&table, &endpoint, message);
        })
    }
}

/// Route one inbound reply to the caller waiting on its transaction.
///
/// Unknown, expired, duplicate or malformed replies are dropped. A reply
/// without `data` leaves the call pending so its timer still fails the
/// caller.
fn demultiplex(table: &CorrelationTable, endpoint: &str, message: ServiceMessage) {
    let Some(transaction_id) = message.transaction_id().map(str::to_string) else {
        debug!(%endpoint, "RVI reply without transaction id, ignoring");
        return;
    };
    if message.data().is_none() {
        debug!(%endpoint, %transaction_id, "RVI reply without data, ignoring");
        return;
    }

    let Some(handle) = table.resolve(&transaction_id) else {
        debug!(%endpoint, %transaction_id, "RVI reply for unknown or expired transaction");
        return;
    };

    debug!(%endpoint, %transaction_id, "RVI reply delivered");
    handle.deliver(message.into_data().unwrap_or_default());
}
