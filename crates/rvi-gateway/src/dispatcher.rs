//! Request dispatcher
//!
//! Entry point for every forwarded request: address the call, register
//! the caller under a fresh transaction id, arm the timeout and fire the
//! RVI call. The caller is completed later by the reply handler or by
//! the timer, never by the dispatcher itself.

use std::sync::Arc;

use rvi_core::{CallOutcome, CallerHandle, CorrelationTable, EndpointScope, TransactionId};
use rvi_transport::{CallPayload, RviTransport};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::supervisor::TimeoutSupervisor;

/// A request to forward to the remote peer
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    /// Resolved path template, e.g. `/vehicles/{id}/odometer`
    pub template: String,
    /// Concrete resource identifier substituted into the template
    pub resource_id: String,
    /// Request body, if any
    pub body: Option<Value>,
}

impl DispatchRequest {
    pub fn new(template: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            resource_id: resource_id.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

pub struct RequestDispatcher {
    table: Arc<CorrelationTable>,
    transport: Arc<dyn RviTransport>,
    supervisor: TimeoutSupervisor,
    target_host: String,
    scope: EndpointScope,
}

impl RequestDispatcher {
    pub fn new(
        table: Arc<CorrelationTable>,
        transport: Arc<dyn RviTransport>,
        supervisor: TimeoutSupervisor,
        target_host: String,
        scope: EndpointScope,
    ) -> Self {
        Self {
            table,
            transport,
            supervisor,
            target_host,
            scope,
        }
    }

    /// Fully qualified RVI address for a request
    pub fn address(&self, request: &DispatchRequest) -> String {
        format!(
            "{}{}",
            self.target_host,
            self.scope.address_path(&request.template, &request.resource_id)
        )
    }

    /// Forward `request`; `handle` is completed once a reply or the
    /// timeout arrives.
    ///
    /// Returns as soon as the call has been handed to the transport. A
    /// transport failure is logged and left to the timeout.
    pub async fn dispatch(&self, request: DispatchRequest, handle: CallerHandle) -> TransactionId {
        self.dispatch_armed(request, handle).await.0
    }

    /// Like [`dispatch`](Self::dispatch), also returning the armed timer.
    ///
    /// The timer resolves to `true` if it failed the caller.
    pub(crate) async fn dispatch_armed(
        &self,
        request: DispatchRequest,
        handle: CallerHandle,
    ) -> (TransactionId, JoinHandle<bool>) {
        let address = self.address(&request);

        // Registered before the call goes out so a fast reply always finds it
        let transaction_id = self.table.create(handle);
        let timer = self.supervisor.arm(transaction_id.clone());

        debug!(%address, %transaction_id, "Dispatching RVI call");
        let payload = CallPayload {
            transaction_id: transaction_id.clone(),
            data: request.body,
        };
        if let Err(e) = self.transport.call_service(&address, payload).await {
            warn!(%address, %transaction_id, error = %e, "RVI call failed, awaiting timeout");
        }

        (transaction_id, timer)
    }

    /// Forward `request` and wait for its reply or timeout
    pub async fn call(&self, request: DispatchRequest) -> CallOutcome {
        let (handle, reply) = CallerHandle::channel();
        self.dispatch(request, handle).await;
        reply.wait().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use rvi_core::GatewayError;
    use rvi_transport::{MockConfig, MockTransport};
    use serde_json::json;

    use super::*;
    use crate::registrar::EndpointRegistrar;

    const TIMEOUT: Duration = Duration::from_millis(500);

    struct Fixture {
        table: Arc<CorrelationTable>,
        transport: Arc<MockTransport>,
        dispatcher: RequestDispatcher,
    }

    async fn fixture(transport: MockTransport) -> Fixture {
        let table = Arc::new(CorrelationTable::new());
        let transport = Arc::new(transport);
        EndpointRegistrar::new(table.clone(), EndpointScope::default())
            .register(transport.as_ref(), ["/vehicles/{id}/foo/bar"])
            .await
            .unwrap();
        let dispatcher = RequestDispatcher::new(
            table.clone(),
            transport.clone(),
            TimeoutSupervisor::new(table.clone(), TIMEOUT),
            "genivi.org".to_string(),
            EndpointScope::default(),
        );
        Fixture {
            table,
            transport,
            dispatcher,
        }
    }

    fn request() -> DispatchRequest {
        DispatchRequest::new("/vehicles/{id}/foo/bar", "123")
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_times_out() {
        let f = fixture(MockTransport::silent()).await;
        let (handle, mut reply) = CallerHandle::channel();

        let id = f.dispatcher.dispatch(request(), handle).await;

        let call = f.transport.last_call().expect("call issued");
        assert_eq!(f.transport.calls().len(), 1);
        assert_eq!(call.address, "genivi.org/vehicles/123/foo/bar");
        assert_eq!(call.payload.transaction_id, id);
        assert!(f.table.contains(id.as_str()));

        tokio::time::sleep(TIMEOUT + Duration::from_millis(1)).await;

        assert_eq!(
            reply.try_outcome(),
            Some(Err(GatewayError::Timeout { timeout_ms: 500 }))
        );
        assert!(!f.table.contains(id.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_then_reply() {
        let f = fixture(MockTransport::silent()).await;
        let (handle, mut reply) = CallerHandle::channel();

        let (id, timer) = f.dispatcher.dispatch_armed(request(), handle).await;
        assert_eq!(f.table.len(), 1);

        f.transport
            .invoke(
                "/foo/bar",
                json!({"transactionId": id, "data": {"result": "some value"}}),
            )
            .unwrap();

        assert_eq!(
            reply.try_outcome(),
            Some(Ok(json!({"result": "some value"})))
        );
        assert!(f.table.is_empty());

        // The timer still fires, and finds nothing to fail
        assert!(!timer.await.unwrap());
        assert!(f.table.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_forwards_body() {
        let f = fixture(MockTransport::silent()).await;
        let (handle, _reply) = CallerHandle::channel();

        f.dispatcher
            .dispatch(request().with_body(json!({"lock": true})), handle)
            .await;

        let call = f.transport.last_call().expect("call issued");
        assert_eq!(call.payload.data, Some(json!({"lock": true})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_resolves_by_timeout() {
        let transport = MockTransport::silent();
        transport.set_connected(false);
        let f = fixture(transport).await;

        let outcome = f.dispatcher.call(request()).await;

        assert_eq!(outcome, Err(GatewayError::Timeout { timeout_ms: 500 }));
        assert!(f.table.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_and_timeout_at_same_instant() {
        // Echo latency equal to the window: reply and timer are due together
        let transport = MockTransport::new(&MockConfig {
            latency_ms: TIMEOUT.as_millis() as u64,
            ..MockConfig::default()
        });
        let f = fixture(transport).await;
        let (handle, mut reply) = CallerHandle::channel();

        let (_, timer) = f.dispatcher.dispatch_armed(request(), handle).await;
        let timer_failed_caller = timer.await.unwrap();
        tokio::time::sleep(TIMEOUT).await;

        match reply.try_outcome() {
            Some(Ok(data)) => {
                assert_eq!(data, json!({"status": "success"}));
                assert!(!timer_failed_caller);
            }
            Some(Err(err)) => {
                assert_eq!(err, GatewayError::Timeout { timeout_ms: 500 });
                assert!(timer_failed_caller);
            }
            None => panic!("call was neither delivered nor failed"),
        }
        assert!(f.table.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_dispatches_are_independent() {
        let f = fixture(MockTransport::silent()).await;
        let mut replies = Vec::new();
        let mut ids = Vec::new();
        for vehicle in ["1", "2", "3"] {
            let (handle, reply) = CallerHandle::channel();
            ids.push(
                f.dispatcher
                    .dispatch(DispatchRequest::new("/vehicles/{id}/foo/bar", vehicle), handle)
                    .await,
            );
            replies.push(reply);
        }

        f.transport
            .invoke("/foo/bar", json!({"transactionId": ids[1], "data": 2}))
            .unwrap();
        tokio::time::sleep(TIMEOUT + Duration::from_millis(1)).await;

        let outcomes: Vec<_> = replies.iter_mut().map(|r| r.try_outcome()).collect();
        assert_eq!(
            outcomes,
            vec![
                Some(Err(GatewayError::Timeout { timeout_ms: 500 })),
                Some(Ok(json!(2))),
                Some(Err(GatewayError::Timeout { timeout_ms: 500 })),
            ]
        );
        assert!(f.table.is_empty());
    }

    #[test]
    fn test_address() {
        let table = Arc::new(CorrelationTable::new());
        let dispatcher = RequestDispatcher::new(
            table.clone(),
            Arc::new(MockTransport::silent()),
            TimeoutSupervisor::new(table, TIMEOUT),
            "genivi.org".to_string(),
            EndpointScope::default(),
        );
        assert_eq!(dispatcher.address(&request()), "genivi.org/vehicles/123/foo/bar");
        assert_eq!(
            dispatcher.address(&DispatchRequest::new("/vehicles/{id}", "abc")),
            "genivi.org/vehicles/abc"
        );
    }
}
