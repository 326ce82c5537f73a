//! End-to-end tests for the RVI gateway
//!
//! Tests in `tests/` run the full stack over a real bound listener:
//! - HTTP API layer (axum router, path schema, error mapping)
//! - Correlation layer (dispatcher, timeout supervisor, demultiplexer)
//! - Mock RVI transport standing in for the vehicle
//!
//! ```bash
//! cargo test -p rvi-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rvi_api::{create_router, AppState, PathSchema};
use rvi_gateway::{GatewayConfig, RviGateway};
use rvi_transport::{MockConfig, MockTransport};
use tokio::net::TcpListener;

/// A test server that shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` on an ephemeral localhost port
    pub async fn start(router: axum::Router) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(std::io::Error::other)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// A running gateway with handles on its moving parts
pub struct GatewayFixture {
    pub server: TestServer,
    pub gateway: Arc<RviGateway>,
    pub transport: Arc<MockTransport>,
}

impl GatewayFixture {
    /// Gateway over a mock vehicle that echoes every call after `latency_ms`
    pub async fn echoing(latency_ms: u64, timeout_ms: u64) -> Self {
        let transport = MockTransport::recording(&MockConfig {
            latency_ms,
            ..MockConfig::default()
        });
        Self::start(transport, timeout_ms).await
    }

    /// Gateway over a mock vehicle that never answers on its own
    pub async fn silent(timeout_ms: u64) -> Self {
        Self::start(MockTransport::silent(), timeout_ms).await
    }

    pub async fn start(transport: MockTransport, timeout_ms: u64) -> Self {
        let transport = Arc::new(transport);
        let gateway = Arc::new(RviGateway::new(
            transport.clone(),
            GatewayConfig {
                timeout_ms,
                ..GatewayConfig::default()
            },
        ));
        let schema = PathSchema::vehicle_default();
        gateway
            .register_endpoints(schema.templates())
            .await
            .expect("mock registration cannot fail");

        let router = create_router(AppState::new(gateway.clone(), schema));
        let server = TestServer::start(router)
            .await
            .expect("failed to bind test server");

        Self {
            server,
            gateway,
            transport,
        }
    }
}

/// Wait for a condition with timeout
pub async fn wait_for<F>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    false
}
