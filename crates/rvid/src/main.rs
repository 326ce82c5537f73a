//! rvid - RVI Gateway Daemon
//!
//! HTTP front end for vehicles that are only reachable over RVI. Each
//! vehicle-scoped request is forwarded as an RVI service call and held
//! open until the vehicle replies or the reply timeout elapses.
//!
//! Usage:
//!   rvid [OPTIONS] [config.toml]
//!
//! If no config file is provided, the built-in vehicle schema and the
//! echoing mock transport are used.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use rvi_api::{create_router, AppState};
use rvi_gateway::RviGateway;
use rvi_transport::{create_transport, RviTransport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DaemonConfig;

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<PathBuf>,
    /// OpenAPI document to load the path schema from
    schema_path: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args {
        config_path: None,
        schema_path: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--schema" | "-s" => {
                if i + 1 < args.len() {
                    result.schema_path = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    tracing::error!("Missing argument for --schema");
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(PathBuf::from(arg));
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    result
}

fn print_help() {
    eprintln!(
        r#"rvid - RVI Gateway Daemon

Usage: rvid [OPTIONS] [config.toml]

Options:
  -s, --schema <path>  Load the path schema from an OpenAPI (Swagger)
                       YAML/JSON document
  -h, --help           Print this help message

Environment:
  PORT             HTTP listen port (default 8001)
  RVI_HOST         RVI node host (default localhost)
  RVI_PORT         RVI node port (default 5000)
  RVI_TARGET_HOST  RVI host prefix of the vehicles (default genivi.org)
  RVI_TIMEOUT_MS   Reply timeout in milliseconds (default 30000)
  RVI_SCHEMA       Same as --schema

Examples:
  # Run with the built-in schema and the echoing mock transport
  rvid

  # Run with config file and an API description
  rvid --schema api/swagger.yaml rvid.toml
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rvid=info,rvi_api=info,rvi_gateway=debug,rvi_transport=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rvid (RVI Gateway Daemon)");

    // Parse command-line arguments
    let args = parse_args();

    // Load configuration
    match &args.config_path {
        Some(path) => tracing::info!("Loading config from: {}", path.display()),
        None => tracing::info!("No config file provided, using defaults"),
    }
    let mut config = DaemonConfig::load(args.config_path.as_deref())?;
    if let Some(path) = args.schema_path {
        config.schema = Some(path);
    }

    let schema = config.path_schema()?;
    tracing::info!("Serving {} path templates", schema.entries().len());

    // Connect the transport and register reply services
    let transport = create_transport(&config.transport(), config.node()).await?;
    tracing::info!(node = %transport.node_address(), "RVI transport ready");
    let gateway = Arc::new(RviGateway::new(transport, config.gateway()));
    let services = gateway.register_endpoints(schema.templates()).await?;
    tracing::debug!(?services, "RVI services");

    // Create the router
    let app = create_router(AppState::new(gateway, schema));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on http://{}", addr);

    // Run the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("rvid stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
