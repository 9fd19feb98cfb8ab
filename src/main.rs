//! Frost - MCP server for the ServiceNow ITSM platform
//!
//! This binary runs as an MCP server using stdio transport, allowing an
//! assistant to work with ServiceNow incidents, change requests and users
//! through natural language.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `SERVICENOW_INSTANCE_URL`: Base URL of your instance
//! - `SERVICENOW_AUTH_TYPE`: `basic` (default), `oauth` or `api_key`
//! - plus the credentials for the chosen mode (see [`frost::config::Config::from_env`])
//!
//! # Usage
//!
//! ```bash
//! SERVICENOW_INSTANCE_URL=https://dev12345.service-now.com \
//! SERVICENOW_USERNAME=admin SERVICENOW_PASSWORD=... ./frost
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{fmt, EnvFilter};

use frost::auth::CredentialProvider;
use frost::client::ApiClient;
use frost::config::{self, ConfigProvider};
use frost::server;

/// Default log filter, raised to debug when `SERVICENOW_DEBUG=true`.
fn default_filter() -> EnvFilter {
    let debug = std::env::var("SERVICENOW_DEBUG")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    EnvFilter::new(if debug { "frost=debug" } else { "frost=info" })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // stdout is reserved for MCP JSON-RPC messages
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting Frost MCP server v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::from_env().context("Failed to load configuration")?;
    config
        .auth
        .validate()
        .context("Invalid authentication configuration")?;

    let credentials = Arc::new(
        CredentialProvider::new(config.auth, &config.destination)
            .context("Failed to create credential provider")?,
    );
    tracing::debug!(
        base_url = %config.destination.base_url(),
        auth_type = credentials.mode().as_str(),
        "Configuration loaded"
    );
    let destination = Arc::new(config.destination);

    tracing::info!("Testing connection to ServiceNow...");
    let client = ApiClient::new(credentials.clone(), destination.as_ref())
        .context("Failed to create API client")?;
    if let Err(e) = client.test_connection().await {
        let secrets = client.secrets();
        let secrets: Vec<&str> = secrets.iter().map(String::as_str).collect();
        tracing::error!(error = %e.sanitized_display(&secrets), "Connection test failed");
        tracing::warn!(
            "Server will start but may not be able to reach ServiceNow. \
             Check configuration and network connectivity."
        );
    }

    let server = server::FrostServer::new(credentials, destination);

    tracing::info!("Server initialized, starting stdio transport");

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })
        .context("Failed to start server")?;

    tracing::info!("Server running, waiting for requests");

    service
        .waiting()
        .await
        .context("Server error during operation")?;

    tracing::info!("Server shutting down");

    Ok(())
}
