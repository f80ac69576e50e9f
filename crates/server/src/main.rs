//! waystation server entry point.
//!
//! Boots one cache generation (install, then activate unless configured to
//! wait) and serves it as MCP tools on stdio. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use waystation_client::{FetchClient, FetchConfig, Interceptor};
use waystation_core::{AppConfig, CacheDb};

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let policy = config.policy()?;
    let db = CacheDb::open(&config.db_path).await?;

    let fetcher = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;
    let interceptor = Arc::new(Interceptor::new(policy, db, Arc::new(fetcher))?);

    tracing::info!(version = %config.cache_version, db = %config.db_path.display(), "installing cache generation");
    interceptor.install().await;
    if config.skip_waiting {
        interceptor.activate().await;
    } else {
        tracing::info!("generation waiting for skip_waiting");
    }

    tracing::info!("Starting waystation server on stdio transport");
    let handler = handler::WaystationServer::new(interceptor);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
