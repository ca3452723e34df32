//! S3 caching proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!   GET /http://host/x    │                 CACHING PROXY                │
//!  ───────────────────────┼─▶ request id ─▶ access log ─▶ CachingHandler │
//!                         │                                   │          │
//!                         │          ┌────────────────────────┼────┐     │
//!                         │          ▼                        ▼    ▼     │
//!                         │   store HEAD (probe)     origin GET   spool  │
//!                         │          │                        │    │     │
//!                         │          ▼                        ▼    ▼     │
//!  ◀──────────────────────┼── 301/302 to store URL  ◀──  store PUT       │
//!     or forwarded error  │                                              │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use s3_caching_proxy::config::overrides::apply_server_overrides;
use s3_caching_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig, StoreArgs};
use s3_caching_proxy::lifecycle::{wait_for_signal, Shutdown};
use s3_caching_proxy::observability::init_logging;
use s3_caching_proxy::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "s3-caching-proxy")]
#[command(about = "HTTP proxy that caches fetched resources in an S3 bucket", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP [host]:port on which to listen
    #[arg(long)]
    addr: Option<String>,

    /// Directory for spooling bodies of unknown length
    #[arg(long)]
    spool_dir: Option<PathBuf>,

    #[command(flatten)]
    store: StoreArgs,
}

fn load(cli: &Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    apply_server_overrides(
        &mut config,
        cli.addr.as_deref(),
        cli.spool_dir.clone(),
        &cli.store,
    );
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    init_logging(&config.observability);

    tracing::info!("s3-caching-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        bucket = %config.store.bucket,
        endpoint = %config.store.endpoint,
        access_key = %config.store.access_key,
        spool_dir = ?config.spool.directory(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    let servers = shutdown.trigger();
    tracing::info!(servers, "Draining in-flight requests");
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
