//! Overlay forwarding proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 OVERLAY PROXY                │
//!  Browser request   │  ┌────────┐   ┌───────────────────────────┐  │
//!  ──────────────────┼─▶│  http  │──▶│ gateway                   │  │
//!                    │  │ server │   │  preflight → path → token │  │
//!                    │  └────────┘   │  → target → allowlist     │  │
//!                    │               └─────────────┬─────────────┘  │
//!                    │                             ▼                │
//!  Relayed response  │  ┌────────┐   ┌───────────────────────────┐  │   Upstream
//!  ◀─────────────────┼──│  cors  │◀──│ upstream (one call, no    │◀─┼── (allowlisted
//!                    │  └────────┘   │ redirects, no pooling)    │  │    host)
//!                    │               └───────────────────────────┘  │
//!                    │  config · observability · lifecycle          │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use overlay_proxy::config::load_layered;
use overlay_proxy::lifecycle::{build_server, Shutdown};
use overlay_proxy::observability::logging::init_logging;
use overlay_proxy::ProxyConfig;

#[derive(Parser, Debug)]
#[command(name = "overlay-proxy", version, about = "Allowlisted CORS forwarding proxy")]
struct Cli {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address, overriding config and PROXY_BIND_ADDRESS.
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,

    /// Validate configuration, print the effective settings and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_layered(cli.config.as_deref(), cli.bind.as_deref())?;

    if cli.check {
        print_summary(&config);
        return Ok(());
    }

    init_logging(&config.observability)?;
    tracing::info!("overlay-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(config);
    let server = build_server(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_summary(config: &ProxyConfig) {
    let gateway = &config.gateway;
    println!("configuration ok");
    println!("  bind_address   {}", config.listener.bind_address);
    println!("  path           {}", gateway.path);
    println!("  allow_origin   {}", gateway.allow_origin);
    println!("  allowed_hosts  {}", gateway.allowed_hosts.join(", "));
    println!(
        "  auth_token     {}",
        if gateway.auth_token.is_some() { "<set>" } else { "<unset>" }
    );
    println!("  metrics        {}", config.observability.metrics_enabled);
}
