//! Kite Gateway
//!
//! ```text
//!   browser ──cookie──▶ /kite/{name} ──▶ Store::resolve_kite ──▶ GET kite?args&username
//!   browser ─────────▶ /login?n=     ──▶ Store (nonce) ──▶ TokenIssuer ──▶ Set-Cookie
//!   kite    ─────────▶ /kite/connect, /kite/disconnect ──▶ Store
//!   pub/sub ─────────▶ /event ──▶ ChannelHandler
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use kite_gateway::config::{self, GatewayConfig};
use kite_gateway::lifecycle::{signals, startup, Shutdown};
use kite_gateway::observability::{logging, metrics};
use kite_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "kite-gateway")]
#[command(about = "Session-authenticated gateway in front of kites", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::loader::finalize(GatewayConfig::default())?,
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("kite-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        fetch_timeout_secs = config.proxy.fetch_timeout_secs,
        seed_path = ?config.store.seed_path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address already validated by the loader.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let store = startup::open_store(&config.store)?;
    let store_config = config.store.clone();
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(startup::build_state(config, store.clone()));
    let server_shutdown = shutdown.subscribe();
    let mut server_task = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    tokio::select! {
        result = &mut server_task => result??,
        _ = signals::wait_for_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
    }

    startup::persist_store(&store_config, &store);
    tracing::info!("Shutdown complete");
    Ok(())
}
