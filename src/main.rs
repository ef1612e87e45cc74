//! Escrow relay (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌───────────────────────────────────────────────────────────┐
//!                  │                       ESCROW RELAY                        │
//!                  │                                                           │
//!   Frontend       │  ┌─────────┐    ┌──────────────┐    ┌─────────────────┐   │
//!   ───────────────┼─▶│  http   │───▶│EscrowService │───▶│ TransactionStore│   │
//!                  │  │ server  │    │ intake/query │    │  memory | file  │   │
//!                  │  └─────────┘    └──────┬───────┘    └────────▲────────┘   │
//!                  │                        │ trigger             │            │
//!                  │                        ▼                     │            │
//!                  │                ┌──────────────┐              │            │
//!                  │   every tick──▶│  Lifecycle   │──────────────┘            │
//!                  │                │   Engine     │                           │
//!                  │                └──┬────────┬──┘                           │
//!                  │          classify │        │ forward                      │
//!                  │                   ▼        ▼                              │
//!                  │                ┌──────────────┐                           │
//!                  │                │   Gateway    │◀──── JSON-RPC ────────────┼──── EVM node
//!                  │                └──────────────┘                           │
//!                  └───────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use clap::Parser;
use tokio::net::TcpListener;

use escrow_relay::blockchain::{BlockchainClient, Gateway, RpcGateway, Wallet};
use escrow_relay::config::schema::{RelayConfig, StoreBackend};
use escrow_relay::config::watcher::{apply_updates, ConfigWatcher};
use escrow_relay::config::{load_config, load_from_env};
use escrow_relay::escrow::{EscrowService, LifecycleEngine};
use escrow_relay::http::HttpServer;
use escrow_relay::lifecycle::{signals, Shutdown};
use escrow_relay::observability::{logging, metrics};
use escrow_relay::store::{FileStore, MemoryStore, TransactionStore};

#[derive(Parser)]
#[command(name = "escrow-relay", version, about = "Escrow forwarding relay")]
struct Args {
    /// TOML configuration file. Without it, defaults plus RELAY_* variables.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config: RelayConfig = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("escrow-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.blockchain.rpc_url,
        confirmation_threshold = config.lifecycle.confirmation_threshold,
        fee_percentage = %config.lifecycle.fee_percentage,
        poll_interval_secs = config.lifecycle.poll_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Chain access
    let client = BlockchainClient::new(config.blockchain.clone()).await?;
    if let Err(e) = client.verify_chain_id().await {
        tracing::warn!(error = %e, "Chain id check failed; continuing");
    }
    let wallet = Wallet::from_env(config.blockchain.chain_id)?;
    match &wallet {
        Some(w) => tracing::info!(address = %w.address(), "Escrow wallet loaded"),
        None => tracing::warn!("No escrow signing key configured; forwards will fail"),
    }
    let gateway: Arc<dyn Gateway> = Arc::new(RpcGateway::new(client, wallet));

    // Persistence
    let store: Arc<dyn TransactionStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(FileStore::open(&config.store.path)?),
    };

    // Lifecycle
    let settings = Arc::new(ArcSwap::from_pointee(config.lifecycle.clone()));
    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        gateway.clone(),
        settings.clone(),
        config.blockchain.gas_limit,
    ));
    let service = Arc::new(EscrowService::new(store, gateway, engine.clone()));

    let shutdown = Shutdown::new();
    let engine_task = tokio::spawn(engine.run(shutdown.subscribe()));

    // Hot reload; the watcher handle must outlive the server.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tokio::spawn(apply_updates(updates, settings.clone(), shutdown.subscribe()));
            match watcher.run() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start config watcher");
                    None
                }
            }
        }
        None => None,
    };

    tokio::spawn(signals::wait_for_shutdown(shutdown.clone()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(service, &config.http);
    let result = server.run(listener, shutdown.subscribe()).await;

    shutdown.trigger();
    if let Err(e) = engine_task.await {
        tracing::error!(error = %e, "Lifecycle engine task failed");
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
