//! envseal Verification Service
//!
//! Answers "does this file still match what was recorded under this id?"
//! for parties that hold no keys.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use envseal_core::config::load_config;
use envseal_core::tracing_init::init_tracing;
use envseal_crypto::DigestLedger;
use envseal_verifyd::routes::{AppState, build_router};

#[derive(Parser, Debug)]
#[command(name = "envseal-verifyd")]
#[command(version, about = "envseal key-less verification service")]
struct Args {
    /// JSON settings file
    #[arg(long, env = "ENVSEAL_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (overrides the settings file)
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Digest ledger file (overrides the settings file)
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Maximum accepted upload size in bytes
    #[arg(long)]
    max_upload_bytes: Option<usize>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("envseal_verifyd=info,tower_http=info", args.log_json);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(path) = args.ledger {
        config.ledger.path = path;
    }
    if let Some(max) = args.max_upload_bytes {
        config.server.max_upload_bytes = max;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        ledger = %config.ledger.path.display(),
        max_upload_bytes = config.server.max_upload_bytes,
        "Starting envseal-verifyd"
    );

    let app = build_router(AppState {
        ledger: Arc::new(DigestLedger::new(config.ledger.path)),
        max_upload_bytes: config.server.max_upload_bytes,
    });
    let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("envseal-verifyd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
