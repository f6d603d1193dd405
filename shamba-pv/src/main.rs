//! shamba-pv (Payment Verification) - Land-sale payment verification service
//!
//! Reconciles two proof-of-payment images against each other and confirms
//! payment status against the on-chain escrow contract.

use anyhow::Result;
use clap::Parser;
use shamba_common::config::load_config;
use shamba_common::db::init_database;
use shamba_pv::services::{GoogleVisionClient, JsonRpcChain};
use shamba_pv::{build_router, AppState};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "shamba-pv", about = "Shamba payment verification service")]
struct Args {
    /// Config file path (overrides SHAMBA_CONFIG and the platform default)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before anything that can stall
    info!(
        "Starting Shamba Payment Verification (shamba-pv) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path).await?;

    let media_root = config.media_root();
    std::fs::create_dir_all(&media_root)?;
    info!("Media root: {}", media_root.display());

    let detector = Arc::new(GoogleVisionClient::new(&config.vision)?);
    let chain = Arc::new(JsonRpcChain::new(&config.chain)?);
    info!("Chain endpoint: {}", config.chain.rpc_url);

    let state = AppState::new(
        pool,
        detector,
        chain,
        media_root,
        config.chain.contract_address.clone(),
    );
    let app = build_router(state);

    let bind = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("shamba-pv listening on http://{bind}");
    info!("Health check: http://{bind}/health");

    axum::serve(listener, app).await?;

    Ok(())
}
