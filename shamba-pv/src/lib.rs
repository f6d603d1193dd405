//! shamba-pv library - Payment Verification module
//!
//! Reconciles pairs of proof-of-payment images into verified land-sale
//! transaction records, and confirms individual payments against the escrow
//! contract.

use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::extract::FieldExtractor;
use crate::services::{ChainClient, TextDetector};

pub mod api;
pub mod chain;
pub mod extract;
pub mod ledger;
pub mod normalize;
pub mod payment;
pub mod reconcile;
pub mod services;

/// Application state shared across HTTP handlers
///
/// The extractor and both external clients are constructed once at startup
/// and injected; handlers never build their own.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub extractor: Arc<FieldExtractor>,
    pub detector: Arc<dyn TextDetector>,
    pub chain: Arc<dyn ChainClient>,
    /// Directory holding proof-of-payment images
    pub media_root: PathBuf,
    /// Deployment contract address used when a record carries none
    pub contract_address: Option<String>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        detector: Arc<dyn TextDetector>,
        chain: Arc<dyn ChainClient>,
        media_root: PathBuf,
        contract_address: Option<String>,
    ) -> Self {
        Self {
            db,
            extractor: Arc::new(FieldExtractor::new()),
            detector,
            chain,
            media_root,
            contract_address,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route(
            "/api/transactions",
            post(api::create_transaction).get(api::list_transactions),
        )
        .route("/api/transactions/verify", post(api::verify_transaction))
        .route("/api/transactions/:id", get(api::get_transaction))
        .route(
            "/api/transactions/:id/verify-payment",
            post(api::verify_payment),
        )
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
