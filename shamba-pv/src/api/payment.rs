//! Single-transaction payment verification endpoint

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shamba_common::db::transactions;

use crate::chain::ChainVerifier;
use crate::payment::{PaymentVerifier, RejectReason, VerifyOutcome};
use crate::AppState;

/// POST /api/transactions/:id/verify-payment
///
/// Runs the document check against the stored proof image, then the on-chain
/// check, and marks the transaction verified when both pass.
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, PaymentError> {
    let transaction = transactions::get(&state.db, id)
        .await
        .map_err(PaymentError::Internal)?
        .ok_or(PaymentError::NotFound(id))?;

    let verifier = PaymentVerifier::new(
        state.db.clone(),
        state.detector.clone(),
        ChainVerifier::new(state.chain.clone()),
        state.media_root.clone(),
        state.contract_address.clone(),
    );

    match verifier
        .verify(&transaction)
        .await
        .map_err(PaymentError::Internal)?
    {
        VerifyOutcome::Verified => Ok(Json(json!({
            "message": "Payment verified successfully."
        }))),
        VerifyOutcome::Rejected(reason) => Err(PaymentError::Rejected(reason)),
    }
}

/// Verification request errors
#[derive(Debug)]
pub enum PaymentError {
    NotFound(i64),
    Rejected(RejectReason),
    Internal(shamba_common::Error),
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            PaymentError::NotFound(id) => {
                (StatusCode::NOT_FOUND, format!("No transaction with id {id}"))
            }
            PaymentError::Rejected(reason) => (StatusCode::BAD_REQUEST, reason.to_string()),
            PaymentError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
