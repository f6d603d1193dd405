//! Two-image payment reconciliation endpoint
//!
//! Accepts two independently sourced proof-of-payment images, extracts and
//! normalizes payment fields from each, and persists a completed transaction
//! record when they agree. Every rejection response names its reason and
//! carries the values that led to it.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use shamba_common::Amount;

use crate::ledger;
use crate::normalize::normalize;
use crate::reconcile::{reconcile, MismatchReport, Reconciliation};
use crate::services::DetectError;
use crate::AppState;

/// Successful reconciliation response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub message: String,
    pub transaction_id: i64,
    pub amount: Amount,
    pub created: bool,
}

/// POST /api/transactions/verify
///
/// Multipart fields `file1` and `file2` carry the two images. The two
/// text-detection calls run concurrently; reconciliation waits for both.
pub async fn verify_transaction(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VerifyResponse>), VerifyError> {
    let mut file1 = None;
    let mut file2 = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| VerifyError::Multipart(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file1") => {
                file1 = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| VerifyError::Multipart(e.to_string()))?,
                );
            }
            Some("file2") => {
                file2 = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| VerifyError::Multipart(e.to_string()))?,
                );
            }
            _ => continue,
        }
    }

    let (Some(image1), Some(image2)) = (file1, file2) else {
        return Err(VerifyError::MissingFiles);
    };

    // The two detections are independent; issue them concurrently
    let (text1, text2) = tokio::join!(
        state.detector.detect_text(&image1),
        state.detector.detect_text(&image2),
    );
    let text1 = text1.map_err(VerifyError::Detection)?;
    let text2 = text2.map_err(VerifyError::Detection)?;

    let raw1 = state.extractor.extract(&text1);
    let raw2 = state.extractor.extract(&text2);

    let (fields1, fields2) = match (normalize(&raw1), normalize(&raw2)) {
        (Ok(fields1), Ok(fields2)) => (fields1, fields2),
        (first, second) => {
            return Err(VerifyError::Incomplete {
                image1: first.err().map(|r| r.fields).unwrap_or_default(),
                image2: second.err().map(|r| r.fields).unwrap_or_default(),
            });
        }
    };

    match reconcile(fields1, fields2) {
        Reconciliation::Mismatch(report) => Err(VerifyError::Mismatch(Box::new(report))),
        Reconciliation::Match(agreed) => {
            let write = ledger::record_completed_payment(&state.db, &agreed)
                .await
                .map_err(VerifyError::Store)?;

            let message = if write.created {
                "Transaction created and marked as complete"
            } else {
                "Transaction updated and marked as complete"
            };

            Ok((
                StatusCode::CREATED,
                Json(VerifyResponse {
                    message: message.to_string(),
                    transaction_id: write.transaction.id,
                    amount: agreed.amount,
                    created: write.created,
                }),
            ))
        }
    }
}

/// Reconciliation request errors
#[derive(Debug)]
pub enum VerifyError {
    MissingFiles,
    Multipart(String),
    Detection(DetectError),
    Incomplete {
        image1: Vec<&'static str>,
        image2: Vec<&'static str>,
    },
    Mismatch(Box<MismatchReport>),
    Store(shamba_common::Error),
}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            VerifyError::MissingFiles => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Both files (file1 and file2) must be provided" }),
            ),
            VerifyError::Multipart(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Failed to read file: {message}") }),
            ),
            VerifyError::Detection(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Failed to process image: {e}") }),
            ),
            VerifyError::Incomplete { image1, image2 } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Could not extract all required fields from both images",
                    "image1_missing": image1,
                    "image2_missing": image2,
                }),
            ),
            VerifyError::Mismatch(report) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "The amounts, dates, or unique codes do not match",
                    "amount1": report.amount1,
                    "amount2": report.amount2,
                    "date1": report.date1,
                    "date2": report.date2,
                    "code1": report.code1,
                    "code2": report.code2,
                }),
            ),
            VerifyError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("Failed to save transaction: {e}") }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
