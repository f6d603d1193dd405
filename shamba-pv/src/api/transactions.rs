//! Transaction resource endpoints
//!
//! The richer creation path: callers supply full buyer/seller/lawyer and
//! proof-image details up front, and the record starts unverified until the
//! payment-verification flow confirms it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shamba_common::db::{transactions, Transaction};
use shamba_common::Amount;

use crate::AppState;

/// Transaction creation request body
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub buyer: String,
    pub seller: String,
    pub amount: Amount,
    pub date: NaiveDate,
    #[serde(default)]
    pub proof_of_payment: Option<String>,
    #[serde(default)]
    pub lawyer_details: Option<String>,
    #[serde(default)]
    pub seller_details: Option<String>,
    #[serde(default)]
    pub smart_contract_address: Option<String>,
}

/// Transaction resource representation
#[derive(Debug, Serialize)]
pub struct TransactionBody {
    pub id: i64,
    pub buyer: Option<String>,
    pub seller: Option<String>,
    pub amount: Amount,
    pub date: NaiveDate,
    pub unique_code: Option<String>,
    pub status: String,
    pub proof_of_payment: Option<String>,
    pub lawyer_details: Option<String>,
    pub seller_details: Option<String>,
    pub is_verified: bool,
    pub smart_contract_address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Transaction> for TransactionBody {
    fn from(transaction: Transaction) -> Self {
        let amount = transaction.amount();
        Self {
            id: transaction.id,
            buyer: transaction.buyer,
            seller: transaction.seller,
            amount,
            date: transaction.paid_on,
            unique_code: transaction.unique_code,
            status: transaction.status,
            proof_of_payment: transaction.proof_of_payment,
            lawyer_details: transaction.lawyer_details,
            seller_details: transaction.seller_details,
            is_verified: transaction.is_verified,
            smart_contract_address: transaction.smart_contract_address,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}

/// POST /api/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionBody>), TransactionError> {
    let created = transactions::create(
        &state.db,
        transactions::NewTransaction {
            buyer: request.buyer,
            seller: request.seller,
            amount: request.amount,
            paid_on: request.date,
            proof_of_payment: request.proof_of_payment,
            lawyer_details: request.lawyer_details,
            seller_details: request.seller_details,
            smart_contract_address: request.smart_contract_address,
        },
    )
    .await
    .map_err(TransactionError::from_store)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /api/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<TransactionBody>>, TransactionError> {
    let all = transactions::list(&state.db)
        .await
        .map_err(TransactionError::from_store)?;

    Ok(Json(all.into_iter().map(TransactionBody::from).collect()))
}

/// GET /api/transactions/:id
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TransactionBody>, TransactionError> {
    let transaction = transactions::get(&state.db, id)
        .await
        .map_err(TransactionError::from_store)?
        .ok_or(TransactionError::NotFound(id))?;

    Ok(Json(transaction.into()))
}

/// Transaction resource errors
#[derive(Debug)]
pub enum TransactionError {
    NotFound(i64),
    Conflict(String),
    Store(String),
}

impl TransactionError {
    /// A unique-constraint violation means the payment event already has a
    /// record; surface that as a conflict rather than a server fault.
    fn from_store(e: shamba_common::Error) -> Self {
        match &e {
            shamba_common::Error::Database(sqlx::Error::Database(db))
                if db.is_unique_violation() =>
            {
                TransactionError::Conflict(
                    "A transaction with this amount and date already exists".to_string(),
                )
            }
            _ => TransactionError::Store(e.to_string()),
        }
    }
}

impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            TransactionError::NotFound(id) => {
                (StatusCode::NOT_FOUND, format!("No transaction with id {id}"))
            }
            TransactionError::Conflict(message) => (StatusCode::CONFLICT, message),
            TransactionError::Store(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
