//! Transaction record queries

use crate::db::models::Transaction;
use crate::money::Amount;
use crate::Result;
use chrono::{NaiveDate, SecondsFormat, Utc};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, buyer, seller, amount_minor, paid_on, unique_code, status, \
     proof_of_payment, lawyer_details, seller_details, is_verified, \
     smart_contract_address, created_at, updated_at";

/// Current timestamp in the RFC 3339 format stored in the database
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Fetch one transaction by id
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Transaction>> {
    let transaction = sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {COLUMNS} FROM transactions WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(transaction)
}

/// List all transactions, newest first
pub async fn list(pool: &SqlitePool) -> Result<Vec<Transaction>> {
    let transactions = sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {COLUMNS} FROM transactions ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(transactions)
}

/// Look up a transaction by its payment-event key
pub async fn find_by_amount_and_date(
    pool: &SqlitePool,
    amount: Amount,
    paid_on: NaiveDate,
) -> Result<Option<Transaction>> {
    let transaction = sqlx::query_as::<_, Transaction>(&format!(
        "SELECT {COLUMNS} FROM transactions WHERE amount_minor = ? AND paid_on = ?"
    ))
    .bind(amount.minor_units())
    .bind(paid_on)
    .fetch_optional(pool)
    .await?;

    Ok(transaction)
}

/// Fields supplied by the richer (non-OCR) creation path
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub buyer: String,
    pub seller: String,
    pub amount: Amount,
    pub paid_on: NaiveDate,
    pub proof_of_payment: Option<String>,
    pub lawyer_details: Option<String>,
    pub seller_details: Option<String>,
    pub smart_contract_address: Option<String>,
}

/// Insert a full transaction record, not yet verified
pub async fn create(pool: &SqlitePool, new: NewTransaction) -> Result<Transaction> {
    let now = now_rfc3339();
    let id = sqlx::query(
        "INSERT INTO transactions
            (buyer, seller, amount_minor, paid_on, proof_of_payment,
             lawyer_details, seller_details, smart_contract_address,
             status, is_verified, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', 0, ?, ?)",
    )
    .bind(&new.buyer)
    .bind(&new.seller)
    .bind(new.amount.minor_units())
    .bind(new.paid_on)
    .bind(&new.proof_of_payment)
    .bind(&new.lawyer_details)
    .bind(&new.seller_details)
    .bind(&new.smart_contract_address)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?
    .last_insert_rowid();

    let transaction = get(pool, id).await?.ok_or_else(|| {
        crate::Error::Internal(format!("transaction {id} vanished after insert"))
    })?;

    Ok(transaction)
}

/// Flip `is_verified` to true after successful on-chain confirmation.
///
/// The flag only ever transitions false -> true; this never reverts it.
pub async fn mark_verified(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE transactions SET is_verified = 1, updated_at = ? WHERE id = ?")
        .bind(now_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
