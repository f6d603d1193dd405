//! Idempotent ledger writes for reconciled payments
//!
//! One payment event must produce exactly one transaction record, no matter
//! how many times the same pair of images is submitted or how many identical
//! requests race. The unique index on (amount_minor, paid_on) is the
//! serialization point: INSERT OR IGNORE either claims the key or loses to
//! the row that already holds it, and the loser updates that row instead.

use crate::normalize::NormalizedFields;
use shamba_common::db::{transactions, Transaction};
use shamba_common::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Result of recording an agreed payment: the record, and whether this
/// request created it
#[derive(Debug)]
pub struct LedgerWrite {
    pub transaction: Transaction,
    pub created: bool,
}

/// Find-or-create the transaction record for an agreed field set.
///
/// On create the record is stored complete and verified with the payment
/// code attached. On find, the existing record's completion fields are
/// re-applied; its verification flag is left for the on-chain path to
/// manage. Safe to retry: identical inputs always converge on one row in
/// the same completed state.
pub async fn record_completed_payment(
    pool: &SqlitePool,
    fields: &NormalizedFields,
) -> Result<LedgerWrite> {
    let now = transactions::now_rfc3339();

    let inserted = sqlx::query(
        "INSERT OR IGNORE INTO transactions
            (amount_minor, paid_on, unique_code, status, is_verified,
             created_at, updated_at)
         VALUES (?, ?, ?, 'complete', 1, ?, ?)",
    )
    .bind(fields.amount.minor_units())
    .bind(fields.date)
    .bind(&fields.code)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?
    .rows_affected()
        == 1;

    if !inserted {
        sqlx::query(
            "UPDATE transactions
             SET status = 'complete', unique_code = ?, updated_at = ?
             WHERE amount_minor = ? AND paid_on = ?",
        )
        .bind(&fields.code)
        .bind(&now)
        .bind(fields.amount.minor_units())
        .bind(fields.date)
        .execute(pool)
        .await?;
    }

    let transaction = transactions::find_by_amount_and_date(pool, fields.amount, fields.date)
        .await?
        .ok_or_else(|| {
            shamba_common::Error::Internal(format!(
                "transaction for amount {} on {} vanished after upsert",
                fields.amount, fields.date
            ))
        })?;

    info!(
        transaction_id = transaction.id,
        amount = %fields.amount,
        created = inserted,
        "Recorded reconciled payment"
    );

    Ok(LedgerWrite {
        transaction,
        created: inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shamba_common::Amount;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        shamba_common::db::create_schema(&pool).await.expect("schema");
        pool
    }

    fn agreed_fields() -> NormalizedFields {
        NormalizedFields {
            amount: Amount::parse("5,000.00").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            code: "AB12345678".to_string(),
        }
    }

    #[tokio::test]
    async fn first_write_creates_a_verified_complete_record() {
        let pool = test_pool().await;

        let write = record_completed_payment(&pool, &agreed_fields())
            .await
            .unwrap();

        assert!(write.created);
        assert_eq!(write.transaction.status, "complete");
        assert!(write.transaction.is_verified);
        assert_eq!(
            write.transaction.unique_code.as_deref(),
            Some("AB12345678")
        );
        assert_eq!(write.transaction.amount_minor, 500000);
    }

    #[tokio::test]
    async fn retry_with_identical_fields_is_idempotent() {
        let pool = test_pool().await;

        let first = record_completed_payment(&pool, &agreed_fields())
            .await
            .unwrap();
        let second = record_completed_payment(&pool, &agreed_fields())
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.transaction.id, second.transaction.id);
        assert_eq!(second.transaction.status, "complete");

        let all = transactions::list(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn completes_a_record_created_by_the_richer_path() {
        let pool = test_pool().await;

        let existing = transactions::create(
            &pool,
            transactions::NewTransaction {
                buyer: "Wanjiku Kamau".to_string(),
                seller: "Otieno Ochieng".to_string(),
                amount: Amount::parse("5000.00").unwrap(),
                paid_on: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                proof_of_payment: None,
                lawyer_details: None,
                seller_details: None,
                smart_contract_address: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(existing.status, "pending");

        let write = record_completed_payment(&pool, &agreed_fields())
            .await
            .unwrap();

        assert!(!write.created);
        assert_eq!(write.transaction.id, existing.id);
        assert_eq!(write.transaction.status, "complete");
        // Verification of the richer record stays with the on-chain path
        assert!(!write.transaction.is_verified);
        // Richer fields are preserved
        assert_eq!(write.transaction.buyer.as_deref(), Some("Wanjiku Kamau"));
    }

    #[tokio::test]
    async fn different_dates_create_distinct_records() {
        let pool = test_pool().await;

        record_completed_payment(&pool, &agreed_fields())
            .await
            .unwrap();

        let mut other_day = agreed_fields();
        other_day.date = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
        let write = record_completed_payment(&pool, &other_day).await.unwrap();

        assert!(write.created);
        let all = transactions::list(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
