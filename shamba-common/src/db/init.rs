//! Database initialization
//!
//! Creates the database file and schema on first run; reopening an existing
//! database is a no-op for the schema (all statements are idempotent).

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize the database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while a verification request writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Bound waiting on the write lock instead of failing immediately
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_transactions_table(pool).await
}

async fn create_transactions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            buyer TEXT,
            seller TEXT,
            amount_minor INTEGER NOT NULL CHECK (amount_minor >= 0),
            paid_on TEXT NOT NULL,
            unique_code TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            proof_of_payment TEXT,
            lawyer_details TEXT,
            seller_details TEXT,
            is_verified INTEGER NOT NULL DEFAULT 0,
            smart_contract_address TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // The reconciliation dedup key: one record per unique payment event.
    // Concurrent identical writes serialize on this constraint.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_transactions_amount_date
         ON transactions (amount_minor, paid_on)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
