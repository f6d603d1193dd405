//! Database models

use crate::money::Amount;
use chrono::NaiveDate;
use sqlx::FromRow;

/// A land-sale payment transaction, the system of record for one payment
/// event.
///
/// Two creation paths populate different subsets: OCR reconciliation writes
/// the minimal amount/date/code subset, while the richer creation endpoint
/// supplies buyer, seller, lawyer and proof-image details. Only amount and
/// date are mandatory; the `(amount_minor, paid_on)` pair is the
/// reconciliation dedup key.
#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub buyer: Option<String>,
    pub seller: Option<String>,
    /// Minor-unit amount (cents); never negative.
    pub amount_minor: i64,
    pub paid_on: NaiveDate,
    /// 10-character uppercase-alphanumeric payment code.
    pub unique_code: Option<String>,
    /// `pending` or `complete`.
    pub status: String,
    /// Proof-of-payment image reference, relative to the media root.
    pub proof_of_payment: Option<String>,
    pub lawyer_details: Option<String>,
    pub seller_details: Option<String>,
    /// Transitions only false -> true; never reverted.
    pub is_verified: bool,
    pub smart_contract_address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Transaction {
    pub fn amount(&self) -> Amount {
        // amount_minor is constrained non-negative by the schema
        Amount::from_minor(self.amount_minor).unwrap_or(Amount::ZERO)
    }
}
