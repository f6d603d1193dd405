//! Cross-validation of two independently sourced extractions
//!
//! Both images must agree on amount, calendar date, and payment code before
//! anything is persisted. Matching is exact on all three fields - no fuzzy
//! comparison, since a near-miss here would confirm a payment that did not
//! happen.

use crate::normalize::NormalizedFields;
use chrono::NaiveDate;
use serde::Serialize;
use shamba_common::Amount;

/// Outcome of comparing the two extractions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Full agreement; carries the agreed field set
    Match(NormalizedFields),
    /// Disagreement; carries both value sets for the diagnostic response
    Mismatch(MismatchReport),
}

/// Both compared value sets, reported back to the caller on disagreement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchReport {
    pub amount1: Amount,
    pub amount2: Amount,
    pub date1: NaiveDate,
    pub date2: NaiveDate,
    pub code1: String,
    pub code2: String,
}

/// Compare two normalized extractions field-by-field.
///
/// Match requires amount equality (minor units), calendar-date equality, and
/// exact code equality.
pub fn reconcile(first: NormalizedFields, second: NormalizedFields) -> Reconciliation {
    let agreed = first.amount == second.amount
        && first.date == second.date
        && first.code == second.code;

    if agreed {
        Reconciliation::Match(first)
    } else {
        Reconciliation::Mismatch(MismatchReport {
            amount1: first.amount,
            amount2: second.amount,
            date1: first.date,
            date2: second.date,
            code1: first.code,
            code2: second.code,
        })
    }
}
