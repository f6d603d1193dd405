//! Canonicalization of extracted payment fields
//!
//! Raw extractions are strings in whatever shape the receipt printed them.
//! Normalization turns them into comparable values: a minor-unit amount, a
//! calendar date, and a validated payment code. Rejection of any one field
//! rejects the whole set for that image - a partially-normalized image never
//! reaches reconciliation.

use crate::extract::RawExtraction;
use chrono::NaiveDate;
use shamba_common::Amount;
use std::fmt;

/// Date source formats, attempted in this fixed priority order.
///
/// Two-digit years first (chrono maps %y 00-68 into the 2000s); a four-digit
/// date fails the first format outright because of the trailing unparsed
/// digits, so the order cannot misread one form as the other.
pub const DATE_FORMATS: [&str; 2] = ["%d/%m/%y", "%d/%m/%Y"];

const CODE_LEN: usize = 10;

/// Canonical field values for one image, ready for comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFields {
    pub amount: Amount,
    pub date: NaiveDate,
    pub code: String,
}

/// All-or-nothing rejection naming every field that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeRejection {
    pub fields: Vec<&'static str>,
}

impl fmt::Display for NormalizeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unextractable fields: {}", self.fields.join(", "))
    }
}

/// Normalize one image's extraction, or reject it naming the bad fields.
///
/// A field that is absent or unparseable counts as unextractable; there is
/// no defaulting.
pub fn normalize(raw: &RawExtraction) -> Result<NormalizedFields, NormalizeRejection> {
    let amount = raw.amount.as_deref().and_then(normalize_amount);
    let date = raw.date.as_deref().and_then(normalize_date);
    let code = raw.code.as_deref().and_then(normalize_code);

    match (amount, date, code) {
        (Some(amount), Some(date), Some(code)) => Ok(NormalizedFields { amount, date, code }),
        (amount, date, code) => {
            let mut fields = Vec::new();
            if amount.is_none() {
                fields.push("amount");
            }
            if date.is_none() {
                fields.push("date");
            }
            if code.is_none() {
                fields.push("code");
            }
            Err(NormalizeRejection { fields })
        }
    }
}

fn normalize_amount(raw: &str) -> Option<Amount> {
    Amount::parse(raw).ok()
}

/// First date format (in priority order) that parses wins
fn normalize_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Codes arrive pre-shaped from extraction; re-validate anyway
fn normalize_code(raw: &str) -> Option<String> {
    let valid = raw.len() == CODE_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    valid.then(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(amount: &str, date: &str, code: &str) -> RawExtraction {
        RawExtraction {
            amount: Some(amount.to_string()),
            date: Some(date.to_string()),
            code: Some(code.to_string()),
        }
    }

    #[test]
    fn thousands_separators_do_not_change_the_value() {
        let a = normalize(&raw("1,200.50", "5/6/24", "AB12345678")).unwrap();
        let b = normalize(&raw("1200.50", "5/6/24", "AB12345678")).unwrap();
        assert_eq!(a.amount, b.amount);
        assert_eq!(a.amount.minor_units(), 120050);
    }

    #[test]
    fn two_and_four_digit_years_normalize_equal() {
        let short = normalize(&raw("100.00", "5/6/24", "AB12345678")).unwrap();
        let long = normalize(&raw("100.00", "5/6/2024", "AB12345678")).unwrap();
        assert_eq!(short.date, long.date);
        assert_eq!(short.date, NaiveDate::from_ymd_opt(2024, 6, 5).unwrap());
    }

    #[test]
    fn date_is_day_month_year() {
        let fields = normalize(&raw("100.00", "1/2/24", "AB12345678")).unwrap();
        // 1 February, not 2 January
        assert_eq!(fields.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn invalid_calendar_date_is_rejected() {
        let rejection = normalize(&raw("100.00", "32/13/24", "AB12345678")).unwrap_err();
        assert_eq!(rejection.fields, vec!["date"]);
    }

    #[test]
    fn bad_amount_rejects_the_whole_set() {
        let rejection = normalize(&raw("12.345", "5/6/24", "AB12345678")).unwrap_err();
        assert_eq!(rejection.fields, vec!["amount"]);
    }

    #[test]
    fn code_shape_is_revalidated() {
        let rejection = normalize(&raw("100.00", "5/6/24", "ab12345678")).unwrap_err();
        assert_eq!(rejection.fields, vec!["code"]);

        let rejection = normalize(&raw("100.00", "5/6/24", "AB1234567")).unwrap_err();
        assert_eq!(rejection.fields, vec!["code"]);
    }

    #[test]
    fn missing_fields_are_all_named() {
        let rejection = normalize(&RawExtraction::default()).unwrap_err();
        assert_eq!(rejection.fields, vec!["amount", "date", "code"]);
    }
}
