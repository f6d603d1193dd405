//! Structured field extraction from detected receipt text
//!
//! Mobile-money receipts arrive as unstructured OCR text. Each field kind
//! (amount, date, payment code) has an ordered list of patterns; the first
//! pattern that matches anywhere in the text wins for that field, and later
//! patterns for the same field are not consulted. A field no pattern matches
//! is simply absent - absence is reported, never invented.

use regex::Regex;

/// Raw field strings pulled out of one image's detected text.
///
/// Values are exactly as captured; normalization happens separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtraction {
    pub amount: Option<String>,
    pub date: Option<String>,
    pub code: Option<String>,
}

impl RawExtraction {
    /// Names of required fields that no pattern matched
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        if self.code.is_none() {
            missing.push("code");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.amount.is_some() && self.date.is_some() && self.code.is_some()
    }
}

/// Compiled extraction rules, built once at startup and shared
pub struct FieldExtractor {
    amount_rules: Vec<Regex>,
    date_rules: Vec<Regex>,
    code_rules: Vec<Regex>,
}

impl FieldExtractor {
    pub fn new() -> Self {
        // Amounts are currency-prefixed with exactly two fractional digits
        // and optional thousands commas. "Ksh" before "KES": receipts from
        // the dominant mobile-money provider print the former.
        let amount_rules = compile(&[r"Ksh\s*([\d,]+\.\d{2})", r"KES\s*([\d,]+\.\d{2})"]);

        // "on D/M/YY" before bare "D/M/YYYY". The trailing \b keeps the
        // two-digit-year rule from truncating a four-digit year to its first
        // two digits, so "on 1/2/2024" falls through to the second rule.
        let date_rules = compile(&[
            r"on\s*(\d{1,2}/\d{1,2}/\d{2})\b",
            r"(\d{1,2}/\d{1,2}/\d{4})",
        ]);

        // Payment codes are standalone 10-character uppercase-alphanumeric
        // tokens.
        let code_rules = compile(&[r"\b([A-Z0-9]{10})\b"]);

        Self {
            amount_rules,
            date_rules,
            code_rules,
        }
    }

    /// Extract whatever fields the rules find in `text`.
    ///
    /// Pure function of the text; an empty input yields an empty extraction,
    /// not an error.
    pub fn extract(&self, text: &str) -> RawExtraction {
        RawExtraction {
            amount: first_match(&self.amount_rules, text),
            date: first_match(&self.date_rules, text),
            code: first_match(&self.code_rules, text),
        }
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("invalid extraction pattern"))
        .collect()
}

/// First rule (in list order) that matches anywhere wins for the field
fn first_match(rules: &[Regex], text: &str) -> Option<String> {
    rules
        .iter()
        .find_map(|rule| rule.captures(text))
        .map(|captures| captures[1].to_string())
}
