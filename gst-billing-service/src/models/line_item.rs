//! Line item model for gst-billing-service.

use crate::error::InvoiceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A numeric form field as submitted: the browser sends either a JSON number
/// or a string such as `"2.00"`.
///
/// The raw text is kept so the ledger stores what the client sent; it is only
/// turned into a [`Decimal`] when a calculation needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(serde_json::Number),
    Text(String),
}

impl NumericField {
    pub fn to_decimal(&self, field: &'static str) -> Result<Decimal, InvoiceError> {
        let raw = self.to_string();
        let trimmed = raw.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| InvoiceError::not_a_number(field, raw.as_str()))
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericField::Number(n) => write!(f, "{}", n),
            NumericField::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for NumericField {
    fn from(s: &str) -> Self {
        NumericField::Text(s.to_string())
    }
}

impl NumericField {
    pub fn integer(n: i64) -> Self {
        NumericField::Number(n.into())
    }
}

/// One billed line. `total` is whatever the client computed; it is stored and
/// summed as-is, never recomputed from `qty × rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub desc: String,
    pub hsn: String,
    pub qty: NumericField,
    pub rate: NumericField,
    pub gst: NumericField,
    pub total: NumericField,
}
