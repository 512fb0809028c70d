//! Ledger row model for gst-billing-service.
//!
//! A ledger row is the invoice header flattened into columns, with every line
//! item packed into one cell: fields joined by `,`, items joined by `|`.
//! Nothing is escaped, so a description containing either separator does not
//! survive a round trip.

use super::{CustomerDetails, InvoiceHeader, InvoiceTotals, LineItem, NumericField};
use crate::error::InvoiceError;
use serde::{Deserialize, Serialize};

pub const ITEM_FIELD_SEPARATOR: &str = ",";
pub const ITEM_SEPARATOR: &str = "|";

const FIELDS_PER_ITEM: usize = 6;

/// One invoice as stored in the ledger workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(flatten)]
    pub details: CustomerDetails,
    pub items: String,
    #[serde(flatten)]
    pub totals: InvoiceTotals,
}

impl LedgerRow {
    pub fn new(header: &InvoiceHeader, items: &[LineItem]) -> Self {
        Self {
            details: header.details.clone(),
            items: encode_items(items),
            totals: header.totals,
        }
    }

    pub fn decoded_items(&self) -> Result<Vec<LineItem>, InvoiceError> {
        decode_items(&self.items)
    }
}

/// `desc,hsn,qty,rate,gst,total|desc,hsn,...`, each field in its submitted text form.
pub fn encode_items(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|item| {
            [
                item.desc.clone(),
                item.hsn.clone(),
                item.qty.to_string(),
                item.rate.to_string(),
                item.gst.to_string(),
                item.total.to_string(),
            ]
            .join(ITEM_FIELD_SEPARATOR)
        })
        .collect::<Vec<_>>()
        .join(ITEM_SEPARATOR)
}

/// Inverse of [`encode_items`]. Numeric fields come back as text.
pub fn decode_items(encoded: &str) -> Result<Vec<LineItem>, InvoiceError> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    encoded
        .split(ITEM_SEPARATOR)
        .enumerate()
        .map(|(index, chunk)| {
            let fields: Vec<&str> = chunk.split(ITEM_FIELD_SEPARATOR).collect();
            match fields.as_slice() {
                [desc, hsn, qty, rate, gst, total] => Ok(LineItem {
                    desc: desc.to_string(),
                    hsn: hsn.to_string(),
                    qty: NumericField::from(*qty),
                    rate: NumericField::from(*rate),
                    gst: NumericField::from(*gst),
                    total: NumericField::from(*total),
                }),
                _ => Err(InvoiceError::Persistence(anyhow::anyhow!(
                    "item {} has {} fields, expected {}: '{}'",
                    index + 1,
                    fields.len(),
                    FIELDS_PER_ITEM,
                    chunk
                ))),
            }
        })
        .collect()
}
