//! GST arithmetic for invoice lines.
//!
//! GST is split evenly into a central (CGST) and a state (SGST) half, each
//! applied to the line's base cost `qty × rate`.

use crate::error::InvoiceError;
use crate::models::{InvoiceTotals, LineItem};
use rust_decimal::Decimal;

/// Per-line figures printed in the item table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineTax {
    pub quantity: Decimal,
    pub rate: Decimal,
    pub base_cost: Decimal,
    pub cgst_percent: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_percent: Decimal,
    pub sgst_amount: Decimal,
    /// The client-supplied line total.
    pub total: Decimal,
}

pub fn line_tax(item: &LineItem) -> Result<LineTax, InvoiceError> {
    let quantity = item.qty.to_decimal("qty")?;
    let rate = item.rate.to_decimal("rate")?;
    let gst_percent = item.gst.to_decimal("gst")?;
    let total = item.total.to_decimal("total")?;

    let base_cost = quantity.checked_mul(rate).ok_or_else(|| {
        InvoiceError::out_of_range("qty × rate", format!("{} × {}", quantity, rate))
    })?;
    let half_percent = gst_percent / Decimal::TWO;
    let half_amount = base_cost
        .checked_mul(half_percent)
        .map(|v| v / Decimal::ONE_HUNDRED)
        .ok_or_else(|| InvoiceError::out_of_range("gst", item.gst.to_string()))?;

    Ok(LineTax {
        quantity,
        rate,
        base_cost,
        cgst_percent: half_percent,
        cgst_amount: half_amount,
        sgst_percent: half_percent,
        sgst_amount: half_amount,
        total,
    })
}

/// Sum the invoice.
///
/// `total_invoice_amount` is the sum of the submitted line totals, not of
/// anything derived from `qty × rate`. Negative values are accepted.
pub fn compute_totals(items: &[LineItem]) -> Result<InvoiceTotals, InvoiceError> {
    let mut totals = InvoiceTotals::default();

    for item in items {
        let tax = line_tax(item)?;
        totals.total_invoice_amount = add(totals.total_invoice_amount, tax.total, "total")?;
        totals.total_cgst_amount = add(totals.total_cgst_amount, tax.cgst_amount, "cgst")?;
        totals.total_sgst_amount = add(totals.total_sgst_amount, tax.sgst_amount, "sgst")?;
    }

    Ok(totals)
}

fn add(acc: Decimal, value: Decimal, field: &'static str) -> Result<Decimal, InvoiceError> {
    acc.checked_add(value)
        .ok_or_else(|| InvoiceError::out_of_range(field, value.to_string()))
}
