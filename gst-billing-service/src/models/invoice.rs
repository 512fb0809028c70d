//! Invoice header model for gst-billing-service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Header fields exactly as entered on the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub inv_num: String,
    pub inv_date: String,
    pub order_num: String,
    pub order_date: String,
    pub bill_type: String,
    pub cust_name: String,
    pub cust_addr: String,
    pub cust_phone: String,
    pub cust_gstin: String,
    pub cust_state: String,
}

/// Aggregate figures produced by the tax calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub total_invoice_amount: Decimal,
    pub total_cgst_amount: Decimal,
    pub total_sgst_amount: Decimal,
}

/// Everything printed in the invoice header area. Built once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    #[serde(flatten)]
    pub details: CustomerDetails,
    #[serde(flatten)]
    pub totals: InvoiceTotals,
}

impl InvoiceHeader {
    pub fn new(details: CustomerDetails, totals: InvoiceTotals) -> Self {
        Self { details, totals }
    }

    pub fn inv_num(&self) -> &str {
        &self.details.inv_num
    }
}
