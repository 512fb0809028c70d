//! Domain models for gst-billing-service.

mod invoice;
mod ledger_row;
mod line_item;

pub use invoice::{CustomerDetails, InvoiceHeader, InvoiceTotals};
pub use ledger_row::{decode_items, encode_items, LedgerRow, ITEM_FIELD_SEPARATOR, ITEM_SEPARATOR};
pub use line_item::{LineItem, NumericField};
