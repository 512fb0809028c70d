pub mod health;
pub mod invoices;

pub use health::{health_check, metrics_endpoint};
pub use invoices::{get_invoice, list_invoices, save_invoice};
