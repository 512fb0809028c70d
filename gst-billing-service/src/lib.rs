//! gst-billing-service: GST invoice entry backed by spreadsheet files.
//!
//! A submission flows through the tax calculator, is appended to the ledger
//! workbook and is rendered into the invoice template, which is returned to
//! the browser for download.
pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
