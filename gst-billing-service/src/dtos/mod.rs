pub mod invoice;

pub use invoice::{CustomerDetailsDto, LedgerEntryResponse, LineItemDto, SaveInvoiceRequest};
