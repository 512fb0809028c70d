pub mod ledger;
pub mod metrics;
pub mod tax;
pub mod template;
pub mod words;
pub mod workbook;

pub use ledger::{LedgerWriter, LEDGER_COLUMNS};
pub use self::metrics::{get_metrics, init_metrics};
pub use tax::{compute_totals, line_tax, LineTax};
pub use template::{output_file_name, FilledInvoice, TemplateFiller, XLSX_CONTENT_TYPE};
pub use words::amount_in_words;
pub use workbook::{CellRef, CellValue, SheetValues, Workbook};
