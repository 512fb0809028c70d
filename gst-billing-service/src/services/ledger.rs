//! The ledger workbook: one row per saved invoice.
//!
//! Every append reloads the workbook, adds a row after the last used one and
//! atomically replaces the file. Anything else in the workbook is left as it
//! was. A single writer task performs all appends,
//! so concurrent requests queue up instead of overwriting each other's rows.

use crate::error::InvoiceError;
use crate::models::{CustomerDetails, InvoiceTotals, LedgerRow};
use crate::services::workbook::{CellValue, SheetValues, Workbook};
use anyhow::Context;
use metrics::counter;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Column order of a ledger row. Also written as the header row of a new ledger.
pub const LEDGER_COLUMNS: [&str; 14] = [
    "inv_num",
    "inv_date",
    "order_num",
    "order_date",
    "bill_type",
    "cust_name",
    "cust_addr",
    "cust_phone",
    "cust_gstin",
    "cust_state",
    "items",
    "total_invoice_amount",
    "total_cgst_amount",
    "total_sgst_amount",
];

const TOTAL_INVOICE_AMOUNT_COLUMN: usize = 11;

const DEFAULT_SHEET_NAME: &str = "Invoices";

struct AppendJob {
    row: LedgerRow,
    reply: oneshot::Sender<Result<u32, InvoiceError>>,
}

/// Handle to the ledger writer task. Cheap to clone.
#[derive(Clone)]
pub struct LedgerWriter {
    path: Arc<PathBuf>,
    job_tx: mpsc::Sender<AppendJob>,
}

impl LedgerWriter {
    /// Create the ledger if it does not exist yet and start the writer task.
    pub async fn start(path: impl Into<PathBuf>, queue_capacity: usize) -> Result<Self, InvoiceError> {
        let path = Arc::new(path.into());

        let create_path = path.clone();
        let created = tokio::task::spawn_blocking(move || create_if_missing(&create_path))
            .await
            .map_err(|e| InvoiceError::Persistence(anyhow::anyhow!("ledger setup task failed: {}", e)))?
            .map_err(InvoiceError::Persistence)?;
        if created {
            tracing::warn!(path = %path.display(), "Ledger not found, created a new one");
        }

        let (job_tx, job_rx) = mpsc::channel(queue_capacity.max(1));
        tokio::spawn(run_writer(path.to_path_buf(), job_rx));

        tracing::info!(path = %path.display(), "Ledger writer started");

        Ok(Self { path, job_tx })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one invoice. Resolves once the row is on disk, with the
    /// 1-based sheet row it landed on.
    pub async fn append(&self, row: LedgerRow) -> Result<u32, InvoiceError> {
        let (reply, response) = oneshot::channel();
        self.job_tx
            .send(AppendJob { row, reply })
            .await
            .map_err(|_| InvoiceError::Persistence(anyhow::anyhow!("ledger writer is not running")))?;

        response
            .await
            .map_err(|_| InvoiceError::Persistence(anyhow::anyhow!("ledger writer dropped the append")))?
    }

    /// Every invoice row in sheet order. Rows whose invoice amount is not a
    /// number (the header row, notes typed into the sheet) are skipped.
    pub async fn rows(&self) -> Result<Vec<LedgerRow>, InvoiceError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_rows(&path))
            .await
            .map_err(|e| InvoiceError::Persistence(anyhow::anyhow!("ledger read task failed: {}", e)))?
            .map_err(InvoiceError::Persistence)
    }
}

async fn run_writer(path: PathBuf, mut job_rx: mpsc::Receiver<AppendJob>) {
    while let Some(AppendJob { row, reply }) = job_rx.recv().await {
        let inv_num = row.details.inv_num.clone();
        let job_path = path.clone();

        let result = match tokio::task::spawn_blocking(move || append_row(&job_path, &row)).await {
            Ok(Ok(sheet_row)) => {
                counter!("ledger_rows_appended_total").increment(1);
                tracing::info!(inv_num = %inv_num, row = sheet_row, "Ledger row appended");
                Ok(sheet_row)
            }
            Ok(Err(e)) => {
                tracing::error!(inv_num = %inv_num, error = %format!("{:#}", e), "Ledger append failed");
                Err(InvoiceError::Persistence(e))
            }
            Err(e) => Err(InvoiceError::Persistence(anyhow::anyhow!(
                "ledger append task failed: {}",
                e
            ))),
        };

        // The requester may have gone away; the row is written either way.
        let _ = reply.send(result);
    }

    tracing::info!("Ledger writer stopped");
}

fn create_if_missing(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
    }

    let mut workbook = Workbook::new(DEFAULT_SHEET_NAME)?;
    workbook.write_row(0, LEDGER_COLUMNS.iter().map(|c| CellValue::from(*c)))?;
    workbook.save_atomic(path)?;
    Ok(true)
}

fn append_row(path: &Path, row: &LedgerRow) -> anyhow::Result<u32> {
    if !path.exists() {
        anyhow::bail!("ledger file {:?} not found", path);
    }

    let mut workbook = Workbook::open(path)?;
    let next = workbook.next_free_row()?;
    workbook.write_row(next, to_cells(row)?)?;
    workbook.save_atomic(path)?;

    Ok(next + 1)
}

fn read_rows(path: &Path) -> anyhow::Result<Vec<LedgerRow>> {
    Ok(SheetValues::read_first(path)?
        .rows()
        .into_iter()
        .filter_map(|(_, cells)| from_cells(&cells))
        .collect())
}

fn to_cells(row: &LedgerRow) -> anyhow::Result<Vec<CellValue>> {
    let d = &row.details;
    let mut cells: Vec<CellValue> = [
        &d.inv_num,
        &d.inv_date,
        &d.order_num,
        &d.order_date,
        &d.bill_type,
        &d.cust_name,
        &d.cust_addr,
        &d.cust_phone,
        &d.cust_gstin,
        &d.cust_state,
        &row.items,
    ]
    .into_iter()
    .map(|s| CellValue::from(s.as_str()))
    .collect();

    for total in [
        row.totals.total_invoice_amount,
        row.totals.total_cgst_amount,
        row.totals.total_sgst_amount,
    ] {
        let n = total
            .to_f64()
            .with_context(|| format!("total {} does not fit a spreadsheet number", total))?;
        cells.push(CellValue::Number(n));
    }

    Ok(cells)
}

fn from_cells(cells: &[Option<CellValue>]) -> Option<LedgerRow> {
    let text = |i: usize| {
        cells
            .get(i)
            .and_then(|c| c.as_ref())
            .map(CellValue::to_text)
            .unwrap_or_default()
    };
    let amount = |i: usize| {
        cells
            .get(i)
            .and_then(|c| c.as_ref())
            .and_then(CellValue::as_number)
            .and_then(Decimal::from_f64)
    };

    let total_invoice_amount = amount(TOTAL_INVOICE_AMOUNT_COLUMN)?;

    Some(LedgerRow {
        details: CustomerDetails {
            inv_num: text(0),
            inv_date: text(1),
            order_num: text(2),
            order_date: text(3),
            bill_type: text(4),
            cust_name: text(5),
            cust_addr: text(6),
            cust_phone: text(7),
            cust_gstin: text(8),
            cust_state: text(9),
        },
        items: text(10),
        totals: InvoiceTotals {
            total_invoice_amount,
            total_cgst_amount: amount(12).unwrap_or_default(),
            total_sgst_amount: amount(13).unwrap_or_default(),
        },
    })
}
