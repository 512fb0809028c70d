#![allow(dead_code)]

use calamine::{open_workbook_auto, Data, Range, Reader};
use gst_billing_service::config::{BillingConfig, LedgerConfig, StorageConfig, TemplateLayout};
use gst_billing_service::startup::Application;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub ledger_path: PathBuf,
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    // Dropped last; removes every file the test produced.
    pub dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let template_path = dir.path().join("template.xlsx");
        write_template(&template_path);

        let static_dir = dir.path().join("static");
        std::fs::create_dir_all(&static_dir).expect("Failed to create static dir");
        std::fs::write(
            static_dir.join("index.html"),
            "<html><body>GST Invoice</body></html>",
        )
        .expect("Failed to write index page");

        let ledger_path = dir.path().join("invoices_db.xlsx");
        let output_dir = dir.path().join("out");

        let config = BillingConfig {
            common: CoreConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port for testing
                ..CoreConfig::default()
            },
            storage: StorageConfig {
                ledger_path: ledger_path.clone(),
                template_path: template_path.clone(),
                output_dir: output_dir.clone(),
                static_dir,
            },
            ledger: LedgerConfig { queue_capacity: 8 },
            layout: TemplateLayout::default(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            client: reqwest::Client::new(),
            ledger_path,
            template_path,
            output_dir,
            dir,
        }
    }

    pub async fn post_invoice(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/save_invoice", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn list_invoices(&self) -> Vec<Value> {
        let response = self
            .client
            .get(format!("{}/invoices", self.address))
            .send()
            .await
            .expect("Failed to execute request");
        assert!(response.status().is_success());
        response.json().await.expect("Failed to parse JSON")
    }

    pub fn output_file(&self, inv_num: &str) -> PathBuf {
        self.output_dir.join(format!("Invoice_{}.xlsx", inv_num))
    }

    /// Data rows of the ledger, header row excluded.
    pub fn ledger_rows(&self) -> Vec<Vec<Data>> {
        first_sheet(&self.ledger_path)
            .rows()
            .skip(1)
            .map(|row| row.to_vec())
            .collect()
    }
}

/// A small stand-in for the shop's template: a merged bold title, the item
/// table heading, a taxable value formula on the first item row and a second
/// sheet. All of it must survive filling.
pub fn write_template(path: &Path) {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let invoice = workbook.add_worksheet();
    invoice.set_name("Invoice").unwrap();
    invoice
        .merge_range(0, 0, 0, 5, "TAX INVOICE", &rust_xlsxwriter::Format::new().set_bold())
        .unwrap();
    invoice.write_formula(19, 5, "=D20*E20").unwrap();
    invoice.set_column_width(1, 32).unwrap();
    invoice.write_string(18, 0, "S.No").unwrap();
    invoice.write_string(18, 1, "Description").unwrap();
    invoice.write_string(35, 10, "Grand Total").unwrap();

    let terms = workbook.add_worksheet();
    terms.set_name("Terms").unwrap();
    terms.write_string(0, 0, "Goods once sold will not be taken back").unwrap();

    workbook.save(path).unwrap();
}

pub fn first_sheet(path: &Path) -> Range<Data> {
    let mut workbook = open_workbook_auto(path).expect("Failed to open workbook");
    workbook
        .worksheet_range_at(0)
        .expect("Workbook has no sheets")
        .expect("Failed to read sheet")
}

/// Value at zero-based (row, col), e.g. `cell(&range, 19, 10)` for K20.
pub fn cell(range: &Range<Data>, row: u32, col: u32) -> Data {
    range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
}

pub fn customer_details(inv_num: &str) -> Value {
    json!({
        "inv_num": inv_num,
        "inv_date": "2024-04-01",
        "order_num": "PO-77",
        "order_date": "2024-03-28",
        "bill_type": "Credit",
        "cust_name": "Acme Traders",
        "cust_addr": "12 MG Road, Bengaluru",
        "cust_phone": "9800000000",
        "cust_gstin": "29ABCDE1234F1Z5",
        "cust_state": "Karnataka"
    })
}

pub fn widget() -> Value {
    json!({"desc": "Widget", "hsn": "1234", "qty": 2, "rate": 100, "gst": 18, "total": 236})
}

pub fn invoice(inv_num: &str, items: Vec<Value>) -> Value {
    json!({"customerDetails": customer_details(inv_num), "items": items})
}
