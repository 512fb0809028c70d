//! Where the invoice template expects each value.
//!
//! The layout is a plain mapping table so a different template only needs a
//! different layout file, e.g.
//!
//! ```toml
//! item_start_row = 22
//!
//! [cells]
//! inv_num = "G3"
//!
//! [item_columns]
//! total = "L"
//! ```
//!
//! Entries missing from a layout file keep their defaults.

use crate::services::workbook::{parse_column, CellRef};
use config::{Config as Cfg, File};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::BTreeMap;

/// Header and total values placed at a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    InvNum,
    InvDate,
    OrderNum,
    OrderDate,
    BillType,
    CustName,
    CustAddr,
    CustPhone,
    CustGstin,
    CustState,
    TotalInvoiceAmount,
    TotalCgstAmount,
    TotalSgstAmount,
    AmountInWords,
}

impl HeaderField {
    pub const ALL: [HeaderField; 14] = [
        HeaderField::InvNum,
        HeaderField::InvDate,
        HeaderField::OrderNum,
        HeaderField::OrderDate,
        HeaderField::BillType,
        HeaderField::CustName,
        HeaderField::CustAddr,
        HeaderField::CustPhone,
        HeaderField::CustGstin,
        HeaderField::CustState,
        HeaderField::TotalInvoiceAmount,
        HeaderField::TotalCgstAmount,
        HeaderField::TotalSgstAmount,
        HeaderField::AmountInWords,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HeaderField::InvNum => "inv_num",
            HeaderField::InvDate => "inv_date",
            HeaderField::OrderNum => "order_num",
            HeaderField::OrderDate => "order_date",
            HeaderField::BillType => "bill_type",
            HeaderField::CustName => "cust_name",
            HeaderField::CustAddr => "cust_addr",
            HeaderField::CustPhone => "cust_phone",
            HeaderField::CustGstin => "cust_gstin",
            HeaderField::CustState => "cust_state",
            HeaderField::TotalInvoiceAmount => "total_invoice_amount",
            HeaderField::TotalCgstAmount => "total_cgst_amount",
            HeaderField::TotalSgstAmount => "total_sgst_amount",
            HeaderField::AmountInWords => "amount_in_words",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

/// Columns of the item table, one row per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemColumn {
    SerialNo,
    Description,
    Hsn,
    Quantity,
    Rate,
    CgstPercent,
    CgstAmount,
    SgstPercent,
    SgstAmount,
    Total,
}

impl ItemColumn {
    pub const ALL: [ItemColumn; 10] = [
        ItemColumn::SerialNo,
        ItemColumn::Description,
        ItemColumn::Hsn,
        ItemColumn::Quantity,
        ItemColumn::Rate,
        ItemColumn::CgstPercent,
        ItemColumn::CgstAmount,
        ItemColumn::SgstPercent,
        ItemColumn::SgstAmount,
        ItemColumn::Total,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemColumn::SerialNo => "serial_no",
            ItemColumn::Description => "description",
            ItemColumn::Hsn => "hsn",
            ItemColumn::Quantity => "quantity",
            ItemColumn::Rate => "rate",
            ItemColumn::CgstPercent => "cgst_percent",
            ItemColumn::CgstAmount => "cgst_amount",
            ItemColumn::SgstPercent => "sgst_percent",
            ItemColumn::SgstAmount => "sgst_amount",
            ItemColumn::Total => "total",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    /// Header field name → A1 cell.
    pub cells: BTreeMap<String, String>,
    /// 1-based sheet row of the first item.
    pub item_start_row: u32,
    /// Item column name → column letters.
    pub item_columns: BTreeMap<String, String>,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        let cells = [
            (HeaderField::CustName, "A10"),
            (HeaderField::CustAddr, "A11"),
            (HeaderField::CustPhone, "A12"),
            (HeaderField::InvNum, "H2"),
            (HeaderField::InvDate, "K2"),
            (HeaderField::OrderNum, "J5"),
            (HeaderField::OrderDate, "J6"),
            (HeaderField::CustGstin, "J13"),
            (HeaderField::CustState, "J14"),
            (HeaderField::BillType, "I4"),
            (HeaderField::TotalInvoiceAmount, "L36"),
            (HeaderField::TotalCgstAmount, "C38"),
            (HeaderField::TotalSgstAmount, "C39"),
            (HeaderField::AmountInWords, "A44"),
        ];
        let item_columns = [
            (ItemColumn::SerialNo, "A"),
            (ItemColumn::Description, "B"),
            (ItemColumn::Hsn, "C"),
            (ItemColumn::Quantity, "D"),
            (ItemColumn::Rate, "E"),
            (ItemColumn::CgstPercent, "G"),
            (ItemColumn::CgstAmount, "H"),
            (ItemColumn::SgstPercent, "I"),
            (ItemColumn::SgstAmount, "J"),
            (ItemColumn::Total, "K"),
        ];

        Self {
            cells: cells
                .into_iter()
                .map(|(f, c)| (f.as_str().to_string(), c.to_string()))
                .collect(),
            item_start_row: 20,
            item_columns: item_columns
                .into_iter()
                .map(|(f, c)| (f.as_str().to_string(), c.to_string()))
                .collect(),
        }
    }
}

/// A layout with every name and coordinate checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub cells: Vec<(HeaderField, CellRef)>,
    /// Zero-based.
    pub item_start_row: u32,
    pub item_columns: Vec<(ItemColumn, u16)>,
}

impl ResolvedLayout {
    /// Cell for `column` of the `index`-th item (zero-based).
    pub fn item_cell(&self, index: usize, col: u16) -> CellRef {
        CellRef::new(self.item_start_row + index as u32, col)
    }
}

impl TemplateLayout {
    /// Defaults overlaid with the layout file at `path` (any format the
    /// `config` crate understands).
    pub fn load(path: &str) -> Result<Self, AppError> {
        let layout = Cfg::builder()
            .add_source(Cfg::try_from(&TemplateLayout::default())?)
            .add_source(File::with_name(path))
            .build()?;

        Ok(layout.try_deserialize()?)
    }

    /// Check every entry, reporting all problems at once.
    pub fn resolve(&self) -> anyhow::Result<ResolvedLayout> {
        let mut problems = Vec::new();

        let mut cells = Vec::with_capacity(self.cells.len());
        for (name, coordinate) in &self.cells {
            match (HeaderField::from_name(name), coordinate.parse::<CellRef>()) {
                (Some(field), Ok(cell)) => cells.push((field, cell)),
                (None, _) => problems.push(format!("unknown cell field '{}'", name)),
                (_, Err(e)) => problems.push(format!("{}: {}", name, e)),
            }
        }

        let mut item_columns = Vec::with_capacity(self.item_columns.len());
        for (name, letters) in &self.item_columns {
            match (ItemColumn::from_name(name), parse_column(letters.trim())) {
                (Some(column), Ok(col)) => item_columns.push((column, col)),
                (None, _) => problems.push(format!("unknown item column '{}'", name)),
                (_, Err(_)) => problems.push(format!(
                    "{}: '{}' is not a valid column",
                    name, letters
                )),
            }
        }

        if self.item_start_row == 0 {
            problems.push("item_start_row must be 1 or greater".to_string());
        }

        if !problems.is_empty() {
            anyhow::bail!("invalid template layout: {}", problems.join("; "));
        }

        Ok(ResolvedLayout {
            cells,
            item_start_row: self.item_start_row - 1,
            item_columns,
        })
    }
}
