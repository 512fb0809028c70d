//! Renders an invoice into a copy of the template workbook.
//!
//! Only the mapped cells change. Formulas, merged ranges, styles and the other
//! sheets of the template carry over to the generated file.

use crate::config::{HeaderField, ItemColumn, TemplateLayout};
use crate::error::InvoiceError;
use crate::models::{InvoiceHeader, LineItem};
use crate::services::tax::{line_tax, LineTax};
use crate::services::words::amount_in_words;
use crate::services::workbook::{CellValue, Workbook};
use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// `Invoice_<inv_num>.xlsx`. The same number always maps to the same file.
pub fn output_file_name(inv_num: &str) -> String {
    format!("Invoice_{}.xlsx", inv_num)
}

/// A generated invoice file and the exact bytes written to it.
#[derive(Debug, Clone)]
pub struct FilledInvoice {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TemplateFiller {
    template_path: PathBuf,
    output_dir: PathBuf,
    layout: TemplateLayout,
}

impl TemplateFiller {
    pub fn new(
        template_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        layout: TemplateLayout,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            output_dir: output_dir.into(),
            layout,
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Fill the template and save it as `Invoice_<inv_num>.xlsx` in the
    /// output directory, replacing any earlier file for the same number.
    ///
    /// Nothing is written unless every cell could be filled. The returned
    /// bytes are this call's own rendering, even when another fill for the
    /// same number replaces the file right after.
    pub fn fill(
        &self,
        header: &InvoiceHeader,
        items: &[LineItem],
    ) -> Result<FilledInvoice, InvoiceError> {
        let workbook = self.render(header, items)?;

        let path = self.output_dir.join(output_file_name(header.inv_num()));
        let bytes = workbook
            .save_atomic(&path)
            .map_err(InvoiceError::Generation)?;

        tracing::info!(
            inv_num = %header.inv_num(),
            items = items.len(),
            path = %path.display(),
            size = bytes.len(),
            "Invoice file generated"
        );

        Ok(FilledInvoice { path, bytes })
    }

    /// The filled workbook, not yet written anywhere.
    pub fn render(
        &self,
        header: &InvoiceHeader,
        items: &[LineItem],
    ) -> Result<Workbook, InvoiceError> {
        let layout = self.layout.resolve().map_err(InvoiceError::Generation)?;

        let taxes = items
            .iter()
            .map(line_tax)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| InvoiceError::Generation(anyhow::Error::new(e)))?;

        let mut workbook = Workbook::open(&self.template_path)
            .with_context(|| format!("load template {:?}", self.template_path))
            .map_err(InvoiceError::Generation)?;

        for (field, cell) in &layout.cells {
            workbook
                .set(*cell, header_value(*field, header)?)
                .map_err(InvoiceError::Generation)?;
        }

        for (index, (item, tax)) in items.iter().zip(&taxes).enumerate() {
            for (column, col) in &layout.item_columns {
                let value = item_value(*column, index, item, tax)?;
                workbook
                    .set(layout.item_cell(index, *col), value)
                    .map_err(InvoiceError::Generation)?;
            }
        }

        Ok(workbook)
    }
}

fn header_value(field: HeaderField, header: &InvoiceHeader) -> Result<CellValue, InvoiceError> {
    let details = &header.details;
    let totals = &header.totals;

    let value: CellValue = match field {
        HeaderField::InvNum => details.inv_num.as_str().into(),
        HeaderField::InvDate => details.inv_date.as_str().into(),
        HeaderField::OrderNum => details.order_num.as_str().into(),
        HeaderField::OrderDate => details.order_date.as_str().into(),
        HeaderField::BillType => details.bill_type.as_str().into(),
        HeaderField::CustName => details.cust_name.as_str().into(),
        HeaderField::CustAddr => details.cust_addr.as_str().into(),
        HeaderField::CustPhone => details.cust_phone.as_str().into(),
        HeaderField::CustGstin => details.cust_gstin.as_str().into(),
        HeaderField::CustState => details.cust_state.as_str().into(),
        HeaderField::TotalInvoiceAmount => number(totals.total_invoice_amount, field.as_str())?,
        HeaderField::TotalCgstAmount => number(totals.total_cgst_amount, field.as_str())?,
        HeaderField::TotalSgstAmount => number(totals.total_sgst_amount, field.as_str())?,
        HeaderField::AmountInWords => amount_in_words(totals.total_invoice_amount).into(),
    };
    Ok(value)
}

fn item_value(
    column: ItemColumn,
    index: usize,
    item: &LineItem,
    tax: &LineTax,
) -> Result<CellValue, InvoiceError> {
    let value: CellValue = match column {
        ItemColumn::SerialNo => CellValue::Number((index + 1) as f64),
        ItemColumn::Description => item.desc.as_str().into(),
        ItemColumn::Hsn => item.hsn.as_str().into(),
        ItemColumn::Quantity => number(tax.quantity, column.as_str())?,
        ItemColumn::Rate => number(tax.rate, column.as_str())?,
        ItemColumn::CgstPercent => number(tax.cgst_percent, column.as_str())?,
        ItemColumn::CgstAmount => number(tax.cgst_amount, column.as_str())?,
        ItemColumn::SgstPercent => number(tax.sgst_percent, column.as_str())?,
        ItemColumn::SgstAmount => number(tax.sgst_amount, column.as_str())?,
        ItemColumn::Total => number(tax.total, column.as_str())?,
    };
    Ok(value)
}

fn number(value: Decimal, field: &str) -> Result<CellValue, InvoiceError> {
    value.to_f64().map(CellValue::Number).ok_or_else(|| {
        InvoiceError::Generation(anyhow::anyhow!(
            "{} value {} cannot be written as a number",
            field,
            value
        ))
    })
}
