//! Spreadsheet access for the ledger and the invoice template.
//!
//! Edits go through umya-spreadsheet, which loads the whole package and writes
//! it back with only the touched cells changed: formulas, merged ranges,
//! styles, column widths and the other sheets come out as they went in.
//! Plain value reads use calamine.

use anyhow::Context;
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Write};
use std::path::Path;
use std::str::FromStr;
use tempfile::NamedTempFile;
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Largest row and column Excel accepts.
const MAX_ROWS: u32 = 1_048_576;
const MAX_COLS: u16 = 16_384;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text form as a user would read it in the sheet: whole numbers print
    /// without a fractional part.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Zero-based cell position, parsed from and printed as A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("'{0}' is not a valid cell reference")]
pub struct InvalidCellRef(pub String);

/// `"A"` → 0, `"K"` → 10, `"AA"` → 26.
pub fn parse_column(letters: &str) -> Result<u16, InvalidCellRef> {
    let invalid = || InvalidCellRef(letters.to_string());
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    let mut index: u32 = 0;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        index = index * 26 + digit;
        if index > MAX_COLS as u32 {
            return Err(invalid());
        }
    }
    Ok((index - 1) as u16)
}

fn column_letters(col: u16) -> String {
    let mut n = col as u32 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl FromStr for CellRef {
    type Err = InvalidCellRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCellRef(s.to_string());
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = trimmed.split_at(split);

        let col = parse_column(letters).map_err(|_| invalid())?;
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 || row > MAX_ROWS {
            return Err(invalid());
        }
        Ok(CellRef::new(row - 1, col))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row + 1)
    }
}

/// Cell values of one sheet as calamine reads them. Read-only.
#[derive(Debug, Clone, Default)]
pub struct SheetValues {
    pub name: String,
    cells: BTreeMap<CellRef, CellValue>,
}

impl SheetValues {
    /// The first sheet of the workbook at `path`.
    pub fn read_first(path: &Path) -> anyhow::Result<Self> {
        let mut workbook =
            open_workbook_auto(path).with_context(|| format!("open workbook {:?}", path))?;
        let name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("workbook {:?} has no worksheets", path))?;
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("read worksheet range {name}"))?;

        let mut cells = BTreeMap::new();
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        for (row, col, cell) in range.cells() {
            let value = match cell {
                Data::Empty => continue,
                Data::String(s) => CellValue::Text(s.clone()),
                Data::Float(f) => CellValue::Number(*f),
                Data::Int(i) => CellValue::Number(*i as f64),
                Data::Bool(b) => CellValue::Bool(*b),
                Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
                other => CellValue::Text(other.to_string()),
            };
            let at = CellRef::new(row_offset + row as u32, (col_offset + col as u32) as u16);
            cells.insert(at, value);
        }

        Ok(Self { name, cells })
    }

    pub fn get(&self, cell: CellRef) -> Option<&CellValue> {
        self.cells.get(&cell)
    }

    /// Used rows in order, each as a dense vector from column A. Gaps are `None`.
    pub fn rows(&self) -> Vec<(u32, Vec<Option<CellValue>>)> {
        let mut rows: BTreeMap<u32, Vec<Option<CellValue>>> = BTreeMap::new();
        for (cell, value) in &self.cells {
            let row = rows.entry(cell.row).or_default();
            let col = cell.col as usize;
            if row.len() <= col {
                row.resize(col + 1, None);
            }
            row[col] = Some(value.clone());
        }
        rows.into_iter().collect()
    }
}

/// An xlsx package opened for editing. Only the first sheet is written to.
pub struct Workbook {
    book: Spreadsheet,
}

impl Workbook {
    /// A fresh workbook with one empty sheet called `sheet_name`.
    pub fn new(sheet_name: &str) -> anyhow::Result<Self> {
        let mut workbook = Self {
            book: umya_spreadsheet::new_file(),
        };
        workbook.active_sheet_mut()?.set_name(sheet_name);
        Ok(workbook)
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let book = umya_spreadsheet::reader::xlsx::read(path)
            .map_err(|e| anyhow::anyhow!("open workbook {:?}: {}", path, e))?;
        let workbook = Self { book };
        workbook.active_sheet()?;
        Ok(workbook)
    }

    /// The sheet a spreadsheet application opens on: the first one.
    fn active_sheet(&self) -> anyhow::Result<&Worksheet> {
        self.book
            .get_sheet(&0)
            .ok_or_else(|| anyhow::anyhow!("workbook has no worksheets"))
    }

    fn active_sheet_mut(&mut self) -> anyhow::Result<&mut Worksheet> {
        self.book
            .get_sheet_mut(&0)
            .ok_or_else(|| anyhow::anyhow!("workbook has no worksheets"))
    }

    /// Replace the value of one cell. Its style stays.
    pub fn set(&mut self, cell: CellRef, value: impl Into<CellValue>) -> anyhow::Result<()> {
        let target = self
            .active_sheet_mut()?
            .get_cell_mut((cell.col as u32 + 1, cell.row + 1));
        match value.into() {
            CellValue::Text(s) => target.set_value_string(s),
            CellValue::Number(n) => target.set_value_number(n),
            CellValue::Bool(b) => target.set_value_bool(b),
        };
        Ok(())
    }

    /// Zero-based index of the first row below every used row.
    pub fn next_free_row(&self) -> anyhow::Result<u32> {
        Ok(self.active_sheet()?.get_highest_row())
    }

    /// Write `values` left to right starting at column A of `row`.
    pub fn write_row(
        &mut self,
        row: u32,
        values: impl IntoIterator<Item = CellValue>,
    ) -> anyhow::Result<()> {
        for (col, value) in values.into_iter().enumerate() {
            self.set(CellRef::new(row, col as u16), value)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, &mut buffer)
            .map_err(|e| anyhow::anyhow!("serialize workbook: {}", e))?;
        Ok(buffer.into_inner())
    }

    /// Serialize and atomically replace `path`. Returns the bytes written.
    pub fn save_atomic(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes)?;
        Ok(bytes)
    }
}

/// Write into a uniquely named temp file beside `path` and rename it over
/// `path`. Readers never see a half-written file, a failed write leaves the
/// old one intact and concurrent writers of the same path never share a temp
/// file. The last rename wins.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp =
        NamedTempFile::new_in(dir).with_context(|| format!("create temp file in {:?}", dir))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write {:?}", tmp.path()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replace {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a1_references() {
        assert_eq!("A1".parse::<CellRef>().unwrap(), CellRef::new(0, 0));
        assert_eq!("H2".parse::<CellRef>().unwrap(), CellRef::new(1, 7));
        assert_eq!("l36".parse::<CellRef>().unwrap(), CellRef::new(35, 11));
        assert_eq!("AA10".parse::<CellRef>().unwrap(), CellRef::new(9, 26));
        assert_eq!(
            "XFD1048576".parse::<CellRef>().unwrap(),
            CellRef::new(1_048_575, 16_383)
        );
    }

    #[test]
    fn rejects_malformed_references() {
        for bad in ["", "A", "10", "A0", "1A", "A1B", "XFE1", "A1048577", "Ä1"] {
            assert!(bad.parse::<CellRef>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn prints_a1_references() {
        assert_eq!(CellRef::new(43, 0).to_string(), "A44");
        assert_eq!(CellRef::new(0, 26).to_string(), "AA1");
        assert_eq!(CellRef::new(19, 10).to_string(), "K20");
    }

    #[test]
    fn next_free_row_follows_last_used_row() {
        let mut book = Workbook::new("Invoices").unwrap();
        assert_eq!(book.next_free_row().unwrap(), 0);

        book.set(CellRef::new(4, 2), "x").unwrap();
        book.set(CellRef::new(1, 0), "y").unwrap();
        assert_eq!(book.next_free_row().unwrap(), 5);
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(1001.0).to_text(), "1001");
        assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
    }

    #[test]
    fn save_and_read_back_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut book = Workbook::new("Ledger").unwrap();
        book.write_row(0, vec![CellValue::from("inv_num"), CellValue::from("total")])
            .unwrap();
        book.write_row(1, vec![CellValue::from("1001"), CellValue::Number(236.0)])
            .unwrap();
        book.set(CellRef::new(2, 3), CellValue::Bool(true)).unwrap();
        let bytes = book.save_atomic(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), bytes);
        let sheet = SheetValues::read_first(&path).unwrap();
        assert_eq!(sheet.name, "Ledger");
        assert_eq!(sheet.get(CellRef::new(1, 0)), Some(&CellValue::from("1001")));
        assert_eq!(sheet.get(CellRef::new(1, 1)), Some(&CellValue::Number(236.0)));

        let rows = sheet.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].1, vec![None, None, None, Some(CellValue::Bool(true))]);
    }

    #[test]
    fn editing_keeps_formulas_merges_and_other_sheets() {
        use calamine::{open_workbook, Xlsx};
        use rust_xlsxwriter::Format;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.xlsx");
        let mut source = rust_xlsxwriter::Workbook::new();
        let sheet = source.add_worksheet().set_name("Invoice").unwrap();
        let bold = Format::new().set_bold();
        sheet.merge_range(0, 0, 0, 5, "TAX INVOICE", &bold).unwrap();
        sheet.write_formula(19, 5, "=D20*E20").unwrap();
        sheet.set_column_width(1, 40).unwrap();
        source
            .add_worksheet()
            .set_name("Terms")
            .unwrap()
            .write_string(0, 0, "Net 30")
            .unwrap();
        source.save(&path).unwrap();

        let mut book = Workbook::open(&path).unwrap();
        book.set("D20".parse().unwrap(), 2.0).unwrap();
        book.set("E20".parse().unwrap(), 100.0).unwrap();
        book.save_atomic(&path).unwrap();

        let mut reread: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(reread.sheet_names(), ["Invoice", "Terms"]);
        let formulas = reread.worksheet_formula("Invoice").unwrap();
        assert_eq!(formulas.get_value((19, 5)).map(String::as_str), Some("D20*E20"));

        reread.load_merged_regions().unwrap();
        let merges = reread.merged_regions_by_sheet("Invoice");
        assert_eq!(merges.len(), 1);
        assert_eq!(merges[0].2.start, (0, 0));
        assert_eq!(merges[0].2.end, (0, 5));

        let values = reread.worksheet_range("Invoice").unwrap();
        assert_eq!(values.get_value((0, 0)), Some(&Data::String("TAX INVOICE".into())));
        assert_eq!(values.get_value((19, 3)), Some(&Data::Float(2.0)));
    }

    #[test]
    fn concurrent_atomic_writes_to_one_path_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Invoice_1001.xlsx");

        let handles: Vec<_> = (0..32u8)
            .map(|n| {
                let path = path.clone();
                std::thread::spawn(move || write_atomic(&path, &[n; 64]))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written.len(), 64);
        assert!(written.iter().all(|b| *b == written[0]));
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
