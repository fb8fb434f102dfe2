//! Spreadsheet I/O: field rows in, backup tables out.
//!
//! Input sheets are `.xlsx` or `.csv`. The first row is a header; the first
//! column holds field names and the second holds values. Backups are
//! written as `.xlsx`.

use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::{Workbook, XlsxError};
use tracing::debug;

use crate::model::FieldRecord;

/// Errors that can occur reading or writing spreadsheets.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("unsupported file format: {} (expected .xlsx or .csv)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read workbook: {0}")]
    Xlsx(#[from] calamine::Error),

    #[error("failed to write workbook: {0}")]
    XlsxWrite(#[from] XlsxError),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook has no worksheets: {}", .0.display())]
    EmptyWorkbook(PathBuf),

    #[error("field '{0}' appears more than once")]
    DuplicateField(String),
}

pub type Result<T> = core::result::Result<T, SheetError>;

/// The tabular formats Cosmo reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Csv,
}

impl SheetFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("xlsx") => Ok(Self::Xlsx),
            Some("csv") => Ok(Self::Csv),
            _ => Err(SheetError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Read field rows from an `.xlsx` or `.csv` file.
///
/// Rows with a blank name are skipped. A name that appears twice is an error.
pub fn read_records(path: &Path) -> Result<Vec<FieldRecord>> {
    let rows = match SheetFormat::from_path(path)? {
        SheetFormat::Xlsx => read_xlsx_rows(path)?,
        SheetFormat::Csv => read_csv_rows(path)?,
    };

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());
    for (name, value) in rows {
        let name = name.trim().to_string();
        if name.is_empty() {
            debug!("skipping row with blank field name");
            continue;
        }
        if !seen.insert(name.clone()) {
            return Err(SheetError::DuplicateField(name));
        }
        records.push(FieldRecord::new(name, value));
    }
    debug!(path = %path.display(), rows = records.len(), "read field rows");
    Ok(records)
}

/// Read only the first column of a sheet: a list of field names.
pub fn read_field_names(path: &Path) -> Result<Vec<String>> {
    Ok(read_records(path)?.into_iter().map(|r| r.name).collect())
}

/// Write a two-column table with a header row to an `.xlsx` file.
///
/// `None` values become empty cells.
pub fn write_xlsx(
    path: &Path,
    header: [&str; 2],
    rows: &[(String, Option<String>)],
) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string(0, 0, header[0])?;
    sheet.write_string(0, 1, header[1])?;
    for (row, (name, value)) in (1u32..).zip(rows) {
        sheet.write_string(row, 0, name)?;
        if let Some(value) = value {
            sheet.write_string(row, 1, value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// First two columns of the first worksheet, header row excluded.
fn read_xlsx_rows(path: &Path) -> Result<Vec<(String, String)>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::EmptyWorkbook(path.to_path_buf()))??;

    Ok(range
        .rows()
        .skip(1)
        .map(|row| {
            let name = row.first().map(cell_text).unwrap_or_default();
            let value = row.get(1).map(cell_text).unwrap_or_default();
            (name, value)
        })
        .collect())
}

/// First two columns of a CSV file, header row excluded.
fn read_csv_rows(path: &Path) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let name = record.get(0).unwrap_or_default().to_string();
        let value = record.get(1).unwrap_or_default().to_string();
        rows.push((name, value));
    }
    Ok(rows)
}

/// Render a cell the way it reads on screen.
///
/// Whole-number floats drop the fractional part, and empty cells are `""`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract().abs() < f64::EPSILON && f.abs() < 1e15 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
