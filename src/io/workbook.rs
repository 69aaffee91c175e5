//! Reading input workbooks.
//!
//! Only the first worksheet of each upload is read. The format (xlsx, xls,
//! xlsb or ods) is detected from the content, so uploads need no extension.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto, open_workbook_auto_from_rs};
use tracing::debug;

use crate::error::{ReconError, ReconResult};
use crate::models::{Cell, RawTable};

/// Reads the first worksheet of an in-memory workbook.
///
/// `input` names the upload in error messages. The header is the row right
/// after the first `skip_rows` sheet rows.
///
/// # Errors
///
/// `WorkbookRead` when the bytes are not a readable workbook or it has no
/// worksheet, `MissingHeader` when the sheet ends before the header row.
pub fn read_table(bytes: &[u8], input: &str, skip_rows: usize) -> ReconResult<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| read_error(input, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| no_sheet(input))?
        .map_err(|e| read_error(input, e))?;

    let table = RawTable::from_grid(input, grid(&range), skip_rows)?;
    debug!(
        input,
        columns = table.columns().len(),
        rows = table.len(),
        "Workbook read"
    );
    Ok(table)
}

/// Reads the first worksheet of a workbook on disk.
pub fn read_table_from_path(path: &Path, input: &str, skip_rows: usize) -> ReconResult<RawTable> {
    let mut workbook = open_workbook_auto(path).map_err(|e| read_error(input, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| no_sheet(input))?
        .map_err(|e| read_error(input, e))?;

    RawTable::from_grid(input, grid(&range), skip_rows)
}

/// Converts a calamine range into rows of cells anchored at sheet row 1.
///
/// calamine ranges start at the first used cell; leading blank rows are
/// restored so that header offsets and row numbers match the sheet.
fn grid(range: &calamine::Range<Data>) -> Vec<Vec<Cell>> {
    let leading = range.start().map_or(0, |(row, _)| row as usize);
    let mut grid = vec![Vec::new(); leading];
    grid.extend(range.rows().map(|row| row.iter().map(to_cell).collect()));
    grid
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => Cell::from_excel_serial(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::from_iso(s),
        Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}

fn read_error(input: &str, err: impl std::fmt::Display) -> ReconError {
    ReconError::WorkbookRead {
        input: input.to_string(),
        message: err.to_string(),
    }
}

fn no_sheet(input: &str) -> ReconError {
    ReconError::WorkbookRead {
        input: input.to_string(),
        message: "workbook has no worksheets".to_string(),
    }
}
