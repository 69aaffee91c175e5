//! Writing the result workbook.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::error::{ReconError, ReconResult};
use crate::models::{Cell, ReconReport, ResultTable};

const DATE_FORMAT: &str = "yyyy-mm-dd";

/// Serializes the report's four tables into an xlsx workbook.
///
/// Sheets come in report order with a bold header row; empty tables still
/// get their header.
pub fn write_report(report: &ReconReport) -> ReconResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format(DATE_FORMAT);

    for table in report.sheets() {
        let worksheet = workbook
            .add_worksheet()
            .set_name(&table.name)
            .map_err(|e| write_error(&table.name, e))?;
        write_table(worksheet, table, &header, &date).map_err(|e| write_error(&table.name, e))?;
    }

    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| ReconError::ReportWrite {
            message: e.to_string(),
        })?;

    info!(
        run_id = %report.run_id,
        bytes = bytes.len(),
        "Result workbook written"
    );
    Ok(bytes)
}

/// Writes the result workbook to a file.
pub fn save_report(report: &ReconReport, path: &Path) -> ReconResult<()> {
    let bytes = write_report(report)?;
    std::fs::write(path, bytes).map_err(|e| ReconError::ReportWrite {
        message: format!("{}: {}", path.display(), e),
    })
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &ResultTable,
    header: &Format,
    date: &Format,
) -> Result<(), XlsxError> {
    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row_num, col, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row_num, col, *b)?;
                }
                Cell::Date(d) => match excel_date(d) {
                    Some(value) => {
                        worksheet.write_datetime_with_format(row_num, col, &value, date)?;
                    }
                    None => {
                        worksheet.write_string(row_num, col, d.format("%Y-%m-%d").to_string())?;
                    }
                },
            }
        }
    }

    worksheet.autofit();
    Ok(())
}

/// Excel only stores dates in 1900..=9999; anything else is written as text.
fn excel_date(d: &NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(d.year()).ok()?;
    ExcelDateTime::from_ymd(year, d.month() as u8, d.day() as u8).ok()
}

fn write_error(sheet: &str, err: XlsxError) -> ReconError {
    ReconError::ReportWrite {
        message: format!("sheet '{}': {}", sheet, err),
    }
}
