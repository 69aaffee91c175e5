//! Spreadsheet cell values.
//!
//! Every input workbook is reduced to a grid of [`Cell`]s before
//! normalization, and every result table is a grid of cells again.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A single spreadsheet value.
///
/// Serializes untagged, so a JSON preview shows `null`, strings, numbers,
/// booleans and ISO dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// A blank cell.
    Empty,
    /// Text.
    Text(String),
    /// Any number; spreadsheets do not distinguish integers.
    Number(f64),
    /// A boolean.
    Bool(bool),
    /// A calendar date. Time of day is dropped.
    Date(NaiveDate),
}

impl Cell {
    /// Builds a text cell, mapping blank text to [`Cell::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    /// Converts an Excel 1900-system date serial to a date cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use absence_recon::models::Cell;
    /// use chrono::NaiveDate;
    ///
    /// let cell = Cell::from_excel_serial(45292.0);
    /// assert_eq!(cell, Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
    /// ```
    pub fn from_excel_serial(serial: f64) -> Self {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
        match epoch.checked_add_signed(Duration::days(serial.floor() as i64)) {
            Some(date) => Cell::Date(date),
            None => Cell::Number(serial),
        }
    }

    /// Parses an ISO 8601 date or datetime, falling back to text.
    pub fn from_iso(value: &str) -> Self {
        let trimmed = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Cell::Date(date);
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Cell::Date(datetime.date());
            }
        }
        Cell::text(value)
    }

    /// Returns true for blank cells.
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Renders the cell the way it reads in a sheet.
    ///
    /// Whole numbers render without a fractional part.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Formats a number, dropping `.0` from whole values.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert_eq!(Cell::text("   "), Cell::Empty);
        assert_eq!(Cell::text("Horas"), Cell::Text("Horas".to_string()));
    }

    #[test]
    fn test_excel_serial_drops_time_of_day() {
        assert_eq!(Cell::from_excel_serial(45296.75), Cell::Date(date(2024, 1, 5)));
    }

    #[test]
    fn test_iso_datetime_becomes_date() {
        assert_eq!(Cell::from_iso("2024-03-01T00:00:00"), Cell::Date(date(2024, 3, 1)));
        assert_eq!(Cell::from_iso("2024-03-01"), Cell::Date(date(2024, 3, 1)));
        assert_eq!(Cell::from_iso("P1D"), Cell::Text("P1D".to_string()));
    }

    #[test]
    fn test_display_whole_and_fractional_numbers() {
        assert_eq!(Cell::Number(1001.0).display(), "1001");
        assert_eq!(Cell::Number(7.5).display(), "7.5");
        assert_eq!(Cell::Bool(true).display(), "TRUE");
        assert_eq!(Cell::Date(date(2024, 1, 10)).display(), "2024-01-10");
    }

    #[test]
    fn test_serializes_untagged() {
        let cells = vec![
            Cell::Empty,
            Cell::Text("a".to_string()),
            Cell::Number(2.5),
            Cell::Date(date(2024, 1, 1)),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[null,"a",2.5,"2024-01-01"]"#);
    }
}
