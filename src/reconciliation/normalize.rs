//! Record normalization.
//!
//! This module turns raw tables into typed records. Every source has a
//! statically declared schema (its [`crate::config`] profile); a missing
//! column or a malformed date is a hard error, so loosely typed spreadsheet
//! cells never reach the joins.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::config::{FractionedSourceConfig, PrimarySourceConfig, SecondarySourceConfig};
use crate::error::{ReconError, ReconResult};
use crate::models::{
    AbsenceRecord, AbsenceTable, Cell, EntityId, FractionedRecord, FractionedTable, MatchKey,
    RawRow, RawTable, SecondaryRecord, SecondaryTable, SourceKind,
};

/// Normalizes the primary absence export.
///
/// Dates are parsed with the profile's format (typed date cells pass
/// through), entry ids become text, and durations are rounded half-to-even
/// to `duration_decimals` places. Every column of the input is kept.
///
/// # Errors
///
/// `MissingColumn` when a profile column is absent, `MissingValue` for a blank
/// person, entry id or date, `InvalidDate` and `InvalidNumber` for malformed
/// cells.
///
/// # Examples
///
/// ```
/// use absence_recon::config::ReconConfig;
/// use absence_recon::models::{Cell, RawTable};
/// use absence_recon::reconciliation::normalize_primary;
/// use rust_decimal::Decimal;
///
/// let config = ReconConfig::default();
/// let raw = RawTable::from_rows(
///     ["PERSON_NUMBER", "PER_ABSENCE_ENTRY_ID", "START_DATE", "END_DATE", "DURATION", "UOM"]
///         .map(String::from)
///         .to_vec(),
///     vec![vec![
///         Cell::Number(1001.0),
///         Cell::Number(55.0),
///         Cell::Text("01/01/2024".to_string()),
///         Cell::Text("02/01/2024".to_string()),
///         Cell::Number(7.996),
///         Cell::Text("Horas".to_string()),
///     ]],
/// );
///
/// let table = normalize_primary(&raw, &config.sources.primary, 2).unwrap();
/// let record = &table.records[0];
/// assert_eq!(record.entry_id, "55");
/// assert_eq!(record.duration, Some(Decimal::new(800, 2)));
/// ```
pub fn normalize_primary(
    table: &RawTable,
    config: &PrimarySourceConfig,
    duration_decimals: u32,
) -> ReconResult<AbsenceTable> {
    let input = SourceKind::Primary.to_string();

    let entity_idx = table.require_column(&input, &config.entity_column)?;
    let entry_idx = table.require_column(&input, &config.entry_id_column)?;
    let start_idx = table.require_column(&input, &config.start_date_column)?;
    let end_idx = table.require_column(&input, &config.end_date_column)?;
    let duration_idx = table.require_column(&input, &config.duration_column)?;
    let unit_idx = table.require_column(&input, &config.unit_column)?;

    let mut records = Vec::with_capacity(table.len());

    for row in table.rows() {
        let field = Field::new(&input, row);

        let person_number = EntityId::from_cell(&row.cells[entity_idx])
            .ok_or_else(|| field.missing(&config.entity_column))?;

        let entry_id = match &row.cells[entry_idx] {
            Cell::Empty => return Err(field.missing(&config.entry_id_column)),
            cell => cell.display().trim().to_string(),
        };

        let start_date = field
            .date(start_idx, &config.start_date_column, &config.date_format)?
            .ok_or_else(|| field.missing(&config.start_date_column))?;
        let end_date = field
            .date(end_idx, &config.end_date_column, &config.date_format)?
            .ok_or_else(|| field.missing(&config.end_date_column))?;

        let duration = field.rounded(duration_idx, &config.duration_column, duration_decimals)?;

        let unit = match &row.cells[unit_idx] {
            Cell::Empty => None,
            cell => Some(cell.display()),
        };

        let mut cells = row.cells.clone();
        cells[entry_idx] = Cell::Text(entry_id.clone());
        cells[start_idx] = Cell::Date(start_date);
        cells[end_idx] = Cell::Date(end_date);
        cells[duration_idx] = duration
            .and_then(|d| d.to_f64())
            .map_or(Cell::Empty, Cell::Number);

        records.push(AbsenceRecord {
            person_number,
            entry_id,
            start_date,
            end_date,
            duration,
            unit,
            line: row.line,
            cells,
        });
    }

    Ok(AbsenceTable::new(table.columns().to_vec(), records))
}

/// Normalizes the fractioned export.
///
/// Rows with a blank employee or start date cannot match anything and are
/// skipped. Hours are kept unrounded.
pub fn normalize_fractioned(
    table: &RawTable,
    config: &FractionedSourceConfig,
) -> ReconResult<FractionedTable> {
    let input = SourceKind::Fractioned.to_string();
    let profile = &config.source;

    let entity_idx = table.require_column(&input, &profile.entity_column)?;
    let date_idx = table.require_column(&input, &profile.start_date_column)?;
    let hours_idx = table.require_column(&input, &config.hours_column)?;
    let report_idx = config
        .report_columns
        .iter()
        .map(|column| table.require_column(&input, column))
        .collect::<ReconResult<Vec<_>>>()?;

    let mut records = Vec::with_capacity(table.len());
    let mut skipped_rows = 0;

    for row in table.rows() {
        let field = Field::new(&input, row);

        let Some(key) = field.key(entity_idx, date_idx, profile)? else {
            skipped_rows += 1;
            continue;
        };

        records.push(FractionedRecord {
            key,
            hours: field.decimal(hours_idx, &config.hours_column)?,
            line: row.line,
            report_cells: report_idx.iter().map(|&i| row.cells[i].clone()).collect(),
        });
    }

    if skipped_rows > 0 {
        debug!(input = %input, skipped_rows, "Skipped rows without employee or date");
    }

    Ok(FractionedTable {
        report_columns: config.report_columns.clone(),
        records,
        skipped_rows,
    })
}

/// Normalizes a total or monetary export down to its join keys.
pub fn normalize_secondary(
    source: SourceKind,
    table: &RawTable,
    config: &SecondarySourceConfig,
) -> ReconResult<SecondaryTable> {
    let input = source.to_string();

    let entity_idx = table.require_column(&input, &config.entity_column)?;
    let date_idx = table.require_column(&input, &config.start_date_column)?;

    let mut records = Vec::with_capacity(table.len());
    let mut skipped_rows = 0;

    for row in table.rows() {
        let field = Field::new(&input, row);
        match field.key(entity_idx, date_idx, config)? {
            Some(key) => records.push(SecondaryRecord {
                key,
                line: row.line,
            }),
            None => skipped_rows += 1,
        }
    }

    if skipped_rows > 0 {
        debug!(input = %input, skipped_rows, "Skipped rows without employee or date");
    }

    Ok(SecondaryTable {
        source,
        records,
        skipped_rows,
    })
}

/// Cell accessors for one row, carrying what error messages need.
struct Field<'a> {
    input: &'a str,
    row: &'a RawRow,
}

impl<'a> Field<'a> {
    fn new(input: &'a str, row: &'a RawRow) -> Self {
        Self { input, row }
    }

    fn missing(&self, column: &str) -> ReconError {
        ReconError::MissingValue {
            input: self.input.to_string(),
            row: self.row.line,
            column: column.to_string(),
        }
    }

    fn date(&self, idx: usize, column: &str, format: &str) -> ReconResult<Option<NaiveDate>> {
        let invalid = |value: String| ReconError::InvalidDate {
            input: self.input.to_string(),
            row: self.row.line,
            column: column.to_string(),
            value,
            format: format.to_string(),
        };

        match &self.row.cells[idx] {
            Cell::Empty => Ok(None),
            Cell::Date(date) => Ok(Some(*date)),
            Cell::Text(text) => NaiveDate::parse_from_str(text.trim(), format)
                .map(Some)
                .map_err(|_| invalid(text.clone())),
            other => Err(invalid(other.display())),
        }
    }

    /// Rounds half-to-even. Numeric cells round their exact binary value, so
    /// `2.675` (stored just below the midpoint) becomes `2.67`.
    fn rounded(&self, idx: usize, column: &str, decimals: u32) -> ReconResult<Option<Decimal>> {
        let exact = match &self.row.cells[idx] {
            Cell::Number(n) => Some(Decimal::from_f64_retain(*n).ok_or_else(|| {
                ReconError::InvalidNumber {
                    input: self.input.to_string(),
                    row: self.row.line,
                    column: column.to_string(),
                    value: n.to_string(),
                }
            })?),
            _ => self.decimal(idx, column)?,
        };
        Ok(exact.map(|d| d.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven)))
    }

    fn decimal(&self, idx: usize, column: &str) -> ReconResult<Option<Decimal>> {
        let invalid = |value: String| ReconError::InvalidNumber {
            input: self.input.to_string(),
            row: self.row.line,
            column: column.to_string(),
            value,
        };

        match &self.row.cells[idx] {
            Cell::Empty => Ok(None),
            Cell::Number(n) => Decimal::from_f64(*n)
                .map(Some)
                .ok_or_else(|| invalid(n.to_string())),
            Cell::Text(text) => Decimal::from_str(text.trim())
                .map(Some)
                .map_err(|_| invalid(text.clone())),
            other => Err(invalid(other.display())),
        }
    }

    /// The join key, or `None` when the employee or date is blank.
    fn key(
        &self,
        entity_idx: usize,
        date_idx: usize,
        config: &SecondarySourceConfig,
    ) -> ReconResult<Option<MatchKey>> {
        let date = self.date(date_idx, &config.start_date_column, &config.date_format)?;
        let entity = EntityId::from_cell(&self.row.cells[entity_idx]);
        Ok(entity.zip(date).map(|(entity, date)| MatchKey::new(entity, date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconConfig;
    use crate::models::KeyKind;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn primary_columns() -> Vec<String> {
        columns(&[
            "PERSON_NUMBER",
            "PER_ABSENCE_ENTRY_ID",
            "START_DATE",
            "END_DATE",
            "DURATION",
            "UOM",
            "ABSENCE_TYPE",
        ])
    }

    fn primary_row(start: Cell, duration: Cell) -> Vec<Cell> {
        vec![
            Cell::Number(1001.0),
            Cell::Number(9001.0),
            start,
            text("10/01/2024"),
            duration,
            text("Horas"),
            text("Vacaciones"),
        ]
    }

    fn fractioned_columns() -> Vec<String> {
        columns(&[
            "ID",
            "Nombre",
            "Fecha Inicio",
            "Horas",
            "Usuario",
            "Instancia",
            "Instancia.1",
            "Recepción",
            "Processed",
        ])
    }

    // ==========================================================================
    // Primary source
    // ==========================================================================

    #[test]
    fn test_primary_parses_day_month_year_text() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![primary_row(text("05/01/2024"), Cell::Number(8.0))],
        );

        let table = normalize_primary(&raw, &config.sources.primary, 2).unwrap();
        let record = &table.records[0];

        assert_eq!(record.start_date, date(2024, 1, 5));
        assert_eq!(record.end_date, date(2024, 1, 10));
        assert_eq!(record.person_number.as_str(), "1001");
        assert_eq!(record.entry_id, "9001");
        assert_eq!(record.unit.as_deref(), Some("Horas"));
    }

    #[test]
    fn test_primary_accepts_typed_date_cells() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![primary_row(Cell::Date(date(2024, 1, 5)), Cell::Number(8.0))],
        );

        let table = normalize_primary(&raw, &config.sources.primary, 2).unwrap();
        assert_eq!(table.records[0].start_date, date(2024, 1, 5));
    }

    #[test]
    fn test_primary_rewrites_normalized_cells_and_keeps_pass_through() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![primary_row(text("05/01/2024"), Cell::Number(7.254))],
        );

        let table = normalize_primary(&raw, &config.sources.primary, 2).unwrap();
        let cells = &table.records[0].cells;

        assert_eq!(table.columns, primary_columns());
        assert_eq!(cells[1], text("9001"));
        assert_eq!(cells[2], Cell::Date(date(2024, 1, 5)));
        assert_eq!(cells[4], Cell::Number(7.25));
        assert_eq!(cells[6], text("Vacaciones"));
    }

    #[test]
    fn test_primary_rounds_half_to_even() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![
                primary_row(text("05/01/2024"), Cell::Number(2.125)),
                primary_row(text("06/01/2024"), text("2.135")),
            ],
        );

        let table = normalize_primary(&raw, &config.sources.primary, 2).unwrap();
        assert_eq!(table.records[0].duration, Some(Decimal::new(212, 2)));
        assert_eq!(table.records[1].duration, Some(Decimal::new(214, 2)));
    }

    #[test]
    fn test_primary_rounds_the_stored_binary_value() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![
                primary_row(text("05/01/2024"), Cell::Number(2.675)),
                primary_row(text("06/01/2024"), Cell::Number(8.1)),
                primary_row(text("07/01/2024"), text("2.675")),
            ],
        );

        let table = normalize_primary(&raw, &config.sources.primary, 2).unwrap();
        assert_eq!(table.records[0].duration, Some(Decimal::new(267, 2)));
        assert_eq!(table.records[1].duration, Some(Decimal::new(810, 2)));
        assert_eq!(table.records[2].duration, Some(Decimal::new(268, 2)));
    }

    #[test]
    fn test_primary_blank_duration_is_none() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![primary_row(text("05/01/2024"), Cell::Empty)],
        );

        let table = normalize_primary(&raw, &config.sources.primary, 2).unwrap();
        assert_eq!(table.records[0].duration, None);
        assert_eq!(table.records[0].cells[4], Cell::Empty);
    }

    #[test]
    fn test_primary_rejects_iso_date_text() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![primary_row(text("2024-01-05"), Cell::Number(8.0))],
        );

        let err = normalize_primary(&raw, &config.sources.primary, 2).unwrap_err();
        match err {
            ReconError::InvalidDate {
                row, column, value, ..
            } => {
                assert_eq!(row, 2);
                assert_eq!(column, "START_DATE");
                assert_eq!(value, "2024-01-05");
            }
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_primary_rejects_number_in_date_column() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![primary_row(Cell::Number(45296.0), Cell::Number(8.0))],
        );

        let err = normalize_primary(&raw, &config.sources.primary, 2).unwrap_err();
        assert!(matches!(err, ReconError::InvalidDate { .. }));
    }

    #[test]
    fn test_primary_rejects_text_duration() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![primary_row(text("05/01/2024"), text("ocho"))],
        );

        let err = normalize_primary(&raw, &config.sources.primary, 2).unwrap_err();
        assert!(matches!(err, ReconError::InvalidNumber { .. }));
    }

    #[test]
    fn test_primary_missing_column() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(columns(&["PERSON_NUMBER", "START_DATE"]), vec![]);

        let err = normalize_primary(&raw, &config.sources.primary, 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "primary: required column 'PER_ABSENCE_ENTRY_ID' not found"
        );
    }

    #[test]
    fn test_primary_blank_start_date_is_missing_value() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            primary_columns(),
            vec![primary_row(Cell::Empty, Cell::Number(8.0))],
        );

        let err = normalize_primary(&raw, &config.sources.primary, 2).unwrap_err();
        assert!(matches!(err, ReconError::MissingValue { row: 2, .. }));
    }

    // ==========================================================================
    // Secondary sources
    // ==========================================================================

    #[test]
    fn test_fractioned_collects_report_columns_in_order() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            fractioned_columns(),
            vec![vec![
                Cell::Number(1001.0),
                text("Ana"),
                Cell::Date(date(2024, 1, 5)),
                Cell::Number(7.5),
                text("jdoe"),
                text("A"),
                text("B"),
                text("2024-01-06"),
                Cell::Bool(true),
            ]],
        );

        let table = normalize_fractioned(&raw, &config.sources.fractioned).unwrap();
        let record = &table.records[0];

        assert_eq!(record.key.entity.as_str(), "1001");
        assert_eq!(record.key.date, date(2024, 1, 5));
        assert_eq!(record.hours, Some(Decimal::new(75, 1)));
        assert_eq!(record.report_cells.len(), 9);
        assert_eq!(record.report_cells[6], text("B"));
        assert_eq!(table.report_columns, fractioned_columns());
    }

    #[test]
    fn test_fractioned_requires_every_report_column() {
        let config = ReconConfig::default();
        let mut names = fractioned_columns();
        names.retain(|c| c != "Instancia.1");
        let raw = RawTable::from_rows(names, vec![]);

        let err = normalize_fractioned(&raw, &config.sources.fractioned).unwrap_err();
        assert_eq!(
            err.to_string(),
            "fractioned: required column 'Instancia.1' not found"
        );
    }

    #[test]
    fn test_secondary_skips_rows_without_key() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            columns(&["ID", "Fecha Inicio Real"]),
            vec![
                vec![Cell::Number(1.0), Cell::Date(date(2024, 1, 1))],
                vec![Cell::Empty, Cell::Date(date(2024, 1, 2))],
                vec![Cell::Number(3.0), Cell::Empty],
            ],
        );

        let table = normalize_secondary(SourceKind::Total, &raw, &config.sources.total).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.skipped_rows, 2);
        assert_eq!(table.key_kind(), Some(KeyKind::Numeric));
    }

    #[test]
    fn test_monetary_parses_year_month_day_text() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            columns(&["Id Empleado", "Fecha Inicio Disfrute"]),
            vec![vec![text("1001"), text("2024-02-29")]],
        );

        let table =
            normalize_secondary(SourceKind::Monetary, &raw, &config.sources.monetary).unwrap();
        assert_eq!(table.records[0].key.date, date(2024, 2, 29));
        assert_eq!(table.key_kind(), Some(KeyKind::Text));
    }

    #[test]
    fn test_monetary_rejects_malformed_date() {
        let config = ReconConfig::default();
        let raw = RawTable::from_rows(
            columns(&["Id Empleado", "Fecha Inicio Disfrute"]),
            vec![vec![text("1001"), text("29/02/2024")]],
        );

        let err = normalize_secondary(SourceKind::Monetary, &raw, &config.sources.monetary)
            .unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().starts_with("monetary, row 2"));
    }
}
