//! Duration and unit checks on fractioned matches.

use serde::Serialize;

use crate::models::{AbsenceRecord, FractionedRecord, ResultTable};

use super::cross_source::MatchedAbsence;

/// A matched pair whose duration or unit disagrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InconsistencyRecord {
    /// The primary record.
    pub absence: AbsenceRecord,
    /// The fractioned record it matched.
    pub fractioned: FractionedRecord,
    /// Primary duration differs from fractioned hours.
    pub duration_mismatch: bool,
    /// Primary unit is not the expected one.
    pub unit_mismatch: bool,
}

/// Flags matched pairs with a duration or unit mismatch.
///
/// Durations compare by value, so `8` equals `8.00`. A blank duration or
/// blank hours never equals anything.
pub fn find_inconsistencies(
    matched: &[MatchedAbsence],
    expected_unit: &str,
) -> Vec<InconsistencyRecord> {
    matched
        .iter()
        .filter_map(|pair| {
            let duration_mismatch = match (pair.absence.duration, pair.fractioned.hours) {
                (Some(duration), Some(hours)) => duration != hours,
                _ => true,
            };
            let unit_mismatch = pair.absence.unit.as_deref() != Some(expected_unit);

            (duration_mismatch || unit_mismatch).then(|| InconsistencyRecord {
                absence: pair.absence.clone(),
                fractioned: pair.fractioned.clone(),
                duration_mismatch,
                unit_mismatch,
            })
        })
        .collect()
}

/// Builds the duration-error sheet: primary columns, then the fractioned report columns.
pub fn inconsistency_table(
    name: &str,
    primary_columns: &[String],
    report_columns: &[String],
    records: &[InconsistencyRecord],
) -> ResultTable {
    let columns = primary_columns
        .iter()
        .chain(report_columns)
        .cloned()
        .collect();
    let rows = records
        .iter()
        .map(|r| {
            r.absence
                .cells
                .iter()
                .chain(&r.fractioned.report_cells)
                .cloned()
                .collect()
        })
        .collect();
    ResultTable::new(name, columns, rows)
}
