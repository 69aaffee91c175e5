//! Records from the downstream exports the primary source is checked against.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::cell::Cell;
use super::key::{KeyKind, MatchKey};

/// The logical sources taking part in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The authoritative HCM absence export.
    Primary,
    /// Fractioned absences (PeopleSoft).
    Fractioned,
    /// Whole-day absences (PeopleSoft).
    Total,
    /// Absences paid as money; two payroll exports combined.
    Monetary,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Primary => write!(f, "primary"),
            SourceKind::Fractioned => write!(f, "fractioned"),
            SourceKind::Total => write!(f, "total"),
            SourceKind::Monetary => write!(f, "monetary"),
        }
    }
}

/// A row from the total or monetary export. Only its key matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondaryRecord {
    /// The (employee, start date) key.
    pub key: MatchKey,
    /// The 1-based row in the source sheet.
    pub line: usize,
}

/// A normalized total or monetary export.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryTable {
    /// Which export this is.
    pub source: SourceKind,
    /// Keyed rows. Rows without a usable key are not included.
    pub records: Vec<SecondaryRecord>,
    /// Rows dropped for a blank employee or date.
    pub skipped_rows: usize,
}

impl SecondaryTable {
    /// Creates a table.
    pub fn new(source: SourceKind, records: Vec<SecondaryRecord>) -> Self {
        Self {
            source,
            records,
            skipped_rows: 0,
        }
    }

    /// The join keys.
    pub fn keys(&self) -> impl Iterator<Item = &MatchKey> {
        self.records.iter().map(|r| &r.key)
    }

    /// How the employee identifiers were stored.
    pub fn key_kind(&self) -> Option<KeyKind> {
        KeyKind::of(self.records.iter().map(|r| &r.key.entity))
    }
}

/// A row from the fractioned export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FractionedRecord {
    /// The (employee, start date) key.
    pub key: MatchKey,
    /// Hours recorded downstream. `None` when blank.
    pub hours: Option<Decimal>,
    /// The 1-based row in the source sheet.
    pub line: usize,
    /// Values of the configured report columns, in configured order.
    pub report_cells: Vec<Cell>,
}

/// The normalized fractioned export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FractionedTable {
    /// The configured report column names.
    pub report_columns: Vec<String>,
    /// Keyed rows.
    pub records: Vec<FractionedRecord>,
    /// Rows dropped for a blank employee or date.
    pub skipped_rows: usize,
}

impl FractionedTable {
    /// Creates a table.
    pub fn new(report_columns: Vec<String>, records: Vec<FractionedRecord>) -> Self {
        Self {
            report_columns,
            records,
            skipped_rows: 0,
        }
    }

    /// The join keys.
    pub fn keys(&self) -> impl Iterator<Item = &MatchKey> {
        self.records.iter().map(|r| &r.key)
    }

    /// How the employee identifiers were stored.
    pub fn key_kind(&self) -> Option<KeyKind> {
        KeyKind::of(self.records.iter().map(|r| &r.key.entity))
    }
}
