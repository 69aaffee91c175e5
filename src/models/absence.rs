//! Absence records from the primary (HCM) export.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::cell::Cell;
use super::key::{EntityId, KeyKind, MatchKey};

/// A normalized absence entry.
///
/// The typed fields drive reconciliation; `cells` keeps every column of the
/// source row (with the typed columns rewritten to their normalized
/// values) so results can be reported with the primary column set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsenceRecord {
    /// The person the absence belongs to.
    pub person_number: EntityId,
    /// The absence entry identifier, as text.
    pub entry_id: String,
    /// First day of the absence.
    pub start_date: NaiveDate,
    /// Last day of the absence.
    pub end_date: NaiveDate,
    /// Duration rounded to the configured decimals. `None` when blank.
    pub duration: Option<Decimal>,
    /// Unit of measure of the duration. `None` when blank.
    pub unit: Option<String>,
    /// The 1-based row in the source sheet.
    pub line: usize,
    /// All primary columns, in header order.
    pub cells: Vec<Cell>,
}

impl AbsenceRecord {
    /// The (person, start date) join key.
    pub fn match_key(&self) -> MatchKey {
        MatchKey::new(self.person_number.clone(), self.start_date)
    }
}

/// The normalized primary dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AbsenceTable {
    /// The primary column names.
    pub columns: Vec<String>,
    /// Records in input order.
    pub records: Vec<AbsenceRecord>,
}

impl AbsenceTable {
    /// Creates a table.
    pub fn new(columns: Vec<String>, records: Vec<AbsenceRecord>) -> Self {
        Self { columns, records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// How the person numbers were stored.
    pub fn key_kind(&self) -> Option<KeyKind> {
        KeyKind::of(self.records.iter().map(|r| &r.person_number))
    }
}
