//! Result tables, summary counts and the audit trace of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::absence::AbsenceRecord;
use super::cell::Cell;

/// A named result table, exported as one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    /// The sheet name.
    pub name: String,
    /// Column headers.
    pub columns: Vec<String>,
    /// Data rows, one cell per column.
    pub rows: Vec<Vec<Cell>>,
}

impl ResultTable {
    /// Creates a table.
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// A table of absence records with the primary column set.
    pub fn from_absences<'a>(
        name: impl Into<String>,
        columns: &[String],
        records: impl IntoIterator<Item = &'a AbsenceRecord>,
    ) -> Self {
        Self::new(
            name,
            columns.to_vec(),
            records.into_iter().map(|r| r.cells.clone()).collect(),
        )
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, if it exists.
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }
}

/// Row counts at every stage of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Primary rows read.
    pub primary_rows: usize,
    /// Keyed fractioned rows read.
    pub fractioned_rows: usize,
    /// Keyed total rows read.
    pub total_rows: usize,
    /// Keyed monetary rows read, both exports combined.
    pub monetary_rows: usize,
    /// Rows whose entry id occurs more than once, all occurrences.
    pub duplicate_rows: usize,
    /// Primary rows left after deduplication.
    pub kept_rows: usize,
    /// Rows flagged by the overlap scan.
    pub overlapping_rows: usize,
    /// Kept rows without a fractioned match.
    pub not_in_fractioned: usize,
    /// Of those, rows without a total match.
    pub not_in_total: usize,
    /// Of those, rows without a monetary match.
    pub not_integrated: usize,
    /// Primary/fractioned pairs sharing a key.
    pub matched_rows: usize,
    /// Matched pairs with a duration or unit mismatch.
    pub inconsistent_rows: usize,
}

/// A single stage of the reconciliation audit trail.
///
/// Each pipeline stage records what it consumed, what it produced, and a
/// human-readable line explaining the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The identifier of the stage.
    pub stage_id: String,
    /// The human-readable name of the stage.
    pub stage_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the result.
    pub reasoning: String,
}

/// A warning raised during a run.
///
/// Warnings do not stop the run but point at input the operator should look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
}

/// The complete audit trace for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of stages.
    pub steps: Vec<AuditStep>,
    /// Any warnings raised.
    pub warnings: Vec<AuditWarning>,
    /// Total run duration in microseconds.
    pub duration_us: u64,
}

/// The complete result of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconReport {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// When the run finished.
    pub timestamp: DateTime<Utc>,
    /// Version of the engine that produced the report.
    pub engine_version: String,
    /// Every occurrence of a repeated entry id.
    pub duplicates: ResultTable,
    /// Absences found in no downstream export.
    pub not_integrated: ResultTable,
    /// Absences flagged by the overlap scan.
    pub overlapping: ResultTable,
    /// Fractioned matches with a duration or unit mismatch.
    pub inconsistent: ResultTable,
    /// Row counts per stage.
    pub summary: ReportSummary,
    /// The audit trail.
    pub audit_trace: AuditTrace,
}

impl ReconReport {
    /// The four result tables in sheet order.
    pub fn sheets(&self) -> [&ResultTable; 4] {
        [
            &self.duplicates,
            &self.not_integrated,
            &self.overlapping,
            &self.inconsistent,
        ]
    }
}
