//! Core data models for the reconciliation engine.
//!
//! This module contains the raw and normalized record types, the join keys
//! shared by every source, and the report types.

mod absence;
mod cell;
mod key;
mod report;
mod secondary;
mod table;

pub use absence::{AbsenceRecord, AbsenceTable};
pub use cell::Cell;
pub use key::{EntityId, KeyKind, MatchKey};
pub use report::{
    AuditStep, AuditTrace, AuditWarning, ReconReport, ReportSummary, ResultTable,
};
pub use secondary::{
    FractionedRecord, FractionedTable, SecondaryRecord, SecondaryTable, SourceKind,
};
pub use table::{RawRow, RawTable};
