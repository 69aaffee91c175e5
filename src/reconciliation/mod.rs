//! Reconciliation stages.
//!
//! This module contains the stages a run goes through:
//! - Normalization of the raw source tables into typed records
//! - Duplicate entry detection on the primary export
//! - Overlap detection per person
//! - The anti-join chain against the downstream exports
//! - Duration and unit checks on fractioned matches
//!
//! [`run`] chains them and assembles the report.

mod cross_source;
mod duplicates;
mod inconsistency;
mod normalize;
mod overlaps;
mod pipeline;

pub use cross_source::{
    MatchedAbsence, Residuals, anti_join, check_key_kinds, inner_join, reconcile,
};
pub use duplicates::{DuplicateSplit, split_duplicates};
pub use inconsistency::{InconsistencyRecord, find_inconsistencies, inconsistency_table};
pub use normalize::{normalize_fractioned, normalize_primary, normalize_secondary};
pub use overlaps::{
    OverlapGroup, detect_interval_overlaps, detect_overlaps, overlap_groups,
    sort_by_entity_and_start,
};
pub use pipeline::{ReconInputs, run};
