//! Duplicate entry detection.
//!
//! An absence entry id must identify exactly one row of the primary export.
//! Repeated ids are reported, never merged.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::AbsenceRecord;

/// The result of splitting the primary records on their entry id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateSplit {
    /// Every occurrence of every repeated entry id, in input order.
    pub duplicates: Vec<AbsenceRecord>,
    /// The input with only the first occurrence of each entry id, in input order.
    pub kept: Vec<AbsenceRecord>,
}

impl DuplicateSplit {
    /// Number of distinct entry ids that occur more than once.
    pub fn duplicated_ids(&self) -> usize {
        self.duplicates
            .iter()
            .map(|r| r.entry_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Splits records into duplicates and the deduplicated set.
///
/// An entry id seen twice contributes both rows to `duplicates`; `kept`
/// holds the first of them.
pub fn split_duplicates(records: &[AbsenceRecord]) -> DuplicateSplit {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.entry_id.as_str()).or_insert(0) += 1;
    }

    let duplicates = records
        .iter()
        .filter(|r| counts[r.entry_id.as_str()] > 1)
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let kept = records
        .iter()
        .filter(|r| seen.insert(r.entry_id.as_str()))
        .cloned()
        .collect();

    DuplicateSplit { duplicates, kept }
}
