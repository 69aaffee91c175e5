//! Cross-source reconciliation.
//!
//! The deduplicated primary records are checked against the downstream
//! exports with exact (person, start date) matches. The "not integrated" set
//! is built as a chain of anti-joins, each stage consuming the residual of the
//! previous one:
//!
//! ```text
//! kept ──▶ ¬fractioned ──▶ residual A ──▶ ¬total ──▶ residual B ──▶ ¬monetary ──▶ residual C
//! ```

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::{ReconError, ReconResult};
use crate::models::{
    AbsenceRecord, AbsenceTable, FractionedRecord, FractionedTable, KeyKind, MatchKey,
    SecondaryTable, SourceKind,
};

/// The residual of every anti-join stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Residuals {
    /// Residual A: kept records with no fractioned match.
    pub not_in_fractioned: Vec<AbsenceRecord>,
    /// Residual B: residual A records with no total match.
    pub not_in_total: Vec<AbsenceRecord>,
    /// Residual C: residual B records with no monetary match.
    pub not_integrated: Vec<AbsenceRecord>,
}

/// A primary record paired with a fractioned record sharing its key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedAbsence {
    /// The primary record.
    pub absence: AbsenceRecord,
    /// The fractioned record.
    pub fractioned: FractionedRecord,
}

/// Keeps the left records whose key is absent from `right`.
///
/// Order and columns of the left records are preserved.
pub fn anti_join<'a>(
    left: &[AbsenceRecord],
    right: impl IntoIterator<Item = &'a MatchKey>,
) -> Vec<AbsenceRecord> {
    let right: HashSet<&MatchKey> = right.into_iter().collect();
    left.iter()
        .filter(|record| !right.contains(&record.match_key()))
        .cloned()
        .collect()
}

/// Runs the three-stage anti-join chain.
///
/// A record leaves the chain at the first source that has its key, so each
/// residual is a subset of the previous one.
pub fn reconcile(
    kept: &[AbsenceRecord],
    fractioned: &FractionedTable,
    total: &SecondaryTable,
    monetary: &SecondaryTable,
) -> Residuals {
    let not_in_fractioned = anti_join(kept, fractioned.keys());
    let not_in_total = anti_join(&not_in_fractioned, total.keys());
    let not_integrated = anti_join(&not_in_total, monetary.keys());

    Residuals {
        not_in_fractioned,
        not_in_total,
        not_integrated,
    }
}

/// Pairs each primary record with every fractioned record sharing its key.
///
/// Pairs come out in primary order, then fractioned order.
pub fn inner_join(kept: &[AbsenceRecord], fractioned: &FractionedTable) -> Vec<MatchedAbsence> {
    let mut index: HashMap<&MatchKey, Vec<&FractionedRecord>> = HashMap::new();
    for record in &fractioned.records {
        index.entry(&record.key).or_default().push(record);
    }

    kept.iter()
        .flat_map(|absence| {
            let key = absence.match_key();
            index
                .get(&key)
                .into_iter()
                .flatten()
                .map(move |fractioned| MatchedAbsence {
                    absence: absence.clone(),
                    fractioned: (*fractioned).clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Checks that every secondary key column was stored like the primary one.
///
/// Used under the strict key policy. Empty columns are not checked.
pub fn check_key_kinds(
    primary: &AbsenceTable,
    secondaries: &[(SourceKind, Option<KeyKind>)],
) -> ReconResult<()> {
    let Some(left_kind) = primary.key_kind() else {
        return Ok(());
    };

    for (source, right_kind) in secondaries {
        if let Some(right_kind) = right_kind {
            if *right_kind != left_kind {
                return Err(ReconError::JoinKeyMismatch {
                    left: SourceKind::Primary.to_string(),
                    left_kind: left_kind.to_string(),
                    right: source.to_string(),
                    right_kind: right_kind.to_string(),
                });
            }
        }
    }

    Ok(())
}
