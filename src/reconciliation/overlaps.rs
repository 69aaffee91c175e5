//! Overlapping absence detection.
//!
//! Records are partitioned by person and walked in start-date order while
//! tracking the latest end date seen so far. Two scans are offered:
//!
//! - [`detect_overlaps`] flags a record when it starts on or before the
//!   running end date, together with the record right before it the first
//!   time this happens for a person. The partner is the preceding record in
//!   sort order, which is not always the record that set the running end
//!   date: with `A = 1..10`, `B = 2..3`, `C = 20..25`, `D = 21..22` the scan
//!   flags `A, B, D` but not `C`, although `C` and `D` overlap.
//! - [`detect_interval_overlaps`] flags every member of every
//!   [`OverlapGroup`] and therefore also reports `C` in the example above.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{AbsenceRecord, EntityId};

/// Records of one person chained together by overlapping date ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapGroup {
    /// The person.
    pub entity: EntityId,
    /// Members in start-date order.
    pub members: Vec<AbsenceRecord>,
}

/// Sorts records by person, then start date.
///
/// The sort is stable, so records with the same person and start date keep
/// their input order.
pub fn sort_by_entity_and_start(records: &[AbsenceRecord]) -> Vec<AbsenceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        a.person_number
            .cmp(&b.person_number)
            .then(a.start_date.cmp(&b.start_date))
    });
    sorted
}

/// Scan state carried from one record to the next within a person.
#[derive(Debug, Clone, Copy, Default)]
struct ScanState<'a> {
    prev_end: Option<NaiveDate>,
    prev_row: Option<&'a AbsenceRecord>,
    overlap_seen: bool,
}

impl<'a> ScanState<'a> {
    /// Consumes one record, returning the next state and the records it flags.
    fn advance(self, row: &'a AbsenceRecord) -> (Self, Vec<&'a AbsenceRecord>) {
        let mut flagged = Vec::new();
        let mut overlap_seen = self.overlap_seen;

        let overlaps = matches!(self.prev_end, Some(end) if row.start_date <= end);
        if overlaps {
            if !overlap_seen {
                flagged.extend(self.prev_row);
                overlap_seen = true;
            }
            flagged.push(row);
        }

        let next = ScanState {
            prev_end: Some(self.prev_end.map_or(row.end_date, |end| end.max(row.end_date))),
            prev_row: Some(row),
            overlap_seen,
        };
        (next, flagged)
    }
}

/// Runs the running-chain scan and returns the flagged records.
///
/// Output is grouped by person in ascending order. A record appears once per
/// time it is flagged.
///
/// # Examples
///
/// ```
/// use absence_recon::models::{AbsenceRecord, EntityId};
/// use absence_recon::reconciliation::detect_overlaps;
/// use chrono::NaiveDate;
///
/// let absence = |id: &str, start: u32, end: u32| AbsenceRecord {
///     person_number: EntityId::new("E1"),
///     entry_id: id.to_string(),
///     start_date: NaiveDate::from_ymd_opt(2024, 1, start).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2024, 1, end).unwrap(),
///     duration: None,
///     unit: None,
///     line: 0,
///     cells: vec![],
/// };
///
/// let flagged = detect_overlaps(&[absence("a", 1, 10), absence("b", 5, 15)]);
/// let ids: Vec<&str> = flagged.iter().map(|r| r.entry_id.as_str()).collect();
/// assert_eq!(ids, vec!["a", "b"]);
/// ```
pub fn detect_overlaps(records: &[AbsenceRecord]) -> Vec<AbsenceRecord> {
    partition(records)
        .into_values()
        .flat_map(|rows| {
            let (_, flagged) = rows.into_iter().fold(
                (ScanState::default(), Vec::new()),
                |(state, mut flagged), row| {
                    let (next, hits) = state.advance(row);
                    flagged.extend(hits);
                    (next, flagged)
                },
            );
            flagged
        })
        .cloned()
        .collect()
}

/// Clusters each person's records into groups joined by the running end date.
///
/// A record joins the current group when it starts on or before the latest
/// end date of the group; otherwise it opens a new one. Single-record groups
/// are not returned.
pub fn overlap_groups(records: &[AbsenceRecord]) -> Vec<OverlapGroup> {
    let mut groups = Vec::new();

    for (entity, rows) in partition(records) {
        let mut current: Vec<&AbsenceRecord> = Vec::new();
        let mut group_end: Option<NaiveDate> = None;

        for row in rows {
            match group_end {
                Some(end) if row.start_date <= end => {
                    group_end = Some(end.max(row.end_date));
                }
                _ => {
                    push_group(&mut groups, &entity, std::mem::take(&mut current));
                    group_end = Some(row.end_date);
                }
            }
            current.push(row);
        }
        push_group(&mut groups, &entity, current);
    }

    groups
}

/// Flags every member of every overlap group.
pub fn detect_interval_overlaps(records: &[AbsenceRecord]) -> Vec<AbsenceRecord> {
    overlap_groups(records)
        .into_iter()
        .flat_map(|group| group.members)
        .collect()
}

fn push_group(groups: &mut Vec<OverlapGroup>, entity: &EntityId, members: Vec<&AbsenceRecord>) {
    if members.len() > 1 {
        groups.push(OverlapGroup {
            entity: entity.clone(),
            members: members.into_iter().cloned().collect(),
        });
    }
}

/// Groups records by person, each group stably sorted by start date.
fn partition(records: &[AbsenceRecord]) -> BTreeMap<EntityId, Vec<&AbsenceRecord>> {
    let mut by_entity: BTreeMap<EntityId, Vec<&AbsenceRecord>> = BTreeMap::new();
    for record in records {
        by_entity
            .entry(record.person_number.clone())
            .or_default()
            .push(record);
    }
    for rows in by_entity.values_mut() {
        rows.sort_by_key(|r| r.start_date);
    }
    by_entity
}
