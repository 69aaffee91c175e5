// Property-based tests for the reconciliation stages.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use absence_recon::models::{
    AbsenceRecord, EntityId, FractionedRecord, FractionedTable, MatchKey, SecondaryRecord,
    SecondaryTable, SourceKind,
};
use absence_recon::reconciliation::{
    detect_interval_overlaps, detect_overlaps, find_inconsistencies, inner_join, reconcile,
    split_duplicates,
};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

fn record(person: &str, entry_id: String, start: i64, length: i64, hours: i64) -> AbsenceRecord {
    AbsenceRecord {
        person_number: EntityId::new(person),
        entry_id,
        start_date: day(start),
        end_date: day(start + length),
        duration: Some(Decimal::new(hours, 0)),
        unit: Some("Horas".to_string()),
        line: 0,
        cells: vec![],
    }
}

/// (person, entry id, start offset, length, hours)
fn arb_row() -> impl Strategy<Value = (String, u32, i64, i64, i64)> {
    (
        prop_oneof![Just("1001"), Just("1002"), Just("E3")].prop_map(String::from),
        0u32..12,
        0i64..60,
        0i64..8,
        1i64..10,
    )
}

fn arb_records() -> impl Strategy<Value = Vec<AbsenceRecord>> {
    prop::collection::vec(arb_row(), 0..30).prop_map(|rows| {
        rows.into_iter()
            .map(|(p, id, start, len, hours)| record(&p, id.to_string(), start, len, hours))
            .collect()
    })
}

fn arb_unique_records() -> impl Strategy<Value = Vec<AbsenceRecord>> {
    prop::collection::vec(arb_row(), 0..30).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (p, _, start, len, hours))| record(&p, i.to_string(), start, len, hours))
            .collect()
    })
}

/// One person's records laid end to end with at least one free day between them.
fn arb_disjoint_records() -> impl Strategy<Value = Vec<AbsenceRecord>> {
    prop::collection::vec((1i64..5, 0i64..6), 0..15).prop_map(|spans| {
        let mut start = 0;
        let mut records: Vec<AbsenceRecord> = spans
            .into_iter()
            .enumerate()
            .map(|(i, (gap, len))| {
                start += gap;
                let r = record("1001", i.to_string(), start, len, 8);
                start += len + 1;
                r
            })
            .collect();
        records.reverse();
        records
    })
}

fn arb_keys() -> impl Strategy<Value = Vec<MatchKey>> {
    prop::collection::vec(
        (
            prop_oneof![Just("1001"), Just("1002"), Just("E3")],
            0i64..60,
        ),
        0..20,
    )
    .prop_map(|keys| {
        keys.into_iter()
            .map(|(p, start)| MatchKey::new(EntityId::new(p), day(start)))
            .collect()
    })
}

fn fractioned(keys: &[MatchKey], hours: i64) -> FractionedTable {
    FractionedTable::new(
        vec![],
        keys.iter()
            .map(|key| FractionedRecord {
                key: key.clone(),
                hours: Some(Decimal::new(hours, 0)),
                line: 0,
                report_cells: vec![],
            })
            .collect(),
    )
}

fn secondary(source: SourceKind, keys: &[MatchKey]) -> SecondaryTable {
    SecondaryTable::new(
        source,
        keys.iter()
            .map(|key| SecondaryRecord {
                key: key.clone(),
                line: 0,
            })
            .collect(),
    )
}

fn entry_ids(records: &[AbsenceRecord]) -> HashSet<&str> {
    records.iter().map(|r| r.entry_id.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Duplicates
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn unique_ids_have_no_duplicates(records in arb_unique_records()) {
        let split = split_duplicates(&records);
        prop_assert!(split.duplicates.is_empty());
        prop_assert_eq!(split.kept, records);
    }

    #[test]
    fn kept_holds_each_id_once(records in arb_records()) {
        let split = split_duplicates(&records);
        let ids: Vec<&str> = split.kept.iter().map(|r| r.entry_id.as_str()).collect();
        let distinct: HashSet<&str> = ids.iter().copied().collect();

        prop_assert_eq!(ids.len(), distinct.len());
        prop_assert_eq!(distinct, entry_ids(&records));
    }

    #[test]
    fn duplicates_are_exactly_the_repeated_ids(records in arb_records()) {
        let split = split_duplicates(&records);
        for record in &records {
            let count = records.iter().filter(|r| r.entry_id == record.entry_id).count();
            let reported = split.duplicates.iter().filter(|r| r.entry_id == record.entry_id).count();
            prop_assert_eq!(reported, if count > 1 { count } else { 0 });
        }
    }
}

// ---------------------------------------------------------------------------
// Overlaps
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn disjoint_intervals_are_never_flagged(records in arb_disjoint_records()) {
        prop_assert!(detect_overlaps(&records).is_empty());
        prop_assert!(detect_interval_overlaps(&records).is_empty());
    }

    #[test]
    fn running_chain_flags_are_within_interval_groups(records in arb_unique_records()) {
        let chain = detect_overlaps(&records);
        let groups = detect_interval_overlaps(&records);
        prop_assert!(entry_ids(&chain).is_subset(&entry_ids(&groups)));
    }

    #[test]
    fn flagged_records_overlap_a_same_person_record(records in arb_unique_records()) {
        for flagged in detect_interval_overlaps(&records) {
            let has_partner = records.iter().any(|other| {
                other.entry_id != flagged.entry_id
                    && other.person_number == flagged.person_number
                    && other.start_date <= flagged.end_date
                    && flagged.start_date <= other.end_date
            });
            prop_assert!(has_partner);
        }
    }
}

// ---------------------------------------------------------------------------
// Cross-source reconciliation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn residuals_never_grow(
        kept in arb_unique_records(),
        f in arb_keys(),
        t in arb_keys(),
        m in arb_keys()
    ) {
        let residuals = reconcile(
            &kept,
            &fractioned(&f, 8),
            &secondary(SourceKind::Total, &t),
            &secondary(SourceKind::Monetary, &m),
        );

        prop_assert!(residuals.not_in_fractioned.len() <= kept.len());
        prop_assert!(residuals.not_in_total.len() <= residuals.not_in_fractioned.len());
        prop_assert!(residuals.not_integrated.len() <= residuals.not_in_total.len());
    }

    #[test]
    fn not_integrated_has_no_downstream_match(
        kept in arb_unique_records(),
        f in arb_keys(),
        t in arb_keys(),
        m in arb_keys()
    ) {
        let residuals = reconcile(
            &kept,
            &fractioned(&f, 8),
            &secondary(SourceKind::Total, &t),
            &secondary(SourceKind::Monetary, &m),
        );

        for record in &residuals.not_integrated {
            let key = record.match_key();
            prop_assert!(!f.contains(&key));
            prop_assert!(!t.contains(&key));
            prop_assert!(!m.contains(&key));
        }
        for record in &kept {
            let key = record.match_key();
            let found = f.contains(&key) || t.contains(&key) || m.contains(&key);
            prop_assert_eq!(
                found,
                !residuals.not_integrated.iter().any(|r| r.entry_id == record.entry_id)
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Inconsistencies
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn matched_hours_decide_inconsistency(kept in arb_unique_records(), hours in 1i64..10) {
        let keys: Vec<MatchKey> = kept.iter().map(|r| r.match_key()).collect();
        let matched = inner_join(&kept, &fractioned(&keys, hours));
        let found = find_inconsistencies(&matched, "Horas");

        let expected = matched
            .iter()
            .filter(|pair| pair.absence.duration != Some(Decimal::new(hours, 0)))
            .count();
        prop_assert_eq!(found.len(), expected);
        prop_assert!(found.iter().all(|r| r.duration_mismatch && !r.unit_mismatch));
    }
}
