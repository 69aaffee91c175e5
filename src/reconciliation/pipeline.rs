//! The reconciliation pipeline.
//!
//! Runs every stage in order over the five raw inputs and assembles the
//! report. Stages never mutate their inputs; each produces a new dataset.

use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{KeyPolicy, OverlapMode, ReconConfig};
use crate::error::ReconResult;
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, RawTable, ReconReport, ReportSummary, ResultTable,
    SourceKind,
};

use super::cross_source::{check_key_kinds, inner_join, reconcile};
use super::duplicates::split_duplicates;
use super::inconsistency::{find_inconsistencies, inconsistency_table};
use super::normalize::{normalize_fractioned, normalize_primary, normalize_secondary};
use super::overlaps::{detect_interval_overlaps, detect_overlaps, sort_by_entity_and_start};

/// The five uploaded exports, already read into raw tables.
#[derive(Debug, Clone, Default)]
pub struct ReconInputs {
    /// The HCM absence export.
    pub primary: RawTable,
    /// The fractioned-absence export.
    pub fractioned: RawTable,
    /// The total-absence export.
    pub total: RawTable,
    /// The monetary exports, combined into one logical table before use.
    pub monetary: Vec<RawTable>,
}

/// Sequential audit step builder.
struct Audit {
    steps: Vec<AuditStep>,
    warnings: Vec<AuditWarning>,
}

impl Audit {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn step(
        &mut self,
        stage_id: &str,
        stage_name: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: String,
    ) {
        debug!(stage = stage_id, %reasoning, "Stage completed");
        self.steps.push(AuditStep {
            step_number: self.steps.len() as u32 + 1,
            stage_id: stage_id.to_string(),
            stage_name: stage_name.to_string(),
            input,
            output,
            reasoning,
        });
    }

    fn warn(&mut self, code: &str, message: String) {
        warn!(code, %message, "Reconciliation warning");
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message,
        });
    }
}

/// Runs a complete reconciliation.
///
/// # Errors
///
/// Any normalization error aborts the run before a report is built. Under
/// [`KeyPolicy::Strict`] a key column stored differently from the primary one
/// fails with `JoinKeyMismatch`.
pub fn run(inputs: ReconInputs, config: &ReconConfig) -> ReconResult<ReconReport> {
    let start_time = Instant::now();
    let sources = &config.sources;
    let report = &config.report;
    let mut audit = Audit::new();

    // Normalization
    let primary = normalize_primary(&inputs.primary, &sources.primary, report.duration_decimals)?;
    let fractioned = normalize_fractioned(&inputs.fractioned, &sources.fractioned)?;
    let total = normalize_secondary(SourceKind::Total, &inputs.total, &sources.total)?;
    let monetary_inputs = inputs.monetary.len();
    let monetary = normalize_secondary(
        SourceKind::Monetary,
        &RawTable::concat(inputs.monetary),
        &sources.monetary,
    )?;

    info!(
        primary_rows = primary.len(),
        fractioned_rows = fractioned.records.len(),
        total_rows = total.records.len(),
        monetary_rows = monetary.records.len(),
        "Inputs normalized"
    );
    audit.step(
        "normalization",
        "Record Normalization",
        json!({
            "primary_rows": inputs.primary.len(),
            "fractioned_rows": inputs.fractioned.len(),
            "total_rows": inputs.total.len(),
            "monetary_inputs": monetary_inputs,
        }),
        json!({
            "primary_records": primary.len(),
            "fractioned_records": fractioned.records.len(),
            "total_records": total.records.len(),
            "monetary_records": monetary.records.len(),
        }),
        format!(
            "{} primary records normalized; downstream keys: {} fractioned, {} total, {} monetary",
            primary.len(),
            fractioned.records.len(),
            total.records.len(),
            monetary.records.len()
        ),
    );

    for (source, skipped) in [
        (SourceKind::Fractioned, fractioned.skipped_rows),
        (SourceKind::Total, total.skipped_rows),
        (SourceKind::Monetary, monetary.skipped_rows),
    ] {
        if skipped > 0 {
            audit.warn(
                "UNKEYED_ROWS",
                format!("{} {} row(s) without employee or start date were ignored", skipped, source),
            );
        }
    }

    // Key kinds
    let key_kinds = [
        (SourceKind::Fractioned, fractioned.key_kind()),
        (SourceKind::Total, total.key_kind()),
        (SourceKind::Monetary, monetary.key_kind()),
    ];
    match report.key_policy {
        KeyPolicy::Strict => check_key_kinds(&primary, &key_kinds)?,
        KeyPolicy::Canonical => {
            if let Err(err) = check_key_kinds(&primary, &key_kinds) {
                audit.warn(
                    "KEY_KIND_DIFFERS",
                    format!("{}; matched on canonical identifiers", err),
                );
            }
        }
    }

    // Duplicates
    let split = split_duplicates(&primary.records);
    info!(
        duplicate_rows = split.duplicates.len(),
        kept_rows = split.kept.len(),
        "Duplicate detection completed"
    );
    audit.step(
        "duplicate_detection",
        "Duplicate Detection",
        json!({ "records": primary.len() }),
        json!({
            "duplicate_rows": split.duplicates.len(),
            "duplicated_ids": split.duplicated_ids(),
            "kept": split.kept.len(),
        }),
        format!(
            "{} entry id(s) occur more than once across {} row(s); first occurrences kept",
            split.duplicated_ids(),
            split.duplicates.len()
        ),
    );

    let kept = sort_by_entity_and_start(&split.kept);

    // Overlaps
    let overlapping = match report.overlap_mode {
        OverlapMode::RunningChain => detect_overlaps(&kept),
        OverlapMode::IntervalGroups => detect_interval_overlaps(&kept),
    };
    info!(
        overlapping_rows = overlapping.len(),
        mode = ?report.overlap_mode,
        "Overlap detection completed"
    );
    audit.step(
        "overlap_detection",
        "Overlap Detection",
        json!({ "records": kept.len(), "mode": report.overlap_mode }),
        json!({ "flagged": overlapping.len() }),
        format!("{} record(s) flagged as overlapping", overlapping.len()),
    );

    // Cross-source
    let residuals = reconcile(&kept, &fractioned, &total, &monetary);
    info!(
        not_in_fractioned = residuals.not_in_fractioned.len(),
        not_in_total = residuals.not_in_total.len(),
        not_integrated = residuals.not_integrated.len(),
        "Cross-source reconciliation completed"
    );
    audit.step(
        "cross_source",
        "Cross-Source Reconciliation",
        json!({ "records": kept.len() }),
        json!({
            "not_in_fractioned": residuals.not_in_fractioned.len(),
            "not_in_total": residuals.not_in_total.len(),
            "not_integrated": residuals.not_integrated.len(),
        }),
        format!(
            "{} of {} record(s) have no match in any downstream export",
            residuals.not_integrated.len(),
            kept.len()
        ),
    );

    // Inconsistencies
    let matched = inner_join(&kept, &fractioned);
    let inconsistent = find_inconsistencies(&matched, &report.expected_unit);
    info!(
        matched_rows = matched.len(),
        inconsistent_rows = inconsistent.len(),
        "Inconsistency check completed"
    );
    audit.step(
        "inconsistency_check",
        "Duration and Unit Check",
        json!({ "matched": matched.len(), "expected_unit": report.expected_unit }),
        json!({
            "inconsistent": inconsistent.len(),
            "duration_mismatches": inconsistent.iter().filter(|r| r.duration_mismatch).count(),
            "unit_mismatches": inconsistent.iter().filter(|r| r.unit_mismatch).count(),
        }),
        format!(
            "{} of {} fractioned match(es) disagree on duration or unit",
            inconsistent.len(),
            matched.len()
        ),
    );

    // Report
    let sheets = &report.sheets;
    let columns = &primary.columns;
    let summary = ReportSummary {
        primary_rows: primary.len(),
        fractioned_rows: fractioned.records.len(),
        total_rows: total.records.len(),
        monetary_rows: monetary.records.len(),
        duplicate_rows: split.duplicates.len(),
        kept_rows: kept.len(),
        overlapping_rows: overlapping.len(),
        not_in_fractioned: residuals.not_in_fractioned.len(),
        not_in_total: residuals.not_in_total.len(),
        not_integrated: residuals.not_integrated.len(),
        matched_rows: matched.len(),
        inconsistent_rows: inconsistent.len(),
    };

    let recon_report = ReconReport {
        run_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        duplicates: ResultTable::from_absences(&sheets.duplicates, columns, &split.duplicates),
        not_integrated: ResultTable::from_absences(
            &sheets.not_integrated,
            columns,
            &residuals.not_integrated,
        ),
        overlapping: ResultTable::from_absences(&sheets.overlapping, columns, &overlapping),
        inconsistent: inconsistency_table(
            &sheets.inconsistent,
            columns,
            &fractioned.report_columns,
            &inconsistent,
        ),
        summary,
        audit_trace: AuditTrace {
            steps: audit.steps,
            warnings: audit.warnings,
            duration_us: start_time.elapsed().as_micros() as u64,
        },
    };

    info!(
        run_id = %recon_report.run_id,
        duration_us = recon_report.audit_trace.duration_us,
        "Reconciliation completed"
    );

    Ok(recon_report)
}
