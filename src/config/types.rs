//! Configuration types for absence reconciliation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML files in a configuration directory.

use serde::{Deserialize, Serialize};

/// Column layout of the primary (HCM) absence export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimarySourceConfig {
    /// Rows above the header row.
    pub header_skip_rows: usize,
    /// Column holding the person number.
    pub entity_column: String,
    /// Column holding the absence entry identifier.
    pub entry_id_column: String,
    /// Column holding the absence start date.
    pub start_date_column: String,
    /// Column holding the absence end date.
    pub end_date_column: String,
    /// Column holding the absence duration.
    pub duration_column: String,
    /// Column holding the unit of measure of the duration.
    pub unit_column: String,
    /// `chrono` format used for dates stored as text.
    pub date_format: String,
}

/// Column layout shared by the secondary exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondarySourceConfig {
    /// Rows above the header row.
    pub header_skip_rows: usize,
    /// Column holding the employee identifier.
    pub entity_column: String,
    /// Column holding the absence start date.
    pub start_date_column: String,
    /// `chrono` format used for dates stored as text.
    pub date_format: String,
}

/// Column layout of the fractioned-absence export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractionedSourceConfig {
    /// Key columns and header offset.
    #[serde(flatten)]
    pub source: SecondarySourceConfig,
    /// Column holding the hours recorded downstream.
    pub hours_column: String,
    /// Columns copied next to the primary columns in the duration-error sheet.
    pub report_columns: Vec<String>,
}

/// Source profiles, from `sources.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// The authoritative absence export.
    pub primary: PrimarySourceConfig,
    /// Absences recorded as fractions of a day.
    pub fractioned: FractionedSourceConfig,
    /// Whole-day absences.
    pub total: SecondarySourceConfig,
    /// Absences paid out as money. Both monetary uploads share this profile.
    pub monetary: SecondarySourceConfig,
}

/// How entity identifiers from different sources are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Compare canonical identifier text; `1001` and `"1001"` match.
    #[default]
    Canonical,
    /// Fail with `JoinKeyMismatch` when key columns were read as different kinds.
    Strict,
}

/// Which overlap scan to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapMode {
    /// Pairwise scan against the immediately preceding record.
    #[default]
    RunningChain,
    /// Flag every member of every overlap group.
    IntervalGroups,
}

/// Sheet names of the result workbook, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetNames {
    /// Duplicated entry identifiers.
    pub duplicates: String,
    /// Absences found in no downstream system.
    pub not_integrated: String,
    /// Overlapping absences.
    pub overlapping: String,
    /// Duration and unit mismatches.
    pub inconsistent: String,
}

impl SheetNames {
    /// Returns the names in sheet order.
    pub fn in_order(&self) -> [&str; 4] {
        [
            &self.duplicates,
            &self.not_integrated,
            &self.overlapping,
            &self.inconsistent,
        ]
    }
}

/// Report and policy settings, from `report.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// The only unit of measure accepted downstream.
    pub expected_unit: String,
    /// Decimal places durations are rounded to.
    pub duration_decimals: u32,
    /// Identifier comparison policy.
    #[serde(default)]
    pub key_policy: KeyPolicy,
    /// Overlap scan.
    #[serde(default)]
    pub overlap_mode: OverlapMode,
    /// File name offered for the result workbook.
    pub output_file_name: String,
    /// Result sheet names.
    pub sheets: SheetNames,
}

/// The complete reconciliation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Source profiles.
    pub sources: SourcesConfig,
    /// Report settings.
    pub report: ReportConfig,
}

impl ReconConfig {
    /// Creates a configuration from its two parts.
    pub fn new(sources: SourcesConfig, report: ReportConfig) -> Self {
        Self { sources, report }
    }
}

impl Default for ReconConfig {
    /// The layout of the HCM, PeopleSoft and payroll exports shipped in `config/default`.
    fn default() -> Self {
        let secondary = |skip: usize, entity: &str, date: &str| SecondarySourceConfig {
            header_skip_rows: skip,
            entity_column: entity.to_string(),
            start_date_column: date.to_string(),
            date_format: "%Y-%m-%d".to_string(),
        };

        let sources = SourcesConfig {
            primary: PrimarySourceConfig {
                header_skip_rows: 1,
                entity_column: "PERSON_NUMBER".to_string(),
                entry_id_column: "PER_ABSENCE_ENTRY_ID".to_string(),
                start_date_column: "START_DATE".to_string(),
                end_date_column: "END_DATE".to_string(),
                duration_column: "DURATION".to_string(),
                unit_column: "UOM".to_string(),
                date_format: "%d/%m/%Y".to_string(),
            },
            fractioned: FractionedSourceConfig {
                source: secondary(0, "ID", "Fecha Inicio"),
                hours_column: "Horas".to_string(),
                report_columns: [
                    "ID",
                    "Nombre",
                    "Fecha Inicio",
                    "Horas",
                    "Usuario",
                    "Instancia",
                    "Instancia.1",
                    "Recepción",
                    "Processed",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            },
            total: secondary(0, "ID", "Fecha Inicio Real"),
            monetary: secondary(6, "Id Empleado", "Fecha Inicio Disfrute"),
        };

        let report = ReportConfig {
            expected_unit: "Horas".to_string(),
            duration_decimals: 2,
            key_policy: KeyPolicy::Canonical,
            overlap_mode: OverlapMode::RunningChain,
            output_file_name: "resultado.xlsx".to_string(),
            sheets: SheetNames {
                duplicates: "Duplicados HCM".to_string(),
                not_integrated: "No integradas".to_string(),
                overlapping: "Solapadas HCM".to_string(),
                inconsistent: "Error Duracion".to_string(),
            },
        };

        Self { sources, report }
    }
}
