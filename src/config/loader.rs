//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading reconciliation
//! configurations from YAML files.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{ReconError, ReconResult};

use super::types::{ReconConfig, ReportConfig, SourcesConfig};

/// Excel rejects sheet names longer than this.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Loads and validates reconciliation configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── sources.yaml   # Header offsets, column names and date formats per source
/// └── report.yaml    # Sheet names, expected unit and matching policies
/// ```
///
/// # Example
///
/// ```no_run
/// use absence_recon::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Expected unit: {}", loader.config().report.expected_unit);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: ReconConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if either file is missing, contains invalid YAML,
    /// or describes a configuration that cannot produce a valid workbook.
    pub fn load<P: AsRef<Path>>(path: P) -> ReconResult<Self> {
        let path = path.as_ref();

        let sources = Self::load_yaml::<SourcesConfig>(&path.join("sources.yaml"))?;
        let report = Self::load_yaml::<ReportConfig>(&path.join("report.yaml"))?;

        Self::from_config(ReconConfig::new(sources, report))
    }

    /// Wraps an in-memory configuration after validating it.
    pub fn from_config(config: ReconConfig) -> ReconResult<Self> {
        validate(&config)?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> ReconResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| ReconError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| ReconError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> ReconConfig {
        self.config
    }
}

fn validate(config: &ReconConfig) -> ReconResult<()> {
    let sources = &config.sources;
    let primary = &sources.primary;

    let mut columns: Vec<(String, &String)> = vec![
        ("primary.entity_column".to_string(), &primary.entity_column),
        ("primary.entry_id_column".to_string(), &primary.entry_id_column),
        ("primary.start_date_column".to_string(), &primary.start_date_column),
        ("primary.end_date_column".to_string(), &primary.end_date_column),
        ("primary.duration_column".to_string(), &primary.duration_column),
        ("primary.unit_column".to_string(), &primary.unit_column),
        ("primary.date_format".to_string(), &primary.date_format),
        ("fractioned.hours_column".to_string(), &sources.fractioned.hours_column),
    ];
    for (name, profile) in [
        ("fractioned", &sources.fractioned.source),
        ("total", &sources.total),
        ("monetary", &sources.monetary),
    ] {
        columns.push((format!("{}.entity_column", name), &profile.entity_column));
        columns.push((format!("{}.start_date_column", name), &profile.start_date_column));
        columns.push((format!("{}.date_format", name), &profile.date_format));
    }

    if let Some((field, _)) = columns.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ReconError::InvalidConfig {
            message: format!("{} must not be empty", field),
        });
    }

    let mut seen = HashSet::new();
    for sheet in config.report.sheets.in_order() {
        if sheet.trim().is_empty() {
            return Err(ReconError::InvalidConfig {
                message: "sheet names must not be empty".to_string(),
            });
        }
        if sheet.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(ReconError::InvalidConfig {
                message: format!(
                    "sheet name '{}' is longer than {} characters",
                    sheet, MAX_SHEET_NAME_LEN
                ),
            });
        }
        if !seen.insert(sheet.to_lowercase()) {
            return Err(ReconError::InvalidConfig {
                message: format!("sheet name '{}' is used twice", sheet),
            });
        }
    }

    if config.report.expected_unit.trim().is_empty() {
        return Err(ReconError::InvalidConfig {
            message: "expected_unit must not be empty".to_string(),
        });
    }

    Ok(())
}
