//! Error types for the absence reconciliation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while loading configuration,
//! reading the input workbooks, normalizing records and writing the report.

use thiserror::Error;

/// The main error type for the reconciliation engine.
///
/// Every stage of a run returns this error type. A run never produces a
/// partial report: the first error aborts the whole batch.
///
/// # Example
///
/// ```
/// use absence_recon::error::ReconError;
///
/// let error = ReconError::MissingColumn {
///     input: "primary".to_string(),
///     column: "START_DATE".to_string(),
/// };
/// assert_eq!(error.to_string(), "primary: required column 'START_DATE' not found");
/// assert!(error.is_parse_error());
/// ```
#[derive(Debug, Error)]
pub enum ReconError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but is not usable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        message: String,
    },

    /// An input workbook could not be opened or its first sheet read.
    #[error("{input}: cannot read workbook: {message}")]
    WorkbookRead {
        /// The input the workbook was uploaded for.
        input: String,
        /// The reader's error message.
        message: String,
    },

    /// The sheet ends before the header row.
    #[error("{input}: no header row after skipping {skip_rows} row(s)")]
    MissingHeader {
        /// The input being normalized.
        input: String,
        /// The configured number of rows skipped before the header.
        skip_rows: usize,
    },

    /// A required column is absent from the header row.
    #[error("{input}: required column '{column}' not found")]
    MissingColumn {
        /// The input being normalized.
        input: String,
        /// The missing column name.
        column: String,
    },

    /// A required cell is blank.
    #[error("{input}, row {row}: column '{column}' is empty")]
    MissingValue {
        /// The input being normalized.
        input: String,
        /// The 1-based sheet row.
        row: usize,
        /// The column holding the blank cell.
        column: String,
    },

    /// A date cell does not match the source's date format.
    #[error("{input}, row {row}: cannot parse '{value}' in column '{column}' as a date ({format})")]
    InvalidDate {
        /// The input being normalized.
        input: String,
        /// The 1-based sheet row.
        row: usize,
        /// The date column.
        column: String,
        /// The offending cell text.
        value: String,
        /// The expected `chrono` format string.
        format: String,
    },

    /// A numeric cell holds something that is not a number.
    #[error("{input}, row {row}: cannot parse '{value}' in column '{column}' as a number")]
    InvalidNumber {
        /// The input being normalized.
        input: String,
        /// The 1-based sheet row.
        row: usize,
        /// The numeric column.
        column: String,
        /// The offending cell text.
        value: String,
    },

    /// Join key columns were read as different kinds under the strict key policy.
    #[error("Join key mismatch: {left} entity ids are {left_kind}, {right} entity ids are {right_kind}")]
    JoinKeyMismatch {
        /// The left side of the join (always the primary source).
        left: String,
        /// The kind of the left key column.
        left_kind: String,
        /// The secondary source.
        right: String,
        /// The kind of the right key column.
        right_kind: String,
    },

    /// The result workbook could not be written.
    #[error("Failed to write report: {message}")]
    ReportWrite {
        /// A description of the write error.
        message: String,
    },
}

impl ReconError {
    /// Returns true for errors raised while reading or normalizing an input.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::WorkbookRead { .. }
                | Self::MissingHeader { .. }
                | Self::MissingColumn { .. }
                | Self::MissingValue { .. }
                | Self::InvalidDate { .. }
                | Self::InvalidNumber { .. }
        )
    }
}

/// A type alias for Results that return ReconError.
pub type ReconResult<T> = Result<T, ReconError>;
