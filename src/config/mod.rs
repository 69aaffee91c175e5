//! Configuration loading and management for the reconciliation engine.
//!
//! This module provides functionality to load source profiles (header
//! offsets, column names, date formats) and report settings (sheet names,
//! expected unit, matching policies) from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use absence_recon::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/default").unwrap();
//! println!("Primary skips {} row(s)", loader.config().sources.primary.header_skip_rows);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    FractionedSourceConfig, KeyPolicy, OverlapMode, PrimarySourceConfig, ReconConfig,
    ReportConfig, SecondarySourceConfig, SheetNames, SourcesConfig,
};
