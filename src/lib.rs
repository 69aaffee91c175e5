//! Absence reconciliation engine.
//!
//! This crate reconciles the absence records of an HCM export against the
//! fractioned, total and monetary absence exports of the payroll side, and
//! reports duplicated entries, overlapping absences, absences that never
//! reached payroll, and duration or unit mismatches.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod reconciliation;
