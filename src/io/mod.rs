//! Workbook input and output.
//!
//! Inputs are read with calamine, results are written with rust_xlsxwriter.

mod export;
mod workbook;

pub use export::{save_report, write_report};
pub use workbook::{read_table, read_table_from_path};
