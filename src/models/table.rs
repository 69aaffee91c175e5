//! Raw tables as read from the input workbooks.

use std::collections::HashMap;

use crate::error::{ReconError, ReconResult};

use super::cell::Cell;

/// One data row of a raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// The 1-based row number in the source sheet.
    pub line: usize,
    /// One cell per table column.
    pub cells: Vec<Cell>,
}

/// A header row plus data rows, before any typing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    /// Creates a table from column names and rows of cells.
    ///
    /// Rows are numbered as if the header sat on sheet row 1. Short rows are
    /// padded with blanks and long rows truncated to the header width.
    ///
    /// # Examples
    ///
    /// ```
    /// use absence_recon::models::{Cell, RawTable};
    ///
    /// let table = RawTable::from_rows(
    ///     vec!["ID".to_string(), "Horas".to_string()],
    ///     vec![vec![Cell::Number(1001.0)]],
    /// );
    /// assert_eq!(table.rows()[0].line, 2);
    /// assert_eq!(table.rows()[0].cells, vec![Cell::Number(1001.0), Cell::Empty]);
    /// ```
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, cells)| RawRow {
                line: idx + 2,
                cells: fit_width(cells, width),
            })
            .collect();
        Self { columns, rows }
    }

    /// Builds a table from a sheet grid.
    ///
    /// The first `skip_rows` grid rows are discarded, the next one is the
    /// header, and fully blank data rows are dropped. Header names follow the
    /// usual dataframe conventions: a blank header becomes `Unnamed: <index>`
    /// and repeated names get `.1`, `.2`, ... suffixes.
    pub fn from_grid(input: &str, grid: Vec<Vec<Cell>>, skip_rows: usize) -> ReconResult<Self> {
        let mut grid = grid.into_iter().enumerate().skip(skip_rows);

        let Some((_, header)) = grid.next() else {
            return Err(ReconError::MissingHeader {
                input: input.to_string(),
                skip_rows,
            });
        };

        let columns = header_names(&header);
        let width = columns.len();

        let rows = grid
            .filter(|(_, cells)| cells.iter().any(|cell| !cell.is_empty()))
            .map(|(idx, cells)| RawRow {
                line: idx + 1,
                cells: fit_width(cells, width),
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Stacks tables on top of each other.
    ///
    /// The result has the union of all columns in order of first appearance;
    /// cells for columns a table lacks are blank.
    pub fn concat(tables: Vec<RawTable>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let positions: Vec<usize> = columns
                .iter()
                .map(|c| table.column_index(c).unwrap_or(usize::MAX))
                .collect();
            for row in table.rows {
                let cells = positions
                    .iter()
                    .map(|&pos| row.cells.get(pos).cloned().unwrap_or(Cell::Empty))
                    .collect();
                rows.push(RawRow {
                    line: row.line,
                    cells,
                });
            }
        }

        Self { columns, rows }
    }

    /// The column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The data rows.
    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a column, or `MissingColumn` naming the input.
    pub fn require_column(&self, input: &str, name: &str) -> ReconResult<usize> {
        self.column_index(name)
            .ok_or_else(|| ReconError::MissingColumn {
                input: input.to_string(),
                column: name.to_string(),
            })
    }
}

fn fit_width(mut cells: Vec<Cell>, width: usize) -> Vec<Cell> {
    cells.resize(width, Cell::Empty);
    cells
}

fn header_names(header: &[Cell]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell.display().trim() {
                "" => format!("Unnamed: {}", idx),
                name => name.to_string(),
            };
            let seen = counts.entry(base.clone()).or_insert(0);
            let name = if *seen == 0 {
                base
            } else {
                format!("{}.{}", base, seen)
            };
            *seen += 1;
            name
        })
        .collect()
}
