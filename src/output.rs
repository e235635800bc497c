use std::path::Path;

use tracing::info;

use crate::error::OmicsError;
use crate::fs_util::write_file_atomic;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
}

impl TableSummary {
    pub fn of(table: &Table) -> Self {
        let missing_cells = table
            .rows()
            .iter()
            .map(|row| row.iter().filter(|cell| cell.is_none()).count())
            .sum();
        Self {
            rows: table.len(),
            columns: table.width(),
            missing_cells,
        }
    }
}

pub struct CsvOutput;

impl CsvOutput {
    /// Writes `table` to `path` as CSV and logs a short summary under `label`.
    pub fn write(table: &Table, path: &Path, label: &str) -> Result<TableSummary, OmicsError> {
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer)?;
        write_file_atomic(path, &buffer)?;

        let summary = TableSummary::of(table);
        info!(
            rows = summary.rows,
            columns = summary.columns,
            missing_cells = summary.missing_cells,
            column_names = ?table.columns(),
            output = %path.display(),
            "{label} result written"
        );
        Ok(summary)
    }
}
