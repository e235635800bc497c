//! Minimal column-named table used for every remote payload and local CSV.
//!
//! Cells are `Option<String>`: `None` is a missing value. Only the columns
//! consumed by validation and reshaping get named access; everything else is
//! carried through untouched.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OmicsError;

/// Tokens read back as missing values, shared by TSV and CSV inputs.
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "NaN", "nan", "null", "NULL", "N/A", "n/a", "None", "#N/A",
];

pub type Row = Vec<Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, OmicsError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn push_row(&mut self, row: Row) -> Result<(), OmicsError> {
        if row.len() != self.columns.len() {
            return Err(OmicsError::Parse(format!(
                "row {} has {} cells but table has {} columns",
                self.rows.len() + 1,
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, OmicsError> {
        self.column_index(name).ok_or_else(|| {
            OmicsError::Validation(format!(
                "missing required column \"{name}\" (columns = {:?})",
                self.columns
            ))
        })
    }

    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = Option<&str>> + '_> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[index].as_deref()))
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    /// Appends `other` below `self` without reordering or deduplicating rows.
    ///
    /// Columns only present in `other` are added at the end; cells absent on
    /// either side become missing.
    pub fn append(&mut self, other: Table) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }

        let mapping = other
            .columns
            .iter()
            .map(|name| match self.column_index(name) {
                Some(index) => index,
                None => {
                    self.columns.push(name.clone());
                    self.columns.len() - 1
                }
            })
            .collect::<Vec<_>>();

        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, None);
        }
        for row in other.rows {
            let mut aligned = vec![None; width];
            for (cell, &target) in row.into_iter().zip(&mapping) {
                aligned[target] = cell;
            }
            self.rows.push(aligned);
        }
    }

    /// Sets `name` to `value` on every row, adding the column if needed.
    pub fn with_constant_column(mut self, name: &str, value: &str) -> Self {
        match self.column_index(name) {
            Some(index) => {
                for row in &mut self.rows {
                    row[index] = Some(value.to_string());
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Some(value.to_string()));
                }
            }
        }
        self
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(index) => {
                self.columns[index] = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn rename_columns<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> String,
    {
        for column in &mut self.columns {
            *column = rename(column);
        }
    }

    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(index) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        true
    }

    pub fn select(&self, names: &[&str]) -> Result<Table, OmicsError> {
        let indices = names
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Table {
            columns: names.iter().map(|name| name.to_string()).collect(),
            rows,
        })
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Option<String>]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Parses a tab-separated payload; every line after the header is data.
    pub fn parse_tsv(text: &str) -> Result<Self, OmicsError> {
        Self::read_delimited(text.as_bytes(), b'\t', None)
    }

    /// Parses a tab-separated payload whose `#` lines are comments, as the
    /// CGDS web service emits them.
    pub fn parse_commented_tsv(text: &str) -> Result<Self, OmicsError> {
        Self::read_delimited(text.as_bytes(), b'\t', Some(b'#'))
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, OmicsError> {
        Self::read_delimited(reader, b',', None)
    }

    pub fn read_csv(path: &Path) -> Result<Self, OmicsError> {
        let file = File::open(path)
            .map_err(|err| OmicsError::Filesystem(format!("open {}: {err}", path.display())))?;
        Self::from_csv_reader(file)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), OmicsError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer
            .flush()
            .map_err(|err| OmicsError::Filesystem(err.to_string()))?;
        Ok(())
    }

    fn read_delimited<R: Read>(
        reader: R,
        delimiter: u8,
        comment: Option<u8>,
    ) -> Result<Self, OmicsError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .comment(comment)
            .has_headers(true)
            .from_reader(reader);

        let columns = reader
            .headers()
            .map_err(|err| OmicsError::Parse(err.to_string()))?
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        if columns.is_empty() || columns.iter().all(|name| name.is_empty()) {
            return Err(OmicsError::Parse("payload has no header line".to_string()));
        }

        let mut table = Table::new(columns);
        for record in reader.records() {
            let record = record.map_err(|err| OmicsError::Parse(err.to_string()))?;
            table.push_row(record.iter().map(parse_cell).collect())?;
        }
        Ok(table)
    }
}

fn parse_cell(raw: &str) -> Option<String> {
    if MISSING_TOKENS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn cells(values: &[&str]) -> Row {
        values.iter().map(|v| parse_cell(v)).collect()
    }

    #[test]
    fn commented_tsv_skips_comments_and_marks_missing() {
        let text = "# Warning: unknown gene FOO\n\
                    GENE_ID\tCOMMON\tS1\tS2\n\
                    7157\tTP53\t1.5\tNaN\n\
                    672\tBRCA1\t\t-0.2\n";
        let table = Table::parse_commented_tsv(text).unwrap();
        assert_eq!(table.columns(), ["GENE_ID", "COMMON", "S1", "S2"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, 3), None);
        assert_eq!(table.value(1, 2), None);
        assert_eq!(table.value(1, 3), Some("-0.2"));
    }

    #[test]
    fn parse_tsv_rejects_ragged_rows() {
        let err = Table::parse_tsv("A\tB\n1\t2\t3\n").unwrap_err();
        assert_matches!(err, OmicsError::Parse(_));
    }

    #[test]
    fn parse_tsv_rejects_headerless_payload() {
        assert_matches!(
            Table::parse_commented_tsv("# only comments\n"),
            Err(OmicsError::Parse(_))
        );
    }

    #[test]
    fn plain_tsv_keeps_hash_leading_rows() {
        let text = "Gene\tProtein class\n#N/A\tEnzymes\n#TP53\tCD markers\n";
        let table = Table::parse_tsv(text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, 0), None);
        assert_eq!(table.value(1, 0), Some("#TP53"));
    }

    #[test]
    fn csv_roundtrip_keeps_hash_leading_cells() {
        let table = Table::from_rows(
            vec!["Gene".into(), "Value".into()],
            vec![cells(&["#TP53", "1"]), cells(&["EGFR", "2"])],
        )
        .unwrap();
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let back = Table::from_csv_reader(buffer.as_slice()).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.value(0, 0), Some("#TP53"));
    }

    #[test]
    fn append_unions_columns_in_order() {
        let mut first = Table::from_rows(
            vec!["GENE_ID".into(), "S1".into()],
            vec![cells(&["1", "0.1"])],
        )
        .unwrap();
        let second = Table::from_rows(
            vec!["S2".into(), "GENE_ID".into()],
            vec![cells(&["0.9", "2"])],
        )
        .unwrap();
        first.append(second);

        assert_eq!(first.columns(), ["GENE_ID", "S1", "S2"]);
        assert_eq!(first.rows()[0], cells(&["1", "0.1", ""]));
        assert_eq!(first.rows()[1], cells(&["2", "", "0.9"]));
    }

    #[test]
    fn append_to_empty_adopts_other() {
        let mut empty = Table::default();
        let other = Table::from_rows(vec!["A".into()], vec![cells(&["x"])]).unwrap();
        empty.append(other.clone());
        assert_eq!(empty, other);
    }

    #[test]
    fn csv_roundtrip_keeps_missing_cells() {
        let table = Table::from_rows(
            vec!["Gene".into(), "Value".into()],
            vec![cells(&["TP53", ""]), cells(&["EGFR, ERBB1", "2"])],
        )
        .unwrap();
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let back = Table::from_csv_reader(buffer.as_slice()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn select_and_drop() {
        let mut table = Table::from_rows(
            vec!["A".into(), "B".into(), "C".into()],
            vec![cells(&["1", "2", "3"])],
        )
        .unwrap();
        let picked = table.select(&["C", "A"]).unwrap();
        assert_eq!(picked.rows()[0], cells(&["3", "1"]));
        assert_matches!(table.select(&["Z"]), Err(OmicsError::Validation(_)));

        assert!(table.drop_column("B"));
        assert_eq!(table.columns(), ["A", "C"]);
        assert!(!table.drop_column("B"));
    }
}
