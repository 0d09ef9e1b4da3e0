//! Tabular values.

use serde::{Deserialize, Serialize};

/// A reconstructed table: one header row followed by data rows.
///
/// Every data row has exactly as many cells as the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column headers
    pub header: Vec<String>,

    /// Data rows, left to right
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given header and no rows.
    pub fn with_header<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from row-major strings; the first row is the header.
    ///
    /// Rows shorter than the header are padded with empty strings, longer
    /// rows are truncated.
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rows = rows.into_iter();
        let mut table = match rows.next() {
            Some(header) => Self::with_header(header),
            None => return Self::new(),
        };
        for row in rows {
            table.add_row(row);
        }
        table
    }

    /// Add a data row, fitting it to the header width.
    ///
    /// Returns `true` if the row had to be padded or truncated.
    pub fn add_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) -> bool {
        let mut cells: Vec<String> = row.into_iter().map(Into::into).collect();
        let width = self.header.len();
        let adjusted = cells.len() != width;
        if adjusted {
            log::debug!(
                "Table: fitting row of {} cells to {} columns",
                cells.len(),
                width
            );
            cells.resize(width, String::new());
        }
        self.rows.push(cells);
        adjusted
    }

    /// Get the number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Check if the table has no header.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        std::iter::once(&self.header)
            .chain(self.rows.iter())
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn test_from_rows() {
        let table = Table::from_rows([["Name", "Age"], ["Alice", "30"], ["Bob", "25"]]);
        assert_eq!(table.header, vec!["Name", "Age"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.plain_text(), "Name\tAge\nAlice\t30\nBob\t25");
    }

    #[test]
    fn test_rows_fit_header_width() {
        let mut table = Table::with_header(["a", "b", "c"]);
        assert!(table.add_row(["1"]));
        assert!(table.add_row(["1", "2", "3", "4"]));
        assert!(!table.add_row(["x", "y", "z"]));

        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_from_no_rows() {
        let rows: Vec<Vec<String>> = Vec::new();
        assert!(Table::from_rows(rows).is_empty());
    }
}
