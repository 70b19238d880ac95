//! Backend-neutral view of a table as rows of text cells.
//!
//! Word tables and worksheet grids both implement [`TableHandle`]; header and totals
//! discovery only need the read side, [`TableView`].

use crate::error::OfferError;

/// Read access to a rectangular-ish grid of text cells. Rows may have different widths.
pub trait TableView {
    fn row_count(&self) -> usize;

    /// Number of cells in `row`, or 0 when the row does not exist.
    fn cell_count(&self, row: usize) -> usize;

    /// Plain text of a cell, `None` when out of range.
    fn cell_text(&self, row: usize, col: usize) -> Option<String>;
}

/// Mutations needed to synthesise goods rows.
///
/// Clones copy cell formatting along with content. Indices are zero-based and always
/// refer to the table as it is at the moment of the call.
pub trait TableHandle: TableView {
    /// Replace the text of a cell, keeping its character formatting.
    fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<(), OfferError>;

    /// Insert a copy of `source` so that it ends up at index `before`.
    fn clone_row_before(&mut self, source: usize, before: usize) -> Result<(), OfferError>;

    /// Append a copy of `source` after the last row.
    fn clone_row_to_end(&mut self, source: usize) -> Result<(), OfferError>;

    fn delete_row(&mut self, row: usize) -> Result<(), OfferError>;
}

fn out_of_range(row: usize, rows: usize) -> OfferError {
    OfferError::RowOutOfRange { row, rows }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCell {
    pub text: String,
    pub bold: bool,
}

/// In-memory table used to exercise the synthesis logic without a document backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTable {
    rows: Vec<Vec<MemoryCell>>,
}

impl MemoryTable {
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|text| MemoryCell {
                            text: text.to_string(),
                            bold: false,
                        })
                        .collect()
                })
                .collect(),
        }
    }

    pub fn set_bold(&mut self, row: usize, col: usize) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            cell.bold = true;
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&MemoryCell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// All cell texts, row by row.
    pub fn texts(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.text.clone()).collect())
            .collect()
    }
}

impl TableView for MemoryTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell_count(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col).map(|cell| cell.text.clone())
    }
}

impl TableHandle for MemoryTable {
    fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<(), OfferError> {
        let rows = self.rows.len();
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or_else(|| out_of_range(row, rows))?;
        cell.text = text.to_string();
        Ok(())
    }

    fn clone_row_before(&mut self, source: usize, before: usize) -> Result<(), OfferError> {
        let rows = self.rows.len();
        let copy = self
            .rows
            .get(source)
            .cloned()
            .ok_or_else(|| out_of_range(source, rows))?;
        if before > rows {
            return Err(out_of_range(before, rows));
        }
        self.rows.insert(before, copy);
        Ok(())
    }

    fn clone_row_to_end(&mut self, source: usize) -> Result<(), OfferError> {
        let rows = self.rows.len();
        let copy = self
            .rows
            .get(source)
            .cloned()
            .ok_or_else(|| out_of_range(source, rows))?;
        self.rows.push(copy);
        Ok(())
    }

    fn delete_row(&mut self, row: usize) -> Result<(), OfferError> {
        if row >= self.rows.len() {
            return Err(out_of_range(row, self.rows.len()));
        }
        self.rows.remove(row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clone_before_copies_formatting() {
        let mut table = MemoryTable::from_rows(&[&["a", "1"], &["b", "2"]]);
        table.set_bold(0, 0);
        table.clone_row_before(0, 2).unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(2, 0).unwrap().text, "a");
        assert!(table.cell(2, 0).unwrap().bold);
    }

    #[test]
    fn test_clone_to_end_and_delete() {
        let mut table = MemoryTable::from_rows(&[&["a"], &["b"]]);
        table.clone_row_to_end(0).unwrap();
        table.delete_row(0).unwrap();
        assert_eq!(table.texts(), vec![vec!["b"], vec!["a"]]);
    }

    #[test]
    fn test_out_of_range_errors() {
        let mut table = MemoryTable::from_rows(&[&["a"]]);
        assert!(matches!(
            table.delete_row(3),
            Err(OfferError::RowOutOfRange { row: 3, rows: 1 })
        ));
        assert!(table.set_cell_text(0, 5, "x").is_err());
        assert!(table.clone_row_before(0, 7).is_err());
        assert_eq!(table.cell_text(0, 5), None);
        assert_eq!(table.cell_count(9), 0);
    }
}
