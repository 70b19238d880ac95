//! Goods table header discovery.
//!
//! Word templates often split a header over two rows ("Цена" above "за ед., руб."),
//! so bindings accumulate across rows there. Spreadsheet sources and templates use a
//! single header row that must carry every required column on its own.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::OfferError;
use crate::normalize::{normalize_compact, normalize_text};
use crate::table::TableView;
use crate::vocabulary::{ColumnRole, HeaderSynonyms};

/// Column index bound to each recognised role. Always holds name, quantity and
/// at least one of unit price or amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoleMap {
    columns: BTreeMap<ColumnRole, usize>,
}

impl ColumnRoleMap {
    pub fn new(columns: BTreeMap<ColumnRole, usize>) -> Result<Self, OfferError> {
        let missing = missing_roles(&columns, &[ColumnRole::Name, ColumnRole::Quantity]);
        if !missing.is_empty() {
            return Err(OfferError::TableStructure(format!(
                "missing {} column(s)",
                describe(&missing)
            )));
        }
        if !has_money_column(&columns) {
            return Err(OfferError::TableStructure(
                "missing both unit price and amount columns".to_string(),
            ));
        }
        Ok(Self { columns })
    }

    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    pub fn name(&self) -> usize {
        self.columns[&ColumnRole::Name]
    }

    pub fn quantity(&self) -> usize {
        self.columns[&ColumnRole::Quantity]
    }

    /// Column that receives totals: amount, else unit price. `new` guarantees one of them.
    pub fn totals_column(&self) -> usize {
        match self.get(ColumnRole::Amount) {
            Some(col) => col,
            None => self.columns[&ColumnRole::UnitPrice],
        }
    }

    pub fn is_mapped(&self, col: usize) -> bool {
        self.columns.values().any(|&c| c == col)
    }

    /// Bindings in role order.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnRole, usize)> + '_ {
        self.columns.iter().map(|(role, col)| (*role, *col))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    pub start_row: usize,
    /// Last row that contributed a binding. The sample row follows it.
    pub end_row: usize,
    pub columns: ColumnRoleMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSpan {
    /// Bindings accumulate across consecutive rows.
    MultiRow,
    /// Every required role must be found in one row.
    SingleRow,
}

/// How far to scan and which roles a header must carry.
#[derive(Debug, Clone, Copy)]
pub struct HeaderOptions {
    pub max_rows: usize,
    pub max_cols: Option<usize>,
    pub span: HeaderSpan,
    /// Roles that must be bound. A unit price or amount column is always required too.
    pub required: &'static [ColumnRole],
    pub normalize: fn(&str) -> String,
}

impl HeaderOptions {
    /// Word tables: first five rows, header may span rows.
    pub fn word_table() -> Self {
        Self {
            max_rows: 5,
            max_cols: None,
            span: HeaderSpan::MultiRow,
            required: &[ColumnRole::Name, ColumnRole::Quantity],
            normalize: normalize_text,
        }
    }

    /// Worksheet grids: one row within the top-left 120 x 60 region with name, quantity,
    /// unit and unit price all present.
    pub fn spreadsheet() -> Self {
        Self {
            max_rows: 120,
            max_cols: Some(60),
            span: HeaderSpan::SingleRow,
            required: &[
                ColumnRole::Name,
                ColumnRole::Quantity,
                ColumnRole::Unit,
                ColumnRole::UnitPrice,
            ],
            normalize: normalize_compact,
        }
    }

    fn is_satisfied(&self, bindings: &BTreeMap<ColumnRole, usize>) -> bool {
        missing_roles(bindings, self.required).is_empty() && has_money_column(bindings)
    }
}

fn has_money_column(bindings: &BTreeMap<ColumnRole, usize>) -> bool {
    bindings.contains_key(&ColumnRole::UnitPrice) || bindings.contains_key(&ColumnRole::Amount)
}

fn missing_roles(bindings: &BTreeMap<ColumnRole, usize>, required: &[ColumnRole]) -> Vec<ColumnRole> {
    required
        .iter()
        .filter(|role| !bindings.contains_key(role))
        .copied()
        .collect()
}

fn describe(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(|role| format!("{role:?}").to_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Find the goods header in `table`.
///
/// Cells are normalised and matched by substring against each role's synonyms. A role
/// binds to the first matching cell in reading order and is never rebound; one cell may
/// bind several roles. Scanning stops at the end of the first row after which the
/// requirement holds, so columns further right in that row still bind.
pub fn locate_header<T: TableView + ?Sized>(
    table: &T,
    synonyms: &HeaderSynonyms,
    options: &HeaderOptions,
) -> Result<HeaderMatch, OfferError> {
    let prepared: Vec<(ColumnRole, Vec<String>)> = ColumnRole::ALL
        .iter()
        .map(|&role| {
            let words = synonyms
                .for_role(role)
                .iter()
                .map(|w| (options.normalize)(w))
                .filter(|w| !w.is_empty())
                .collect();
            (role, words)
        })
        .collect();

    let rows = table.row_count().min(options.max_rows);
    let mut bindings: BTreeMap<ColumnRole, usize> = BTreeMap::new();
    let mut bound_rows: BTreeMap<ColumnRole, usize> = BTreeMap::new();

    for row in 0..rows {
        if options.span == HeaderSpan::SingleRow {
            bindings.clear();
            bound_rows.clear();
        }

        let cols = match options.max_cols {
            Some(max) => table.cell_count(row).min(max),
            None => table.cell_count(row),
        };
        for col in 0..cols {
            let text = table
                .cell_text(row, col)
                .map(|t| (options.normalize)(&t))
                .unwrap_or_default();
            if text.is_empty() {
                continue;
            }
            for (role, words) in &prepared {
                if bindings.contains_key(role) {
                    continue;
                }
                if words.iter().any(|w| text.contains(w.as_str())) {
                    bindings.insert(*role, col);
                    bound_rows.insert(*role, row);
                }
            }
        }

        if options.is_satisfied(&bindings) {
            let start_row = bound_rows.values().copied().min().unwrap_or(row);
            let end_row = bound_rows.values().copied().max().unwrap_or(row);
            debug!(start_row, end_row, ?bindings, "goods header located");
            return Ok(HeaderMatch {
                start_row,
                end_row,
                columns: ColumnRoleMap::new(bindings)?,
            });
        }
    }

    let mut missing = missing_roles(&bindings, options.required);
    if !has_money_column(&bindings) {
        missing.push(ColumnRole::UnitPrice);
        missing.push(ColumnRole::Amount);
    }
    Err(OfferError::TableStructure(format!(
        "no header within the first {} row(s); missing {}",
        options.max_rows,
        describe(&missing)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MemoryTable;
    use pretty_assertions::assert_eq;

    fn word(table: &MemoryTable) -> Result<HeaderMatch, OfferError> {
        locate_header(table, &HeaderSynonyms::default(), &HeaderOptions::word_table())
    }

    #[test]
    fn test_single_row_header() {
        let table = MemoryTable::from_rows(&[
            &["№", "Наименование", "Ед. изм.", "Кол-во", "Цена", "Сумма"],
            &["1", "", "", "", "", ""],
        ]);
        let header = word(&table).unwrap();
        assert_eq!(header.start_row, 0);
        assert_eq!(header.end_row, 0);
        assert_eq!(header.columns.name(), 1);
        assert_eq!(header.columns.get(ColumnRole::Unit), Some(2));
        assert_eq!(header.columns.quantity(), 3);
        assert_eq!(header.columns.get(ColumnRole::UnitPrice), Some(4));
        assert_eq!(header.columns.get(ColumnRole::Amount), Some(5));
    }

    #[test]
    fn test_two_row_header_accumulates() {
        let table = MemoryTable::from_rows(&[
            &["№", "Наименование товара", "Ед.", "Количество", "", ""],
            &["", "", "", "", "Цена", "Сумма, руб"],
            &["1", "", "", "", "", ""],
        ]);
        let header = word(&table).unwrap();
        assert_eq!(header.start_row, 0);
        assert_eq!(header.end_row, 1);
        assert_eq!(header.columns.name(), 1);
        assert_eq!(header.columns.get(ColumnRole::Unit), Some(2));
        assert_eq!(header.columns.quantity(), 3);
        assert_eq!(header.columns.get(ColumnRole::UnitPrice), Some(4));
        assert_eq!(header.columns.get(ColumnRole::Amount), Some(5));
    }

    #[test]
    fn test_repeated_label_does_not_rebind() {
        let table = MemoryTable::from_rows(&[
            &["Наименование", "Количество", ""],
            &["Наименование", "", "Сумма"],
        ]);
        let header = word(&table).unwrap();
        assert_eq!(header.columns.name(), 0);
        assert_eq!(header.start_row, 0);
        assert_eq!(header.end_row, 1);
    }

    #[test]
    fn test_stops_after_satisfying_row() {
        let table = MemoryTable::from_rows(&[
            &["Наименование", "Кол-во", "Цена", "Ед."],
            &["Сумма", "", "", ""],
        ]);
        let header = word(&table).unwrap();
        assert_eq!(header.end_row, 0);
        assert_eq!(header.columns.get(ColumnRole::Unit), Some(3));
        assert_eq!(header.columns.get(ColumnRole::Amount), None);
        assert_eq!(header.columns.totals_column(), 2);
    }

    #[test]
    fn test_totals_column_prefers_amount() {
        let both = ColumnRoleMap::new(BTreeMap::from([
            (ColumnRole::Name, 0),
            (ColumnRole::Quantity, 1),
            (ColumnRole::UnitPrice, 2),
            (ColumnRole::Amount, 3),
        ]))
        .unwrap();
        assert_eq!(both.totals_column(), 3);

        let price_only = ColumnRoleMap::new(BTreeMap::from([
            (ColumnRole::Name, 0),
            (ColumnRole::Quantity, 1),
            (ColumnRole::UnitPrice, 2),
        ]))
        .unwrap();
        assert_eq!(price_only.totals_column(), 2);
    }

    #[test]
    fn test_missing_money_columns_is_structure_error() {
        let table = MemoryTable::from_rows(&[&["Наименование", "Количество", "Ед."], &["", "", ""]]);
        let err = word(&table).unwrap_err();
        match err {
            OfferError::TableStructure(msg) => assert!(msg.contains("unitprice")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_beyond_scan_window_not_found() {
        let blank: &[&str] = &[""];
        let mut rows = vec![blank; 5];
        rows.push(&["Наименование", "Кол-во", "Цена"]);
        let table = MemoryTable::from_rows(&rows);
        assert!(word(&table).is_err());
    }

    #[test]
    fn test_spreadsheet_requires_single_row() {
        let table = MemoryTable::from_rows(&[
            &["Наименование", "Кол-во", "", ""],
            &["", "", "Ед.", "Цена"],
            &["Наименование", "Кол-во", "Ед.изм", "Цена, руб."],
        ]);
        let header =
            locate_header(&table, &HeaderSynonyms::default(), &HeaderOptions::spreadsheet()).unwrap();
        assert_eq!(header.start_row, 2);
        assert_eq!(header.end_row, 2);
        assert_eq!(header.columns.get(ColumnRole::UnitPrice), Some(3));
    }

    #[test]
    fn test_role_map_rejects_incomplete_bindings() {
        let mut columns = BTreeMap::new();
        columns.insert(ColumnRole::Name, 0);
        columns.insert(ColumnRole::Amount, 1);
        assert!(ColumnRoleMap::new(columns).is_err());
    }
}
