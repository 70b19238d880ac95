//! Goods lines from the first sheet of an Excel price list.

use std::path::Path;
use std::str::FromStr;

use calamine::{open_workbook_auto, Data, Range, Reader};
use offer_engine::format::parse_decimal;
use offer_engine::header::{locate_header, HeaderOptions};
use offer_engine::{ColumnRole, TableView, Vocabulary};
use rust_decimal::Decimal;
use shared_types::{round_money, LineItem, ModelError};
use tracing::{debug, info};

use crate::error::ExtractError;

/// Header search window for price lists.
pub fn price_list_header_options() -> HeaderOptions {
    HeaderOptions {
        max_rows: 80,
        max_cols: Some(50),
        ..HeaderOptions::spreadsheet()
    }
}

/// A calamine range addressed with absolute, zero-based sheet coordinates.
pub struct CalamineView<'a> {
    range: &'a Range<Data>,
}

impl<'a> CalamineView<'a> {
    pub fn new(range: &'a Range<Data>) -> Self {
        Self { range }
    }

    fn value(&self, row: usize, col: usize) -> Option<&Data> {
        let row = u32::try_from(row).ok()?;
        let col = u32::try_from(col).ok()?;
        self.range.get_value((row, col))
    }

    pub fn decimal(&self, row: usize, col: usize) -> Option<Decimal> {
        match self.value(row, col)? {
            Data::Int(i) => Some(Decimal::from(*i)),
            Data::Float(f) => Decimal::from_str(&f.to_string()).ok(),
            Data::String(s) => parse_decimal(s),
            _ => None,
        }
    }
}

impl TableView for CalamineView<'_> {
    fn row_count(&self) -> usize {
        self.range.end().map_or(0, |(row, _)| row as usize + 1)
    }

    fn cell_count(&self, _row: usize) -> usize {
        self.range.end().map_or(0, |(_, col)| col as usize + 1)
    }

    fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        match self.value(row, col)? {
            Data::Empty => None,
            Data::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Items read from a workbook, with the sheet they came from.
#[derive(Debug, Clone)]
pub struct SheetItems {
    pub sheet_name: String,
    pub items: Vec<LineItem>,
}

pub fn read_workbook(path: &Path, vocabulary: &Vocabulary) -> Result<SheetItems, ExtractError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ExtractError::Workbook(e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ExtractError::EmptyWorkbook)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ExtractError::Workbook(e.to_string()))?;

    let items = read_range(&range, vocabulary)?;
    if items.is_empty() {
        return Err(ExtractError::NoItems(format!(
            "sheet '{sheet_name}': the header was found but no goods rows follow it"
        )));
    }
    info!(sheet = sheet_name.as_str(), items = items.len(), "price list read");
    Ok(SheetItems { sheet_name, items })
}

/// Rows under the header until the first blank name after at least one item, or a
/// totals label.
pub fn read_range(range: &Range<Data>, vocabulary: &Vocabulary) -> Result<Vec<LineItem>, ExtractError> {
    let view = CalamineView::new(range);
    let header = locate_header(&view, &vocabulary.headers, &price_list_header_options())
        .map_err(ExtractError::HeaderNotFound)?;
    let columns = &header.columns;
    let unit_col = columns.get(ColumnRole::Unit);
    let price_col = columns.get(ColumnRole::UnitPrice);
    let amount_col = columns.get(ColumnRole::Amount);

    let mut items = Vec::new();
    for row in header.end_row + 1..view.row_count() {
        let name = view
            .cell_text(row, columns.name())
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        if name.is_empty() {
            if items.is_empty() {
                continue;
            }
            break;
        }
        if vocabulary.sheet_total_labels.matches(&name) {
            break;
        }

        let number = |col: Option<usize>, column: &'static str| -> Result<Decimal, ExtractError> {
            col.and_then(|c| view.decimal(row, c))
                .ok_or_else(|| ExtractError::BadNumber {
                    row: row + 1,
                    column,
                    value: col.and_then(|c| view.cell_text(row, c)).unwrap_or_default(),
                })
        };
        let quantity = number(Some(columns.quantity()), "quantity")?;
        let price = number(price_col, "price")?;
        let unit = unit_col
            .and_then(|c| view.cell_text(row, c))
            .unwrap_or_default();

        let amount_text = amount_col
            .and_then(|c| view.cell_text(row, c))
            .filter(|t| !t.trim().is_empty());
        let amount = match amount_text {
            Some(_) => number(amount_col, "amount")?,
            None => quantity
                .checked_mul(price)
                .ok_or_else(|| ModelError::AmountOverflow {
                    name: name.clone(),
                    quantity,
                    price,
                })?,
        };

        debug!(row, name = name.as_str(), "goods row read");
        items.push(LineItem::with_amount(
            name,
            quantity,
            unit,
            round_money(price),
            round_money(amount),
        )?);
    }
    Ok(items)
}
