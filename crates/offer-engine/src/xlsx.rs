//! Excel (xlsx) backend.
//!
//! Edits the active worksheet part in place. Cell styles live in the `s` attribute
//! and are never touched, so writing values keeps the template's look. Strings are
//! written as inline strings to leave the shared string table alone.
//!
//! Row insertion and deletion renumber row and cell references only. Merged ranges,
//! formulas and defined names that point below an edit are not rewritten.

use std::path::Path;

use rust_decimal::Decimal;
use shared_types::{LineItem, PartyProfile};
use tracing::{debug, warn};

use crate::error::OfferError;
use crate::header::{ColumnRoleMap, HeaderMatch};
use crate::package::{OfficePackage, CONTENT_TYPES_PART};
use crate::placeholders::substitute;
use crate::table::{TableHandle, TableView};
use crate::vocabulary::{ColumnRole, SheetTotalLabels};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

pub const WORKBOOK_PART: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const CALC_CHAIN_PART: &str = "xl/calcChain.xml";

/// Rows searched below the written items for the totals label.
pub const TOTALS_SEARCH_WINDOW: usize = 60;

/// `0 -> "A"`, `27 -> "AB"`.
pub fn column_name(col: usize) -> String {
    let mut n = col + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Column count of a worksheet, `XFD`.
const MAX_COLUMNS: usize = 16_384;

/// `"B12" -> (11, 1)`, zero-based row and column.
pub fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let col = letters.chars().try_fold(0usize, |acc, c| {
        acc.checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as usize - 'A' as usize + 1)
    })?;
    if col > MAX_COLUMNS {
        return None;
    }
    let row: usize = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}

fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

fn row_number(row: &XmlElement) -> Option<usize> {
    row.attr("r")?.parse::<usize>().ok()?.checked_sub(1)
}

fn cell_column(cell: &XmlElement) -> Option<usize> {
    parse_cell_ref(cell.attr("r")?).map(|(_, col)| col)
}

fn renumber_row(row: &mut XmlElement, index: usize) {
    row.set_attr("r", (index + 1).to_string());
    for cell in row.elements_mut().filter(|e| e.is("c")) {
        if let Some(col) = cell_column(cell) {
            cell.set_attr("r", cell_ref(index, col));
        }
    }
}

/// Text of a shared string item or inline string: plain `t` plus rich-text runs, no phonetics.
fn rich_text(si: &XmlElement) -> String {
    let mut out = String::new();
    for child in si.elements() {
        match child.local_name() {
            "t" => out.push_str(&child.text()),
            "r" => {
                if let Some(t) = child.child("t") {
                    out.push_str(&t.text());
                }
            }
            _ => {}
        }
    }
    out
}

fn cell_value(cell: &XmlElement, shared: &[String]) -> String {
    let raw = cell.child("v").map(|v| v.text()).unwrap_or_default();
    match cell.attr("t") {
        Some("s") => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i).cloned())
            .unwrap_or_default(),
        Some("inlineStr") => cell.child("is").map(rich_text).unwrap_or_default(),
        Some("b") => (if raw.trim() == "1" { "TRUE" } else { "FALSE" }).to_string(),
        _ => raw,
    }
}

fn clear_value(cell: &mut XmlElement) {
    cell.remove_attr("t");
    cell.remove_elements(|e| matches!(e.local_name(), "v" | "f" | "is"));
}

/// Active worksheet of an xlsx package.
pub struct XlsxWorkbook {
    package: OfficePackage,
    sheet_part: String,
    sheet: XmlDocument,
    shared_strings: Vec<String>,
}

impl XlsxWorkbook {
    pub fn open(path: &Path) -> Result<Self, OfferError> {
        Self::from_package(OfficePackage::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OfferError> {
        Self::from_package(OfficePackage::from_bytes(bytes)?)
    }

    pub fn from_package(package: OfficePackage) -> Result<Self, OfferError> {
        let sheet_part = active_sheet_part(&package)?;
        let sheet = package.part_xml(&sheet_part)?;
        if sheet.root.child("sheetData").is_none() {
            return Err(OfferError::Package(format!("{sheet_part} has no sheetData")));
        }
        let shared_strings = match package.part(SHARED_STRINGS_PART) {
            Some(_) => package
                .part_xml(SHARED_STRINGS_PART)?
                .root
                .children_named("si")
                .map(rich_text)
                .collect(),
            None => Vec::new(),
        };
        debug!(sheet_part = sheet_part.as_str(), shared = shared_strings.len(), "workbook loaded");
        Ok(Self {
            package,
            sheet_part,
            sheet,
            shared_strings,
        })
    }

    pub fn sheet_part(&self) -> &str {
        &self.sheet_part
    }

    pub fn grid(&mut self) -> Result<SheetGrid<'_>, OfferError> {
        let data = self
            .sheet
            .root
            .child_mut("sheetData")
            .ok_or_else(|| OfferError::Package("worksheet has no sheetData".to_string()))?;
        Ok(SheetGrid::new(data, &self.shared_strings))
    }

    /// Replace party tokens in every string cell. Returns the number of cells rewritten.
    pub fn replace_placeholders(&mut self, profile: &PartyProfile) -> Result<usize, OfferError> {
        let mut grid = self.grid()?;
        let mut targets = Vec::new();
        for row in 0..grid.row_count() {
            for col in 0..grid.cell_count(row) {
                if let Some(text) = grid.cell_text(row, col).and_then(|t| substitute(&t, profile)) {
                    targets.push((row, col, text));
                }
            }
        }
        for (row, col, text) in &targets {
            grid.set_cell_text(*row, *col, text)?;
        }
        Ok(targets.len())
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>, OfferError> {
        self.flush()?;
        self.package.to_bytes()
    }

    pub fn save(&mut self, path: &Path) -> Result<(), OfferError> {
        self.flush()?;
        self.package.save(path)
    }

    fn flush(&mut self) -> Result<(), OfferError> {
        self.package.set_part_xml(&self.sheet_part, &self.sheet)?;
        drop_calc_chain(&mut self.package)
    }
}

/// Worksheet selected by the workbook view's `activeTab`, defaulting to the first.
fn active_sheet_part(package: &OfficePackage) -> Result<String, OfferError> {
    let workbook = package.part_xml(WORKBOOK_PART)?;
    let active = workbook
        .root
        .child("bookViews")
        .and_then(|views| views.child("workbookView"))
        .and_then(|view| view.attr("activeTab"))
        .and_then(|tab| tab.parse::<usize>().ok())
        .unwrap_or(0);
    let sheets: Vec<&XmlElement> = workbook
        .root
        .child("sheets")
        .map(|s| s.children_named("sheet").collect())
        .unwrap_or_default();
    let sheet = sheets
        .get(active)
        .or_else(|| sheets.first())
        .ok_or_else(|| OfferError::Package("workbook has no sheets".to_string()))?;
    let rel_id = sheet
        .attr("r:id")
        .or_else(|| sheet.attr("id"))
        .ok_or_else(|| OfferError::Package("sheet entry has no relationship id".to_string()))?;

    let rels = package.part_xml(WORKBOOK_RELS_PART)?;
    let target = rels
        .root
        .children_named("Relationship")
        .find(|rel| rel.attr("Id") == Some(rel_id))
        .and_then(|rel| rel.attr("Target"))
        .ok_or_else(|| OfferError::Package(format!("relationship {rel_id} not found")))?;

    Ok(match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    })
}

/// Remove the calculation chain so Excel rebuilds it instead of reporting a corrupt file.
fn drop_calc_chain(package: &mut OfficePackage) -> Result<(), OfferError> {
    if !package.remove_part(CALC_CHAIN_PART) {
        return Ok(());
    }
    let mut types = package.part_xml(CONTENT_TYPES_PART)?;
    types
        .root
        .remove_elements(|e| e.is("Override") && e.attr("PartName") == Some("/xl/calcChain.xml"));
    package.set_part_xml(CONTENT_TYPES_PART, &types)?;

    if package.contains(WORKBOOK_RELS_PART) {
        let mut rels = package.part_xml(WORKBOOK_RELS_PART)?;
        rels.root.remove_elements(|e| {
            e.attr("Type")
                .is_some_and(|t| t.ends_with("/calcChain"))
        });
        package.set_part_xml(WORKBOOK_RELS_PART, &rels)?;
    }
    debug!("calculation chain dropped");
    Ok(())
}

/// The `sheetData` of a worksheet viewed as a zero-based grid (row 0 is Excel row 1).
pub struct SheetGrid<'a> {
    data: &'a mut XmlElement,
    shared: &'a [String],
}

impl<'a> SheetGrid<'a> {
    pub fn new(data: &'a mut XmlElement, shared: &'a [String]) -> Self {
        assign_missing_refs(data);
        Self { data, shared }
    }

    fn row(&self, row: usize) -> Option<&XmlElement> {
        self.data
            .children_named("row")
            .find(|r| row_number(r) == Some(row))
    }

    fn row_position(&self, row: usize) -> Option<usize> {
        self.data
            .positions("row")
            .into_iter()
            .find(|&p| self.data.element_at(p).and_then(row_number) == Some(row))
    }

    /// Position where a row numbered `row` belongs, keeping ascending order.
    fn insertion_position(&self, row: usize) -> usize {
        self.data
            .positions("row")
            .into_iter()
            .find(|&p| self.data.element_at(p).and_then(row_number).is_some_and(|r| r > row))
            .unwrap_or(self.data.children.len())
    }

    fn ensure_row(&mut self, row: usize) -> Result<&mut XmlElement, OfferError> {
        let position = match self.row_position(row) {
            Some(p) => p,
            None => {
                let p = self.insertion_position(row);
                let mut element = XmlElement::new(self.data.sibling_name("row"));
                element.set_attr("r", (row + 1).to_string());
                self.data
                    .children
                    .insert(p, XmlNode::Element(element));
                p
            }
        };
        self.data
            .element_at_mut(position)
            .ok_or_else(|| OfferError::Xml(format!("row {} vanished", row + 1)))
    }

    fn ensure_cell(&mut self, row: usize, col: usize) -> Result<&mut XmlElement, OfferError> {
        let row_element = self.ensure_row(row)?;
        let cells = row_element.positions("c");
        let existing = cells
            .iter()
            .copied()
            .find(|&p| row_element.element_at(p).and_then(cell_column) == Some(col));
        let position = match existing {
            Some(p) => p,
            None => {
                let p = cells
                    .iter()
                    .copied()
                    .find(|&p| {
                        row_element
                            .element_at(p)
                            .and_then(cell_column)
                            .is_some_and(|c| c > col)
                    })
                    .unwrap_or(row_element.children.len());
                let mut cell = XmlElement::new(row_element.sibling_name("c"));
                cell.set_attr("r", cell_ref(row, col));
                row_element
                    .children
                    .insert(p, XmlNode::Element(cell));
                p
            }
        };
        row_element
            .element_at_mut(position)
            .ok_or_else(|| OfferError::Xml(format!("cell {} vanished", cell_ref(row, col))))
    }

    fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut XmlElement> {
        let position = self.row_position(row)?;
        self.data
            .element_at_mut(position)?
            .elements_mut()
            .find(|c| c.is("c") && cell_column(c) == Some(col))
    }

    /// Empty a cell's value, keeping its style. Missing cells are left missing.
    pub fn clear_cell(&mut self, row: usize, col: usize) {
        if let Some(cell) = self.cell_mut(row, col) {
            clear_value(cell);
        }
    }

    pub fn set_cell_number(&mut self, row: usize, col: usize, value: Decimal) -> Result<(), OfferError> {
        let cell = self.ensure_cell(row, col)?;
        clear_value(cell);
        let v = XmlElement::new(cell.sibling_name("v")).with_text(value.normalize().to_string());
        cell.push(v);
        Ok(())
    }

    /// Numeric content of a cell, if it holds a plain number.
    pub fn cell_number(&self, row: usize, col: usize) -> Option<Decimal> {
        let cell = self
            .row(row)?
            .children_named("c")
            .find(|c| cell_column(c) == Some(col))?;
        if cell.attr("t").is_some_and(|t| t != "n") {
            return None;
        }
        cell.child("v")?.text().trim().parse().ok()
    }

    fn shift_rows_from(&mut self, first: usize, up: bool) {
        for row in self.data.elements_mut().filter(|e| e.is("row")) {
            if let Some(index) = row_number(row) {
                if index >= first {
                    let target = if up { index - 1 } else { index + 1 };
                    renumber_row(row, target);
                }
            }
        }
    }

    fn source_copy(&self, source: usize) -> Result<XmlElement, OfferError> {
        if source >= self.row_count() {
            return Err(OfferError::RowOutOfRange {
                row: source,
                rows: self.row_count(),
            });
        }
        Ok(self.row(source).cloned().unwrap_or_else(|| {
            let mut element = XmlElement::new(self.data.sibling_name("row"));
            element.set_attr("r", (source + 1).to_string());
            element
        }))
    }
}

/// Give every row and cell an explicit `r`; the attribute is optional in the file format.
fn assign_missing_refs(data: &mut XmlElement) {
    let mut next_row = 0;
    for row in data.elements_mut().filter(|e| e.is("row")) {
        let index = row_number(row).unwrap_or(next_row);
        row.set_attr("r", (index + 1).to_string());
        next_row = index + 1;

        let mut next_col = 0;
        for cell in row.elements_mut().filter(|e| e.is("c")) {
            let col = cell_column(cell).unwrap_or(next_col);
            cell.set_attr("r", cell_ref(index, col));
            next_col = col + 1;
        }
    }
}

impl TableView for SheetGrid<'_> {
    fn row_count(&self) -> usize {
        self.data
            .children_named("row")
            .filter_map(row_number)
            .max()
            .map_or(0, |r| r + 1)
    }

    fn cell_count(&self, row: usize) -> usize {
        self.row(row)
            .and_then(|r| r.children_named("c").filter_map(cell_column).max())
            .map_or(0, |c| c + 1)
    }

    fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        if col >= self.cell_count(row) {
            return None;
        }
        let text = self
            .row(row)?
            .children_named("c")
            .find(|c| cell_column(c) == Some(col))
            .map(|c| cell_value(c, self.shared))
            .unwrap_or_default();
        Some(text)
    }
}

impl TableHandle for SheetGrid<'_> {
    fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<(), OfferError> {
        let cell = self.ensure_cell(row, col)?;
        clear_value(cell);
        if text.is_empty() {
            return Ok(());
        }
        cell.set_attr("t", "inlineStr");
        let mut t = XmlElement::new(cell.sibling_name("t"));
        t.set_attr("xml:space", "preserve");
        let mut is = XmlElement::new(cell.sibling_name("is"));
        is.push(t.with_text(text));
        cell.push(is);
        Ok(())
    }

    fn clone_row_before(&mut self, source: usize, before: usize) -> Result<(), OfferError> {
        let mut copy = self.source_copy(source)?;
        let rows = self.row_count();
        if before > rows {
            return Err(OfferError::RowOutOfRange { row: before, rows });
        }
        self.shift_rows_from(before, false);
        renumber_row(&mut copy, before);
        let position = self.insertion_position(before);
        self.data
            .children
            .insert(position, XmlNode::Element(copy));
        Ok(())
    }

    fn clone_row_to_end(&mut self, source: usize) -> Result<(), OfferError> {
        let mut copy = self.source_copy(source)?;
        let end = self.row_count();
        renumber_row(&mut copy, end);
        let position = self.insertion_position(end);
        self.data
            .children
            .insert(position, XmlNode::Element(copy));
        Ok(())
    }

    fn delete_row(&mut self, row: usize) -> Result<(), OfferError> {
        let rows = self.row_count();
        if row >= rows {
            return Err(OfferError::RowOutOfRange { row, rows });
        }
        if let Some(position) = self.row_position(row) {
            self.data.children.remove(position);
        }
        self.shift_rows_from(row + 1, true);
        Ok(())
    }
}

/// Where goods were written by [`write_goods`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodsPlacement {
    pub first_row: usize,
    /// First row after the written items.
    pub after_row: usize,
    pub cleared_rows: usize,
    /// Row that received a totals label displaced by the items.
    pub label_moved_to: Option<usize>,
}

/// Overwrite the item block under the header in place.
///
/// Existing rows are cleared in the mapped columns until the first blank name cell or a
/// totals label. Items are then written from the row after the header. If the items run
/// over the totals label, the label is written again right after them.
pub fn write_goods(
    grid: &mut SheetGrid<'_>,
    header: &HeaderMatch,
    items: &[LineItem],
    labels: &SheetTotalLabels,
) -> Result<GoodsPlacement, OfferError> {
    let columns = &header.columns;
    let name_col = columns.name();
    let first_row = header.end_row + 1;

    let mut row = first_row;
    let mut label: Option<(usize, String)> = None;
    while row < grid.row_count() {
        let text = grid.cell_text(row, name_col).unwrap_or_default();
        if text.trim().is_empty() {
            break;
        }
        if labels.matches(&text) {
            label = Some((row, text));
            break;
        }
        for (_, col) in columns.iter() {
            grid.clear_cell(row, col);
        }
        row += 1;
    }
    let cleared_rows = row - first_row;

    for (offset, item) in items.iter().enumerate() {
        write_item(grid, columns, first_row + offset, item)?;
    }
    let after_row = first_row + items.len();

    let mut label_moved_to = None;
    if let Some((label_row, text)) = label {
        if label_row < after_row {
            grid.set_cell_text(after_row, name_col, &text)?;
            label_moved_to = Some(after_row);
            debug!(label_row, after_row, "totals label moved below items");
        }
    }

    Ok(GoodsPlacement {
        first_row,
        after_row,
        cleared_rows,
        label_moved_to,
    })
}

fn write_item(
    grid: &mut SheetGrid<'_>,
    columns: &ColumnRoleMap,
    row: usize,
    item: &LineItem,
) -> Result<(), OfferError> {
    for (role, col) in columns.iter() {
        match role {
            ColumnRole::Name => grid.set_cell_text(row, col, item.name())?,
            ColumnRole::Unit => grid.set_cell_text(row, col, item.unit())?,
            ColumnRole::Quantity => grid.set_cell_number(row, col, item.quantity())?,
            ColumnRole::UnitPrice => grid.set_cell_number(row, col, item.unit_price())?,
            ColumnRole::Amount => grid.set_cell_number(row, col, item.amount())?,
        }
    }
    Ok(())
}

/// Write `total` next to the first totals label within the window below `after_row`.
pub fn write_sheet_total(
    grid: &mut SheetGrid<'_>,
    after_row: usize,
    columns: &ColumnRoleMap,
    labels: &SheetTotalLabels,
    total: Decimal,
) -> Result<Option<usize>, OfferError> {
    let end = grid.row_count().min(after_row + TOTALS_SEARCH_WINDOW + 1);
    let found = (after_row..end).find(|&row| {
        grid.cell_text(row, columns.name())
            .is_some_and(|text| labels.matches(&text))
    });
    match found {
        Some(row) => {
            grid.set_cell_number(row, columns.totals_column(), total)?;
            Ok(Some(row))
        }
        None => {
            warn!(after_row, "no totals label below the items; total not written");
            Ok(None)
        }
    }
}
