//! Word (docx) backend.
//!
//! Only `word/document.xml` is touched. Tables are top-level `w:tbl` elements of the
//! body, rows are `w:tr`, cells the direct `w:tc` children of a row. Horizontally
//! merged cells count as one cell, so column indices follow `w:tc` order rather than
//! the layout grid.

use std::path::Path;

use shared_types::PartyProfile;
use tracing::debug;

use crate::error::OfferError;
use crate::package::OfficePackage;
use crate::placeholders::substitute;
use crate::table::{TableHandle, TableView};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

pub const DOCUMENT_PART: &str = "word/document.xml";

pub struct DocxDocument {
    package: OfficePackage,
    document: XmlDocument,
}

impl DocxDocument {
    pub fn open(path: &Path) -> Result<Self, OfferError> {
        Self::from_package(OfficePackage::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OfferError> {
        Self::from_package(OfficePackage::from_bytes(bytes)?)
    }

    pub fn from_package(package: OfficePackage) -> Result<Self, OfferError> {
        let document = package.part_xml(DOCUMENT_PART)?;
        if document.root.child("body").is_none() {
            return Err(OfferError::Package(format!("{DOCUMENT_PART} has no body")));
        }
        Ok(Self { package, document })
    }

    fn body(&self) -> Option<&XmlElement> {
        self.document.root.child("body")
    }

    fn body_mut(&mut self) -> Option<&mut XmlElement> {
        self.document.root.child_mut("body")
    }

    pub fn table_count(&self) -> usize {
        self.body().map_or(0, |b| b.positions("tbl").len())
    }

    /// The `index`-th top-level table.
    pub fn table_mut(&mut self, index: usize) -> Option<DocxTable<'_>> {
        let body = self.body_mut()?;
        let position = *body.positions("tbl").get(index)?;
        body.element_at_mut(position).map(|tbl| DocxTable { tbl })
    }

    /// Replace party tokens in every paragraph of the body, tables included.
    /// Returns the number of paragraphs rewritten.
    pub fn replace_placeholders(&mut self, profile: &PartyProfile) -> usize {
        let mut rewritten = 0;
        if let Some(body) = self.body_mut() {
            body.for_each_named_mut("p", &mut |p| {
                if let Some(text) = substitute(&paragraph_text(p), profile) {
                    set_paragraph_text(p, &text);
                    rewritten += 1;
                }
            });
        }
        debug!(rewritten, "placeholders replaced");
        rewritten
    }

    /// Plain text of the whole body, paragraphs separated by newlines.
    pub fn body_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(body) = self.body() {
            collect_paragraphs(body, &mut lines);
        }
        lines.join("\n")
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>, OfferError> {
        self.package.set_part_xml(DOCUMENT_PART, &self.document)?;
        self.package.to_bytes()
    }

    pub fn save(&mut self, path: &Path) -> Result<(), OfferError> {
        self.package.set_part_xml(DOCUMENT_PART, &self.document)?;
        self.package.save(path)
    }
}

fn collect_paragraphs(element: &XmlElement, lines: &mut Vec<String>) {
    for child in element.elements() {
        if child.is("p") {
            lines.push(paragraph_text(child));
        } else {
            collect_paragraphs(child, lines);
        }
    }
}

/// Visible text of a run: `w:t` content, tabs and breaks.
pub fn run_text(run: &XmlElement) -> String {
    let mut out = String::new();
    for child in run.elements() {
        match child.local_name() {
            "t" => out.push_str(&child.text()),
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Replace a run's content, keeping its `w:rPr` and anything else that is not text.
pub fn set_run_text(run: &mut XmlElement, text: &str) {
    run.remove_elements(|e| matches!(e.local_name(), "t" | "tab" | "br" | "cr" | "delText"));

    let mut pending = String::new();
    for ch in text.chars() {
        match ch {
            '\t' | '\n' => {
                flush_text(run, &mut pending);
                let name = if ch == '\t' { "tab" } else { "br" };
                run.push(XmlElement::new(run.sibling_name(name)));
            }
            _ => pending.push(ch),
        }
    }
    flush_text(run, &mut pending);
}

fn flush_text(run: &mut XmlElement, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    let mut t = XmlElement::new(run.sibling_name("t"));
    t.set_attr("xml:space", "preserve");
    run.push(t.with_text(std::mem::take(pending)));
}

pub fn paragraph_text(paragraph: &XmlElement) -> String {
    paragraph.children_named("r").map(run_text).collect()
}

/// Put `text` into the paragraph's first run and empty the others, so the first run's
/// character formatting carries the new text. A paragraph without runs gets one.
pub fn set_paragraph_text(paragraph: &mut XmlElement, text: &str) {
    let runs = paragraph.positions("r");
    if runs.is_empty() {
        let mut run = XmlElement::new(paragraph.sibling_name("r"));
        set_run_text(&mut run, text);
        paragraph.push(run);
        return;
    }
    for (i, &position) in runs.iter().enumerate() {
        if let Some(run) = paragraph.element_at_mut(position) {
            set_run_text(run, if i == 0 { text } else { "" });
        }
    }
}

pub fn cell_text(cell: &XmlElement) -> String {
    cell.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `text` into the cell's first paragraph and clear the rest. Cell and
/// paragraph properties stay in place.
pub fn set_cell_text(cell: &mut XmlElement, text: &str) {
    let paragraphs = cell.positions("p");
    if paragraphs.is_empty() {
        let mut p = XmlElement::new(cell.sibling_name("p"));
        set_paragraph_text(&mut p, text);
        cell.push(p);
        return;
    }
    for (i, &position) in paragraphs.iter().enumerate() {
        if let Some(p) = cell.element_at_mut(position) {
            set_paragraph_text(p, if i == 0 { text } else { "" });
        }
    }
}

/// A body-level table borrowed from a [`DocxDocument`].
pub struct DocxTable<'a> {
    tbl: &'a mut XmlElement,
}

impl DocxTable<'_> {
    fn row_positions(&self) -> Vec<usize> {
        self.tbl.positions("tr")
    }

    fn row(&self, row: usize) -> Option<&XmlElement> {
        let position = *self.row_positions().get(row)?;
        self.tbl.element_at(position)
    }

    fn row_position(&self, row: usize) -> Result<usize, OfferError> {
        let positions = self.row_positions();
        positions
            .get(row)
            .copied()
            .ok_or(OfferError::RowOutOfRange {
                row,
                rows: positions.len(),
            })
    }

    fn row_clone(&self, source: usize) -> Result<XmlNode, OfferError> {
        let position = self.row_position(source)?;
        Ok(self.tbl.children[position].clone())
    }
}

impl TableView for DocxTable<'_> {
    fn row_count(&self) -> usize {
        self.row_positions().len()
    }

    fn cell_count(&self, row: usize) -> usize {
        self.row(row).map_or(0, |tr| tr.children_named("tc").count())
    }

    fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        self.row(row)?.children_named("tc").nth(col).map(cell_text)
    }
}

impl TableHandle for DocxTable<'_> {
    fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<(), OfferError> {
        let position = self.row_position(row)?;
        let rows = self.row_count();
        let cell = self
            .tbl
            .element_at_mut(position)
            .and_then(|tr| tr.elements_mut().filter(|e| e.is("tc")).nth(col))
            .ok_or(OfferError::RowOutOfRange { row, rows })?;
        set_cell_text(cell, text);
        Ok(())
    }

    fn clone_row_before(&mut self, source: usize, before: usize) -> Result<(), OfferError> {
        let copy = self.row_clone(source)?;
        let positions = self.row_positions();
        let position = match positions.get(before) {
            Some(&p) => p,
            None if before == positions.len() => positions.last().map_or(self.tbl.children.len(), |p| p + 1),
            None => {
                return Err(OfferError::RowOutOfRange {
                    row: before,
                    rows: positions.len(),
                })
            }
        };
        self.tbl.children.insert(position, copy);
        Ok(())
    }

    fn clone_row_to_end(&mut self, source: usize) -> Result<(), OfferError> {
        let copy = self.row_clone(source)?;
        let position = self
            .row_positions()
            .last()
            .map_or(self.tbl.children.len(), |p| p + 1);
        self.tbl.children.insert(position, copy);
        Ok(())
    }

    fn delete_row(&mut self, row: usize) -> Result<(), OfferError> {
        let position = self.row_position(row)?;
        self.tbl.children.remove(position);
        Ok(())
    }
}
