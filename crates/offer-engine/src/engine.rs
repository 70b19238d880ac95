//! Document-level rendering: placeholders, goods table and totals in one pass.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shared_types::{LineItem, PartyProfile};
use tracing::{debug, info, warn};

use crate::default_sheet::build_default_workbook;
use crate::docx::DocxDocument;
use crate::error::{OfferError, TotalsUpdateSkipped};
use crate::header::{locate_header, HeaderMatch, HeaderOptions};
use crate::synth::RowSynthesizer;
use crate::totals::{TotalsAmounts, VatPolicy};
use crate::vocabulary::{TotalsCategory, Vocabulary};
use crate::xlsx::{write_goods, write_sheet_total, XlsxWorkbook};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Docx,
    Xlsx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Docx => "docx",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

/// What a render starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Docx(PathBuf),
    Xlsx(PathBuf),
    /// Built-in spreadsheet layout, no template file.
    DefaultLayout,
}

impl TemplateSource {
    /// A Word template wins over a spreadsheet one; with neither the default layout is used.
    pub fn select(docx: Option<&Path>, xlsx: Option<&Path>) -> Self {
        match (docx, xlsx) {
            (Some(path), _) => TemplateSource::Docx(path.to_path_buf()),
            (None, Some(path)) => TemplateSource::Xlsx(path.to_path_buf()),
            (None, None) => TemplateSource::DefaultLayout,
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        match self {
            TemplateSource::Docx(_) => OutputFormat::Docx,
            TemplateSource::Xlsx(_) | TemplateSource::DefaultLayout => OutputFormat::Xlsx,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub format: OutputFormat,
    /// Index of the goods table among the document's top-level tables (Word only).
    pub table_index: Option<usize>,
    pub rows_written: usize,
    pub placeholders_replaced: usize,
    pub totals: TotalsAmounts,
    /// Categories written, with their final row.
    pub totals_written: Vec<(TotalsCategory, usize)>,
    pub totals_skipped: Vec<TotalsUpdateSkipped>,
    pub output_size_bytes: usize,
}

/// Renders offers against templates using one vocabulary and VAT policy.
#[derive(Debug, Clone, Default)]
pub struct TableSynthesisEngine {
    vocabulary: Vocabulary,
    vat: VatPolicy,
}

impl TableSynthesisEngine {
    pub fn new(vocabulary: Vocabulary, vat: VatPolicy) -> Self {
        Self { vocabulary, vat }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn vat_policy(&self) -> VatPolicy {
        self.vat
    }

    /// Render to `output`. Nothing is written unless rendering succeeds.
    pub fn render(
        &self,
        template: &TemplateSource,
        profile: &PartyProfile,
        items: &[LineItem],
        output: &Path,
    ) -> Result<RenderReport, OfferError> {
        let (bytes, report) = match template {
            TemplateSource::Docx(path) => {
                let template = std::fs::read(path)?;
                self.render_docx_bytes(&template, profile, items)?
            }
            TemplateSource::Xlsx(path) => {
                let template = std::fs::read(path)?;
                self.render_xlsx_bytes(Some(&template), profile, items)?
            }
            TemplateSource::DefaultLayout => self.render_xlsx_bytes(None, profile, items)?,
        };
        std::fs::write(output, bytes)?;
        info!(
            output = %output.display(),
            company = profile.name.as_str(),
            rows = report.rows_written,
            "offer written"
        );
        Ok(report)
    }

    pub fn render_docx_bytes(
        &self,
        template: &[u8],
        profile: &PartyProfile,
        items: &[LineItem],
    ) -> Result<(Vec<u8>, RenderReport), OfferError> {
        let mut doc = DocxDocument::from_bytes(template)?;
        let placeholders_replaced = doc.replace_placeholders(profile);

        let (table_index, header) = self.find_goods_table(&mut doc)?;
        let mut table = doc
            .table_mut(table_index)
            .ok_or(OfferError::NoGoodsTableFound {
                tables_checked: table_index + 1,
            })?;
        let outcome = RowSynthesizer::new(&header.columns, &self.vocabulary.totals, self.vat)
            .synthesize(&mut table, header.end_row, items)?;

        let bytes = doc.to_bytes()?;
        let report = RenderReport {
            format: OutputFormat::Docx,
            table_index: Some(table_index),
            rows_written: outcome.rows_inserted,
            placeholders_replaced,
            totals: TotalsAmounts::compute(items, &self.vat),
            totals_written: outcome.totals_written,
            totals_skipped: outcome.totals_skipped,
            output_size_bytes: bytes.len(),
        };
        Ok((bytes, report))
    }

    /// First table whose header satisfies the locator.
    ///
    /// A document with a single table reports that table's header problem directly.
    fn find_goods_table(&self, doc: &mut DocxDocument) -> Result<(usize, HeaderMatch), OfferError> {
        let count = doc.table_count();
        let options = HeaderOptions::word_table();
        let mut last_error = None;
        for index in 0..count {
            let Some(table) = doc.table_mut(index) else {
                continue;
            };
            match locate_header(&table, &self.vocabulary.headers, &options) {
                Ok(header) => {
                    debug!(index, end_row = header.end_row, "goods table found");
                    return Ok((index, header));
                }
                Err(err) => {
                    debug!(index, error = %err, "table skipped");
                    last_error = Some(err);
                }
            }
        }
        match (count, last_error) {
            (1, Some(err)) => Err(err),
            _ => Err(OfferError::NoGoodsTableFound {
                tables_checked: count,
            }),
        }
    }

    /// Render a spreadsheet, from `template` when given, else from the default layout.
    pub fn render_xlsx_bytes(
        &self,
        template: Option<&[u8]>,
        profile: &PartyProfile,
        items: &[LineItem],
    ) -> Result<(Vec<u8>, RenderReport), OfferError> {
        let totals = TotalsAmounts::compute(items, &self.vat);
        let Some(template) = template else {
            let sheet = build_default_workbook(items, profile, totals.grand_total)?;
            let report = RenderReport {
                format: OutputFormat::Xlsx,
                table_index: None,
                rows_written: items.len(),
                placeholders_replaced: sheet.placeholders_replaced,
                totals,
                totals_written: vec![(TotalsCategory::GrandTotal, sheet.total_row)],
                totals_skipped: Vec::new(),
                output_size_bytes: sheet.bytes.len(),
            };
            return Ok((sheet.bytes, report));
        };

        let mut workbook = XlsxWorkbook::from_bytes(template)?;
        let placeholders_replaced = workbook.replace_placeholders(profile)?;
        let labels = &self.vocabulary.sheet_total_labels;

        let mut grid = workbook.grid()?;
        let header = locate_header(&grid, &self.vocabulary.headers, &HeaderOptions::spreadsheet())?;
        let placement = write_goods(&mut grid, &header, items, labels)?;
        let total_row = write_sheet_total(
            &mut grid,
            placement.after_row,
            &header.columns,
            labels,
            totals.grand_total,
        )?;

        let mut totals_written = Vec::new();
        let mut totals_skipped = Vec::new();
        match total_row {
            Some(row) => totals_written.push((TotalsCategory::GrandTotal, row)),
            None => {
                let skipped = TotalsUpdateSkipped {
                    category: TotalsCategory::GrandTotal,
                    template_row: placement.after_row,
                    reason: "no totals label below the items".to_string(),
                };
                warn!(%skipped, "grand total not written");
                totals_skipped.push(skipped);
            }
        }

        let bytes = workbook.to_bytes()?;
        let report = RenderReport {
            format: OutputFormat::Xlsx,
            table_index: None,
            rows_written: items.len(),
            placeholders_replaced,
            totals,
            totals_written,
            totals_skipped,
            output_size_bytes: bytes.len(),
        };
        Ok((bytes, report))
    }
}
