//! Commercial offer rendering
//!
//! Fills the goods table of a Word or spreadsheet template with priced line items and
//! rewrites the totals rows underneath.
//!
//! The pipeline for a Word template:
//! - `header::locate_header` binds column roles from the table's leading rows
//! - `totals::locate_totals` records the totals rows before anything moves
//! - `synth::RowSynthesizer` clones the sample row per item and shifts the totals positions
//!
//! Spreadsheets overwrite the rows in place instead (see `xlsx::write_goods`). Both
//! backends implement `table::TableHandle`, so the synthesizer can be tested against
//! `table::MemoryTable`.

pub mod default_sheet;
pub mod docx;
pub mod engine;
pub mod error;
pub mod format;
pub mod header;
pub mod normalize;
pub mod package;
pub mod placeholders;
pub mod row_log;
pub mod samples;
pub mod synth;
pub mod table;
pub mod totals;
pub mod vocabulary;
pub mod xlsx;
pub mod xml;

pub use engine::{OutputFormat, RenderReport, TableSynthesisEngine, TemplateSource};
pub use error::{OfferError, TotalsUpdateSkipped};
pub use header::{locate_header, ColumnRoleMap, HeaderMatch, HeaderOptions};
pub use synth::{RowSynthesizer, SynthesisOutcome};
pub use table::{MemoryTable, TableHandle, TableView};
pub use totals::{locate_totals, TotalsAmounts, TotalsIndex, VatPolicy};
pub use vocabulary::{ColumnRole, HeaderSynonyms, TotalsCategory, TotalsKeywords, Vocabulary};
