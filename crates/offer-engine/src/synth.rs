//! Goods row synthesis.
//!
//! The sample row directly under the header is the formatting source. Synthesis:
//!
//! 1. Locate totals rows below the sample (pre-mutation coordinates)
//! 2. Delete every row between the sample and the first totals row (or the table end)
//! 3. For each item, clone the pristine sample in front of the first totals row
//!    (or append it) and fill the clone
//! 4. Delete the sample itself
//! 5. Shift every totals row by `inserted - deleted - 1` and write the totals
//!
//! Every mutation goes through [`RowEditLog`], so the shift can be checked against a replay.

use tracing::{debug, warn};

use shared_types::LineItem;

use crate::error::{OfferError, TotalsUpdateSkipped};
use crate::format::{format_money, format_quantity};
use crate::header::ColumnRoleMap;
use crate::normalize::normalize_text;
use crate::row_log::{RowEdit, RowEditLog};
use crate::table::TableHandle;
use crate::totals::{locate_totals, TotalsAmounts, TotalsIndex, VatPolicy};
use crate::vocabulary::{ColumnRole, TotalsCategory, TotalsKeywords};

/// Result of one synthesis pass.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    /// Stale rows removed between the sample and the first totals row.
    pub stale_rows_removed: usize,
    pub rows_inserted: usize,
    pub index_shift: isize,
    /// Totals rows as found before mutation.
    pub totals: TotalsIndex,
    /// Categories written, with their final row.
    pub totals_written: Vec<(TotalsCategory, usize)>,
    pub totals_skipped: Vec<TotalsUpdateSkipped>,
    pub edits: RowEditLog,
}

pub struct RowSynthesizer<'a> {
    columns: &'a ColumnRoleMap,
    keywords: &'a TotalsKeywords,
    vat: VatPolicy,
}

impl<'a> RowSynthesizer<'a> {
    pub fn new(columns: &'a ColumnRoleMap, keywords: &'a TotalsKeywords, vat: VatPolicy) -> Self {
        Self {
            columns,
            keywords,
            vat,
        }
    }

    /// Replace the sample row below `header_end` with one row per item and update totals.
    pub fn synthesize<T: TableHandle + ?Sized>(
        &self,
        table: &mut T,
        header_end: usize,
        items: &[LineItem],
    ) -> Result<SynthesisOutcome, OfferError> {
        let sample = header_end + 1;
        if sample >= table.row_count() {
            return Err(OfferError::MissingSampleRow { header_end });
        }

        let totals = locate_totals(table, sample, self.keywords);
        let first_total = totals.first_row();
        if first_total == Some(sample) {
            // The row under the header is already a totals row: nothing to clone from.
            return Err(OfferError::MissingSampleRow { header_end });
        }

        let mut log = RowEditLog::new();

        let stale_end = first_total.unwrap_or_else(|| table.row_count());
        let stale = stale_end.saturating_sub(sample + 1);
        for row in (sample + 1..stale_end).rev() {
            table.delete_row(row)?;
        }
        if stale > 0 {
            log.add(RowEdit::DeleteRange {
                id: 0,
                start: sample + 1,
                count: stale,
            });
        }
        debug!(sample, stale, "stale rows removed");

        let mut insert_at = match first_total {
            Some(first) => self.insertion_point(table, sample, first - stale),
            None => None,
        };

        for (index, item) in items.iter().enumerate() {
            let row = match insert_at.as_mut() {
                Some(at) => {
                    table.clone_row_before(sample, *at)?;
                    log.add(RowEdit::InsertBefore { id: 0, at: *at });
                    let row = *at;
                    *at += 1;
                    row
                }
                None => {
                    table.clone_row_to_end(sample)?;
                    let row = table.row_count() - 1;
                    log.add(RowEdit::Append { id: 0, at: row });
                    row
                }
            };
            self.fill_row(table, row, index + 1, item)?;
        }

        table.delete_row(sample)?;
        log.add(RowEdit::Delete { id: 0, row: sample });

        let index_shift = log.net_shift();
        debug!(
            inserted = items.len(),
            deleted = log.deleted(),
            index_shift,
            "goods rows synthesised"
        );

        let amounts = TotalsAmounts::compute(items, &self.vat);
        let mut totals_written = Vec::new();
        let mut totals_skipped = Vec::new();
        let column = self.columns.totals_column();

        for (category, original) in totals.by_row() {
            let target = original as isize + index_shift;
            let in_range = target >= 0
                && (target as usize) < table.row_count()
                && column < table.cell_count(target as usize);
            if !in_range {
                let skipped = TotalsUpdateSkipped {
                    category,
                    template_row: original,
                    reason: format!(
                        "shifted row {target} has no column {column} in a table of {} rows",
                        table.row_count()
                    ),
                };
                warn!("{skipped}");
                totals_skipped.push(skipped);
                continue;
            }
            let target = target as usize;
            table.set_cell_text(target, column, &format_money(amounts.value(category)))?;
            totals_written.push((category, target));
        }

        Ok(SynthesisOutcome {
            stale_rows_removed: stale,
            rows_inserted: items.len(),
            index_shift,
            totals,
            totals_written,
            totals_skipped,
            edits: log,
        })
    }

    /// Row in front of which clones are inserted, re-scanning when the arithmetic
    /// position falls outside the table.
    fn insertion_point<T: TableHandle + ?Sized>(
        &self,
        table: &T,
        sample: usize,
        expected: usize,
    ) -> Option<usize> {
        if expected > sample && expected < table.row_count() {
            return Some(expected);
        }
        let rescanned = locate_totals(table, sample + 1, self.keywords).first_row();
        warn!(expected, ?rescanned, "totals row not where expected; re-scanned");
        rescanned
    }

    fn fill_row<T: TableHandle + ?Sized>(
        &self,
        table: &mut T,
        row: usize,
        ordinal: usize,
        item: &LineItem,
    ) -> Result<(), OfferError> {
        let cells = table.cell_count(row);

        // Unmapped column left of the name holding a number or nothing is a row counter.
        if let Some(counter) = self.columns.name().checked_sub(1) {
            if !self.columns.is_mapped(counter) && counter < cells {
                let current = table.cell_text(row, counter).unwrap_or_default();
                let current = normalize_text(&current);
                if current.chars().all(|c| c.is_ascii_digit()) {
                    table.set_cell_text(row, counter, &ordinal.to_string())?;
                }
            }
        }

        for (role, col) in self.columns.iter() {
            if col >= cells {
                debug!(row, col, ?role, "row has no such cell; skipped");
                continue;
            }
            let text = match role {
                ColumnRole::Name => item.name().to_string(),
                ColumnRole::Quantity => format_quantity(item.quantity()),
                ColumnRole::Unit => item.unit().to_string(),
                ColumnRole::UnitPrice => format_money(item.unit_price()),
                ColumnRole::Amount => format_money(item.amount()),
            };
            table.set_cell_text(row, col, &text)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::header::{locate_header, HeaderOptions};
    use crate::table::{MemoryTable, TableView};
    use crate::vocabulary::HeaderSynonyms;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    proptest! {
        #[test]
        fn item_rows_match_input_and_totals_follow(stale in 0usize..5, count in 0usize..15) {
            let mut rows: Vec<Vec<&str>> = vec![
                vec!["Наименование", "Кол-во", "Цена", "Сумма"],
                vec!["Образец", "", "", ""],
            ];
            for _ in 0..stale {
                rows.push(vec!["старое", "", "", ""]);
            }
            rows.push(vec!["Итого", "", "", ""]);
            let refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
            let mut table = MemoryTable::from_rows(&refs);

            let items: Vec<LineItem> = (0..count)
                .map(|i| LineItem::new(format!("item {i}"), Decimal::ONE, "pcs", Decimal::from(i as u64 + 1)).unwrap())
                .collect();
            let header = locate_header(&table, &HeaderSynonyms::default(), &HeaderOptions::word_table()).unwrap();
            let keywords = TotalsKeywords::default();
            let outcome = RowSynthesizer::new(&header.columns, &keywords, VatPolicy::default())
                .synthesize(&mut table, header.end_row, &items)
                .unwrap();

            prop_assert_eq!(table.row_count(), 1 + count + 1);
            prop_assert_eq!(outcome.index_shift, count as isize - stale as isize - 1);
            let texts = table.texts();
            for i in 0..count {
                prop_assert_eq!(&texts[1 + i][0], &format!("item {i}"));
            }
            prop_assert_eq!(&texts[1 + count][0], "Итого");
            let expected: Decimal = items.iter().map(LineItem::amount).sum();
            prop_assert_eq!(&texts[1 + count][3], &format_money(expected));
        }
    }
}
