//! Totals row discovery and totals arithmetic.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::{round_money, LineItem};

use crate::normalize::normalize_text;
use crate::table::TableView;
use crate::vocabulary::{TotalsCategory, TotalsKeywords};

/// Row index per totals category, in pre-mutation coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TotalsIndex {
    rows: BTreeMap<TotalsCategory, usize>,
}

impl TotalsIndex {
    pub fn get(&self, category: TotalsCategory) -> Option<usize> {
        self.rows.get(&category).copied()
    }

    /// Topmost totals row of any category.
    pub fn first_row(&self) -> Option<usize> {
        self.rows.values().copied().min()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Entries ordered by row.
    pub fn by_row(&self) -> Vec<(TotalsCategory, usize)> {
        let mut entries: Vec<_> = self.rows.iter().map(|(c, r)| (*c, *r)).collect();
        entries.sort_by_key(|(_, row)| *row);
        entries
    }
}

/// Classify a first-cell text. Excluding-VAT wins over VAT, VAT over grand total.
pub fn classify_totals_row(text: &str, keywords: &TotalsKeywords) -> Option<TotalsCategory> {
    let text = normalize_text(text);
    if text.is_empty() {
        return None;
    }
    keywords
        .in_priority_order()
        .into_iter()
        .find(|(_, words)| {
            words
                .iter()
                .map(|w| normalize_text(w))
                .any(|w| !w.is_empty() && text.contains(w.as_str()))
        })
        .map(|(category, _)| category)
}

/// Scan rows from `start_row` to the end by their first cell, keeping the first row per category.
pub fn locate_totals<T: TableView + ?Sized>(
    table: &T,
    start_row: usize,
    keywords: &TotalsKeywords,
) -> TotalsIndex {
    let mut rows = BTreeMap::new();
    for row in start_row..table.row_count() {
        let Some(text) = table.cell_text(row, 0) else {
            continue;
        };
        if let Some(category) = classify_totals_row(&text, keywords) {
            rows.entry(category).or_insert(row);
        }
    }
    TotalsIndex { rows }
}

/// How VAT is carved out of a VAT-inclusive grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatPolicy {
    pub rate_percent: Decimal,
}

impl Default for VatPolicy {
    fn default() -> Self {
        Self {
            rate_percent: Decimal::from(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalsAmounts {
    pub grand_total: Decimal,
    pub vat: Decimal,
    pub total_excluding_vat: Decimal,
}

impl TotalsAmounts {
    /// Grand total is the sum of line amounts and already includes VAT.
    pub fn compute(items: &[LineItem], policy: &VatPolicy) -> Self {
        let grand_total = round_money(items.iter().map(LineItem::amount).sum());
        let divisor = Decimal::ONE_HUNDRED + policy.rate_percent;
        let vat = if divisor.is_zero() {
            Decimal::ZERO
        } else {
            round_money(grand_total * policy.rate_percent / divisor)
        };
        Self {
            grand_total,
            vat,
            total_excluding_vat: grand_total - vat,
        }
    }

    pub fn value(&self, category: TotalsCategory) -> Decimal {
        match category {
            TotalsCategory::GrandTotal => self.grand_total,
            TotalsCategory::Vat => self.vat,
            TotalsCategory::TotalExcludingVat => self.total_excluding_vat,
        }
    }
}
