//! Goods lines from plain text laid out in columns.
//!
//! PDF text keeps table columns apart with runs of spaces or tabs. A line is a goods
//! line when it has at least four such columns and at least one money-looking value:
//! name, quantity, optional unit, then price and amount at the end.

use lazy_static::lazy_static;
use offer_engine::format::parse_decimal;
use regex::Regex;
use rust_decimal::Decimal;
use shared_types::{round_money, LineItem};
use tracing::debug;

lazy_static! {
    /// Money value somewhere in a line: digits, optional grouping spaces, two decimals
    static ref MONEY_PATTERN: Regex = Regex::new(r"\d[\d\s]*[.,]\d{2}").unwrap();

    /// A whole column that is a money value
    static ref MONEY_COLUMN_PATTERN: Regex = Regex::new(r"^\d[\d\s]*[.,]\d{2}$").unwrap();

    /// Column separator: two or more whitespace characters, or tabs
    static ref COLUMN_GAP_PATTERN: Regex = Regex::new(r"\s{2,}|\t+").unwrap();
}

fn is_counter(column: &str) -> bool {
    !column.is_empty() && column.chars().all(|c| c.is_ascii_digit())
}

/// Parse one line, or `None` when it does not look like a goods line.
pub fn parse_line(line: &str) -> Option<LineItem> {
    let line = line.trim();
    if !MONEY_PATTERN.is_match(line) {
        return None;
    }

    let mut columns: Vec<&str> = COLUMN_GAP_PATTERN
        .split(line)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    // Leading row number column
    if columns.len() >= 5 && is_counter(columns[0]) {
        columns.remove(0);
    }
    if columns.len() < 4 {
        return None;
    }

    let monies: Vec<&str> = columns
        .iter()
        .copied()
        .filter(|c| MONEY_COLUMN_PATTERN.is_match(c))
        .collect();
    let amount = parse_decimal(monies.last()?)?;
    let price = match monies.len() {
        1 => amount,
        n => parse_decimal(monies[n - 2])?,
    };

    let name = columns[0];
    let middle = &columns[1..columns.len() - 2];
    let quantity = middle.first().and_then(|q| parse_decimal(q))?;
    let unit = middle.get(1).copied().unwrap_or_default();
    if name.is_empty() || quantity <= Decimal::ZERO {
        return None;
    }

    let amount = if amount > Decimal::ZERO {
        amount
    } else {
        quantity.checked_mul(price)?
    };
    LineItem::with_amount(name, quantity, unit, round_money(price), round_money(amount)).ok()
}

/// Every goods line in `text`, in order.
pub fn parse_items(text: &str) -> Vec<LineItem> {
    let items: Vec<LineItem> = text.lines().filter_map(parse_line).collect();
    debug!(lines = text.lines().count(), items = items.len(), "text parsed");
    items
}
