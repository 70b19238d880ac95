//! Display formatting for money and quantities, plus the lenient inverse parser.

use std::str::FromStr;

use rust_decimal::Decimal;
use shared_types::round_money;

/// Format money as `12 345,67`: two decimals, space-grouped thousands, comma separator.
pub fn format_money(value: Decimal) -> String {
    let mut rounded = round_money(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded.set_sign_positive(true);
    rounded.rescale(2);

    let text = rounded.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut out = String::with_capacity(text.len() + text.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    out.push(',');
    out.push_str(frac_part);
    out
}

/// Whole quantities print without decimals; fractional ones keep their digits with a comma.
pub fn format_quantity(value: Decimal) -> String {
    let normalized = value.normalize();
    if normalized.fract().is_zero() {
        normalized.trunc().to_string()
    } else {
        normalized.to_string().replace('.', ",")
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// Best-effort parse of human-entered numbers such as `"1 234,50"` or `"12.345,6"`.
///
/// Spaces (including non-breaking) are dropped and commas read as decimal points.
/// When several points remain, all but the last are treated as grouping.
/// Returns `None` when no digits are present.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let negative = cleaned.starts_with('-');
    let unsigned: String = cleaned.chars().filter(|c| *c != '-').collect();
    let unsigned = unsigned.trim_end_matches('.');
    let canonical = match unsigned.rfind('.') {
        Some(last) => {
            let (whole, frac) = unsigned.split_at(last);
            format!("{}.{}", whole.replace('.', ""), &frac[1..])
        }
        None => unsigned.to_string(),
    };
    let value = Decimal::from_str(&canonical)
        .or_else(|_| Decimal::from_str(&format!("0{canonical}")))
        .ok()?;
    Some(if negative { -value } else { value })
}
