//! Text normalisation used for every header and totals comparison.

/// Collapse whitespace (including non-breaking spaces), trim and lowercase.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Stricter form for spreadsheet headers: keeps only letters, digits, spaces and underscores.
///
/// "Цена, руб." and "цена руб" normalise to the same key.
pub fn normalize_compact(raw: &str) -> String {
    let kept: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  Кол-во\u{a0}\u{a0}шт.\n"), "кол-во шт.");
    }

    #[test]
    fn test_normalize_text_empty() {
        assert_eq!(normalize_text(" \t\n"), "");
    }

    #[test]
    fn test_normalize_compact_strips_punctuation() {
        assert_eq!(normalize_compact("Цена, руб."), "цена руб");
        assert_eq!(normalize_compact("Ед.изм"), "едизм");
        assert_eq!(normalize_compact("unit_price"), "unit_price");
    }

    #[test]
    fn test_normalize_compact_collapses_gaps_left_by_punctuation() {
        assert_eq!(normalize_compact("Кол - во"), "кол во");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalize_text_is_idempotent(s in "\\PC{0,40}") {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
        }

        #[test]
        fn normalize_compact_is_idempotent(s in "\\PC{0,40}") {
            let once = normalize_compact(&s);
            prop_assert_eq!(normalize_compact(&once), once);
        }
    }
}
