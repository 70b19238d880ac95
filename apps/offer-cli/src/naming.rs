//! Output file names: `КП_<company>_<YYYYmmdd_HHMMSS>_v<variant>.<ext>`.

use chrono::{DateTime, Local};
use offer_engine::OutputFormat;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn timestamp(now: DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Keep alphanumerics, spaces, `_` and `-`; trim; turn spaces into underscores.
pub fn sanitize_company_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    kept.trim().replace(' ', "_")
}

/// `variant` is 1-based.
pub fn output_file_name(
    company_name: &str,
    timestamp: &str,
    variant: usize,
    format: OutputFormat,
) -> String {
    format!(
        "КП_{}_{}_v{}.{}",
        sanitize_company_name(company_name),
        timestamp,
        variant,
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_company_name("ООО «Ромашка»"), "ООО_Ромашка");
        assert_eq!(sanitize_company_name("  ИП Петров-Водкин / Опт "), "ИП_Петров-Водкин__Опт");
        assert_eq!(sanitize_company_name("a:b*c?"), "abc");
        assert_eq!(sanitize_company_name("«»"), "");
    }

    #[test]
    fn test_file_name() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 9, 7, 1).unwrap();
        let name = output_file_name("ООО «Ромашка»", &timestamp(now), 2, OutputFormat::Docx);
        assert_eq!(name, "КП_ООО_Ромашка_20240305_090701_v2.docx");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sanitized_names_are_path_safe(name in "\\PC{0,40}") {
            let safe = sanitize_company_name(&name);
            prop_assert!(!safe.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|', ' ']));
            prop_assert_eq!(sanitize_company_name(&safe), safe.clone());
        }
    }
}
