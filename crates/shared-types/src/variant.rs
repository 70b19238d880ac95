use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-variant pricing parameters.
///
/// `rounding_step` is one of 1, 10, 50 or 100; the pricing crate validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSettings {
    pub company_id: String,
    #[serde(default)]
    pub percent_up: Decimal,
    #[serde(default)]
    pub fixed_add: Decimal,
    #[serde(default)]
    pub random_spread: Decimal,
    #[serde(default = "default_rounding_step")]
    pub rounding_step: Decimal,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_rounding_step() -> Decimal {
    Decimal::ONE
}

fn default_enabled() -> bool {
    true
}

impl VariantSettings {
    pub fn for_company(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            percent_up: Decimal::ZERO,
            fixed_add: Decimal::ZERO,
            random_spread: Decimal::ZERO,
            rounding_step: default_rounding_step(),
            enabled: true,
        }
    }
}
