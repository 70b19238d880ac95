//! Keyword tables for header roles, totals rows and party placeholders

use serde::{Deserialize, Serialize};

/// Semantic meaning of a goods table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Name,
    Quantity,
    Unit,
    UnitPrice,
    Amount,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::Name,
        ColumnRole::Quantity,
        ColumnRole::Unit,
        ColumnRole::UnitPrice,
        ColumnRole::Amount,
    ];
}

/// Kind of summary row below the goods lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalsCategory {
    GrandTotal,
    Vat,
    TotalExcludingVat,
}

/// Item name column
pub const NAME_SYNONYMS: &[&str] = &[
    "наименование",
    "товар",
    "услуга",
    "описание объекта закупки",
    "наименование товара",
    "name",
    "description",
    "item",
];

/// Quantity column
pub const QUANTITY_SYNONYMS: &[&str] = &["количество", "кол-во", "кол во", "кол.", "qty", "quantity"];

/// Unit of measure column
pub const UNIT_SYNONYMS: &[&str] = &[
    "ед",
    "ед.",
    "едизм",
    "ед.изм",
    "единица измерения",
    "unit",
    "uom",
];

/// Unit price column
pub const UNIT_PRICE_SYNONYMS: &[&str] = &[
    "цена",
    "цена за ед",
    "цена за единицу",
    "цена, руб",
    "price",
];

/// Line amount column
pub const AMOUNT_SYNONYMS: &[&str] = &[
    "сумма",
    "стоимость",
    "итого",
    "сумма, руб",
    "amount",
    "total",
    "sum",
];

/// Totals rows that exclude VAT. Checked first: they also contain the VAT keyword.
pub const EXCLUDING_VAT_KEYWORDS: &[&str] =
    &["без ндс", "excluding vat", "excl. vat", "without vat"];

/// VAT rows
pub const VAT_KEYWORDS: &[&str] = &["ндс", "vat"];

/// Grand total rows
pub const GRAND_TOTAL_KEYWORDS: &[&str] = &["итого", "всего", "total"];

/// Exact first-column labels that mark a totals row in spreadsheet templates
pub const SHEET_TOTAL_LABELS: &[&str] = &[
    "итого",
    "всего",
    "итого:",
    "всего:",
    "total",
    "total:",
    "grand total",
];

/// Party placeholder tokens recognised in templates.
pub const COMPANY_NAME_TOKEN: &str = "{{COMPANY_NAME}}";
pub const TAX_ID_TOKEN: &str = "{{INN}}";
pub const ADDRESS_TOKEN: &str = "{{ADDRESS}}";
pub const PHONE_TOKEN: &str = "{{PHONE}}";
pub const RESPONSIBLE_PERSON_TOKEN: &str = "{{CEO}}";

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Header synonyms per column role. Matching is by substring of the normalised cell text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderSynonyms {
    pub name: Vec<String>,
    pub quantity: Vec<String>,
    pub unit: Vec<String>,
    pub unit_price: Vec<String>,
    pub amount: Vec<String>,
}

impl HeaderSynonyms {
    pub fn for_role(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Name => &self.name,
            ColumnRole::Quantity => &self.quantity,
            ColumnRole::Unit => &self.unit,
            ColumnRole::UnitPrice => &self.unit_price,
            ColumnRole::Amount => &self.amount,
        }
    }
}

impl Default for HeaderSynonyms {
    fn default() -> Self {
        Self {
            name: owned(NAME_SYNONYMS),
            quantity: owned(QUANTITY_SYNONYMS),
            unit: owned(UNIT_SYNONYMS),
            unit_price: owned(UNIT_PRICE_SYNONYMS),
            amount: owned(AMOUNT_SYNONYMS),
        }
    }
}

/// Keywords per totals category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalsKeywords {
    pub excluding_vat: Vec<String>,
    pub vat: Vec<String>,
    pub grand_total: Vec<String>,
}

impl TotalsKeywords {
    /// Categories in classification priority order.
    pub fn in_priority_order(&self) -> [(TotalsCategory, &[String]); 3] {
        [
            (TotalsCategory::TotalExcludingVat, self.excluding_vat.as_slice()),
            (TotalsCategory::Vat, self.vat.as_slice()),
            (TotalsCategory::GrandTotal, self.grand_total.as_slice()),
        ]
    }
}

impl Default for TotalsKeywords {
    fn default() -> Self {
        Self {
            excluding_vat: owned(EXCLUDING_VAT_KEYWORDS),
            vat: owned(VAT_KEYWORDS),
            grand_total: owned(GRAND_TOTAL_KEYWORDS),
        }
    }
}

/// Complete vocabulary. Every field can be overridden from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub headers: HeaderSynonyms,
    pub totals: TotalsKeywords,
    pub sheet_total_labels: SheetTotalLabels,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetTotalLabels(pub Vec<String>);

impl SheetTotalLabels {
    /// Exact match against the trimmed, lowercased cell text.
    pub fn matches(&self, cell_text: &str) -> bool {
        let probe = cell_text.trim().to_lowercase();
        !probe.is_empty() && self.0.iter().any(|label| label.trim().to_lowercase() == probe)
    }
}

impl Default for SheetTotalLabels {
    fn default() -> Self {
        Self(owned(SHEET_TOTAL_LABELS))
    }
}
