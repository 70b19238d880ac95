//! Generator configuration
//!
//! TOML file with output location, templates, company store, VAT rate, vocabulary
//! overrides and the list of pricing variants. Every section is optional except
//! `[[variants]]`, which must enable at least `batch.min_variants` entries.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use offer_engine::{OutputFormat, TemplateSource, VatPolicy, Vocabulary};
use pricing::validate_settings;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::VariantSettings;
use tracing::warn;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "offer.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub totals: TotalsConfig,
    #[serde(default)]
    pub vocabulary: Vocabulary,
    #[serde(default)]
    pub variants: Vec<VariantSettings>,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Load `path` when given, else `offer.toml` from the working directory when present,
    /// else the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn enabled_variants(&self) -> Vec<VariantSettings> {
        self.variants.iter().filter(|v| v.enabled).cloned().collect()
    }

    /// Check variant settings and the minimum variant count.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (index, variant) in self.variants.iter().enumerate() {
            if variant.enabled {
                validate_settings(variant)
                    .with_context(|| format!("Variant {} ({})", index + 1, variant.company_id))?;
            }
        }
        let enabled = self.variants.iter().filter(|v| v.enabled).count();
        if enabled < self.batch.min_variants {
            bail!(
                "At least {} enabled variants are required, {} configured",
                self.batch.min_variants,
                enabled
            );
        }
        if self.totals.vat_rate_percent.is_sign_negative() {
            bail!("VAT rate must not be negative");
        }
        Ok(())
    }

    pub fn vat_policy(&self) -> VatPolicy {
        VatPolicy {
            rate_percent: self.totals.vat_rate_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Forces the output format; picked from the configured templates when unset.
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: None,
        }
    }
}

fn default_output_dir() -> PathBuf {
    dirs::document_dir()
        .map(|docs| docs.join("KP_Generator_Output"))
        .unwrap_or_else(fallback_output_dir)
}

fn fallback_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl OutputConfig {
    /// Create the output directory, falling back to `./output` when it cannot be created.
    pub fn prepare_dir(&self) -> anyhow::Result<PathBuf> {
        match std::fs::create_dir_all(&self.dir) {
            Ok(()) => Ok(self.dir.clone()),
            Err(e) => {
                let fallback = fallback_output_dir();
                warn!(dir = %self.dir.display(), error = %e, fallback = %fallback.display(), "output directory unavailable");
                std::fs::create_dir_all(&fallback).with_context(|| {
                    format!("Failed to create output directory: {}", fallback.display())
                })?;
                Ok(fallback)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesConfig {
    pub docx: Option<PathBuf>,
    pub xlsx: Option<PathBuf>,
}

impl TemplatesConfig {
    /// Template for the batch; a Word template wins unless the format says otherwise.
    pub fn source(&self, format: Option<OutputFormat>) -> anyhow::Result<TemplateSource> {
        let source = match format {
            None => TemplateSource::select(self.docx.as_deref(), self.xlsx.as_deref()),
            Some(OutputFormat::Docx) => match &self.docx {
                Some(path) => TemplateSource::Docx(path.clone()),
                None => bail!("Output format docx requires a Word template (templates.docx)"),
            },
            Some(OutputFormat::Xlsx) => TemplateSource::select(None, self.xlsx.as_deref()),
        };
        match &source {
            TemplateSource::Docx(path) | TemplateSource::Xlsx(path) if !path.exists() => {
                bail!("Template not found: {}", path.display())
            }
            _ => Ok(source),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default = "default_profiles_path")]
    pub path: PathBuf,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            path: default_profiles_path(),
        }
    }
}

fn default_profiles_path() -> PathBuf {
    PathBuf::from("assets").join("companies.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalsConfig {
    /// VAT rate included in item prices, percent.
    #[serde(default = "default_vat_rate")]
    pub vat_rate_percent: Decimal,
}

impl Default for TotalsConfig {
    fn default() -> Self {
        Self {
            vat_rate_percent: default_vat_rate(),
        }
    }
}

fn default_vat_rate() -> Decimal {
    Decimal::from(20)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default = "default_min_variants")]
    pub min_variants: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            min_variants: default_min_variants(),
        }
    }
}

fn default_parallel() -> bool {
    true
}

fn default_min_variants() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const FULL: &str = r#"
        [output]
        dir = "/tmp/kp"
        format = "xlsx"

        [templates]
        xlsx = "templates/template_kp.xlsx"

        [profiles]
        path = "companies.json"

        [totals]
        vat_rate_percent = 10

        [vocabulary.headers]
        name = ["позиция"]

        [batch]
        parallel = false

        [[variants]]
        company_id = "c1"
        percent_up = 10
        rounding_step = 10

        [[variants]]
        company_id = "c2"
        fixed_add = 50
        random_spread = 25.5

        [[variants]]
        company_id = "c3"
        enabled = false
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_str(FULL).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("/tmp/kp"));
        assert_eq!(config.output.format, Some(OutputFormat::Xlsx));
        assert_eq!(config.profiles.path, PathBuf::from("companies.json"));
        assert_eq!(config.vat_policy().rate_percent, dec!(10));
        assert_eq!(config.vocabulary.headers.name, vec!["позиция".to_string()]);
        assert!(!config.vocabulary.headers.quantity.is_empty());
        assert!(!config.batch.parallel);
        assert_eq!(config.batch.min_variants, 2);
        assert_eq!(config.variants.len(), 3);
        assert_eq!(config.variants[1].random_spread, dec!(25.5));
        assert_eq!(config.enabled_variants().len(), 2);
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.totals.vat_rate_percent, dec!(20));
        assert_eq!(config.profiles.path, PathBuf::from("assets/companies.json"));
        assert!(config.batch.parallel);
        assert!(config.output.dir.ends_with("KP_Generator_Output") || config.output.dir == PathBuf::from("output"));
        assert_eq!(config.vocabulary, Vocabulary::default());
    }

    #[test]
    fn test_too_few_variants() {
        let config = Config::from_str(
            r#"
            [[variants]]
            company_id = "c1"
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("At least 2 enabled variants"));
    }

    #[test]
    fn test_invalid_variant_names_position() {
        let config = Config::from_str(
            r#"
            [[variants]]
            company_id = "c1"

            [[variants]]
            company_id = "c2"
            rounding_step = 7
            "#,
        )
        .unwrap();
        let err = format!("{:#}", config.validate().unwrap_err());
        assert!(err.starts_with("Variant 2 (c2)"));
        assert!(err.contains("Rounding step"));
    }

    #[test]
    fn test_template_selection() {
        let dir = tempfile::tempdir().unwrap();
        let docx = dir.path().join("t.docx");
        let xlsx = dir.path().join("t.xlsx");
        std::fs::write(&docx, b"").unwrap();
        std::fs::write(&xlsx, b"").unwrap();

        let templates = TemplatesConfig {
            docx: Some(docx.clone()),
            xlsx: Some(xlsx.clone()),
        };
        assert_eq!(templates.source(None).unwrap(), TemplateSource::Docx(docx));
        assert_eq!(
            templates.source(Some(OutputFormat::Xlsx)).unwrap(),
            TemplateSource::Xlsx(xlsx)
        );

        let none = TemplatesConfig::default();
        assert_eq!(none.source(None).unwrap(), TemplateSource::DefaultLayout);
        assert!(none.source(Some(OutputFormat::Docx)).is_err());

        let missing = TemplatesConfig {
            docx: Some(dir.path().join("missing.docx")),
            xlsx: None,
        };
        assert!(missing.source(None).unwrap_err().to_string().contains("missing.docx"));
    }

    #[test]
    fn test_prepare_dir_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            dir: dir.path().join("a").join("b"),
            format: None,
        };
        assert_eq!(output.prepare_dir().unwrap(), dir.path().join("a").join("b"));
        assert!(dir.path().join("a").join("b").is_dir());
    }
}
