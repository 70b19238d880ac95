//! One rendered offer per enabled pricing variant.
//!
//! Variants share the extracted items, the company store and the template read-only.
//! Each gets its own RNG and output path, so they run in parallel without locking.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use offer_engine::{RenderReport, TableSynthesisEngine, TemplateSource};
use pricing::apply_pricing;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use shared_types::{LineItem, VariantSettings};
use tracing::info;

use crate::naming::output_file_name;
use crate::profiles::CompanyStore;

/// Everything a batch needs, borrowed for its duration.
pub struct Batch<'a> {
    pub engine: &'a TableSynthesisEngine,
    pub store: &'a CompanyStore,
    pub items: &'a [LineItem],
    pub template: &'a TemplateSource,
    pub out_dir: &'a Path,
    /// Shared by every file of the batch.
    pub timestamp: String,
    /// Variant `i` (1-based) uses `seed + i`; entropy when unset.
    pub seed: Option<u64>,
    pub parallel: bool,
}

#[derive(Debug, Clone)]
pub struct VariantOutput {
    /// 1-based variant number.
    pub variant: usize,
    pub company_id: String,
    pub path: PathBuf,
    pub report: RenderReport,
}

impl Batch<'_> {
    /// Render every variant. Stops scheduling new variants after the first failure and
    /// returns the error of the earliest failed variant. Files already written stay.
    pub fn run(&self, variants: &[VariantSettings]) -> anyhow::Result<Vec<VariantOutput>> {
        let failed = AtomicBool::new(false);
        let attempt = |(offset, settings): (usize, &VariantSettings)| {
            if failed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            let result = self.render_variant(offset + 1, settings);
            if result.is_err() {
                failed.store(true, Ordering::SeqCst);
            }
            result.map(Some)
        };

        let results: Vec<anyhow::Result<Option<VariantOutput>>> = if self.parallel {
            variants.par_iter().enumerate().map(attempt).collect()
        } else {
            let mut results = Vec::with_capacity(variants.len());
            for entry in variants.iter().enumerate() {
                let result = attempt(entry);
                let stop = result.is_err();
                results.push(result);
                if stop {
                    break;
                }
            }
            results
        };

        let mut outputs = Vec::with_capacity(results.len());
        for result in results {
            if let Some(output) = result? {
                outputs.push(output);
            }
        }
        Ok(outputs)
    }

    fn rng_for(&self, variant: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(variant as u64)),
            None => StdRng::from_entropy(),
        }
    }

    fn render_variant(
        &self,
        variant: usize,
        settings: &VariantSettings,
    ) -> anyhow::Result<VariantOutput> {
        let context = || format!("Variant {variant} ({})", settings.company_id);
        let company = self.store.get(&settings.company_id).with_context(context)?;
        info!(
            variant,
            company = company.name.as_str(),
            percent_up = %settings.percent_up,
            fixed_add = %settings.fixed_add,
            random_spread = %settings.random_spread,
            rounding_step = %settings.rounding_step,
            "rendering variant"
        );

        let mut rng = self.rng_for(variant);
        let priced = apply_pricing(self.items, settings, &mut rng).with_context(context)?;

        let file_name = output_file_name(
            &company.name,
            &self.timestamp,
            variant,
            self.template.output_format(),
        );
        let path = self.out_dir.join(file_name);
        let report = self
            .engine
            .render(self.template, company, &priced, &path)
            .with_context(context)?;

        Ok(VariantOutput {
            variant,
            company_id: settings.company_id.clone(),
            path,
            report,
        })
    }
}
