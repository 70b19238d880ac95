//! Commercial offer generator binary.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use offer_cli::logging::init_tracing;
use offer_cli::naming::timestamp;
use offer_cli::{Batch, CompanyStore, Config};
use offer_engine::samples::write_sample_templates;
use offer_engine::TableSynthesisEngine;

#[derive(Parser, Debug)]
#[command(name = "offer-cli")]
#[command(version, about = "Generate priced commercial offer variants from a price list")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one offer per enabled pricing variant
    Generate(GenerateArgs),
    /// Write sample Word and Excel templates
    Templates {
        /// Target directory
        #[arg(long, default_value = "templates")]
        dir: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Supplier price list (.xlsx, .xlsm or .pdf)
    #[arg(short, long)]
    input: PathBuf,

    /// Configuration file (default: ./offer.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Word template, overrides [templates] docx
    #[arg(long)]
    docx_template: Option<PathBuf>,

    /// Excel template, overrides [templates] xlsx
    #[arg(long)]
    xlsx_template: Option<PathBuf>,

    /// Output directory, overrides [output] dir
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Seed for the random price spread; variant i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Render variants one after another
    #[arg(long)]
    sequential: bool,

    /// Also write logs to a timestamped file in the output directory
    #[arg(long)]
    log_file: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => generate(args),
        Command::Templates { dir } => {
            init_tracing(None, "")?;
            let (docx, xlsx) = write_sample_templates(&dir)
                .with_context(|| format!("Failed to write templates to {}", dir.display()))?;
            println!("{}", docx.display());
            println!("{}", xlsx.display());
            Ok(())
        }
    }
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if args.docx_template.is_some() {
        config.templates.docx = args.docx_template;
    }
    if args.xlsx_template.is_some() {
        config.templates.xlsx = args.xlsx_template;
    }
    if let Some(dir) = args.out_dir {
        config.output.dir = dir;
    }
    if args.sequential {
        config.batch.parallel = false;
    }

    let stamp = timestamp(Local::now());
    let out_dir = config.output.prepare_dir()?;
    let log_path = init_tracing(args.log_file.then_some(out_dir.as_path()), &stamp)?;
    tracing::info!("Starting offer generator v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = log_path {
        tracing::info!(path = %path.display(), "logging to file");
    }

    config.validate()?;
    let store = CompanyStore::load(&config.profiles.path)?;
    let items = price_extract::read_items(&args.input, &config.vocabulary)
        .with_context(|| format!("Failed to read items from {}", args.input.display()))?;
    tracing::info!(items = items.len(), input = %args.input.display(), "price list read");

    let template = config.templates.source(config.output.format)?;
    let engine = TableSynthesisEngine::new(config.vocabulary.clone(), config.vat_policy());
    let variants = config.enabled_variants();
    let batch = Batch {
        engine: &engine,
        store: &store,
        items: &items,
        template: &template,
        out_dir: &out_dir,
        timestamp: stamp,
        seed: args.seed,
        parallel: config.batch.parallel,
    };

    let outputs = batch.run(&variants)?;
    for output in &outputs {
        println!(
            "v{} {} {} rows, total {}",
            output.variant,
            output.path.display(),
            output.report.rows_written,
            offer_engine::format::format_money(output.report.totals.grand_total)
        );
    }
    tracing::info!(files = outputs.len(), dir = %out_dir.display(), "offers written");
    Ok(())
}
