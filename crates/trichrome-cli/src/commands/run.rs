use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;
use trichrome_core::io::ImageCrateCodec;
use trichrome_core::pipeline::config::TrichromeConfig;
use trichrome_core::pipeline::run_batch;

use crate::progress::BarReporter;
use crate::summary::{print_batch_result, print_run_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Plate images (JPEG, PNG or TIFF)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Directory the composites are written to
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Maximum number of plates processed at once
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = build_config(args)?;
    config.validate().context("Invalid configuration")?;
    debug!(?config, "Resolved configuration");
    print_run_summary(&config, args.files.len());

    let reporter = BarReporter::new();
    let report = run_batch(&args.files, &config, &ImageCrateCodec, &reporter)?;
    reporter.finish();

    print_batch_result(&report);
    report.into_result()?;
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
pub fn build_config(args: &RunArgs) -> Result<TrichromeConfig> {
    let mut config = super::config::load(args.config.as_deref())?;
    if let Some(ref dir) = args.outdir {
        config.batch.output_dir = dir.clone();
    }
    if let Some(workers) = args.workers {
        config.batch.max_workers = workers;
    }
    Ok(config)
}
