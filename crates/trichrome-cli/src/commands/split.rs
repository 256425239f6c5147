use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use trichrome_core::io::image_io::save_plane;
use trichrome_core::io::{ImageCodec, ImageCrateCodec};
use trichrome_core::pipeline::prepare_output_dir;
use trichrome_core::plane::Channel;
use trichrome_core::split::{luma_plane, split_channels};

#[derive(Args)]
pub struct SplitArgs {
    /// Plate image
    pub file: PathBuf,

    /// Directory the bands are written to
    #[arg(long, default_value = ".")]
    pub outdir: PathBuf,

    /// Config file (TOML); only the [split] section is used
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &SplitArgs) -> Result<()> {
    let config = super::config::load(args.config.as_deref())?;
    let out_dir = prepare_output_dir(&args.outdir)?;

    let decoded = ImageCrateCodec.decode(&args.file)?;
    let planes = split_channels(&luma_plane(&decoded.image)?, &config.split)?;

    let stem = args
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Input path has no file name")?;
    let ext = args
        .file
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");

    for channel in Channel::ALL {
        let path = out_dir.join(band_file_name(stem, channel, ext));
        save_plane(planes.get(channel), decoded.format, &path)?;
        println!("{:<6} {}", channel, path.display());
    }

    Ok(())
}

fn band_file_name(stem: &str, channel: Channel, ext: &str) -> String {
    let suffix = match channel {
        Channel::Red => "r",
        Channel::Green => "g",
        Channel::Blue => "b",
    };
    format!("{stem}_{suffix}.{ext}")
}
