//! qoi-bmp-convert - flatten a PNG tree into a 24-bit RGB bitmap test set

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use qoi_bench::corpus::convert_directory;
use tracing_subscriber::EnvFilter;

/// Test bitmap converter.
///
/// Every PNG under ROOT is written to OUT as `<subdir>___<name>.bmp`, so the
/// source directory becomes the image class in qoi-bench reports. OUT is
/// deleted and recreated.
#[derive(Parser)]
#[command(name = "qoi-bmp-convert")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory searched recursively for *.png
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Output directory
    #[arg(default_value = "./out")]
    out: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    println!("Test Bitmap Converter");

    let summary = convert_directory(&cli.root, &cli.out).with_context(|| {
        format!("Failed to convert {} into {}", cli.root.display(), cli.out.display())
    })?;

    println!("Converted {} image(s) into {}", summary.converted, cli.out.display());
    if summary.failed > 0 {
        println!("{} image(s) could not be converted", summary.failed);
    }

    Ok(())
}
