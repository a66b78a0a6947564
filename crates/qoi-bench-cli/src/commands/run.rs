//! Batch test command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qoi_bench::corpus::discover_test_set;
use qoi_bench::{BatchConfig, BatchSession, ProcessInvoker};
use tracing::info;

pub fn run(program: &Path, test_set: &Path, temp_dir: PathBuf, json: bool) -> Result<()> {
    let files = discover_test_set(test_set)
        .with_context(|| format!("Failed to list test set {}", test_set.display()))?;
    info!("Found {} bitmap(s) in {}", files.len(), test_set.display());

    let config = BatchConfig::builder().temp_dir(temp_dir).build();
    let session = BatchSession::new(config, ProcessInvoker::new(program));
    let report = session
        .run(&files)
        .with_context(|| format!("Failed to run {}", program.display()))?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render());
    }

    Ok(())
}
