//! qoi-bench CLI - batch lossless round-trip test for a QOI-style codec

use std::path::PathBuf;

use clap::Parser;

mod commands;

/// Batch compression performance test.
///
/// Runs the codec's encode, decode and compare verbs on every bitmap in the
/// test set and prints a report to stdout.
#[derive(Parser)]
#[command(name = "qoi-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Codec program under test
    program: Option<PathBuf>,

    /// Directory containing the *.bmp test set
    test_set: Option<PathBuf>,

    /// Directory for per-worker temporary files
    #[arg(long, env = "QOI_BENCH_TEMP_DIR", default_value = "temp")]
    temp_dir: PathBuf,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::init_logging(cli.verbose);

    println!("Batch Compression Performance Test");
    println!("qoi-bench <test program> <test set path>");

    let (Some(program), Some(test_set)) = (cli.program, cli.test_set) else {
        return Ok(());
    };

    commands::run::run(&program, &test_set, cli.temp_dir, cli.json)
}
