//! check_cuckoo_filter: verify filters produced by make_cuckoo_filter
//!
//! Every list in the source repository must test positive against its
//! filter, and random probes must not hit a filter noticeably more often
//! than the target false-positive rate.

use clap::Parser;
use cuckoo_targeting::builder::DEFAULT_TARGET_FP_RATE;
use cuckoo_targeting::repository::{verify_repository_with, Repository};
use cuckoo_targeting::verifier::validate_target_fp_rate;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Checks the correctness of cuckoo filters
#[derive(Parser, Debug)]
#[command(name = "check_cuckoo_filter", version)]
struct Cli {
    /// Input JSON ad repository file
    src_file_name: PathBuf,

    /// Input JSON cuckoo filter file output by make_cuckoo_filter
    cuckoo_filter_file_name: PathBuf,

    /// Target false positive rate used by make_cuckoo_filter
    #[arg(default_value_t = DEFAULT_TARGET_FP_RATE)]
    target_fp_rate: f64,
}

fn run(cli: &Cli) -> cuckoo_targeting::Result<()> {
    validate_target_fp_rate(cli.target_fp_rate)?;

    let source = Repository::from_path(&cli.src_file_name)?;
    let filtered = Repository::from_path(&cli.cuckoo_filter_file_name)?;
    let mut rng = rand::thread_rng();

    let mut checked = 0;
    verify_repository_with(&source, &filtered, cli.target_fp_rate, &mut rng, |report| {
        println!(
            "Row {} {}: False negative check OK. No false negatives.",
            report.row, report.field
        );
        println!(
            "Row {} {}: False positive check OK. {}",
            report.row, report.field, report.false_positives
        );
        checked += 1;
    })?;
    info!(filters = checked, "Verified cuckoo filters");
    Ok(())
}

fn main() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .from_env_lossy();
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("Correctness check failed");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
    println!("Correctness check done! Constructed cuckoo filters are correct.");
}
