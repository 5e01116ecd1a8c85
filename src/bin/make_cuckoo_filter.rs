//! make_cuckoo_filter: replace targeting lists with cuckoo filters
//!
//! Reads a JSON ad repository and prints it with every `excludes`,
//! `keywords` and `apps` list swapped for a Base64 cuckoo filter.

use clap::Parser;
use cuckoo_targeting::builder::DEFAULT_TARGET_FP_RATE;
use cuckoo_targeting::repository::{build_repository, Repository};
use std::path::PathBuf;
use tracing::{error, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Replace lists of targeting criteria in a JSON ad repository with
/// serialized cuckoo filters
#[derive(Parser, Debug)]
#[command(name = "make_cuckoo_filter", version)]
struct Cli {
    /// Input JSON ad repository file
    src_file_name: PathBuf,

    /// Target false positive rate
    #[arg(default_value_t = DEFAULT_TARGET_FP_RATE)]
    target_fp_rate: f64,
}

fn run(cli: &Cli) -> cuckoo_targeting::Result<String> {
    let repository = Repository::from_path(&cli.src_file_name)?;
    let built = build_repository(&repository, cli.target_fp_rate)?;
    built.to_json_pretty()
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
    match run(&cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!(file = %cli.src_file_name.display(), "Build failed");
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
