//! Entry point for the cross-section run.
//! Reads `input/MODEL OUTPUT/<quantity> alltimes/` under the working directory.

use clap::Parser;
use fluvial_glacial::cli::Args;
use fluvial_glacial::prelude::*;
use std::process;
use tracing::{error, info};

fn run(args: &Args) -> Result<()> {
    let dir = args.working_dir()?;
    info!("Working directory {}", dir.display());

    let report = CrossSectionRun::new(CrossSectionConfig::default(), &dir)?.run()?;
    for (quantity, row) in &report.rows {
        println!("{},{}", quantity, row);
    }
    for path in &report.summaries {
        info!("Wrote {}", path.display());
    }
    if !report.skipped.is_empty() {
        info!("{} cross-section files skipped", report.skipped.len());
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
