//! Entry point for the monthly grid statistics run.
//! Reads `input/<Month>/<label>.txt` under the working directory and writes one table per month.

use clap::Parser;
use fluvial_glacial::cli::Args;
use fluvial_glacial::grid_statistics::HEADER;
use fluvial_glacial::prelude::*;
use std::process;
use tracing::{error, info};

fn run(args: &Args) -> Result<()> {
    let dir = args.working_dir()?;
    info!("Working directory {}", dir.display());

    let run = GridStatisticsRun::new(GridRunConfig::default(), &dir)?;
    for month in run.run()? {
        println!("{}", month.month);
        println!("{}", HEADER);
        for row in &month.rows {
            println!("{}", row);
        }
        info!(
            "Wrote {} rows to {} ({} skipped)",
            month.rows.len(),
            month.output.display(),
            month.skipped.len()
        );
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
