use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use calc_data::RateTableLoader;
use clap::Parser;

/// Validate a rate table CSV file and print the tables it defines.
///
/// The CSV file should have the following columns:
/// - table_id: The table the band belongs to (e.g., income-tax)
/// - upper_bound: Inclusive upper bound of the band (empty for unbounded)
/// - rate: The band's rate as a decimal (e.g., 0.23) or a fixed amount
#[derive(Parser, Debug)]
#[command(name = "rate-table-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing rate tables
    #[arg(short, long)]
    file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = RateTableLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let tables = RateTableLoader::build(&records).context("Invalid rate table")?;

    for (table_id, table) in &tables {
        println!("{table_id} ({} bands)", table.len());
        for band in table.bands() {
            match band.upper_bound {
                Some(bound) => println!("  up to {:>12}  {}", bound, band.rate),
                None => println!("  {:>18}  {}", "above", band.rate),
            }
        }
    }

    println!("{} tables are valid.", tables.len());

    Ok(())
}
