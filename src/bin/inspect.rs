//! Development tool: load the input tables and print what is in them
//!
//! Usage: inspect [--data-dir DIR]
//!
//! Runs the same loader and reshaper as the dashboard, then prints the
//! schema, grid dimensions and per-column code histograms. No rendering,
//! no network.

use std::collections::BTreeMap;
use std::path::PathBuf;

use telemap::telec::grid::{CorrelationGrid, DuplicatePolicy};
use telemap::telec::loader;
use telemap::telec::schema::TestVariant;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let data_dir = args
        .iter()
        .position(|a| a == "--data-dir")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    let correlation_path = data_dir.join("amax_pp_telec.csv");
    let nonstat_path = data_dir.join("amax_pp_nonstat.csv");

    println!("=== Correlation table: {} ===", correlation_path.display());
    let correlation = loader::load_correlation_table(&correlation_path)?;
    println!("rows: {}", correlation.rows.len());
    println!("value columns: {:?}", correlation.value_columns);

    let grid = CorrelationGrid::reshape(&correlation, DuplicatePolicy::LastWins)?;
    println!(
        "grid: {} rlon × {} rlat",
        grid.rlon_axis.len(),
        grid.rlat_axis.len()
    );
    for name in correlation.value_columns.iter() {
        let mut histogram: BTreeMap<i64, usize> = BTreeMap::new();
        for (_, _, value) in grid.defined_cells(name) {
            *histogram.entry(value.round() as i64).or_default() += 1;
        }
        println!(
            "  {name}: {} defined cells, codes {:?}",
            grid.defined_count(name),
            histogram
        );
    }

    println!();
    println!("=== Non-stationarity table: {} ===", nonstat_path.display());
    let nonstat = loader::load_nonstationarity_table(&nonstat_path)?;
    println!("rows: {}", nonstat.rows.len());
    for variant in TestVariant::ALL {
        let mut histogram: BTreeMap<u8, usize> = BTreeMap::new();
        for row in &nonstat.rows {
            *histogram.entry(row.code(variant)).or_default() += 1;
        }
        let nonzero: usize = histogram
            .iter()
            .filter(|(&code, _)| code != 0)
            .map(|(_, &n)| n)
            .sum();
        println!(
            "  {} ({}): {nonzero} flagged, codes {:?}",
            variant.column(),
            variant.label(),
            histogram
        );
    }

    Ok(())
}
