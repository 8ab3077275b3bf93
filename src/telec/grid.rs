//! Grid reshaper: sparse coordinate-keyed rows to a dense 2-D grid
//!
//! Rendering wants one addressable cell per unique (rlon, rlat) pair, with
//! the two coordinate columns promoted to orthogonal index axes. Pairs
//! absent from the input stay undefined and must be treated as transparent
//! by everything downstream, never as zero.

use super::error::{Result, TelecError};
use super::loader::CorrelationTable;
use std::cmp::Ordering;

/// What to do when the same (rlon, rlat) pair occurs twice in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Later row overwrites the earlier one
    #[default]
    LastWins,
    /// Duplicates abort the reshape with an error naming the pair
    Reject,
}

/// One named value layer over the grid, row-major over (rlat, rlon)
#[derive(Debug, Clone)]
struct GridLayer {
    name: String,
    cells: Vec<Option<f64>>,
}

/// Dense coordinate-indexed grid with one value layer per table column
#[derive(Debug, Clone)]
pub struct CorrelationGrid {
    /// Sorted unique rotated longitudes (x axis)
    pub rlon_axis: Vec<f64>,
    /// Sorted unique rotated latitudes (y axis)
    pub rlat_axis: Vec<f64>,
    layers: Vec<GridLayer>,
}

impl CorrelationGrid {
    /// Reshape a correlation table into a grid.
    ///
    /// The axes are the sorted unique coordinate values present in the
    /// input; every table column becomes a layer. Reshaping the same table
    /// twice yields the same grid.
    pub fn reshape(table: &CorrelationTable, policy: DuplicatePolicy) -> Result<CorrelationGrid> {
        let rlon_axis = sorted_unique(table.rows.iter().map(|r| r.rlon));
        let rlat_axis = sorted_unique(table.rows.iter().map(|r| r.rlat));
        let n_cells = rlon_axis.len() * rlat_axis.len();

        let mut layers: Vec<GridLayer> = table
            .value_columns
            .iter()
            .map(|name| GridLayer {
                name: name.clone(),
                cells: vec![None; n_cells],
            })
            .collect();

        let mut occupied = vec![false; n_cells];
        for row in &table.rows {
            // Axis membership is guaranteed by construction
            let i = axis_index(&rlon_axis, row.rlon).expect("rlon on axis");
            let j = axis_index(&rlat_axis, row.rlat).expect("rlat on axis");
            let cell = j * rlon_axis.len() + i;

            if occupied[cell] && policy == DuplicatePolicy::Reject {
                return Err(TelecError::DuplicateCell {
                    rlon: row.rlon,
                    rlat: row.rlat,
                });
            }
            occupied[cell] = true;

            for (layer, value) in layers.iter_mut().zip(row.values.iter()) {
                layer.cells[cell] = *value;
            }
        }

        Ok(CorrelationGrid {
            rlon_axis,
            rlat_axis,
            layers,
        })
    }

    /// Names of the value layers, in table column order
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.name.as_str())
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name == name)
    }

    /// Value of one layer at grid indices (i along rlon, j along rlat)
    pub fn value_at(&self, layer: &str, i: usize, j: usize) -> Option<f64> {
        let layer = self.layers.iter().find(|l| l.name == layer)?;
        layer.cells.get(j * self.rlon_axis.len() + i).copied().flatten()
    }

    /// All layer values at one cell, paired with their layer names
    pub fn values_at(&self, i: usize, j: usize) -> Vec<(&str, Option<f64>)> {
        let cell = j * self.rlon_axis.len() + i;
        self.layers
            .iter()
            .map(|l| (l.name.as_str(), l.cells.get(cell).copied().flatten()))
            .collect()
    }

    /// Defined cells of one layer as (i, j, value)
    pub fn defined_cells<'a>(
        &'a self,
        layer: &str,
    ) -> Box<dyn Iterator<Item = (usize, usize, f64)> + 'a> {
        let Some(layer) = self.layers.iter().find(|l| l.name == layer) else {
            return Box::new(std::iter::empty());
        };
        let nx = self.rlon_axis.len();
        Box::new(
            layer
                .cells
                .iter()
                .enumerate()
                .filter_map(move |(cell, value)| value.map(|v| (cell % nx, cell / nx, v))),
        )
    }

    /// Number of defined cells in one layer
    pub fn defined_count(&self, layer: &str) -> usize {
        self.defined_cells(layer).count()
    }

    /// Rotated-coordinate bounds of a cell, from midpoints to its neighbors.
    /// Returns (rlon_min, rlon_max, rlat_min, rlat_max).
    pub fn cell_bounds(&self, i: usize, j: usize) -> (f64, f64, f64, f64) {
        let (x0, x1) = axis_bounds(&self.rlon_axis, i);
        let (y0, y1) = axis_bounds(&self.rlat_axis, j);
        (x0, x1, y0, y1)
    }
}

/// Half-width used for a degenerate one-value axis; half of the 0.11°
/// rotated grid step the analysis runs on.
const DEFAULT_HALF_STEP: f64 = 0.055;

fn axis_bounds(axis: &[f64], idx: usize) -> (f64, f64) {
    let center = axis[idx];
    let below = idx.checked_sub(1).map(|k| (center - axis[k]) / 2.0);
    let above = axis.get(idx + 1).map(|next| (next - center) / 2.0);
    let half_low = below.or(above).unwrap_or(DEFAULT_HALF_STEP);
    let half_high = above.or(below).unwrap_or(DEFAULT_HALF_STEP);
    (center - half_low, center + half_high)
}

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

fn axis_index(axis: &[f64], value: f64) -> Option<usize> {
    axis.binary_search_by(|probe| probe.total_cmp(&value))
        .ok()
        .or_else(|| {
            // Guard against -0.0/0.0 straddles
            axis.iter()
                .position(|&v| v.partial_cmp(&value) == Some(Ordering::Equal))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telec::loader::parse_correlation_table;

    fn three_row_table() -> CorrelationTable {
        let csv = "rlon;rlat;pearson_xcorr_sig_lag0_aft\n\
                   0.0;0.0;5\n\
                   1.0;0.0;12\n\
                   0.0;1.0;1\n";
        parse_correlation_table(csv.as_bytes(), "corr").unwrap()
    }

    #[test]
    fn reshape_exposes_one_cell_per_input_pair() {
        let table = three_row_table();
        let grid = CorrelationGrid::reshape(&table, DuplicatePolicy::LastWins).unwrap();

        assert_eq!(grid.rlon_axis, vec![0.0, 1.0]);
        assert_eq!(grid.rlat_axis, vec![0.0, 1.0]);

        let layer = "pearson_xcorr_sig_lag0_aft";
        assert_eq!(grid.defined_count(layer), 3);
        assert_eq!(grid.value_at(layer, 0, 0), Some(5.0));
        assert_eq!(grid.value_at(layer, 1, 0), Some(12.0));
        assert_eq!(grid.value_at(layer, 0, 1), Some(1.0));
        // the pair absent from the input is undefined, not zero
        assert_eq!(grid.value_at(layer, 1, 1), None);
    }

    #[test]
    fn reshape_is_idempotent() {
        let table = three_row_table();
        let a = CorrelationGrid::reshape(&table, DuplicatePolicy::LastWins).unwrap();
        let b = CorrelationGrid::reshape(&table, DuplicatePolicy::LastWins).unwrap();

        assert_eq!(a.rlon_axis, b.rlon_axis);
        assert_eq!(a.rlat_axis, b.rlat_axis);
        let layer = "pearson_xcorr_sig_lag0_aft";
        let cells_a: Vec<_> = a.defined_cells(layer).collect();
        let cells_b: Vec<_> = b.defined_cells(layer).collect();
        assert_eq!(cells_a, cells_b);
    }

    #[test]
    fn duplicate_pair_last_wins_by_default() {
        let csv = "rlon;rlat;pearson_xcorr_sig_lag0_aft\n\
                   0.0;0.0;5\n\
                   0.0;0.0;9\n";
        let table = parse_correlation_table(csv.as_bytes(), "corr").unwrap();
        let grid = CorrelationGrid::reshape(&table, DuplicatePolicy::LastWins).unwrap();
        assert_eq!(grid.value_at("pearson_xcorr_sig_lag0_aft", 0, 0), Some(9.0));
    }

    #[test]
    fn duplicate_pair_rejected_under_strict_policy() {
        let csv = "rlon;rlat;pearson_xcorr_sig_lag0_aft\n\
                   0.0;0.0;5\n\
                   0.0;0.0;9\n";
        let table = parse_correlation_table(csv.as_bytes(), "corr").unwrap();
        let err = CorrelationGrid::reshape(&table, DuplicatePolicy::Reject).unwrap_err();
        match err {
            TelecError::DuplicateCell { rlon, rlat } => {
                assert_eq!(rlon, 0.0);
                assert_eq!(rlat, 0.0);
            }
            other => panic!("expected DuplicateCell, got {other}"),
        }
    }

    #[test]
    fn unknown_layer_yields_no_cells() {
        let table = three_row_table();
        let grid = CorrelationGrid::reshape(&table, DuplicatePolicy::LastWins).unwrap();
        assert_eq!(grid.defined_count("no_such_layer"), 0);
        assert!(!grid.has_layer("no_such_layer"));
    }

    #[test]
    fn cell_bounds_sit_on_neighbor_midpoints() {
        let csv = "rlon;rlat;c\n0.0;0.0;1\n0.5;0.0;2\n1.5;0.0;3\n";
        let table = parse_correlation_table(csv.as_bytes(), "corr").unwrap();
        let grid = CorrelationGrid::reshape(&table, DuplicatePolicy::LastWins).unwrap();

        let (x0, x1, y0, y1) = grid.cell_bounds(1, 0);
        assert_eq!((x0, x1), (0.25, 1.0));
        // single-value axis falls back to the default half step
        assert_eq!((y0, y1), (-DEFAULT_HALF_STEP, DEFAULT_HALF_STEP));
    }

    #[test]
    fn all_table_columns_become_layers() {
        let csv = "rlon;rlat;a;b\n0.0;0.0;1;2\n";
        let table = parse_correlation_table(csv.as_bytes(), "corr").unwrap();
        let grid = CorrelationGrid::reshape(&table, DuplicatePolicy::LastWins).unwrap();
        assert_eq!(grid.layer_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(grid.values_at(0, 0), vec![("a", Some(1.0)), ("b", Some(2.0))]);
    }
}
