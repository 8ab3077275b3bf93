//! Point filter: non-stationarity rows with a non-zero result code
//!
//! One subset per test variant. A row contributes a point if and only if
//! the variant's code column is non-zero; an all-zero column is a valid,
//! empty subset. Row order is preserved.

use super::loader::NonStationarityTable;
use super::schema::TestVariant;

/// One location where a test reported a result
#[derive(Debug, Clone, PartialEq)]
pub struct NonStatPoint {
    pub rlon: f64,
    pub rlat: f64,
    pub lon: f64,
    pub lat: f64,
    /// Result code, non-zero: 1 = change point, 2 = trend, 3 = both
    pub code: u8,
}

/// All points reported by one test variant, in original row order
#[derive(Debug, Clone)]
pub struct PointSet {
    pub variant: TestVariant,
    pub points: Vec<NonStatPoint>,
}

impl PointSet {
    /// Select the rows where `variant`'s result code differs from zero
    pub fn filter(table: &NonStationarityTable, variant: TestVariant) -> PointSet {
        let points = table
            .rows
            .iter()
            .filter(|row| row.code(variant) != 0)
            .map(|row| NonStatPoint {
                rlon: row.rlon,
                rlat: row.rlat,
                lon: row.lon,
                lat: row.lat,
                code: row.code(variant),
            })
            .collect();

        PointSet { variant, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telec::loader::parse_nonstationarity_table;

    fn table_with_hr_codes() -> NonStationarityTable {
        // nonstat_mk_HR column carries 0, 1, 2, 3, 0
        let csv =
            "rlon;rlat;lon;lat;nonstat_mk_orig;nonstat_mk_orig_BH;nonstat_mk_HR;nonstat_mk_HR_BH\n\
             0.0;0.0;-6.0;40.5;0;0;0;0\n\
             0.1;0.0;-5.9;40.5;1;0;1;1\n\
             0.2;0.0;-5.8;40.5;2;1;2;0\n\
             0.3;0.0;-5.7;40.5;3;0;3;0\n\
             0.4;0.0;-5.6;40.5;0;0;0;0\n";
        parse_nonstationarity_table(csv.as_bytes(), "nonstat").unwrap()
    }

    #[test]
    fn filter_keeps_exactly_the_nonzero_rows_in_order() {
        let table = table_with_hr_codes();
        let set = PointSet::filter(&table, TestVariant::MkHr);

        assert_eq!(set.len(), 3);
        let codes: Vec<u8> = set.points.iter().map(|p| p.code).collect();
        assert_eq!(codes, vec![1, 2, 3]);
        // original row order, by rlon
        let rlons: Vec<f64> = set.points.iter().map(|p| p.rlon).collect();
        assert_eq!(rlons, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn filtering_twice_is_a_no_op() {
        let table = table_with_hr_codes();
        let once = PointSet::filter(&table, TestVariant::MkHr);

        // re-filter the already filtered subset on the same column
        let refiltered: Vec<&NonStatPoint> =
            once.points.iter().filter(|p| p.code != 0).collect();
        assert_eq!(refiltered.len(), once.len());
        for (a, b) in refiltered.iter().zip(once.points.iter()) {
            assert_eq!(**a, *b);
        }
    }

    #[test]
    fn all_zero_column_yields_an_empty_valid_subset() {
        let csv =
            "rlon;rlat;lon;lat;nonstat_mk_orig;nonstat_mk_orig_BH;nonstat_mk_HR;nonstat_mk_HR_BH\n\
             0.0;0.0;-6.0;40.5;1;0;2;0\n";
        let table = parse_nonstationarity_table(csv.as_bytes(), "nonstat").unwrap();
        let set = PointSet::filter(&table, TestVariant::MkOrigBh);
        assert!(set.is_empty());
    }

    #[test]
    fn variants_filter_independently() {
        let table = table_with_hr_codes();
        assert_eq!(PointSet::filter(&table, TestVariant::MkOrig).len(), 3);
        assert_eq!(PointSet::filter(&table, TestVariant::MkOrigBh).len(), 1);
        assert_eq!(PointSet::filter(&table, TestVariant::MkHrBh).len(), 1);
    }
}
