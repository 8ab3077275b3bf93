//! Tabular loader for the `;`-separated, Latin-1 encoded analysis tables
//!
//! Loading validates the schema once, up front: the coordinate columns and
//! (for the non-stationarity table) the four test-result columns must be
//! present in the header, and every cell must parse as its declared type.
//! A file that fails any of these checks is rejected whole; there is no
//! partial success and no retry.

use super::error::{Result, TelecError};
use super::schema::{self, TestVariant};
use csv::ReaderBuilder;
use std::path::Path;

/// One row of the correlation table, coordinates plus the remaining value
/// columns in header order. Missing cells (non-significant) are `None`.
#[derive(Debug, Clone)]
pub struct CorrelationRow {
    pub rlon: f64,
    pub rlat: f64,
    pub values: Vec<Option<f64>>,
}

/// Correlation table: per-lag significance codes and derived statistics,
/// keyed by rotated-grid coordinates.
#[derive(Debug, Clone)]
pub struct CorrelationTable {
    /// Non-coordinate columns, in header order; aligned with `CorrelationRow::values`
    pub value_columns: Vec<String>,
    pub rows: Vec<CorrelationRow>,
}

impl CorrelationTable {
    /// Index of a value column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.value_columns.iter().position(|c| c == name)
    }
}

/// One row of the non-stationarity table: both coordinate systems and the
/// four test-result codes.
#[derive(Debug, Clone)]
pub struct NonStationarityRow {
    pub rlon: f64,
    pub rlat: f64,
    pub lon: f64,
    pub lat: f64,
    pub mk_orig: u8,
    pub mk_orig_bh: u8,
    pub mk_hr: u8,
    pub mk_hr_bh: u8,
}

impl NonStationarityRow {
    /// Result code for one test variant
    pub fn code(&self, variant: TestVariant) -> u8 {
        match variant {
            TestVariant::MkOrig => self.mk_orig,
            TestVariant::MkOrigBh => self.mk_orig_bh,
            TestVariant::MkHr => self.mk_hr,
            TestVariant::MkHrBh => self.mk_hr_bh,
        }
    }
}

/// Non-stationarity table in original row order
#[derive(Debug, Clone)]
pub struct NonStationarityTable {
    pub rows: Vec<NonStationarityRow>,
}

/// Load and validate the correlation table from a file
pub fn load_correlation_table(path: &Path) -> Result<CorrelationTable> {
    let bytes = read_file(path)?;
    parse_correlation_table(&bytes, &path.to_string_lossy())
}

/// Load and validate the non-stationarity table from a file
pub fn load_nonstationarity_table(path: &Path) -> Result<NonStationarityTable> {
    let bytes = read_file(path)?;
    parse_nonstationarity_table(&bytes, &path.to_string_lossy())
}

/// Parse correlation CSV bytes. `table` names the source in errors.
pub fn parse_correlation_table(bytes: &[u8], table: &str) -> Result<CorrelationTable> {
    let text = decode_latin1(bytes);
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(text.as_bytes());

    let headers = read_headers(&mut reader, table)?;
    let rlon_idx = require_column(&headers, schema::RLON, table)?;
    let rlat_idx = require_column(&headers, schema::RLAT, table)?;

    // Everything that is not a coordinate becomes a named value layer
    let value_indices: Vec<usize> = (0..headers.len())
        .filter(|&i| i != rlon_idx && i != rlat_idx)
        .collect();
    let value_columns: Vec<String> = value_indices.iter().map(|&i| headers[i].clone()).collect();

    let mut rows = Vec::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record.map_err(|source| TelecError::Csv {
            path: table.to_string(),
            source,
        })?;

        let rlon = parse_f64(&record, rlon_idx, schema::RLON, row_no, table)?;
        let rlat = parse_f64(&record, rlat_idx, schema::RLAT, row_no, table)?;
        let values = value_indices
            .iter()
            .map(|&i| parse_optional_f64(record.get(i).unwrap_or("")))
            .collect();

        rows.push(CorrelationRow { rlon, rlat, values });
    }

    Ok(CorrelationTable {
        value_columns,
        rows,
    })
}

/// Parse non-stationarity CSV bytes. `table` names the source in errors.
pub fn parse_nonstationarity_table(bytes: &[u8], table: &str) -> Result<NonStationarityTable> {
    let text = decode_latin1(bytes);
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(text.as_bytes());

    let headers = read_headers(&mut reader, table)?;
    let rlon_idx = require_column(&headers, schema::RLON, table)?;
    let rlat_idx = require_column(&headers, schema::RLAT, table)?;
    let lon_idx = require_column(&headers, schema::LON, table)?;
    let lat_idx = require_column(&headers, schema::LAT, table)?;
    let variant_idx: Vec<usize> = TestVariant::ALL
        .iter()
        .map(|v| require_column(&headers, v.column(), table))
        .collect::<Result<_>>()?;

    let mut rows = Vec::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record.map_err(|source| TelecError::Csv {
            path: table.to_string(),
            source,
        })?;

        let mut codes = [0u8; 4];
        for (slot, (&idx, variant)) in codes
            .iter_mut()
            .zip(variant_idx.iter().zip(TestVariant::ALL.iter()))
        {
            *slot = parse_code(&record, idx, variant.column(), row_no, table)?;
        }

        rows.push(NonStationarityRow {
            rlon: parse_f64(&record, rlon_idx, schema::RLON, row_no, table)?,
            rlat: parse_f64(&record, rlat_idx, schema::RLAT, row_no, table)?,
            lon: parse_f64(&record, lon_idx, schema::LON, row_no, table)?,
            lat: parse_f64(&record, lat_idx, schema::LAT, row_no, table)?,
            mk_orig: codes[0],
            mk_orig_bh: codes[1],
            mk_hr: codes[2],
            mk_hr_bh: codes[3],
        });
    }

    Ok(NonStationarityTable { rows })
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| TelecError::Io {
        path: path.to_string_lossy().into_owned(),
        source,
    })
}

/// ISO-8859-1 code points coincide with the first 256 Unicode scalars,
/// so the decode is a direct byte-to-char widening.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn read_headers(
    reader: &mut csv::Reader<&[u8]>,
    table: &str,
) -> Result<Vec<String>> {
    let headers = reader.headers().map_err(|source| TelecError::Csv {
        path: table.to_string(),
        source,
    })?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

fn require_column(headers: &[String], column: &str, table: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| TelecError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

fn parse_f64(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    row: usize,
    table: &str,
) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| TelecError::InvalidValue {
        table: table.to_string(),
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Empty cells and the usual NA spellings mean "no value"
fn parse_optional_f64(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Result codes are small non-negative integers, possibly serialized as floats
fn parse_code(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    row: usize,
    table: &str,
) -> Result<u8> {
    let raw = record.get(idx).unwrap_or("").trim();
    let invalid = || TelecError::InvalidValue {
        table: table.to_string(),
        row,
        column: column.to_string(),
        value: raw.to_string(),
    };
    let value: f64 = raw.parse().map_err(|_| invalid())?;
    if value.fract() != 0.0 || !(0.0..=255.0).contains(&value) {
        return Err(invalid());
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CORR_CSV: &str = "rlon;rlat;pearson_xcorr_sig_lag0_aft;pearson_xcorr_max\n\
                            0.0;0.0;5;0.61\n\
                            1.0;0.0;12;0.48\n\
                            0.0;1.0;1;\n";

    const NONSTAT_CSV: &str =
        "rlon;rlat;lon;lat;nonstat_mk_orig;nonstat_mk_orig_BH;nonstat_mk_HR;nonstat_mk_HR_BH\n\
         0.0;0.0;-6.0;40.5;0;0;0;0\n\
         0.1;0.0;-5.9;40.5;1;0;1;1\n\
         0.2;0.0;-5.8;40.5;2;1;2;0\n\
         0.3;0.0;-5.7;40.5;3;0;3;0\n\
         0.4;0.0;-5.6;40.5;0;0;0;0\n";

    #[test]
    fn correlation_table_parses_with_missing_cells() {
        let table = parse_correlation_table(CORR_CSV.as_bytes(), "corr").unwrap();
        assert_eq!(
            table.value_columns,
            vec!["pearson_xcorr_sig_lag0_aft", "pearson_xcorr_max"]
        );
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].values, vec![Some(5.0), Some(0.61)]);
        // empty trailing cell is a missing value, not zero
        assert_eq!(table.rows[2].values, vec![Some(1.0), None]);
    }

    #[test]
    fn missing_coordinate_column_is_rejected_before_reshaping() {
        let csv = "rlat;pearson_xcorr_sig_lag0_aft\n0.0;5\n";
        let err = parse_correlation_table(csv.as_bytes(), "corr").unwrap_err();
        match err {
            TelecError::MissingColumn { table, column } => {
                assert_eq!(table, "corr");
                assert_eq!(column, "rlon");
            }
            other => panic!("expected MissingColumn, got {other}"),
        }
    }

    #[test]
    fn nonstationarity_table_parses_all_variants() {
        let table = parse_nonstationarity_table(NONSTAT_CSV.as_bytes(), "nonstat").unwrap();
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.rows[1].code(TestVariant::MkOrig), 1);
        assert_eq!(table.rows[2].code(TestVariant::MkOrigBh), 1);
        assert_eq!(table.rows[3].code(TestVariant::MkHr), 3);
    }

    #[test]
    fn nonstationarity_requires_all_result_columns() {
        let csv = "rlon;rlat;lon;lat;nonstat_mk_orig\n0.0;0.0;-6.0;40.5;1\n";
        let err = parse_nonstationarity_table(csv.as_bytes(), "nonstat").unwrap_err();
        match err {
            TelecError::MissingColumn { column, .. } => {
                assert_eq!(column, "nonstat_mk_orig_BH");
            }
            other => panic!("expected MissingColumn, got {other}"),
        }
    }

    #[test]
    fn bad_coordinate_value_is_an_error() {
        let csv = "rlon;rlat;pearson_xcorr_sig_lag0_aft\nnorth;0.0;5\n";
        let err = parse_correlation_table(csv.as_bytes(), "corr").unwrap_err();
        assert!(matches!(err, TelecError::InvalidValue { .. }));
    }

    #[test]
    fn latin1_bytes_decode_without_loss() {
        // 0xF1 is ñ in ISO-8859-1; must not break parsing
        let bytes = b"rlon;rlat;Espa\xF1a_lag0\n0.0;0.0;5\n";
        let table = parse_correlation_table(bytes, "corr").unwrap();
        assert_eq!(table.value_columns, vec!["España_lag0"]);
    }

    #[test]
    fn loading_a_missing_file_fails() {
        let err = load_correlation_table(Path::new("/nonexistent/telec.csv")).unwrap_err();
        assert!(matches!(err, TelecError::Io { .. }));
    }

    #[test]
    fn loading_from_disk_round_trips() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CORR_CSV.as_bytes()).unwrap();
        let table = load_correlation_table(file.path()).unwrap();
        assert_eq!(table.rows.len(), 3);
    }
}
