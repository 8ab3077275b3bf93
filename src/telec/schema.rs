//! Column names and code semantics for the two input tables
//!
//! Both tables come out of the teleconnection analysis as `;`-separated,
//! Latin-1 encoded CSV. The correlation table carries one significance-code
//! column per cross-correlation lag; the non-stationarity table carries one
//! result-code column per Mann-Kendall test variant.

/// Rotated-grid longitude column, present in both tables
pub const RLON: &str = "rlon";

/// Rotated-grid latitude column, present in both tables
pub const RLAT: &str = "rlat";

/// Unrotated longitude column (non-stationarity table only)
pub const LON: &str = "lon";

/// Unrotated latitude column (non-stationarity table only)
pub const LAT: &str = "lat";

/// Default lag-0 significance-code column
pub const LAG0_CODE: &str = "pearson_xcorr_sig_lag0_aft";

/// The four climate indices, in bit order of the significance code
pub const CLIMATE_INDICES: [&str; 4] = ["NAO", "EA", "EAWR", "SCA"];

/// Inclusive significance-code range; anything outside renders transparent
pub const CODE_MIN: i64 = 1;
pub const CODE_MAX: i64 = 15;

/// Decode a significance code (1..=15) into the index combination it encodes.
///
/// The code is a bitmask over [`CLIMATE_INDICES`]: 1 = NAO, 2 = EA,
/// 4 = EAWR, 8 = SCA, so e.g. 5 means NAO+EAWR. Codes outside the range
/// return `None`.
pub fn significance_label(code: i64) -> Option<String> {
    if !(CODE_MIN..=CODE_MAX).contains(&code) {
        return None;
    }
    let names: Vec<&str> = CLIMATE_INDICES
        .iter()
        .enumerate()
        .filter(|(bit, _)| code & (1 << bit) != 0)
        .map(|(_, name)| *name)
        .collect();
    Some(names.join("+"))
}

/// Mann-Kendall test variants of the non-stationarity analysis.
///
/// Each variant has its own result-code column in the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestVariant {
    /// Original Mann-Kendall test
    MkOrig,
    /// Original test with Benjamini-Hochberg correction
    MkOrigBh,
    /// Hamed-Rao variance-corrected test
    MkHr,
    /// Hamed-Rao variant with Benjamini-Hochberg correction
    MkHrBh,
}

impl TestVariant {
    pub const ALL: [TestVariant; 4] = [
        TestVariant::MkOrig,
        TestVariant::MkOrigBh,
        TestVariant::MkHr,
        TestVariant::MkHrBh,
    ];

    /// Column name in the non-stationarity table
    pub fn column(&self) -> &'static str {
        match self {
            TestVariant::MkOrig => "nonstat_mk_orig",
            TestVariant::MkOrigBh => "nonstat_mk_orig_BH",
            TestVariant::MkHr => "nonstat_mk_HR",
            TestVariant::MkHrBh => "nonstat_mk_HR_BH",
        }
    }

    /// Human-readable variant name for panel titles and legends
    pub fn label(&self) -> &'static str {
        match self {
            TestVariant::MkOrig => "Mann-Kendall",
            TestVariant::MkOrigBh => "Mann-Kendall + BH",
            TestVariant::MkHr => "Hamed-Rao",
            TestVariant::MkHrBh => "Hamed-Rao + BH",
        }
    }

    /// Resolve a variant from its column name
    pub fn from_column(column: &str) -> Option<TestVariant> {
        Self::ALL.iter().copied().find(|v| v.column() == column)
    }
}

/// Meaning of a non-zero non-stationarity result code
pub fn nonstat_label(code: u8) -> Option<&'static str> {
    match code {
        1 => Some("change point"),
        2 => Some("trend"),
        3 => Some("change point + trend"),
        _ => None,
    }
}
