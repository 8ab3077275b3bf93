use thiserror::Error;

/// Errors that can occur while loading or composing the map data
#[derive(Debug, Error)]
pub enum TelecError {
    /// File could not be opened or read
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV framing or parsing error
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from a table header
    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// A cell value could not be parsed as the declared type
    #[error("table '{table}', row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    /// The same (rlon, rlat) pair appeared more than once under the reject policy
    #[error("duplicate grid cell at (rlon={rlon}, rlat={rlat})")]
    DuplicateCell { rlon: f64, rlat: f64 },

    /// Configuration error (bad file, bad field value, unknown palette or column)
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Type alias for Results using TelecError
pub type Result<T> = std::result::Result<T, TelecError>;
