use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum JoinError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (cutoff out of range, empty column name, etc.).
    ConfigValidation(String),
    /// Missing required column in an input table.
    MissingColumn { table: String, column: String },
    /// A record lacks a field required for key construction.
    MissingField { field: String },
    /// A field is present but cannot be interpreted (e.g. non-numeric year).
    InvalidField { field: String, value: String },
    /// Reference dataset could not be acquired.
    ReferenceLoad(String),
    /// Reference acquisition exceeded its wall-clock guard.
    LoadTimeout { source: String, seconds: u64 },
    /// IO error (file read, CSV read/write, etc.).
    Io(String),
}

impl JoinError {
    /// Whether this error aborts the whole run.
    ///
    /// Per-record errors (`MissingField`, `InvalidField`) only drop the
    /// offending record; everything else stops before output is written.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MissingField { .. } | Self::InvalidField { .. })
    }
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { table, column } => {
                write!(f, "{table} table: missing column '{column}'")
            }
            Self::MissingField { field } => write!(f, "missing field '{field}'"),
            Self::InvalidField { field, value } => {
                write!(f, "invalid value for field '{field}': '{value}'")
            }
            Self::ReferenceLoad(msg) => write!(f, "cannot load reference data: {msg}"),
            Self::LoadTimeout { source, seconds } => {
                write!(f, "loading {source} timed out after {seconds}s")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for JoinError {}

impl From<csv::Error> for JoinError {
    fn from(e: csv::Error) -> Self {
        Self::Io(e.to_string())
    }
}
