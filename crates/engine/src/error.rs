use std::fmt;

#[derive(Debug)]
pub enum TriageError {
    /// TOML parse / deserialization error.
    SchemaParse(String),
    /// Schema validation error (duplicate field, bad identity reference, etc.).
    SchemaValidation(String),
    /// Import payload is not a collection of rows.
    InvalidRows(String),
    /// CSV read error.
    Csv(String),
}

impl fmt::Display for TriageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaParse(msg) => write!(f, "schema parse error: {msg}"),
            Self::SchemaValidation(msg) => write!(f, "schema validation error: {msg}"),
            Self::InvalidRows(msg) => write!(f, "invalid rows: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for TriageError {}
