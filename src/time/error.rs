use thiserror::Error;

/// A filename matched a timestamp pattern, but the digits do not form a real date.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{matched:?} in {filename:?} is not a valid date/time")]
pub struct DateParseError {
    pub filename: String,
    pub matched: String,
}
