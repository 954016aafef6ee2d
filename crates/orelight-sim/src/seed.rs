use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    Empty,
    NotNumeric(String),
}

impl fmt::Display for SeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedError::Empty => write!(f, "no world seed was provided"),
            SeedError::NotNumeric(s) => write!(f, "world seed '{}' is not a 64-bit integer", s),
        }
    }
}

impl std::error::Error for SeedError {}

/// Parses a configured world seed. Text seeds are rejected rather than hashed.
pub fn parse_seed(text: &str) -> Result<i64, SeedError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SeedError::Empty);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| SeedError::NotNumeric(trimmed.to_string()))
}
