//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over price-history sources (Yahoo Finance,
//! CSV files, synthetic data) so the fetch cache can sit on top of any of them
//! and tests can inject a mock.

use super::raw::RawFrame;
use crate::domain::SeriesError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
///
/// Provider failures and malformed input are separate variants so callers can
/// choose a user-facing message; see [`DataError::kind`].
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("failed to read source: {0}")]
    SourceRead(String),

    #[error("required column '{field}' is missing")]
    MissingField { field: &'static str },

    #[error("column '{field}' is provided by more than one source column")]
    AmbiguousField { field: &'static str },

    #[error("bad '{field}' value at row {row}: {reason}")]
    MalformedCell {
        field: &'static str,
        row: usize,
        reason: String,
    },

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("data error: {0}")]
    Other(String),
}

/// Coarse classification of a [`DataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source failed or refused the request.
    Provider,
    /// The source answered, but with data that cannot be mapped.
    MalformedInput,
    /// The request itself was invalid.
    Request,
}

impl DataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::MissingField { .. }
            | DataError::AmbiguousField { .. }
            | DataError::MalformedCell { .. }
            | DataError::RaggedColumns { .. }
            | DataError::InvalidSeries(_) => ErrorKind::MalformedInput,
            DataError::InvalidRange { .. } => ErrorKind::Request,
            _ => ErrorKind::Provider,
        }
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvFile,
    Synthetic,
}

/// Trait for price-history providers.
///
/// Implementations return whatever shape their source produces; mapping to
/// the canonical schema is the normalizer's job. An empty frame means "no
/// data for this range" and is not an error. The cache layer sits above this
/// trait; providers don't know about the cache.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Fetch daily bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<RawFrame, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(
            DataError::MissingField { field: "close" }.kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(DataError::CircuitBreakerTripped.kind(), ErrorKind::Provider);
        assert_eq!(
            DataError::SymbolNotFound {
                symbol: "XYZ".into()
            }
            .kind(),
            ErrorKind::Provider
        );
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(
            DataError::InvalidRange { start: d, end: d }.kind(),
            ErrorKind::Request
        );
    }

    #[test]
    fn messages_name_the_field() {
        let err = DataError::MalformedCell {
            field: "open",
            row: 3,
            reason: "not a number: 'abc'".into(),
        };
        assert_eq!(err.to_string(), "bad 'open' value at row 3: not a number: 'abc'");
    }
}
