//! Error types for fetching, configuration and analysis runs.

use chrono::NaiveDate;
use thiserror::Error;

/// Failure reported by a price source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("symbol '{symbol}' not found")]
    SymbolNotFound { symbol: String },
    #[error("no data for '{symbol}' since {start:?}")]
    NoDataInRange {
        symbol: String,
        start: Option<NaiveDate>,
    },
    #[error("transport error: {0}")]
    Transport(String),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Fatal failure of an analysis run. No partial results accompany it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] FetchError),
    #[error("data unavailable: no usable price records")]
    EmptySeries,
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl AnalysisError {
    /// True for both fetch failures and series that normalize to nothing
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_) | Self::EmptySeries)
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
