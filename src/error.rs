//! Error handling for archive scraping and reconciliation.
//!
//! Provides error types with context for page fetching, table extraction,
//! season indexing and derived-metric failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Fetch failed for {url} after {attempts} attempt(s): {reason}")]
    Fetch {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No results table found at {url}")]
    NoTable { url: String },

    #[error("Missing column '{column}' in table for {session}")]
    MissingData { session: String, column: String },

    #[error("No race or qualifying links discovered for season {season}")]
    EmptySeason { season: String },

    #[error("No comparison available for team {team} at {session}")]
    NoComparisonAvailable { team: String, session: String },

    #[error("Invalid lap time '{value}'")]
    InvalidTime { value: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ArchiveError {
    /// True for conditions that only skip one session and never the season
    pub fn is_session_local(&self) -> bool {
        matches!(
            self,
            ArchiveError::MissingData { .. }
                | ArchiveError::NoTable { .. }
                | ArchiveError::NoComparisonAvailable { .. }
                | ArchiveError::InvalidTime { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
