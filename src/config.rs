//! Configuration management and validation.
//!
//! Provides the run configuration (seasons, derived-metric switches,
//! points override) and the fetch settings used by the HTTP page source.

use crate::constants::{
    DEFAULT_HOMEPAGE, DEFAULT_MAX_RETRIES, DEFAULT_QUALY_MEAN_THRESHOLD,
    DEFAULT_RETRY_BACKOFF_MS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, MAX_FETCH_RETRIES,
};
use crate::error::{ArchiveError, Result};
use crate::models::Season;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Network settings for page fetching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Backoff before retry n is n times this many milliseconds
    pub retry_backoff_ms: u64,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// First attempt plus retries
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Pause before the attempt following failed attempt `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Global configuration for an archive run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Seasons to process, in order
    pub years: Vec<Season>,

    /// Append "% of max" to constructors standings
    pub include_max_percentage: bool,

    /// Append "% of total" to constructors standings
    pub include_total_percentage: bool,

    /// Field-mean deviations below this (seconds) are discarded as outliers
    pub qualy_mean_threshold: f64,

    /// Award schedule to use instead of the era table
    pub points_system_override: Option<Vec<u32>>,

    /// Counted-results window for best-N scoring (None disables it)
    pub best_n: Option<usize>,

    /// Build qualifying tables
    pub include_qualifying: bool,

    /// Build constructors standings
    pub include_standings: bool,

    /// Results website root
    pub homepage: String,

    pub fetch: FetchConfig,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            years: Vec::new(),
            include_max_percentage: true,
            include_total_percentage: true,
            qualy_mean_threshold: DEFAULT_QUALY_MEAN_THRESHOLD,
            points_system_override: None,
            best_n: None,
            include_qualifying: true,
            include_standings: true,
            homepage: DEFAULT_HOMEPAGE.to_string(),
            fetch: FetchConfig::default(),
        }
    }
}

impl ArchiveConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| ArchiveError::Configuration {
            message: format!("Invalid config file {}: {}", path.display(), e),
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn with_years(mut self, years: Vec<Season>) -> Self {
        self.years = years;
        self
    }

    pub fn with_qualy_mean_threshold(mut self, threshold: f64) -> Self {
        self.qualy_mean_threshold = threshold;
        self
    }

    pub fn with_points_override(mut self, points: Vec<u32>) -> Self {
        self.points_system_override = Some(points);
        self
    }

    pub fn with_best_n(mut self, n: usize) -> Self {
        self.best_n = Some(n);
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = homepage.into();
        self
    }

    pub fn without_max_percentage(mut self) -> Self {
        self.include_max_percentage = false;
        self
    }

    pub fn without_total_percentage(mut self) -> Self {
        self.include_total_percentage = false;
        self
    }

    pub fn without_qualifying(mut self) -> Self {
        self.include_qualifying = false;
        self
    }

    pub fn without_standings(mut self) -> Self {
        self.include_standings = false;
        self
    }

    /// Parsed homepage; always ends with '/' so relative paths join under it
    pub fn homepage_url(&self) -> Result<Url> {
        let mut homepage = self.homepage.clone();
        if !homepage.ends_with('/') {
            homepage.push('/');
        }
        Ok(Url::parse(&homepage)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.years.is_empty() {
            return Err(ArchiveError::Configuration {
                message: "At least one season must be requested".to_string(),
            });
        }

        if !self.qualy_mean_threshold.is_finite() {
            return Err(ArchiveError::Configuration {
                message: "qualy_mean_threshold must be a finite number".to_string(),
            });
        }

        if let Some(points) = &self.points_system_override {
            if points.len() < 2 {
                return Err(ArchiveError::Configuration {
                    message: "points_system_override needs at least two awards".to_string(),
                });
            }
            if points.windows(2).any(|w| w[0] < w[1]) {
                return Err(ArchiveError::Configuration {
                    message: "points_system_override must be ordered largest first".to_string(),
                });
            }
        }

        if self.best_n == Some(0) {
            return Err(ArchiveError::Configuration {
                message: "best_n must be at least 1".to_string(),
            });
        }

        if self.fetch.timeout_secs == 0 {
            return Err(ArchiveError::Configuration {
                message: "fetch.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.fetch.max_retries > MAX_FETCH_RETRIES {
            return Err(ArchiveError::Configuration {
                message: format!("fetch.max_retries must be at most {}", MAX_FETCH_RETRIES),
            });
        }

        self.homepage_url()?;
        Ok(())
    }
}
