//! Page fetching.
//!
//! `PageSource` is the seam between the reconciliation core and the network.
//! `HttpFetcher` is the production implementation with a per-request timeout
//! and bounded retries; tests substitute an in-memory source.

use crate::config::FetchConfig;
use crate::error::{ArchiveError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Anything that can turn a URL into an HTML document
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// reqwest-backed page source with timeout and retry handling
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ArchiveError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { http, config })
    }

    async fn fetch_once(&self, url: &Url) -> std::result::Result<String, String> {
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }

        resp.text().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let attempts = self.config.attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            debug!("GET {} (attempt {}/{})", url, attempt, attempts);
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(reason) => {
                    warn!("Fetch of {} failed (attempt {}/{}): {}", url, attempt, attempts, reason);
                    last_error = reason;
                    if attempt < attempts {
                        tokio::time::sleep(self.config.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(ArchiveError::Fetch {
            url: url.to_string(),
            attempts,
            reason: last_error,
        })
    }
}

/// Resolve an href found on a page against the site root
pub fn resolve(base: &Url, href: &str) -> Result<Url> {
    Ok(base.join(href)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute_path_href() {
        let base = Url::parse("https://www.formula1.com/").unwrap();
        let url = resolve(&base, "/en/results.html/2010/races/860/bahrain/race-result.html").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.formula1.com/en/results.html/2010/races/860/bahrain/race-result.html"
        );
    }

    #[test]
    fn test_resolve_relative_href() {
        let base = Url::parse("https://www.formula1.com/").unwrap();
        let url = resolve(&base, "en/results.html/2010/races.html").unwrap();
        assert_eq!(url.path(), "/en/results.html/2010/races.html");
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_attempts() {
        let config = FetchConfig {
            timeout_secs: 1,
            max_retries: 1,
            retry_backoff_ms: 1,
            ..FetchConfig::default()
        };
        let fetcher = HttpFetcher::new(config).unwrap();
        let url = Url::parse("http://127.0.0.1:9/none.html").unwrap();

        match fetcher.fetch(&url).await {
            Err(ArchiveError::Fetch { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("Expected Fetch error, got {:?}", other.map(|s| s.len())),
        }
    }
}
