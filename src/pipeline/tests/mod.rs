//! Tests for the season pipeline
//!
//! Pages are served from memory so every scenario is deterministic.


use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::fetcher::PageSource;
use async_trait::async_trait;
use std::collections::HashMap;
use url::Url;

pub const HOME: &str = "https://archive.test/";

/// In-memory page source keyed by absolute URL
#[derive(Debug, Default)]
pub struct FixtureSource {
    pages: HashMap<String, String>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `path`, relative to the fixture homepage
    pub fn page(mut self, path: &str, body: impl Into<String>) -> Self {
        let url = format!("{}{}", HOME, path.trim_start_matches('/'));
        self.pages.insert(url, body.into());
        self
    }
}

#[async_trait]
impl PageSource for FixtureSource {
    async fn fetch(&self, url: &Url) -> Result<String> {
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ArchiveError::Fetch {
                url: url.to_string(),
                attempts: 1,
                reason: "HTTP 404 Not Found".to_string(),
            })
    }
}

pub fn test_config() -> ArchiveConfig {
    ArchiveConfig::default().with_homepage(HOME)
}

pub fn race_href(year: i32, round: u32, slug: &str) -> String {
    format!("/en/results.html/{}/races/{}/{}/race-result.html", year, round, slug)
}

pub fn qualy_href(year: i32, round: u32, slug: &str) -> String {
    format!("/en/results.html/{}/races/{}/{}/qualifying.html", year, round, slug)
}

pub fn links_page(hrefs: &[String]) -> String {
    let anchors: String = hrefs
        .iter()
        .map(|h| format!("<a href=\"{}\">link</a>\n", h))
        .collect();
    format!("<html><body><nav>{}</nav></body></html>", anchors)
}

/// A results table with layout padding columns, as the site renders it
pub fn table_page(headers: &[&str], rows: &[Vec<&str>], extra_links: &[String]) -> String {
    let mut html = String::from("<html><body><table class=\"resultsarchive-table\"><thead><tr><th></th>");
    for h in headers {
        html.push_str(&format!("<th>{}</th>", h));
    }
    html.push_str("<th></th></tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr><td></td>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", cell));
        }
        html.push_str("<td></td></tr>");
    }
    html.push_str("</tbody></table>");
    html.push_str(&links_page(extra_links));
    html.push_str("</body></html>");
    html
}

/// Two-race 2010 season with a third race whose page is missing
pub fn season_2010_fixture() -> FixtureSource {
    let race_headers = ["Pos", "No", "Driver", "Car", "Laps", "PTS"];
    let qualy_headers = ["Pos", "No", "Driver", "Car", "Q1", "Q2", "Q3"];

    let bahrain_race = table_page(
        &race_headers,
        &[
            vec!["1", "8", "Fernando Alonso ALO", "Ferrari", "49", "25"],
            vec!["2", "7", "Felipe Massa MAS", "Ferrari", "49", "18"],
            vec!["3", "2", "Lewis Hamilton HAM", "McLaren Mercedes", "49", "15"],
            vec!["7", "1", "Jenson Button BUT", "McLaren Mercedes", "49", "6"],
        ],
        &[qualy_href(2010, 860, "bahrain"), race_href(2010, 860, "bahrain")],
    );
    let malaysia_race = table_page(
        &race_headers,
        &[
            vec!["1", "5", "Sebastian Vettel VET", "Red Bull Racing Renault", "56", "25"],
            vec!["2", "8", "Fernando Alonso ALO", "Ferrari", "56", "18"],
            vec!["3", "1", "Jenson Button BUT", "McLaren Mercedes", "56", "15"],
            vec!["4", "7", "Felipe Massa MAS", "Ferrari", "56", "12"],
            vec!["5", "2", "Lewis Hamilton HAM", "McLaren Mercedes", "56", "10"],
        ],
        &[qualy_href(2010, 862, "malaysia")],
    );
    let bahrain_qualy = table_page(
        &qualy_headers,
        &[
            vec!["1", "8", "Fernando Alonso ALO", "Ferrari", "1:55.000", "1:54.500", "1:54.000"],
            vec!["2", "7", "Felipe Massa MAS", "Ferrari", "1:55.100", "1:54.600", "1:54.300"],
            vec!["3", "2", "Lewis Hamilton HAM", "McLaren Mercedes", "1:55.200", "1:54.700", ""],
            vec!["4", "1", "Jenson Button BUT", "McLaren Mercedes", "1:55.300", "", ""],
        ],
        &[],
    );
    let malaysia_qualy = table_page(
        &qualy_headers,
        &[
            vec!["1", "5", "Sebastian Vettel VET", "Red Bull Racing Renault", "1:48.000", "1:47.500", "1:47.000"],
            vec!["2", "8", "Fernando Alonso ALO", "Ferrari", "1:48.100", "1:47.600", "1:47.200"],
            vec!["2", "8", "Fernando Alonso ALO", "Ferrari", "1:48.100", "1:47.600", "1:47.200"],
            vec!["3", "7", "Felipe Massa MAS", "Ferrari", "1:48.200", "1:47.700", "1:47.500"],
        ],
        &[],
    );
    let standings = table_page(
        &["Pos", "Team", "PTS"],
        &[
            vec!["1", "Ferrari", "73"],
            vec!["2", "McLaren Mercedes", "46"],
            vec!["3", "Red Bull Racing Renault", "25"],
        ],
        &[],
    );

    FixtureSource::new()
        .page(
            "en/results.html/2010/races.html",
            links_page(&[
                race_href(2010, 860, "bahrain"),
                "/en/results.html/2010/drivers.html".to_string(),
                race_href(2010, 861, "australia"),
                race_href(2010, 862, "malaysia"),
                race_href(2010, 860, "bahrain"),
            ]),
        )
        .page(&race_href(2010, 860, "bahrain"), bahrain_race)
        .page(&race_href(2010, 862, "malaysia"), malaysia_race)
        .page(&qualy_href(2010, 860, "bahrain"), bahrain_qualy)
        .page(&qualy_href(2010, 862, "malaysia"), malaysia_qualy)
        .page("en/results.html/2010/team.html", standings)
}
