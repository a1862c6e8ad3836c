//! Season index discovery.
//!
//! A season's race list comes from the links on its race listing page; the
//! qualifying sessions of each race come from the links on that race's
//! result page. Link order on the page is race chronology.

use crate::constants::{
    QUALY_BROAD_FROM_YEAR, QUALY_BROAD_MARKER, QUALY_LEGACY_MARKER, RACE_RESULT_MARKER,
    SESSION_SUFFIXES, races_index_path,
};
use crate::error::{ArchiveError, Result};
use crate::fetcher::{PageSource, resolve};
use crate::html::links;
use crate::models::{Season, SessionId, SessionRef};
use tracing::{debug, info, warn};
use url::Url;

/// Builds race and qualifying-session indexes for seasons
pub struct SeasonIndex<'a, S: PageSource + ?Sized> {
    source: &'a S,
    homepage: Url,
}

impl<'a, S: PageSource + ?Sized> SeasonIndex<'a, S> {
    pub fn new(source: &'a S, homepage: Url) -> Self {
        Self { source, homepage }
    }

    /// Ordered race result pages for a season
    ///
    /// Returns `EmptySeason` when the listing page has no race links.
    pub async fn race_identifiers(&self, season: &Season) -> Result<Vec<SessionRef>> {
        let url = resolve(&self.homepage, &races_index_path(season.label()))?;
        let doc = self.source.fetch(&url).await?;

        let races = race_links(&links(&doc), season);
        if races.is_empty() {
            return Err(ArchiveError::EmptySeason {
                season: season.to_string(),
            });
        }

        info!("Season {}: {} races indexed", season, races.len());
        Ok(races)
    }

    /// Ordered qualifying sessions for the given races
    ///
    /// A race page that cannot be fetched contributes no sessions; the
    /// remaining races are still indexed.
    pub async fn qualy_session_identifiers(
        &self,
        season: &Season,
        races: &[SessionRef],
    ) -> Result<Vec<SessionRef>> {
        let mut hrefs: Vec<String> = Vec::new();

        for race in races {
            let url = resolve(&self.homepage, &race.href)?;
            match self.source.fetch(&url).await {
                Ok(doc) => {
                    for href in qualy_links(&links(&doc), season) {
                        if !hrefs.contains(&href) {
                            hrefs.push(href);
                        }
                    }
                }
                Err(e) => warn!("Season {}: qualifying links for {} unavailable: {}", season, race.session, e),
            }
        }

        let sessions = disambiguate_sessions(hrefs);
        if sessions.is_empty() {
            return Err(ArchiveError::EmptySeason {
                season: season.to_string(),
            });
        }

        info!("Season {}: {} qualifying sessions indexed", season, sessions.len());
        Ok(sessions)
    }
}

/// Race result hrefs for the season, deduplicated in first-seen order
pub fn race_links(hrefs: &[String], season: &Season) -> Vec<SessionRef> {
    let mut seen: Vec<&str> = Vec::new();
    let mut races = Vec::new();

    for href in hrefs {
        if !href.contains(season.label()) || !href.contains(RACE_RESULT_MARKER) {
            continue;
        }
        if seen.contains(&href.as_str()) {
            continue;
        }
        seen.push(href);
        match slug_from_href(href) {
            Some(slug) => races.push(SessionRef {
                session: SessionId::new(slug),
                href: href.clone(),
            }),
            None => debug!("Skipping race link without a slug: {}", href),
        }
    }

    races
}

/// Qualifying hrefs on a race page
///
/// Every era links "qualifying-0"; from 2006 any "qualifying" link counts,
/// which also picks up sprint qualifying sessions.
pub fn qualy_links(hrefs: &[String], season: &Season) -> Vec<String> {
    let broad = season.is_from(QUALY_BROAD_FROM_YEAR);
    hrefs
        .iter()
        .filter(|href| href.contains(season.label()))
        .filter(|href| {
            href.contains(QUALY_LEGACY_MARKER) || (broad && href.contains(QUALY_BROAD_MARKER))
        })
        .cloned()
        .collect()
}

/// Assign session ids, suffixing repeated slugs with 'A' then 'B'
pub fn disambiguate_sessions(hrefs: Vec<String>) -> Vec<SessionRef> {
    let mut taken: Vec<String> = Vec::new();
    let mut sessions = Vec::new();

    for href in hrefs {
        let Some(slug) = slug_from_href(&href) else {
            debug!("Skipping qualifying link without a slug: {}", href);
            continue;
        };

        let candidate = std::iter::once(slug.clone())
            .chain(SESSION_SUFFIXES.iter().map(|s| format!("{}{}", slug, s)))
            .find(|id| !taken.contains(id));

        match candidate {
            Some(id) => {
                taken.push(id.clone());
                sessions.push(SessionRef {
                    session: SessionId::new(id),
                    href,
                });
            }
            None => warn!("More qualifying sessions than suffixes for {}; dropping {}", slug, href),
        }
    }

    sessions
}

/// Race slug: the path segment before the page name
///
/// `/en/results.html/2010/races/860/bahrain/race-result.html` → `bahrain`
pub fn slug_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    let mut segments = path.trim_end_matches('/').rsplit('/');
    segments.next()?;
    segments
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
