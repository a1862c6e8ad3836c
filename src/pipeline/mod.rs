//! Season processing pipeline.
//!
//! Runs, season by season: race index, race table, qualifying index,
//! qualifying table with gaps, and constructors standings. A session that
//! cannot be fetched or parsed is skipped and counted; a season whose race
//! index cannot be built is recorded as failed and the batch moves on.

#[cfg(test)]
pub mod tests;

use crate::config::ArchiveConfig;
use crate::constants::team_standings_path;
use crate::error::{ArchiveError, Result};
use crate::fetcher::{PageSource, resolve};
use crate::html::{RawTable, first_table};
use crate::index::SeasonIndex;
use crate::metrics::{qualy_gap_to_field_mean, qualy_gap_to_teammate};
use crate::models::{Season, SeasonStats, SessionId, SessionRef};
use crate::points::PointsSystem;
use crate::reconciler::{QualyTable, RaceTable, parse_qualy_table, parse_race_table};
use crate::standings::{SeasonTrends, Standings, TrendMetric};
use crate::teams::TeamNameRules;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use tracing::{error, info, warn};
use url::Url;

/// Everything built for one season
#[derive(Debug, Clone)]
pub struct SeasonResults {
    pub season: Season,
    pub races: Vec<SessionRef>,
    pub race_table: RaceTable,
    pub qualifying: Option<QualyTable>,
    /// Field mean per qualifying session, seconds
    pub qualy_means: Vec<(SessionId, f64)>,
    pub standings: Option<Standings>,
    pub stats: SeasonStats,
}

impl SeasonResults {
    /// Races in the season index, used for the percentage of maximum
    pub fn race_count(&self) -> usize {
        self.races.len()
    }
}

/// Seasons that could not be processed
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub completed: Vec<Season>,
    pub failed: Vec<(Season, String)>,
    pub stats: SeasonStats,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.stats.errors == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} seasons completed, {} failed | {}",
            self.completed.len(),
            self.failed.len(),
            self.stats.summary()
        )
    }
}

/// Per-run results keyed by season
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    seasons: BTreeMap<Season, SeasonResults>,
    report: RunReport,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, results: SeasonResults) {
        self.report.completed.push(results.season.clone());
        self.report.stats.absorb(results.stats.clone());
        self.seasons.insert(results.season.clone(), results);
    }

    pub fn record_failure(&mut self, season: Season, reason: String) {
        self.report.failed.push((season, reason));
    }

    pub fn get(&self, season: &Season) -> Option<&SeasonResults> {
        self.seasons.get(season)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeasonResults> {
        self.seasons.values()
    }

    pub fn len(&self) -> usize {
        self.seasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Constructors trend over every season that has standings
    pub fn trends(&self, rules: TeamNameRules, metric: TrendMetric) -> SeasonTrends {
        let mut trends = SeasonTrends::new(rules, metric);
        for standings in self.iter().filter_map(|r| r.standings.as_ref()) {
            trends.add(standings);
        }
        trends
    }
}

/// Drives one run against a page source
pub struct SeasonProcessor<'a, S: PageSource + ?Sized> {
    source: &'a S,
    config: ArchiveConfig,
    homepage: Url,
    points: PointsSystem,
    show_progress: bool,
}

impl<'a, S: PageSource + ?Sized> SeasonProcessor<'a, S> {
    pub fn new(source: &'a S, config: ArchiveConfig) -> Result<Self> {
        let homepage = config.homepage_url()?;
        let points = PointsSystem::new(config.points_system_override.clone());
        Ok(Self {
            source,
            config,
            homepage,
            points,
            show_progress: false,
        })
    }

    /// Draw a progress bar over seasons
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn points(&self) -> &PointsSystem {
        &self.points
    }

    fn index(&self) -> SeasonIndex<'_, S> {
        SeasonIndex::new(self.source, self.homepage.clone())
    }

    async fn fetch_table(&self, href: &str) -> Result<RawTable> {
        let url = resolve(&self.homepage, href)?;
        let doc = self.source.fetch(&url).await?;
        first_table(&doc).ok_or_else(|| ArchiveError::NoTable {
            url: url.to_string(),
        })
    }

    /// Build the race table from the season's race pages
    pub async fn process_races(
        &self,
        season: &Season,
        races: &[SessionRef],
        stats: &mut SeasonStats,
    ) -> RaceTable {
        let mut table = RaceTable::new(season.clone());
        stats.sessions_indexed += races.len();

        for race in races {
            let parsed = match self.fetch_table(&race.href).await {
                Ok(raw) => parse_race_table(&raw, &race.session),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(entries) if entries.is_empty() => {
                    info!("Season {} {}: empty results table, skipped", season, race.session);
                    stats.sessions_skipped += 1;
                }
                Ok(entries) => {
                    let report = table.merge(&race.session, entries);
                    stats.duplicates_renamed += report.renamed.len();
                    stats.sessions_merged += 1;
                }
                Err(e) => skip_session(season, &race.session, e, stats),
            }
        }

        stats.entrants = stats.entrants.max(table.len());
        table
    }

    /// Build the qualifying table and fill team-mate and field-mean gaps
    pub async fn process_qualifying(
        &self,
        season: &Season,
        races: &[SessionRef],
        stats: &mut SeasonStats,
    ) -> Result<(QualyTable, Vec<(SessionId, f64)>)> {
        let sessions = self.index().qualy_session_identifiers(season, races).await?;
        let mut table = QualyTable::new(season.clone());
        stats.sessions_indexed += sessions.len();

        for session in &sessions {
            let parsed = match self.fetch_table(&session.href).await {
                Ok(raw) => parse_qualy_table(&raw, &session.session, season),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(entries) if entries.is_empty() => {
                    info!("Season {} {}: empty qualifying table, skipped", season, session.session);
                    stats.sessions_skipped += 1;
                }
                Ok(entries) => {
                    let report = table.merge(&session.session, entries);
                    stats.duplicates_renamed += report.renamed.len();
                    stats.sessions_merged += 1;
                }
                Err(e) => skip_session(season, &session.session, e, stats),
            }
        }

        let mut means = Vec::new();
        for session in table.sessions().to_vec() {
            // Missing comparisons are logged where they are found
            qualy_gap_to_teammate(&mut table, &session);
            if let Some(mean) =
                qualy_gap_to_field_mean(&mut table, &session, self.config.qualy_mean_threshold)
            {
                means.push((session, mean));
            }
        }

        stats.entrants = stats.entrants.max(table.len());
        Ok((table, means))
    }

    /// Fetch the constructors table and append the configured percentages
    pub async fn process_standings(&self, season: &Season, race_count: usize) -> Result<Standings> {
        let raw = self.fetch_table(&team_standings_path(season.label())).await?;
        let mut standings = Standings::from_table(season.clone(), &raw)?;

        if self.config.include_total_percentage {
            standings = match standings.clone().with_percent_of_total() {
                Ok(updated) => updated,
                Err(e) => {
                    warn!("Season {} standings: {}", season, e);
                    standings
                }
            };
        }
        if self.config.include_max_percentage {
            standings = match standings.clone().with_percent_of_max(race_count, &self.points) {
                Ok(updated) => updated,
                Err(e) => {
                    warn!("Season {} standings: {}", season, e);
                    standings
                }
            };
        }

        Ok(standings)
    }

    /// Process one season end to end
    ///
    /// Fails only when the race index cannot be built; qualifying and
    /// standings failures are recorded in the season statistics.
    pub async fn process_season(&self, season: &Season) -> Result<SeasonResults> {
        let mut stats = SeasonStats::new();
        let races = self.index().race_identifiers(season).await?;

        let race_table = self.process_races(season, &races, &mut stats).await;

        let (qualifying, qualy_means) = if self.config.include_qualifying {
            match self.process_qualifying(season, &races, &mut stats).await {
                Ok((table, means)) => (Some(table), means),
                Err(e) => {
                    warn!("Season {}: qualifying unavailable: {}", season, e);
                    stats.add_error(format!("{} qualifying: {}", season, e));
                    (None, Vec::new())
                }
            }
        } else {
            (None, Vec::new())
        };

        let standings = if self.config.include_standings {
            match self.process_standings(season, races.len()).await {
                Ok(standings) => Some(standings),
                Err(e) => {
                    warn!("Season {}: standings unavailable: {}", season, e);
                    stats.add_error(format!("{} standings: {}", season, e));
                    None
                }
            }
        } else {
            None
        };

        info!("Season {}: {}", season, stats.summary());
        Ok(SeasonResults {
            season: season.clone(),
            races,
            race_table,
            qualifying,
            qualy_means,
            standings,
            stats,
        })
    }

    /// Process every season in order; failed seasons go to the run report
    pub async fn run(&self, years: &[Season]) -> ResultStore {
        let mut store = ResultStore::new();
        let progress = self.show_progress.then(|| season_progress_bar(years.len() as u64));

        for season in years {
            if let Some(pb) = &progress {
                pb.set_message(format!("Season {}", season));
            }
            match self.process_season(season).await {
                Ok(results) => store.insert(results),
                Err(e) => {
                    error!("Season {} failed: {}", season, e);
                    store.record_failure(season.clone(), e.to_string());
                }
            }
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Seasons processed");
        }
        store
    }
}

fn skip_session(season: &Season, session: &SessionId, e: ArchiveError, stats: &mut SeasonStats) {
    if e.is_session_local() {
        warn!("Season {} {}: skipped: {}", season, session, e);
    } else {
        error!("Season {} {}: skipped: {}", season, session, e);
    }
    stats.sessions_skipped += 1;
    stats.add_error(format!("{} {}: {}", season, session, e));
}

fn season_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
