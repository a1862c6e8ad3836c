//! Constructors championship standings and multi-season trends.

use crate::constants::columns;
use crate::error::{ArchiveError, Result};
use crate::html::RawTable;
use crate::metrics::{percent_of_maximum, percent_of_total};
use crate::models::{Position, Season};
use crate::points::PointsSystem;
use crate::teams::TeamNameRules;
use clap::ValueEnum;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct StandingsRow {
    pub position: Position,
    pub team: String,
    pub points: f64,
    pub percent_of_total: Option<f64>,
    pub percent_of_max: Option<f64>,
}

/// One season's constructors table
#[derive(Debug, Clone, PartialEq)]
pub struct Standings {
    season: Season,
    rows: Vec<StandingsRow>,
}

impl Standings {
    /// Parse the `Pos, Team, PTS` standings table
    pub fn from_table(season: Season, table: &RawTable) -> Result<Self> {
        for required in [columns::TEAM, columns::PTS] {
            if !table.has_column(required) {
                return Err(ArchiveError::MissingData {
                    session: format!("{} standings", season),
                    column: required.to_string(),
                });
            }
        }

        let mut rows = Vec::with_capacity(table.len());
        for row in &table.rows {
            let Some(team) = table.value(row, columns::TEAM) else {
                continue;
            };
            let points = match table.value(row, columns::PTS).map(str::parse::<f64>) {
                Some(Ok(points)) => points,
                _ => {
                    warn!("{} standings: unreadable points for {}, using 0", season, team);
                    0.0
                }
            };
            rows.push(StandingsRow {
                position: table
                    .value(row, columns::POS)
                    .map(Position::parse)
                    .unwrap_or_else(|| Position::Unclassified(String::new())),
                team: team.to_string(),
                points,
                percent_of_total: None,
                percent_of_max: None,
            });
        }

        debug!("{} standings: {} teams", season, rows.len());
        Ok(Self { season, rows })
    }

    pub fn season(&self) -> &Season {
        &self.season
    }

    pub fn rows(&self) -> &[StandingsRow] {
        &self.rows
    }

    pub fn points(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.points).collect()
    }

    pub fn with_percent_of_total(mut self) -> Result<Self> {
        let pct = percent_of_total(&self.points())?;
        for (row, pct) in self.rows.iter_mut().zip(pct) {
            row.percent_of_total = Some(pct);
        }
        Ok(self)
    }

    pub fn with_percent_of_max(mut self, race_count: usize, system: &PointsSystem) -> Result<Self> {
        let pct = percent_of_maximum(&self.points(), &self.season, race_count, system)?;
        for (row, pct) in self.rows.iter_mut().zip(pct) {
            row.percent_of_max = Some(pct);
        }
        Ok(self)
    }
}

/// Standings column tracked across seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TrendMetric {
    #[default]
    Points,
    PercentOfTotal,
    PercentOfMax,
}

impl TrendMetric {
    pub fn label(&self) -> &'static str {
        match self {
            TrendMetric::Points => "Points",
            TrendMetric::PercentOfTotal => "% of total",
            TrendMetric::PercentOfMax => "% of max",
        }
    }

    fn read(&self, row: &StandingsRow) -> Option<f64> {
        match self {
            TrendMetric::Points => Some(row.points),
            TrendMetric::PercentOfTotal => row.percent_of_total,
            TrendMetric::PercentOfMax => row.percent_of_max,
        }
    }
}

/// Canonical teams by season
///
/// Rows are canonical team identities in first-seen order, columns are
/// seasons in the order they were added. Within one season the first
/// standings row mapping to a team wins; a team absent from a season reads 0.
#[derive(Debug, Clone)]
pub struct SeasonTrends {
    rules: TeamNameRules,
    metric: TrendMetric,
    seasons: Vec<Season>,
    teams: Vec<String>,
    values: HashMap<(usize, usize), f64>,
}

impl SeasonTrends {
    pub fn new(rules: TeamNameRules, metric: TrendMetric) -> Self {
        Self {
            rules,
            metric,
            seasons: Vec::new(),
            teams: Vec::new(),
            values: HashMap::new(),
        }
    }

    pub fn metric(&self) -> TrendMetric {
        self.metric
    }

    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn add(&mut self, standings: &Standings) {
        let season_idx = match self.seasons.iter().position(|s| s == standings.season()) {
            Some(idx) => idx,
            None => {
                self.seasons.push(standings.season().clone());
                self.seasons.len() - 1
            }
        };

        for row in standings.rows() {
            let team = self.rules.canonical(&row.team);
            let team_idx = match self.teams.iter().position(|t| *t == team) {
                Some(idx) => idx,
                None => {
                    self.teams.push(team);
                    self.teams.len() - 1
                }
            };
            let Some(value) = self.metric.read(row) else {
                debug!(
                    "{} standings: {} not computed for {}",
                    standings.season(),
                    self.metric.label(),
                    row.team
                );
                continue;
            };
            self.values.entry((team_idx, season_idx)).or_insert(value);
        }
    }

    pub fn value(&self, team: &str, season: &Season) -> f64 {
        let team_idx = self.teams.iter().position(|t| t == team);
        let season_idx = self.seasons.iter().position(|s| s == season);
        match (team_idx, season_idx) {
            (Some(t), Some(s)) => self.values.get(&(t, s)).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// One row per team, one value per season
    pub fn wide(&self) -> Vec<(String, Vec<f64>)> {
        self.teams
            .iter()
            .enumerate()
            .map(|(t, team)| {
                let values = (0..self.seasons.len())
                    .map(|s| self.values.get(&(t, s)).copied().unwrap_or(0.0))
                    .collect();
                (team.clone(), values)
            })
            .collect()
    }

    /// `(team, value, season)` triples, season-major
    pub fn stacked(&self) -> Vec<(String, f64, Season)> {
        let wide = self.wide();
        let mut out = Vec::with_capacity(wide.len() * self.seasons.len());
        for (s, season) in self.seasons.iter().enumerate() {
            for (team, values) in &wide {
                out.push((team.clone(), values[s], season.clone()));
            }
        }
        out
    }
}
