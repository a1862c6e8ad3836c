//! DataFrame conversion and file export.
//!
//! Season tables become wide frames (one column group per session), the
//! qualifying table also has a stacked form with one row per entrant per
//! session, and constructors trends come in wide and stacked forms. Files are
//! written as CSV or Snappy-compressed Parquet, one per table and season.

use crate::constants::race_abbreviation;
use crate::error::Result;
use crate::metrics::{DriverSeries, TeammateSummary, best_n_points, cumulative_points, teammate_season_mean};
use crate::models::{SessionId, car_code};
use crate::pipeline::SeasonResults;
use crate::reconciler::{QualyTable, RaceTable};
use crate::standings::{SeasonTrends, Standings};
use clap::ValueEnum;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

fn identity_columns<'a>(
    drivers: impl Iterator<Item = (&'a str, &'a str)> + Clone,
) -> Vec<Column> {
    let driver: Vec<String> = drivers.clone().map(|(d, _)| d.to_string()).collect();
    let car: Vec<String> = drivers.clone().map(|(_, c)| c.to_string()).collect();
    let code: Vec<String> = drivers.map(|(_, c)| car_code(c)).collect();
    vec![
        Column::new("Driver".into(), driver),
        Column::new("Car".into(), car),
        Column::new("Code".into(), code),
    ]
}

/// Wide race table: `{session} Position`, `Points` and `Entered` per session
pub fn race_frame(table: &RaceTable) -> Result<DataFrame> {
    let rows = table.rows();
    let mut columns = identity_columns(rows.iter().map(|r| (r.driver.as_str(), r.car())));

    for (col, session) in table.sessions().iter().enumerate() {
        let position: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.cell(col).map(|c| c.value.position.to_string()))
            .collect();
        let points: Vec<f64> = rows
            .iter()
            .map(|r| r.cell(col).map_or(0.0, |c| c.value.points))
            .collect();
        let entered: Vec<bool> = rows.iter().map(|r| r.entered(col)).collect();

        columns.push(Column::new(format!("{} Position", session).into(), position));
        columns.push(Column::new(format!("{} Points", session).into(), points));
        columns.push(Column::new(format!("{} Entered", session).into(), entered));
    }

    Ok(DataFrame::new(columns)?)
}

/// Wide qualifying table; an undefined team-mate gap exports as 0
pub fn qualy_frame(table: &QualyTable) -> Result<DataFrame> {
    let rows = table.rows();
    let mut columns = identity_columns(rows.iter().map(|r| (r.driver.as_str(), r.car())));

    for (col, session) in table.sessions().iter().enumerate() {
        let position: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.cell(col).map(|c| c.value.position.to_string()))
            .collect();
        let time: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.cell(col).and_then(|c| c.value.time).map(|t| t.to_string()))
            .collect();
        let teammate: Vec<f64> = rows
            .iter()
            .map(|r| r.cell(col).and_then(|c| c.value.teammate_gap).unwrap_or(0.0))
            .collect();
        let to_mean: Vec<Option<f64>> = rows
            .iter()
            .map(|r| r.cell(col).and_then(|c| c.value.to_mean))
            .collect();
        let entered: Vec<bool> = rows.iter().map(|r| r.entered(col)).collect();

        columns.push(Column::new(format!("{} Position", session).into(), position));
        columns.push(Column::new(format!("{} Time", session).into(), time));
        columns.push(Column::new(format!("{} Team-mate", session).into(), teammate));
        columns.push(Column::new(format!("{} to_mean", session).into(), to_mean));
        columns.push(Column::new(format!("{} Entered", session).into(), entered));
    }

    Ok(DataFrame::new(columns)?)
}

/// One row per entrant per session entered, in session order
pub fn stacked_qualy_frame(table: &QualyTable) -> Result<DataFrame> {
    let mut driver = Vec::new();
    let mut car = Vec::new();
    let mut race = Vec::new();
    let mut race_no: Vec<u32> = Vec::new();
    let mut position = Vec::new();
    let mut time: Vec<Option<String>> = Vec::new();
    let mut teammate = Vec::new();
    let mut to_mean: Vec<Option<f64>> = Vec::new();
    let mut abbr = Vec::new();

    for (col, session) in table.sessions().iter().enumerate() {
        for row in table.rows() {
            let Some(entry) = row.cell(col) else {
                continue;
            };
            driver.push(row.driver.clone());
            car.push(car_code(&entry.car));
            race.push(session.to_string());
            race_no.push(col as u32 + 1);
            position.push(entry.value.position.to_string());
            time.push(entry.value.time.map(|t| t.to_string()));
            teammate.push(entry.value.teammate_gap.unwrap_or(0.0));
            to_mean.push(entry.value.to_mean);
            abbr.push(race_abbreviation(session.as_str()));
        }
    }

    Ok(DataFrame::new(vec![
        Column::new("Driver".into(), driver),
        Column::new("Car".into(), car),
        Column::new("Race".into(), race),
        Column::new("Race No".into(), race_no),
        Column::new("Position".into(), position),
        Column::new("Time".into(), time),
        Column::new("Team-mate".into(), teammate),
        Column::new("to_mean".into(), to_mean),
        Column::new("Abbr".into(), abbr),
    ])?)
}

/// `Driver` then one column per session
pub fn series_frame(series: &[DriverSeries], sessions: &[SessionId]) -> Result<DataFrame> {
    let mut columns = vec![Column::new(
        "Driver".into(),
        series.iter().map(|s| s.driver.clone()).collect::<Vec<_>>(),
    )];
    for (col, session) in sessions.iter().enumerate() {
        let values: Vec<f64> = series
            .iter()
            .map(|s| s.values.get(col).copied().unwrap_or(0.0))
            .collect();
        columns.push(Column::new(session.to_string().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

/// Team-mate gaps per session with the season mean
pub fn teammate_mean_frame(summary: &[TeammateSummary], sessions: &[SessionId]) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new(
            "Driver".into(),
            summary.iter().map(|s| s.driver.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "Car".into(),
            summary.iter().map(|s| car_code(&s.car)).collect::<Vec<_>>(),
        ),
    ];
    for (col, session) in sessions.iter().enumerate() {
        let gaps: Vec<Option<f64>> = summary
            .iter()
            .map(|s| s.gaps.get(col).copied().flatten())
            .collect();
        columns.push(Column::new(session.to_string().into(), gaps));
    }
    columns.push(Column::new(
        "Mean".into(),
        summary.iter().map(|s| s.mean).collect::<Vec<_>>(),
    ));
    Ok(DataFrame::new(columns)?)
}

/// `Pos | Team | PTS` plus whichever percentages were computed
pub fn standings_frame(standings: &Standings) -> Result<DataFrame> {
    let rows = standings.rows();
    let mut columns = vec![
        Column::new(
            "Pos".into(),
            rows.iter().map(|r| r.position.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "Team".into(),
            rows.iter().map(|r| r.team.clone()).collect::<Vec<_>>(),
        ),
        Column::new("PTS".into(), rows.iter().map(|r| r.points).collect::<Vec<_>>()),
    ];
    if rows.iter().any(|r| r.percent_of_total.is_some()) {
        columns.push(Column::new(
            "% of total".into(),
            rows.iter().map(|r| r.percent_of_total).collect::<Vec<_>>(),
        ));
    }
    if rows.iter().any(|r| r.percent_of_max.is_some()) {
        columns.push(Column::new(
            "% of max".into(),
            rows.iter().map(|r| r.percent_of_max).collect::<Vec<_>>(),
        ));
    }
    Ok(DataFrame::new(columns)?)
}

/// `Team | {season}...`
pub fn trends_frame(trends: &SeasonTrends) -> Result<DataFrame> {
    let wide = trends.wide();
    let mut columns = vec![Column::new(
        "Team".into(),
        wide.iter().map(|(team, _)| team.clone()).collect::<Vec<_>>(),
    )];
    for (s, season) in trends.seasons().iter().enumerate() {
        columns.push(Column::new(
            season.label().into(),
            wide.iter().map(|(_, values)| values[s]).collect::<Vec<_>>(),
        ));
    }
    Ok(DataFrame::new(columns)?)
}

/// `Team | {metric} | Year`, ordered by year then metric descending
pub fn trends_stacked_frame(trends: &SeasonTrends) -> Result<DataFrame> {
    let stacked = trends.stacked();
    let metric = trends.metric().label();
    let df = DataFrame::new(vec![
        Column::new(
            "Team".into(),
            stacked.iter().map(|(team, _, _)| team.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            metric.into(),
            stacked.iter().map(|(_, value, _)| *value).collect::<Vec<_>>(),
        ),
        Column::new(
            "Year".into(),
            stacked
                .iter()
                .map(|(_, _, season)| season.label().to_string())
                .collect::<Vec<_>>(),
        ),
    ])?;

    let sorted = df
        .lazy()
        .sort(
            ["Year", metric],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true])
                .with_maintain_order(true),
        )
        .collect()?;
    Ok(sorted)
}

/// Write one frame to `path`
pub fn write_frame(df: &mut DataFrame, path: &Path, format: ExportFormat) -> Result<()> {
    let mut file = File::create(path)?;
    match format {
        ExportFormat::Csv => {
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        ExportFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(df)?;
        }
    }
    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Writes season and trend tables into one directory
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    format: ExportFormat,
    best_n: Option<usize>,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            best_n: None,
        }
    }

    /// Also export best-`n` running totals
    pub fn with_best_n(mut self, best_n: Option<usize>) -> Self {
        self.best_n = best_n;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn path_for(&self, prefix: &str, table: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.{}", prefix, table, self.format.extension()))
    }

    fn write(&self, prefix: &str, table: &str, mut df: DataFrame) -> Result<PathBuf> {
        let path = self.path_for(prefix, table);
        write_frame(&mut df, &path, self.format)?;
        Ok(path)
    }

    /// Write every table built for a season; returns the files written
    pub fn export_season(&self, results: &SeasonResults) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir)?;
        let year = results.season.label();
        let race = &results.race_table;
        let mut written = Vec::new();

        written.push(self.write(year, "races", race_frame(race)?)?);
        written.push(self.write(
            year,
            "cumulative",
            series_frame(&cumulative_points(race), race.sessions())?,
        )?);
        if let Some(n) = self.best_n {
            written.push(self.write(
                year,
                &format!("best_{}", n),
                series_frame(&best_n_points(race, n), race.sessions())?,
            )?);
        }

        if let Some(qualifying) = &results.qualifying {
            written.push(self.write(year, "qualifying", qualy_frame(qualifying)?)?);
            written.push(self.write(year, "qualifying_stacked", stacked_qualy_frame(qualifying)?)?);
            written.push(self.write(
                year,
                "teammate_mean",
                teammate_mean_frame(&teammate_season_mean(qualifying), qualifying.sessions())?,
            )?);
        }

        if let Some(standings) = &results.standings {
            written.push(self.write(year, "standings", standings_frame(standings)?)?);
        }

        info!("Season {}: {} tables exported", year, written.len());
        Ok(written)
    }

    /// Write the wide and stacked constructors trend tables
    pub fn export_trends(&self, trends: &SeasonTrends) -> Result<Vec<PathBuf>> {
        if trends.seasons().is_empty() {
            return Ok(Vec::new());
        }
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(vec![
            self.write("constructors", "trends", trends_frame(trends)?)?,
            self.write("constructors", "trends_stacked", trends_stacked_frame(trends)?)?,
        ])
    }
}
