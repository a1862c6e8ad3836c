//! Derived metrics over reconciled season tables.
//!
//! Percentages are computed on plain point vectors so the same functions
//! serve driver tables and constructors standings. Qualifying gaps are
//! written back into the qualifying table cells.

use crate::constants::{GAP_WRAP_WINDOW, SECONDS_PER_MINUTE};
use crate::error::{ArchiveError, Result};
use crate::models::{Season, SessionId};
use crate::points::PointsSystem;
use crate::reconciler::{QualyTable, RaceTable};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn round3(value: f64) -> f64 {
    round_to(value, 3)
}

/// Fold a time difference into (-15, 15) seconds
///
/// Differences are taken modulo one minute into [0, 60); anything outside
/// the window is shifted down by a minute. `58.2` becomes `-1.8`.
pub fn wrap_gap(diff: f64) -> f64 {
    let folded = diff.rem_euclid(SECONDS_PER_MINUTE);
    let gap = if folded > -GAP_WRAP_WINDOW && folded < GAP_WRAP_WINDOW {
        folded
    } else {
        folded - SECONDS_PER_MINUTE
    };
    round3(gap)
}

/// Each value as a percentage of the column sum, rounded to 2 decimals
pub fn percent_of_total(points: &[f64]) -> Result<Vec<f64>> {
    let total: f64 = points.iter().sum();
    if total <= 0.0 {
        return Err(ArchiveError::InvalidInput {
            message: format!("percentage of total needs a positive total, got {}", total),
        });
    }
    Ok(points.iter().map(|p| round2(p / total * 100.0)).collect())
}

/// Each value as a percentage of the most a car pair could score
///
/// The maximum is `race_count` one-two finishes under the season's system.
pub fn percent_of_maximum(
    points: &[f64],
    season: &Season,
    race_count: usize,
    system: &PointsSystem,
) -> Result<Vec<f64>> {
    let per_race = system.max_per_race(season);
    if race_count == 0 || per_race == 0 {
        return Err(ArchiveError::InvalidInput {
            message: format!(
                "percentage of maximum needs races and awards (season {}: {} races, {} per race)",
                season, race_count, per_race
            ),
        });
    }
    let max = (race_count as f64) * f64::from(per_race);
    Ok(points.iter().map(|p| round2(p / max * 100.0)).collect())
}

/// Fill team-mate gaps for one qualifying session
///
/// Entrants are grouped by the car they drove in the session. Each timed
/// entrant is compared with the fastest other timed entrant of its group.
/// Groups with fewer than two timed entrants get no gaps and are returned
/// as `NoComparisonAvailable`.
pub fn qualy_gap_to_teammate(table: &mut QualyTable, session: &SessionId) -> Vec<ArchiveError> {
    let Some(col) = table.column_of(session) else {
        debug!("{}: not a column of the qualifying table", session);
        return Vec::new();
    };

    let mut groups: BTreeMap<String, Vec<(usize, Option<f64>)>> = BTreeMap::new();
    for (idx, row) in table.rows().iter().enumerate() {
        if let Some(entry) = row.cell(col) {
            groups
                .entry(entry.car.clone())
                .or_default()
                .push((idx, entry.value.time.map(|t| t.as_secs_f64())));
        }
    }

    let mut unmatched = Vec::new();
    let rows = table.rows_mut();
    for (car, members) in groups {
        let timed: Vec<(usize, f64)> = members
            .iter()
            .filter_map(|&(idx, time)| time.map(|t| (idx, t)))
            .collect();

        for &(idx, _) in &members {
            if let Some(Some(entry)) = rows[idx].cells.get_mut(col) {
                entry.value.teammate_gap = None;
            }
        }

        if timed.len() < 2 {
            warn!("{}: no team-mate comparison for {}", session, car);
            unmatched.push(ArchiveError::NoComparisonAvailable {
                team: car,
                session: session.to_string(),
            });
            continue;
        }

        for &(idx, own) in &timed {
            let fastest_other = timed
                .iter()
                .filter(|&&(other, _)| other != idx)
                .map(|&(_, t)| t)
                .fold(f64::INFINITY, f64::min);
            if let Some(Some(entry)) = rows[idx].cells.get_mut(col) {
                entry.value.teammate_gap = Some(wrap_gap(own - fastest_other));
            }
        }
    }

    unmatched
}

/// Fill deviations from the session mean; returns the mean in seconds
///
/// Untimed entrants get no deviation. Deviations below `threshold` are
/// treated as outliers and dropped.
pub fn qualy_gap_to_field_mean(
    table: &mut QualyTable,
    session: &SessionId,
    threshold: f64,
) -> Option<f64> {
    let col = table.column_of(session)?;

    let times: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|row| row.cell(col)?.value.time)
        .map(|t| t.as_secs_f64())
        .collect();
    if times.is_empty() {
        warn!("{}: no timed entrants, field mean undefined", session);
        return None;
    }
    let mean = times.iter().sum::<f64>() / times.len() as f64;

    let mut outliers = 0;
    for row in table.rows_mut() {
        let Some(Some(entry)) = row.cells.get_mut(col) else {
            continue;
        };
        entry.value.to_mean = entry.value.time.and_then(|t| {
            let gap = wrap_gap(t.as_secs_f64() - mean);
            if gap < threshold {
                outliers += 1;
                None
            } else {
                Some(gap)
            }
        });
    }
    if outliers > 0 {
        debug!("{}: {} deviations below {}s dropped", session, outliers, threshold);
    }

    Some(mean)
}

/// One value per session for a single entrant
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSeries {
    pub driver: String,
    pub car: String,
    pub values: Vec<f64>,
}

/// Points per session with absent cells read as zero
pub fn points_by_session(table: &RaceTable) -> Vec<DriverSeries> {
    let columns = table.sessions().len();
    table
        .rows()
        .iter()
        .map(|row| DriverSeries {
            driver: row.driver.clone(),
            car: row.car().to_string(),
            values: (0..columns)
                .map(|col| row.cell(col).map_or(0.0, |c| c.value.points))
                .collect(),
        })
        .collect()
}

/// Running points total per entrant across the season
pub fn cumulative_points(table: &RaceTable) -> Vec<DriverSeries> {
    points_by_session(table)
        .into_iter()
        .map(|mut series| {
            let mut total = 0.0;
            for value in &mut series.values {
                total += *value;
                *value = total;
            }
            series
        })
        .collect()
}

/// Running total of the best `n` results so far
///
/// The first `n` results all count; afterwards a new result replaces the
/// worst counted one when it is larger.
pub fn best_n_cumulative(points: &[f64], n: usize) -> Vec<f64> {
    let mut counted: Vec<f64> = Vec::with_capacity(n);
    let mut out = Vec::with_capacity(points.len());

    for &p in points {
        if counted.len() < n {
            counted.push(p);
        } else if let Some((worst_idx, &worst)) = counted
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
        {
            if p > worst {
                counted[worst_idx] = p;
            }
        }
        out.push(counted.iter().sum());
    }

    out
}

/// Best-`n` running totals for every entrant of a race table
pub fn best_n_points(table: &RaceTable, n: usize) -> Vec<DriverSeries> {
    points_by_session(table)
        .into_iter()
        .map(|series| DriverSeries {
            values: best_n_cumulative(&series.values, n),
            ..series
        })
        .collect()
}

/// Team-mate gaps across a season with their mean
#[derive(Debug, Clone, PartialEq)]
pub struct TeammateSummary {
    pub driver: String,
    pub car: String,
    pub gaps: Vec<Option<f64>>,
    pub mean: Option<f64>,
}

/// Per-entrant mean of its defined team-mate gaps
pub fn teammate_season_mean(table: &QualyTable) -> Vec<TeammateSummary> {
    let columns = table.sessions().len();
    table
        .rows()
        .iter()
        .map(|row| {
            let gaps: Vec<Option<f64>> = (0..columns)
                .map(|col| row.cell(col).and_then(|c| c.value.teammate_gap))
                .collect();
            let defined: Vec<f64> = gaps.iter().flatten().copied().collect();
            let mean = (!defined.is_empty())
                .then(|| round3(defined.iter().sum::<f64>() / defined.len() as f64));
            TeammateSummary {
                driver: row.driver.clone(),
                car: row.car().to_string(),
                gaps,
                mean,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParsedEntry, Position};
    use crate::reconciler::{LapTime, QualyCell};
    use approx::assert_relative_eq;

    fn qualy_entry(driver: &str, car: &str, time: Option<&str>) -> ParsedEntry<QualyCell> {
        ParsedEntry {
            driver: driver.to_string(),
            car: car.to_string(),
            number: None,
            cell: QualyCell::new(
                Position::Classified(1),
                time.map(|t| LapTime::parse(t).unwrap()),
            ),
        }
    }

    fn gap(table: &QualyTable, driver: &str) -> Option<f64> {
        table.row_by_driver(driver).unwrap().cell(0).unwrap().value.teammate_gap
    }

    fn to_mean(table: &QualyTable, driver: &str) -> Option<f64> {
        table.row_by_driver(driver).unwrap().cell(0).unwrap().value.to_mean
    }

    #[test]
    fn test_wrap_gap() {
        assert_relative_eq!(wrap_gap(58.2), -1.8, epsilon = 1e-9);
        assert_relative_eq!(wrap_gap(0.3), 0.3, epsilon = 1e-9);
        assert_relative_eq!(wrap_gap(-0.3), -0.3, epsilon = 1e-9);
        assert_relative_eq!(wrap_gap(1.23456), 1.235, epsilon = 1e-9);
    }

    #[test]
    fn test_percent_of_total_sums_to_100() {
        let points = [498.0, 454.0, 214.0, 163.0, 72.0, 69.0];
        let pct = percent_of_total(&points).unwrap();
        let sum: f64 = pct.iter().sum();
        assert!((sum - 100.0).abs() <= 0.01 * points.len() as f64);
    }

    #[test]
    fn test_percent_of_total_rejects_zero_total() {
        assert!(matches!(
            percent_of_total(&[0.0, 0.0]),
            Err(ArchiveError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_percent_of_maximum_2010() {
        let system = PointsSystem::default();
        let pct = percent_of_maximum(&[498.0], &Season::new(2010), 19, &system).unwrap();
        // 498 / (19 * 43) * 100
        assert_relative_eq!(pct[0], 60.95, epsilon = 1e-9);
    }

    #[test]
    fn test_percent_of_maximum_monotone_in_race_count() {
        let system = PointsSystem::default();
        let season = Season::new(2003);
        let mut previous = 0.0;
        for races in (1..=18).rev() {
            let pct = percent_of_maximum(&[18.0], &season, races, &system).unwrap()[0];
            assert!(pct >= previous);
            previous = pct;
        }
        let full = percent_of_maximum(&[18.0 * 18.0], &season, 18, &system).unwrap()[0];
        assert!(full <= 100.0);
    }

    #[test]
    fn test_percent_of_maximum_zero_races() {
        let system = PointsSystem::default();
        assert!(percent_of_maximum(&[1.0], &Season::new(2010), 0, &system).is_err());
    }

    #[test]
    fn test_teammate_gaps() {
        let session = SessionId::new("bahrain");
        let mut table = QualyTable::new(Season::new(2010));
        table.merge(
            &session,
            vec![
                qualy_entry("Sebastian Vettel", "Red Bull Racing Renault", Some("1:54.101")),
                qualy_entry("Mark Webber", "Red Bull Racing Renault", Some("1:54.802")),
                qualy_entry("Bruno Senna", "HRT Cosworth", Some("1:59.300")),
                qualy_entry("Karun Chandhok", "HRT Cosworth", None),
            ],
        );

        let unmatched = qualy_gap_to_teammate(&mut table, &session);

        assert_relative_eq!(gap(&table, "Sebastian Vettel").unwrap(), -0.701, epsilon = 1e-9);
        assert_relative_eq!(gap(&table, "Mark Webber").unwrap(), 0.701, epsilon = 1e-9);
        assert_eq!(gap(&table, "Bruno Senna"), None);
        assert_eq!(unmatched.len(), 1);
        assert!(matches!(
            &unmatched[0],
            ArchiveError::NoComparisonAvailable { team, .. } if team == "HRT Cosworth"
        ));
    }

    #[test]
    fn test_teammate_gap_three_drivers_uses_fastest_other() {
        let session = SessionId::new("monaco");
        let mut table = QualyTable::new(Season::new(1988));
        table.merge(
            &session,
            vec![
                qualy_entry("A", "Lotus Honda", Some("1:20.000")),
                qualy_entry("B", "Lotus Honda", Some("1:20.500")),
                qualy_entry("C", "Lotus Honda", Some("1:21.000")),
            ],
        );

        qualy_gap_to_teammate(&mut table, &session);

        assert_relative_eq!(gap(&table, "A").unwrap(), -0.5, epsilon = 1e-9);
        assert_relative_eq!(gap(&table, "B").unwrap(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(gap(&table, "C").unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_field_mean_with_outlier_threshold() {
        let session = SessionId::new("monza");
        let mut table = QualyTable::new(Season::new(2010));
        table.merge(
            &session,
            vec![
                qualy_entry("A", "Ferrari", Some("1:21.000")),
                qualy_entry("B", "Ferrari", Some("1:22.000")),
                qualy_entry("C", "McLaren Mercedes", Some("1:23.000")),
                qualy_entry("D", "McLaren Mercedes", None),
            ],
        );

        let mean = qualy_gap_to_field_mean(&mut table, &session, -0.5).unwrap();

        assert_relative_eq!(mean, 82.0, epsilon = 1e-9);
        assert_eq!(to_mean(&table, "A"), None);
        assert_relative_eq!(to_mean(&table, "B").unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(to_mean(&table, "C").unwrap(), 1.0, epsilon = 1e-9);
        assert_eq!(to_mean(&table, "D"), None);
    }

    #[test]
    fn test_cumulative_points() {
        let mut table = RaceTable::new(Season::new(2010));
        let entry = |driver: &str, points: f64| ParsedEntry {
            driver: driver.to_string(),
            car: "Ferrari".to_string(),
            number: None,
            cell: crate::models::RaceCell {
                position: Position::Classified(1),
                points,
            },
        };
        table.merge(&SessionId::new("r1"), vec![entry("A", 25.0)]);
        table.merge(&SessionId::new("r2"), vec![entry("A", 18.0), entry("B", 25.0)]);
        table.merge(&SessionId::new("r3"), vec![entry("A", 0.0), entry("B", 15.0)]);

        let cumulative = cumulative_points(&table);

        assert_eq!(cumulative[0].values, vec![25.0, 43.0, 43.0]);
        assert_eq!(cumulative[1].values, vec![0.0, 25.0, 40.0]);
    }

    #[test]
    fn test_best_n_cumulative() {
        let points = [9.0, 0.0, 6.0, 9.0, 4.0, 9.0];
        assert_eq!(
            best_n_cumulative(&points, 3),
            vec![9.0, 9.0, 15.0, 24.0, 24.0, 27.0]
        );
        assert_eq!(best_n_cumulative(&points, 0), vec![0.0; 6]);
        let all = best_n_cumulative(&points, 10);
        assert_eq!(all.last().copied(), Some(37.0));
    }

    #[test]
    fn test_teammate_season_mean_skips_undefined() {
        let mut table = QualyTable::new(Season::new(2010));
        for (slug, a, b) in [("r1", "1:20.000", Some("1:20.400")), ("r2", "1:20.000", None)] {
            let session = SessionId::new(slug);
            table.merge(
                &session,
                vec![
                    qualy_entry("A", "Ferrari", Some(a)),
                    qualy_entry("B", "Ferrari", b),
                ],
            );
            qualy_gap_to_teammate(&mut table, &session);
        }

        let summary = teammate_season_mean(&table);

        assert_eq!(summary[0].gaps.len(), 2);
        assert_relative_eq!(summary[0].mean.unwrap(), -0.4, epsilon = 1e-9);
        assert_eq!(summary[0].gaps[1], None);
    }
}
