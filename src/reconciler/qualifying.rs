//! Qualifying parsing, lap times and knockout stage collapse.

use crate::constants::{KNOCKOUT_QUALY_FROM_YEAR, UNTIMED_MARKERS, columns};
use crate::error::{ArchiveError, Result};
use crate::html::RawTable;
use crate::models::{ParsedEntry, Position, Season, SessionId, normalize_driver_name};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Lap time with millisecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LapTime {
    millis: u64,
}

impl LapTime {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    /// Parse `M:SS.mmm` or `SS.mmm`; untimed markers (DNF, DNS, ...) fail
    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw.trim();
        let invalid = || ArchiveError::InvalidTime {
            value: raw.to_string(),
        };

        if value.is_empty() || UNTIMED_MARKERS.iter().any(|m| value.eq_ignore_ascii_case(m)) {
            return Err(invalid());
        }

        let (minutes, rest) = match value.split_once(':') {
            Some((m, rest)) => (m.parse::<u64>().map_err(|_| invalid())?, rest),
            None => (0, value),
        };
        let (secs, frac) = rest.split_once('.').unwrap_or((rest, ""));
        let secs: u64 = secs.parse().map_err(|_| invalid())?;
        if secs >= 60 && minutes > 0 {
            return Err(invalid());
        }
        if frac.len() > 3 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let frac_millis = if frac.is_empty() {
            0
        } else {
            // "4" is 400ms, "45" is 450ms
            format!("{:0<3}", frac).parse::<u64>().map_err(|_| invalid())?
        };

        Ok(Self::from_millis((minutes * 60 + secs) * 1000 + frac_millis))
    }
}

impl FromStr for LapTime {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.millis / 60_000;
        let secs = (self.millis / 1000) % 60;
        let millis = self.millis % 1000;
        write!(f, "{}:{:02}.{:03}", minutes, secs, millis)
    }
}

/// Qualifying result cell; gaps are filled in by the metric pass
#[derive(Debug, Clone, PartialEq)]
pub struct QualyCell {
    pub position: Position,
    pub time: Option<LapTime>,
    /// Seconds to the team-mate, `None` when no comparison was possible
    pub teammate_gap: Option<f64>,
    /// Seconds to the session mean, `None` for untimed entries and outliers
    pub to_mean: Option<f64>,
}

impl QualyCell {
    pub fn new(position: Position, time: Option<LapTime>) -> Self {
        Self {
            position,
            time,
            teammate_gap: None,
            to_mean: None,
        }
    }
}

/// Latest knockout stage the driver completed: Q3, else Q2, else Q1
pub fn collapse_stages(q1: Option<&str>, q2: Option<&str>, q3: Option<&str>) -> Option<LapTime> {
    [q3, q2, q1]
        .into_iter()
        .flatten()
        .find_map(|raw| LapTime::parse(raw).ok())
}

/// Parse a qualifying table
///
/// Knockout seasons read Q1/Q2/Q3 and keep only the latest stage; older
/// seasons read the single `Time` column. Rows repeating an earlier numeric
/// `Pos` are dropped, first kept; unclassified rows are only dropped when
/// identical to an earlier row.
pub fn parse_qualy_table(
    table: &RawTable,
    session: &SessionId,
    season: &Season,
) -> Result<Vec<ParsedEntry<QualyCell>>> {
    for required in [columns::DRIVER, columns::CAR] {
        if !table.has_column(required) {
            return Err(ArchiveError::MissingData {
                session: session.to_string(),
                column: required.to_string(),
            });
        }
    }

    let knockout = season.is_from(KNOCKOUT_QUALY_FROM_YEAR)
        && columns::KNOCKOUT_STAGES.iter().any(|q| table.has_column(q));
    if !knockout && !table.has_column(columns::TIME) {
        return Err(ArchiveError::MissingData {
            session: session.to_string(),
            column: columns::TIME.to_string(),
        });
    }

    let mut table = table.clone();
    // Only a repeated numeric position marks a republished row; unclassified
    // entrants share labels like "NC" and are dropped only as exact copies
    let dropped = table.retain_first_by(|t, row| {
        match t.value(row, columns::POS).map(Position::parse) {
            Some(Position::Classified(pos)) => Ok(pos),
            _ => Err(row.to_vec()),
        }
    });
    if dropped > 0 {
        info!("{}: dropped {} duplicate qualifying rows", session, dropped);
    }

    let mut entries = Vec::with_capacity(table.len());
    for row in &table.rows {
        let Some(driver) = table.value(row, columns::DRIVER) else {
            debug!("{}: skipping row without a driver", session);
            continue;
        };

        let time = if knockout {
            collapse_stages(
                table.value(row, columns::Q1),
                table.value(row, columns::Q2),
                table.value(row, columns::Q3),
            )
        } else {
            table
                .value(row, columns::TIME)
                .and_then(|raw| LapTime::parse(raw).ok())
        };

        let position = table
            .value(row, columns::POS)
            .map(Position::parse)
            .unwrap_or_else(|| Position::Unclassified(String::new()));

        entries.push(ParsedEntry {
            driver: normalize_driver_name(driver),
            car: table.value(row, columns::CAR).unwrap_or_default().to_string(),
            number: table.value(row, columns::NO).and_then(|n| n.parse().ok()),
            cell: QualyCell::new(position, time),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lap_time_parse() {
        assert_eq!(LapTime::parse("1:23.456").unwrap().as_millis(), 83_456);
        assert_eq!(LapTime::parse("59.1").unwrap().as_millis(), 59_100);
        assert_eq!(LapTime::parse(" 1:05.07 ").unwrap().as_millis(), 65_070);
        assert!(LapTime::parse("DNF").is_err());
        assert!(LapTime::parse("").is_err());
        assert!(LapTime::parse("1:23.4567").is_err());
        assert!(LapTime::parse("abc").is_err());
    }

    #[test]
    fn test_lap_time_display() {
        assert_eq!(LapTime::from_millis(83_456).to_string(), "1:23.456");
        assert_eq!(LapTime::from_millis(65_070).to_string(), "1:05.070");
    }

    #[test]
    fn test_collapse_uses_latest_completed_stage() {
        let time = collapse_stages(Some("1:23.456"), Some("1:22.100"), None).unwrap();
        assert_eq!(time.to_string(), "1:22.100");

        let time = collapse_stages(Some("1:23.456"), Some("1:22.100"), Some("1:21.900")).unwrap();
        assert_eq!(time.to_string(), "1:21.900");

        let time = collapse_stages(Some("1:23.456"), None, None).unwrap();
        assert_eq!(time.to_string(), "1:23.456");

        assert!(collapse_stages(Some("DNF"), None, None).is_none());
    }
}
