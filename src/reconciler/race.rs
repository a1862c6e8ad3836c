//! Race classification parsing.

use crate::constants::columns;
use crate::error::{ArchiveError, Result};
use crate::html::RawTable;
use crate::models::{ParsedEntry, Position, RaceCell, SessionId, normalize_driver_name};
use tracing::{debug, warn};

/// Parse a race classification table
///
/// `Driver` and `Car` are required. A missing `PTS` column is dropped and
/// every row scores zero; a missing `Pos` column leaves rows unclassified.
pub fn parse_race_table(
    table: &RawTable,
    session: &SessionId,
) -> Result<Vec<ParsedEntry<RaceCell>>> {
    for required in [columns::DRIVER, columns::CAR] {
        if !table.has_column(required) {
            return Err(ArchiveError::MissingData {
                session: session.to_string(),
                column: required.to_string(),
            });
        }
    }

    if !table.has_column(columns::PTS) {
        warn!("{}: no {} column, scoring every entrant zero", session, columns::PTS);
    }

    let mut entries = Vec::with_capacity(table.len());
    for row in &table.rows {
        let Some(driver) = table.value(row, columns::DRIVER) else {
            debug!("{}: skipping row without a driver", session);
            continue;
        };
        let car = table.value(row, columns::CAR).unwrap_or_default();

        let position = table
            .value(row, columns::POS)
            .map(Position::parse)
            .unwrap_or_else(|| Position::Unclassified(String::new()));
        let points = table
            .value(row, columns::PTS)
            .map(|raw| parse_points(raw, session))
            .unwrap_or(0.0);

        entries.push(ParsedEntry {
            driver: normalize_driver_name(driver),
            car: car.to_string(),
            number: table.value(row, columns::NO).and_then(|n| n.parse().ok()),
            cell: RaceCell { position, points },
        });
    }

    Ok(entries)
}

/// Points as published; half points appear in shortened races
fn parse_points(raw: &str, session: &SessionId) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(points) if points.is_finite() && points >= 0.0 => points,
        _ => {
            debug!("{}: unreadable points value '{}', using 0", session, raw);
            0.0
        }
    }
}
