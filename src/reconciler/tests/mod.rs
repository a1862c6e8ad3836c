//! Tests for the season table reconciler
//!
//! Covers merge identity rules, duplicate handling and table parsing.

pub mod parser_tests;

use crate::html::RawTable;
use crate::models::{ParsedEntry, Position, RaceCell, Season, SessionId};

pub fn session(slug: &str) -> SessionId {
    SessionId::new(slug)
}

/// Race entry with a classified position and points
pub fn race_entry(driver: &str, car: &str, pos: u32, points: f64) -> ParsedEntry<RaceCell> {
    ParsedEntry {
        driver: driver.to_string(),
        car: car.to_string(),
        number: None,
        cell: RaceCell {
            position: Position::Classified(pos),
            points,
        },
    }
}

pub fn season_2010() -> Season {
    Season::new(2010)
}

/// Build a raw table from string literals
pub fn raw_table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}
