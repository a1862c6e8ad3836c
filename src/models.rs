//! Core data structures and types for archive processing.
//!
//! Defines seasons, session identifiers, finishing positions, parsed
//! table entries and the per-season statistics used throughout the library.

use crate::constants::{CAR_CODE_LEN, DRIVER_CODE_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One championship year, or a placeholder label that is not a year
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "SeasonInput", into = "String")]
pub struct Season {
    year: Option<i32>,
    label: String,
}

/// Accepts both `1992` and `"1992"` in configuration files
#[derive(Deserialize)]
#[serde(untagged)]
enum SeasonInput {
    Year(i32),
    Label(String),
}

impl From<SeasonInput> for Season {
    fn from(input: SeasonInput) -> Self {
        match input {
            SeasonInput::Year(year) => Season::new(year),
            SeasonInput::Label(label) => Season::from_label(&label),
        }
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.label
    }
}

impl Season {
    pub fn new(year: i32) -> Self {
        Self {
            year: Some(year),
            label: year.to_string(),
        }
    }

    /// Build a season from a label; numeric labels become years
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        Self {
            year: label.parse().ok(),
            label: label.to_string(),
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True when the season is a known year at or after `year`
    pub fn is_from(&self, year: i32) -> bool {
        self.year.is_some_and(|y| y >= year)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Race or qualifying-session slug, unique within one season table
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discovered result page: session slug plus the href it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    pub session: SessionId,
    pub href: String,
}

/// Finishing or qualifying position as published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Classified(u32),
    /// NC, DQ, EX and similar non-numeric classifications
    Unclassified(String),
}

impl Position {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<u32>() {
            Ok(n) => Position::Classified(n),
            Err(_) => Position::Unclassified(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<u32> {
        match self {
            Position::Classified(n) => Some(*n),
            Position::Unclassified(_) => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Classified(n) => write!(f, "{}", n),
            Position::Unclassified(s) => f.write_str(s),
        }
    }
}

/// One row of a parsed result page before it is merged into a season table
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry<C> {
    pub driver: String,
    pub car: String,
    pub number: Option<u32>,
    pub cell: C,
}

/// Race classification cell
#[derive(Debug, Clone, PartialEq)]
pub struct RaceCell {
    pub position: Position,
    pub points: f64,
}

/// Strip the trailing driver code the site appends and collapse whitespace
///
/// `"Lewis Hamilton HAM"` and `"Lewis HamiltonHAM"` both become
/// `"Lewis Hamilton"`. Names without a trailing upper-case code are kept.
pub fn normalize_driver_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = collapsed.chars().collect();
    if chars.len() <= DRIVER_CODE_LEN {
        return collapsed;
    }
    let (head, code) = chars.split_at(chars.len() - DRIVER_CODE_LEN);
    let is_code = code.iter().all(|c| c.is_ascii_uppercase());
    // "Nelson Piquet Jr." style names keep their suffix
    let head_ends_lower_or_space = head
        .last()
        .is_some_and(|c| c.is_whitespace() || c.is_lowercase());
    if is_code && head_ends_lower_or_space {
        head.iter().collect::<String>().trim_end().to_string()
    } else {
        collapsed
    }
}

/// First three characters of a car label, upper-cased
pub fn car_code(car: &str) -> String {
    car.trim()
        .chars()
        .take(CAR_CODE_LEN)
        .collect::<String>()
        .to_uppercase()
}

/// Per-season processing statistics
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeasonStats {
    /// Sessions discovered by the index
    pub sessions_indexed: usize,
    /// Sessions merged into a table
    pub sessions_merged: usize,
    /// Sessions skipped after a fetch or parse failure
    pub sessions_skipped: usize,
    /// Rows in the finished table
    pub entrants: usize,
    /// Duplicate driver names renamed during merges
    pub duplicates_renamed: usize,
    /// Number of errors encountered
    pub errors: usize,
    /// Error messages for the run summary
    pub error_messages: Vec<String>,
}

impl SeasonStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the statistics
    pub fn add_error(&mut self, message: String) {
        self.errors += 1;
        self.error_messages.push(message);
    }

    /// Fold another table's statistics into this one
    pub fn absorb(&mut self, other: SeasonStats) {
        self.sessions_indexed += other.sessions_indexed;
        self.sessions_merged += other.sessions_merged;
        self.sessions_skipped += other.sessions_skipped;
        self.entrants = self.entrants.max(other.entrants);
        self.duplicates_renamed += other.duplicates_renamed;
        self.errors += other.errors;
        self.error_messages.extend(other.error_messages);
    }

    /// Percentage of indexed sessions that were merged
    pub fn success_rate(&self) -> f64 {
        if self.sessions_indexed == 0 {
            100.0
        } else {
            (self.sessions_merged as f64 / self.sessions_indexed as f64) * 100.0
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} sessions merged ({:.1}%) | {} entrants | {} duplicates renamed | {} errors",
            self.sessions_merged,
            self.sessions_indexed,
            self.success_rate(),
            self.entrants,
            self.duplicates_renamed,
            self.errors
        )
    }
}
