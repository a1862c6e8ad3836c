//! Result table reconciliation
//!
//! Builds one wide table per season from the per-session result pages,
//! merging race by race in chronological order.
//!
//! # Architecture
//!
//! - [`table`] - The generic season table, entrant identity and merge rules
//! - [`race`] - Race classification parsing (`Pos, Driver, Car, PTS`)
//! - [`qualifying`] - Qualifying parsing, lap times and knockout stage collapse
//!
//! # Merge Rules
//!
//! 1. Entrants are rows with a stable synthetic id assigned at first sighting.
//! 2. An entrant first seen mid-season gets absent cells for earlier sessions;
//!    absent cells read as zero points but keep "did not enter" visible.
//! 3. Rows match on (driver, car); a driver whose car changed matches on the
//!    driver alone.
//! 4. Duplicate display names within one session are suffixed (`"Name (2)"`),
//!    reusing the suffix that earlier sessions gave the same car.
//! 5. Merging a session again overwrites its cells; rows and columns do not grow.

pub mod qualifying;
pub mod race;
pub mod table;

#[cfg(test)]
pub mod tests;

pub use qualifying::{LapTime, QualyCell, collapse_stages, parse_qualy_table};
pub use race::parse_race_table;
pub use table::{EntrantId, EntrantRow, MergeReport, SeasonTable, SessionEntry};

use crate::models::RaceCell;

pub type RaceTable = SeasonTable<RaceCell>;
pub type QualyTable = SeasonTable<QualyCell>;
