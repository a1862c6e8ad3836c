//! Season table and merge logic.

use crate::models::{ParsedEntry, Season, SessionId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Stable row identity, assigned in first-sighting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntrantId(pub usize);

/// One entrant's result in one session, with the car driven there
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry<C> {
    pub car: String,
    pub value: C,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntrantRow<C> {
    pub id: EntrantId,
    pub driver: String,
    pub number: Option<u32>,
    /// Distinct cars in the order they were first driven
    pub cars: Vec<String>,
    /// One slot per session column; `None` = did not take part
    pub cells: Vec<Option<SessionEntry<C>>>,
}

impl<C> EntrantRow<C> {
    /// Most recent car label
    pub fn car(&self) -> &str {
        self.cars.last().map(String::as_str).unwrap_or_default()
    }

    pub fn cell(&self, column: usize) -> Option<&SessionEntry<C>> {
        self.cells.get(column).and_then(Option::as_ref)
    }

    pub fn entered(&self, column: usize) -> bool {
        self.cell(column).is_some()
    }

    pub fn sessions_entered(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Outcome of merging one session into a table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeReport {
    pub new_entrants: usize,
    pub updated: usize,
    /// Entrants matched on driver alone because their car changed
    pub car_changes: usize,
    /// Display names given a suffix to keep duplicates apart
    pub renamed: Vec<String>,
}

/// Wide per-season table: rows are entrants, columns are sessions
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonTable<C> {
    season: Season,
    sessions: Vec<SessionId>,
    rows: Vec<EntrantRow<C>>,
}

impl<C: Clone> SeasonTable<C> {
    pub fn new(season: Season) -> Self {
        Self {
            season,
            sessions: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Table with its session columns laid out up front in chronological order
    pub fn with_sessions(season: Season, sessions: impl IntoIterator<Item = SessionId>) -> Self {
        let mut table = Self::new(season);
        for session in sessions {
            table.ensure_column(&session);
        }
        table
    }

    pub fn season(&self) -> &Season {
        &self.season
    }

    pub fn sessions(&self) -> &[SessionId] {
        &self.sessions
    }

    pub fn rows(&self) -> &[EntrantRow<C>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [EntrantRow<C>] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_of(&self, session: &SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| s == session)
    }

    pub fn row_by_driver(&self, driver: &str) -> Option<&EntrantRow<C>> {
        self.rows.iter().find(|r| r.driver == driver)
    }

    /// Sessions in which at least one entrant has a cell
    pub fn populated_sessions(&self) -> usize {
        (0..self.sessions.len())
            .filter(|&col| self.rows.iter().any(|r| r.entered(col)))
            .count()
    }

    fn ensure_column(&mut self, session: &SessionId) -> usize {
        if let Some(col) = self.column_of(session) {
            return col;
        }
        self.sessions.push(session.clone());
        for row in &mut self.rows {
            row.cells.push(None);
        }
        self.sessions.len() - 1
    }

    /// Merge one session's parsed rows into the table
    pub fn merge(&mut self, session: &SessionId, entries: Vec<ParsedEntry<C>>) -> MergeReport {
        let mut report = MergeReport::default();
        if entries.is_empty() {
            debug!("{} {}: no rows to merge", self.season, session);
            return report;
        }

        let col = self.ensure_column(session);
        let entries = self.disambiguate(entries, &mut report);
        let mut claimed: HashSet<usize> = HashSet::new();

        for entry in entries {
            match self.find_row(&entry, &claimed) {
                Some(idx) => {
                    let row = &mut self.rows[idx];
                    if !row.cars.contains(&entry.car) {
                        debug!(
                            "{} {}: {} moved from {} to {}",
                            self.season,
                            session,
                            row.driver,
                            row.car(),
                            entry.car
                        );
                        row.cars.push(entry.car.clone());
                        report.car_changes += 1;
                    }
                    if entry.number.is_some() {
                        row.number = entry.number;
                    }
                    row.cells[col] = Some(SessionEntry {
                        car: entry.car,
                        value: entry.cell,
                    });
                    claimed.insert(idx);
                    report.updated += 1;
                }
                None => {
                    let mut cells = vec![None; self.sessions.len()];
                    cells[col] = Some(SessionEntry {
                        car: entry.car.clone(),
                        value: entry.cell,
                    });
                    self.rows.push(EntrantRow {
                        id: EntrantId(self.rows.len()),
                        driver: entry.driver,
                        number: entry.number,
                        cars: vec![entry.car],
                        cells,
                    });
                    claimed.insert(self.rows.len() - 1);
                    report.new_entrants += 1;
                }
            }
        }

        info!(
            "{} {}: merged {} rows ({} new, {} car changes)",
            self.season,
            session,
            report.updated + report.new_entrants,
            report.new_entrants,
            report.car_changes
        );
        report
    }

    /// Row an entry belongs to, among rows not yet written this session
    ///
    /// Tried in order: same name and car, a suffixed row of the same name
    /// that drove this car, then the same name alone (a car change).
    fn find_row(&self, entry: &ParsedEntry<C>, claimed: &HashSet<usize>) -> Option<usize> {
        let free = || {
            self.rows
                .iter()
                .enumerate()
                .filter(move |(idx, _)| !claimed.contains(idx))
        };
        free()
            .find(|(_, r)| r.driver == entry.driver && r.cars.contains(&entry.car))
            .or_else(|| {
                free().find(|(_, r)| {
                    base_name(&r.driver) == entry.driver && r.cars.contains(&entry.car)
                })
            })
            .or_else(|| free().find(|(_, r)| r.driver == entry.driver))
            .map(|(idx, _)| idx)
    }

    /// Give repeated display names within one session distinct suffixes
    ///
    /// A suffixed name already held by a row driving the same car is reused
    /// so the same pairing keeps its row across sessions.
    fn disambiguate(
        &self,
        entries: Vec<ParsedEntry<C>>,
        report: &mut MergeReport,
    ) -> Vec<ParsedEntry<C>> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for entry in &entries {
            *counts.entry(entry.driver.clone()).or_default() += 1;
        }
        if counts.values().all(|&n| n == 1) {
            return entries;
        }

        let mut assigned: HashSet<String> = HashSet::new();
        let mut pending: Vec<usize> = Vec::new();
        let mut out = entries;

        // First pass: reuse names whose existing row drove this car
        for (i, entry) in out.iter_mut().enumerate() {
            let n = counts[&entry.driver];
            if n == 1 {
                continue;
            }
            let reuse = suffixed_names(&entry.driver, n + self.rows.len())
                .find(|name| {
                    !assigned.contains(name)
                        && self
                            .rows
                            .iter()
                            .any(|r| &r.driver == name && r.cars.contains(&entry.car))
                });
            match reuse {
                Some(name) => {
                    if name != entry.driver {
                        report.renamed.push(name.clone());
                    }
                    assigned.insert(name.clone());
                    entry.driver = name;
                }
                None => pending.push(i),
            }
        }

        // Second pass: first free name in suffix order
        for i in pending {
            let base = out[i].driver.clone();
            let name = suffixed_names(&base, usize::MAX)
                .find(|name| !assigned.contains(name))
                .unwrap_or_else(|| base.clone());
            if name != base {
                report.renamed.push(name.clone());
            }
            assigned.insert(name.clone());
            out[i].driver = name;
        }

        out
    }
}

/// Display name without a `" (n)"` duplicate suffix
fn base_name(name: &str) -> &str {
    name.strip_suffix(')')
        .and_then(|rest| rest.rsplit_once(" ("))
        .filter(|(_, n)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .map_or(name, |(base, _)| base)
}

/// `base`, `base (2)`, `base (3)`, ...
fn suffixed_names(base: &str, limit: usize) -> impl Iterator<Item = String> + '_ {
    (1..=limit).map(move |n| {
        if n == 1 {
            base.to_string()
        } else {
            format!("{} ({})", base, n)
        }
    })
}
