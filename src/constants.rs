//! Application constants for the F1 archive
//!
//! Source layout details, era boundaries, default values and lookup
//! tables used throughout the scraper and metric engine.

// =============================================================================
// Source Site Layout
// =============================================================================

/// Results website root
pub const DEFAULT_HOMEPAGE: &str = "https://www.formula1.com/";

/// Marker in hrefs that point at a race classification page
pub const RACE_RESULT_MARKER: &str = "race-result";

/// Qualifying link marker used by every era
pub const QUALY_LEGACY_MARKER: &str = "qualifying-0";

/// Broader qualifying marker accepted from `QUALY_BROAD_FROM_YEAR` onward
pub const QUALY_BROAD_MARKER: &str = "qualifying";

/// First season published with knockout (Q1/Q2/Q3) qualifying
pub const KNOCKOUT_QUALY_FROM_YEAR: i32 = 2006;

/// First season whose race pages carry the broader qualifying link pattern
pub const QUALY_BROAD_FROM_YEAR: i32 = 2006;

/// Suffixes appended to a session slug when it collides with an earlier one
pub const SESSION_SUFFIXES: &[&str] = &["A", "B"];

/// Season race listing page, relative to the homepage
pub fn races_index_path(year: &str) -> String {
    format!("en/results.html/{}/races.html", year)
}

/// Constructors championship page, relative to the homepage
pub fn team_standings_path(year: &str) -> String {
    format!("en/results.html/{}/team.html", year)
}

// =============================================================================
// Table Columns
// =============================================================================

pub mod columns {
    pub const POS: &str = "Pos";
    pub const NO: &str = "No";
    pub const DRIVER: &str = "Driver";
    pub const CAR: &str = "Car";
    pub const TEAM: &str = "Team";
    pub const PTS: &str = "PTS";
    pub const TIME: &str = "Time";
    pub const Q1: &str = "Q1";
    pub const Q2: &str = "Q2";
    pub const Q3: &str = "Q3";

    /// Knockout stages, latest last
    pub const KNOCKOUT_STAGES: &[&str] = &[Q1, Q2, Q3];
}

/// Length of the driver code the site appends to driver names ("HAM")
pub const DRIVER_CODE_LEN: usize = 3;

/// Length of the car code shown by presentation ("MCL")
pub const CAR_CODE_LEN: usize = 3;

/// Time values the site uses for untimed entries
pub const UNTIMED_MARKERS: &[&str] = &["DNF", "DNS", "DNC", "DNQ", "DNPQ", "DSQ", "EX", "NC"];

// =============================================================================
// Metric Defaults
// =============================================================================

/// Field-mean deviations below this many seconds are treated as outliers
pub const DEFAULT_QUALY_MEAN_THRESHOLD: f64 = -10.0;

/// Gaps outside (-WINDOW, WINDOW) seconds are treated as minute wraparound
pub const GAP_WRAP_WINDOW: f64 = 15.0;

/// Modulus of the minute wraparound correction
pub const SECONDS_PER_MINUTE: f64 = 60.0;

// =============================================================================
// Fetch Defaults
// =============================================================================

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Upper bound accepted for `fetch.max_retries`
pub const MAX_FETCH_RETRIES: u32 = 10;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
pub const DEFAULT_USER_AGENT: &str = concat!("f1_archive/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Race Abbreviations
// =============================================================================

/// Short labels for race slugs, used by chart axes
pub const RACE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("south-africa", "SA"),
    ("mexico", "MEX"),
    ("brazil", "BRA"),
    ("spain", "SPA"),
    ("san-marino", "SMA"),
    ("monaco", "MNO"),
    ("canada", "CND"),
    ("france", "FRA"),
    ("great-britain", "GB"),
    ("germany", "GER"),
    ("hungary", "HUN"),
    ("belgium", "BEL"),
    ("italy", "ITA"),
    ("portugal", "POR"),
    ("japan", "JAP"),
    ("australia", "AUS"),
    ("united-states", "USA"),
    ("europe", "EUR"),
    ("pacific", "PAC"),
    ("argentina", "ARG"),
    ("luxembourg", "LUX"),
    ("austria", "AST"),
];

/// Abbreviation for a race slug, upper-cased slug prefix when unknown
pub fn race_abbreviation(slug: &str) -> String {
    let base = slug.trim_end_matches(|c: char| c.is_ascii_uppercase());
    RACE_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == base)
        .map(|(_, abbr)| abbr.to_string())
        .unwrap_or_else(|| base.chars().take(3).collect::<String>().to_uppercase())
}
