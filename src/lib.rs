//! Historical Formula One results archive
//!
//! Scrapes race, qualifying and constructors standings pages from the
//! official results site and reconciles them into one wide table per season,
//! with derived comparisons on top.
//!
//! This library provides:
//! - Season indexing from the site's race listings and race pages
//! - Race and qualifying table reconciliation across a season
//! - Era-correct points systems and percentage metrics
//! - Team-mate and field-mean qualifying gaps
//! - Constructors standings with canonical team identities across eras
//! - DataFrame export to CSV or Parquet

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod html;
pub mod index;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod points;
pub mod reconciler;
pub mod standings;
pub mod teams;

pub use config::{ArchiveConfig, FetchConfig};
pub use error::{ArchiveError, Result};
pub use export::{ExportFormat, Exporter};
pub use fetcher::{HttpFetcher, PageSource};
pub use models::{Season, SessionId};
pub use pipeline::{ResultStore, RunReport, SeasonProcessor, SeasonResults};
pub use reconciler::{QualyTable, RaceTable};
