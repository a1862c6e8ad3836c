//! Command-line interface.
//!
//! Builds an `ArchiveConfig` from an optional JSON file plus flags, runs the
//! season pipeline against the live site and exports every table.

use crate::config::ArchiveConfig;
use crate::export::{ExportFormat, Exporter};
use crate::fetcher::HttpFetcher;
use crate::models::Season;
use crate::pipeline::{ResultStore, RunReport, SeasonProcessor};
use crate::standings::TrendMetric;
use crate::teams::TeamNameRules;
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "f1_archive")]
#[command(about = "Scrape historical Formula One results into normalized season tables")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Seasons to process (e.g. 1992 2010); overrides the config file list
    #[arg(value_name = "YEAR")]
    pub years: Vec<String>,

    /// JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for exported tables
    #[arg(short, long, value_name = "PATH", default_value = "output")]
    pub output_dir: PathBuf,

    /// Export file format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Skip the "% of max" standings column
    #[arg(long)]
    pub no_max_percentage: bool,

    /// Skip the "% of total" standings column
    #[arg(long)]
    pub no_total_percentage: bool,

    /// Skip qualifying tables
    #[arg(long)]
    pub no_qualifying: bool,

    /// Skip constructors standings and trends
    #[arg(long)]
    pub no_standings: bool,

    /// Discard field-mean deviations below this many seconds
    #[arg(long, value_name = "SECONDS", allow_hyphen_values = true)]
    pub threshold: Option<f64>,

    /// Points awarded by finishing position, largest first (e.g. 10,6,4,3,2,1)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub points: Option<Vec<u32>>,

    /// Also export best-N running totals
    #[arg(long, value_name = "N")]
    pub best_n: Option<usize>,

    /// Standings column tracked in the constructors trend table
    #[arg(long, value_enum, default_value_t = TrendMetric::Points)]
    pub trend_metric: TrendMetric,

    /// Results website root
    #[arg(long, value_name = "URL")]
    pub homepage: Option<String>,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Config file (or defaults) with command-line overrides applied
    pub fn build_config(&self) -> Result<ArchiveConfig> {
        let mut config = match &self.config {
            Some(path) => ArchiveConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ArchiveConfig::default(),
        };

        if !self.years.is_empty() {
            config = config.with_years(self.years.iter().map(|y| Season::from_label(y)).collect());
        }
        if self.no_max_percentage {
            config = config.without_max_percentage();
        }
        if self.no_total_percentage {
            config = config.without_total_percentage();
        }
        if self.no_qualifying {
            config = config.without_qualifying();
        }
        if self.no_standings {
            config = config.without_standings();
        }
        if let Some(threshold) = self.threshold {
            config = config.with_qualy_mean_threshold(threshold);
        }
        if let Some(points) = &self.points {
            config = config.with_points_override(points.clone());
        }
        if let Some(n) = self.best_n {
            config = config.with_best_n(n);
        }
        if let Some(homepage) = &self.homepage {
            config = config.with_homepage(homepage.clone());
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("f1_archive={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

/// Run the archive and export every table; returns the run report
pub async fn run(args: Args) -> Result<RunReport> {
    setup_logging(&args);
    let start = Instant::now();
    let config = args.build_config()?;

    if !args.quiet {
        println!("{}", "Starting archive run".bright_green().bold());
        println!(
            "  {} {}",
            "Seasons:".bright_cyan(),
            config
                .years
                .iter()
                .map(Season::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("  {} {}", "Output:".bright_cyan(), args.output_dir.display());
    }

    let fetcher = HttpFetcher::new(config.fetch.clone())?;
    let processor =
        SeasonProcessor::new(&fetcher, config.clone())?.with_progress(args.show_progress());
    let store = processor.run(&config.years).await;

    let exporter = Exporter::new(&args.output_dir, args.format).with_best_n(config.best_n);
    let mut written = Vec::new();
    for results in store.iter() {
        let files = exporter
            .export_season(results)
            .with_context(|| format!("Failed to export season {}", results.season))?;
        written.extend(files);
    }
    if config.include_standings {
        let trends = store.trends(TeamNameRules::latest(), args.trend_metric);
        written.extend(
            exporter
                .export_trends(&trends)
                .context("Failed to export constructors trends")?,
        );
    }

    if !args.quiet {
        print_summary(&store, written.len(), start);
    }
    Ok(store.report().clone())
}

fn print_summary(store: &ResultStore, files: usize, start: Instant) {
    let report = store.report();
    println!("\n{}", "Run complete".bright_green().bold());
    println!(
        "  {} {}",
        "Seasons completed:".bright_cyan(),
        report.completed.len().to_string().bright_white().bold()
    );
    for results in store.iter() {
        println!("    {} {}", results.season.to_string().bright_white(), results.stats.summary());
    }
    if !report.failed.is_empty() {
        println!(
            "  {} {}",
            "Seasons failed:".bright_red(),
            report.failed.len().to_string().bright_white().bold()
        );
        for (season, reason) in &report.failed {
            println!("    {} {}", season.to_string().bright_red(), reason);
        }
    }
    println!("  {} {}", "Files written:".bright_cyan(), files);
    println!(
        "  {} {:.1}s",
        "Elapsed:".bright_cyan(),
        start.elapsed().as_secs_f64()
    );
}
