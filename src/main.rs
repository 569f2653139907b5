use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod aggregate;
mod cache;
mod config;
mod derive;
mod error;
mod filter;
mod ingest;
mod logging;
mod models;
mod report;

use crate::cache::TransformCache;
use crate::config::Config;
use crate::filter::{FilterOptions, FilterSpec};
use crate::models::DerivedRequest;
use crate::report::DashboardView;

#[derive(Parser)]
#[command(name = "roadmap-timeline")]
#[command(about = "Strategic priorities roadmap from the AI tool request pipeline sheet", long_about = None)]
struct Cli {
    /// TOML config file; defaults to ./roadmap.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Only items scheduled for this quarter, e.g. "Q1 2025"
    #[arg(long)]
    quarter: Option<String>,
    /// Only items with this status; repeat for several
    #[arg(long = "status")]
    statuses: Vec<String>,
    /// Only items requested by this stakeholder
    #[arg(long)]
    stakeholder: Option<String>,
}

impl FilterArgs {
    fn into_spec(self) -> FilterSpec {
        FilterSpec {
            time_bucket: self.quarter,
            statuses: (!self.statuses.is_empty()).then(|| self.statuses.into_iter().collect()),
            stakeholder: self.stakeholder,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print headline counts and quick statistics
    Summary {
        #[arg(long)]
        file: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Generate a markdown roadmap report
    Report {
        #[arg(long)]
        file: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "roadmap.md")]
        out: PathBuf,
    },
    /// Write the filtered rows and aggregates as JSON
    Export {
        #[arg(long)]
        file: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output path; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the values each filter accepts
    Options {
        #[arg(long)]
        file: PathBuf,
    },
}

/// One user session: settings plus the memoized transform of the last file.
struct Dashboard {
    config: Config,
    cache: TransformCache,
}

impl Dashboard {
    fn new(config: Config) -> Self {
        Self {
            config,
            cache: TransformCache::new(),
        }
    }

    fn load(&mut self, file: &Path) -> anyhow::Result<Arc<Vec<DerivedRequest>>> {
        let (bytes, format) = ingest::read_source(file)
            .with_context(|| format!("could not load {}", file.display()))?;
        let rows = self
            .cache
            .get_or_load(&bytes, format, self.config.header_row)
            .with_context(|| {
                format!(
                    "could not load data from {}; check the file format",
                    file.display()
                )
            })?;
        tracing::info!(
            file = %file.display(),
            rows = rows.len(),
            cache_hits = self.cache.hits(),
            cache_misses = self.cache.misses(),
            "loaded roadmap"
        );
        Ok(rows)
    }

    fn view(&mut self, file: &Path, spec: FilterSpec) -> anyhow::Result<DashboardView> {
        let rows = self.load(file)?;
        Ok(DashboardView::build(
            file.display().to_string(),
            &rows,
            spec,
            &self.config.aggregate,
        ))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    logging::init(&config, cli.verbose)?;

    let mut dashboard = Dashboard::new(config);

    match cli.command {
        Commands::Summary { file, filters } => {
            let view = dashboard.view(&file, filters.into_spec())?;
            print!("{}", report::summarize(&view));
        }
        Commands::Report {
            file,
            filters,
            out,
        } => {
            let view = dashboard.view(&file, filters.into_spec())?;
            let report = report::build_report(&view);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            file,
            filters,
            out,
        } => {
            let view = dashboard.view(&file, filters.into_spec())?;
            let json = serde_json::to_string_pretty(&view)?;
            match out {
                Some(out) => {
                    std::fs::write(&out, json)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Exported {} rows to {}.", view.rows.len(), out.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Options { file } => {
            let rows = dashboard.load(&file)?;
            let options = FilterOptions::from_rows(&rows);
            println!("Quarters: {}", options.quarters.join(", "));
            println!("Statuses: {}", options.statuses.join(", "));
            println!("Stakeholders: {}", options.stakeholders.join(", "));
        }
    }

    Ok(())
}
