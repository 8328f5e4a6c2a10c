#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for IPO grey market premium lookups.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use ipo_gmp_models::{Failure, LatestRow, ResolverKind, SummaryRecord};
use ipo_gmp_scraper::resolver::TemplateProbe;
use ipo_gmp_scraper::slug::slugify;
use ipo_gmp_scraper::{BatchEntry, GmpClient, GmpConfig};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "ipo_gmp", about = "IPO grey market premium lookup tool")]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Commands,
}

/// Settings that take precedence over the `GMP_*` environment variables.
#[derive(Args, Default)]
struct Overrides {
    /// Page discovery strategy (`template-probe` or `external-search`)
    #[arg(long, global = true)]
    resolver: Option<ResolverKind>,
    /// Row that seeds the summary prices (`most-recent` or `second-most-recent`)
    #[arg(long, global = true)]
    latest_row: Option<LatestRow>,
    /// Number of most recent observations kept in the trend
    #[arg(long, global = true)]
    window: Option<usize>,
    /// Timeout in seconds for the page fetch and search calls
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Timeout in seconds for each candidate URL probe
    #[arg(long, global = true)]
    probe_timeout: Option<u64>,
    /// Maximum number of lookups in flight
    #[arg(long, global = true)]
    concurrency: Option<usize>,
}

impl Overrides {
    fn apply(&self, mut config: GmpConfig) -> GmpConfig {
        if let Some(resolver) = self.resolver {
            config = config.with_resolver(resolver);
        }
        if let Some(latest_row) = self.latest_row {
            config = config.with_latest_row(latest_row);
        }
        if let Some(window) = self.window {
            config = config.with_window(window);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.probe_timeout {
            config = config.with_probe_timeout(Duration::from_secs(secs));
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the GMP summary of one or more IPOs
    Lookup {
        /// IPO display names (e.g., "Patel Retail Ltd")
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Print the full normalized GMP history of an IPO
    History {
        /// IPO display name
        name: String,
    },
    /// Print the slug and candidate URLs for an IPO without fetching them
    Candidates {
        /// IPO display name
        name: String,
    },
}

/// One element of the `lookup` output array.
#[derive(Debug, Serialize)]
struct LookupOutput<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a SummaryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Failure>,
}

impl<'a> From<&'a BatchEntry> for LookupOutput<'a> {
    fn from(entry: &'a BatchEntry) -> Self {
        match &entry.result {
            Ok(record) => Self {
                name: &entry.name,
                record: Some(record),
                error: None,
            },
            Err(e) => Self {
                name: &entry.name,
                record: None,
                error: Some(e.to_failure()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CandidatesOutput {
    slug: String,
    candidates: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = cli.overrides.apply(GmpConfig::from_env()?);

    match cli.command {
        Commands::Lookup { names } => {
            let client = GmpClient::new(config)?;
            let entries = client.lookup_many(&names).await;

            let failed = entries.iter().filter(|e| e.result.is_err()).count();
            log::info!(
                "Looked up {} offering(s): {} succeeded, {failed} failed",
                entries.len(),
                entries.len() - failed
            );

            let output: Vec<LookupOutput<'_>> = entries.iter().map(LookupOutput::from).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::History { name } => {
            let client = GmpClient::new(config)?;
            let history = client.history(&name).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Commands::Candidates { name } => {
            let output = CandidatesOutput {
                slug: slugify(&name),
                candidates: TemplateProbe::from_config(&config).candidates(&name),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
