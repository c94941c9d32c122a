//! votepower-node: command-line runner for the governance analytics engines
//!
//! - `dashboard`: per-track delegation status of a set of addresses
//! - `analytics`: delegator / delegatee voting power on one track
//! - `treasury-tally`: the monthly treasury tally (a no-op off the run day)
//! - `treasury-history`: the stored long-term treasury history
//!
//! Results are printed to stdout as JSON.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use config::Config;
use delegation::{DelegationDashboard, SubsquidClient};
use treasury::{SubscanClient, TreasuryHistoryAggregator};
use votepower_core::{DocumentStore, FileStore, TrackId, TrimmingCodec};

#[derive(Parser)]
#[command(name = "votepower-node")]
#[command(about = "Delegation and treasury analytics for governance dashboards")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "votepower-node.toml")]
    config: PathBuf,

    /// Document store file (overrides config file)
    #[arg(long, env = "VOTEPOWER_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Per-track delegation status of one or more addresses
    Dashboard {
        #[arg(short, long)]
        network: String,
        /// Address to inspect (repeatable)
        #[arg(short, long = "address", required = true)]
        addresses: Vec<String>,
        /// Restrict to one track
        #[arg(short, long)]
        track: Option<u16>,
    },

    /// Delegator and delegatee voting power on one track
    Analytics {
        #[arg(short, long)]
        network: String,
        #[arg(short, long)]
        track: u16,
    },

    /// Compute and store the monthly treasury tally
    TreasuryTally {
        #[arg(short, long)]
        network: String,
        /// Run as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Print the stored treasury history
    TreasuryHistory {
        #[arg(short, long)]
        network: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("votepower_node=info".parse()?)
                .add_directive("delegation=info".parse()?)
                .add_directive("treasury=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("reading {}", cli.config.display()))?;
    if let Some(store) = cli.store {
        config.store.path = store;
    }

    info!(store = %config.store.path.display(), "Using document store");
    let store: Arc<dyn DocumentStore> = Arc::new(FileStore::new(config.store.path.clone()));

    match cli.command {
        Commands::Dashboard {
            network,
            addresses,
            track,
        } => {
            let dashboard = delegation_dashboard(&config, store);
            let result = dashboard
                .summaries(&addresses, &network, track.map(TrackId))
                .await?;
            print_json(&result)
        }
        Commands::Analytics { network, track } => {
            let dashboard = delegation_dashboard(&config, store);
            let analytics = dashboard.track_analytics(&network, TrackId(track)).await?;
            print_json(&analytics)
        }
        Commands::TreasuryTally { network, date } => {
            let hosts = config
                .subscan
                .networks
                .get(&network)
                .with_context(|| format!("no subscan hosts configured for {}", network))?;
            let api_key = config.subscan.api_key.clone();
            let aggregator = TreasuryHistoryAggregator::new(
                store,
                Arc::new(SubscanClient::new(&hosts.relay_chain, api_key.clone())),
                Arc::new(SubscanClient::new(&hosts.asset_hub, api_key)),
            )
            .with_config(config.engine.treasury.clone());

            let today = date.unwrap_or_else(|| chrono::Utc::now().date_naive());
            let outcome = aggregator.run(&network, today).await?;
            print_json(&outcome)
        }
        Commands::TreasuryHistory { network } => {
            let history = treasury::read_history(store.as_ref(), &network).await?;
            print_json(&history)
        }
    }
}

fn delegation_dashboard(config: &Config, store: Arc<dyn DocumentStore>) -> DelegationDashboard {
    let mut client = SubsquidClient::new(config.subsquid.url_template.clone());
    if let Some(key) = &config.subsquid.api_key {
        client = client.with_api_key(key.clone());
    }

    DelegationDashboard::new(store, Arc::new(client), Arc::new(TrimmingCodec))
        .with_config(config.engine.fetch.clone())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
