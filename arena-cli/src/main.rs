//! ARENA CLI - Command-line interface
//!
//! Commands:
//! - duel: Fight a single 1v1 battle
//! - tag-team: Fight a single tag-team battle
//! - cycle: Resolve and price a batch of league battles
//! - rebalance: Promote and demote competitors between tiers
//! - income: Passive income and upgrade costs for a stable

mod battle_cmd;
mod cycle_cmd;
mod income_cmd;
mod rebalance_cmd;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use arena_league::LeagueConfig;

#[derive(Parser)]
#[command(name = "arena")]
#[command(about = "Robot arena battle and league engine")]
struct Cli {
    /// Random seed for the combat model
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// League configuration JSON (defaults apply to missing fields)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fight a single 1v1 battle
    Duel(battle_cmd::DuelArgs),
    /// Fight a single tag-team battle
    TagTeam(battle_cmd::TagTeamArgs),
    /// Resolve a cycle of league battles
    Cycle(cycle_cmd::CycleArgs),
    /// Rebalance league tiers
    Rebalance(rebalance_cmd::RebalanceArgs),
    /// Passive income and attribute upgrade costs
    Income(income_cmd::IncomeArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.seed)?;

    match cli.command {
        Commands::Duel(args) => battle_cmd::run_duel(args, &config),
        Commands::TagTeam(args) => battle_cmd::run_tag_team(args, &config),
        Commands::Cycle(args) => cycle_cmd::run(args, &config),
        Commands::Rebalance(args) => rebalance_cmd::run(args, &config),
        Commands::Income(args) => income_cmd::run(args, &config),
    }
}

/// League configuration from `--config`, with `--seed` on top
fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<LeagueConfig> {
    let config = match path {
        Some(path) => LeagueConfig::load(path)?,
        None => LeagueConfig::default(),
    };
    Ok(match seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    })
}

/// Read and parse a JSON input file
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}: {}", what, path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}: {}", what, path.display()))
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
