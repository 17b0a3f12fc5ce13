//! Cycle command - resolve a batch of league battles and update standings
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_requests(), update_standings(), report_results()
//! - Level 3: battle_line()
//! - Level 4: file I/O, formatting utilities

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use arena_league::{
    run_cycle, BattleRequest, BattleResult, CycleReport, CycleSummary, LeagueConfig, LeagueStanding,
    Resolution, RewardResult, Standings,
};

use crate::{print_json, read_json};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct CycleArgs {
    /// Battle requests JSON file (array)
    #[arg(long, value_name = "FILE")]
    pub battles: PathBuf,

    /// Current standings JSON file; league points and ratings are credited to it
    #[arg(long, value_name = "FILE")]
    pub standings: Option<PathBuf>,

    /// Where to write updated standings (requires --standings)
    #[arg(long, value_name = "FILE", requires = "standings")]
    pub output: Option<PathBuf>,

    /// Resolve battles one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// One row of the cycle report
#[derive(Clone, Debug, serde::Serialize)]
struct BattleLine {
    battle_id: u64,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    red: Option<SideLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blue: Option<SideLine>,
}

/// What one corner took home
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
struct SideLine {
    currency: u32,
    /// Currency plus streaming minus repairs
    net_credits: i64,
    fame: u32,
}

impl From<&RewardResult> for SideLine {
    fn from(reward: &RewardResult) -> Self {
        Self {
            currency: reward.currency,
            net_credits: reward.net_credits(),
            fame: reward.total_fame(),
        }
    }
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run cycle command
///
/// 1. Load the battle requests
/// 2. Resolve and price every battle
/// 3. Credit league points and ratings to the standings, if given
/// 4. Report results
pub fn run(args: CycleArgs, config: &LeagueConfig) -> Result<()> {
    let requests = load_requests(&args.battles)?;
    let config = config.clone().with_parallel(config.parallel && !args.sequential);

    tracing::info!(
        "Running cycle: {} battles ({})",
        requests.len(),
        if config.parallel { "parallel" } else { "sequential" }
    );

    let report = run_cycle(&requests, &config);

    let standings = match &args.standings {
        Some(path) => Some(update_standings(path, &report)?),
        None => None,
    };
    if let (Some(standings), Some(output)) = (&standings, &args.output) {
        save_standings(standings, output)?;
    }

    report_results(&report, standings.as_ref(), args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_requests(path: &Path) -> Result<Vec<BattleRequest>> {
    read_json(path, "battle requests")
}

/// Credit every fought battle, then close the cycle
fn update_standings(path: &Path, report: &CycleReport) -> Result<Standings> {
    let entries: Vec<LeagueStanding> = read_json(path, "standings")?;
    let mut standings = Standings::from_entries(entries);

    for battle in report.reports() {
        for missing in standings.apply_report(battle) {
            tracing::warn!("Battle {}: no standing for {}", battle.battle_id, missing);
        }
    }
    standings.advance_cycle();

    Ok(standings)
}

fn report_results(report: &CycleReport, standings: Option<&Standings>, json: bool) -> Result<()> {
    let lines: Vec<BattleLine> = report.results.iter().map(battle_line).collect();
    let summary = report.summary();

    if json {
        #[derive(serde::Serialize)]
        struct JsonOutput {
            summary: CycleSummary,
            battles: Vec<BattleLine>,
            #[serde(skip_serializing_if = "Option::is_none")]
            standings: Option<Vec<LeagueStanding>>,
        }

        print_json(&JsonOutput {
            summary,
            battles: lines,
            standings: standings.map(Standings::snapshot),
        })
    } else {
        print_text_results(&summary, &lines, standings);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn battle_line(result: &BattleResult) -> BattleLine {
    match result {
        Ok(Resolution::Fought(report)) => {
            let winner = match report.outcome.winner() {
                Some(corner) => format!("{} wins", report.outcome.competitor(corner)),
                None => "draw".to_string(),
            };
            let side = |index: usize| report.rewards.get(index).map(SideLine::from);
            BattleLine {
                battle_id: report.battle_id,
                status: "fought",
                detail: format!("{} ({}, {:?})", winner, report.tier, report.outcome.end_reason()),
                red: side(0),
                blue: side(1),
            }
        }
        Ok(Resolution::Skipped(skipped)) => BattleLine {
            battle_id: skipped.battle_id,
            status: "skipped",
            detail: format!(
                "not ready: {}",
                skipped.unready.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
            ),
            red: None,
            blue: None,
        },
        Err(failure) => BattleLine {
            battle_id: failure.battle_id,
            status: "failed",
            detail: failure.error.to_string(),
            red: None,
            blue: None,
        },
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn save_standings(standings: &Standings, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(&standings.snapshot()).context("Failed to serialize standings")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write standings: {}", path.display()))?;
    tracing::info!("Standings written to {}", path.display());
    Ok(())
}

fn print_text_results(summary: &CycleSummary, lines: &[BattleLine], standings: Option<&Standings>) {
    println!("\n=== Cycle Results ===");
    println!("Battles: {}", summary.total);
    println!("Fought:  {} ({} draws)", summary.fought, summary.draws);
    println!("Skipped: {}", summary.skipped);
    println!("Failed:  {}", summary.failed);

    println!("\nBattle details:");
    for line in lines {
        match (line.red, line.blue) {
            (Some(red), Some(blue)) => println!(
                "  Battle {}: {} [red {:+} / blue {:+} net credits, fame {} / {}]",
                line.battle_id, line.detail, red.net_credits, blue.net_credits, red.fame, blue.fame
            ),
            _ => println!("  Battle {}: {} ({})", line.battle_id, line.status, line.detail),
        }
    }

    if let Some(standings) = standings {
        println!("\nStandings:");
        for s in standings.snapshot() {
            println!(
                "  {}: {} - {} points, {} cycles",
                s.competitor, s.tier, s.league_points, s.cycles_in_tier
            );
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
