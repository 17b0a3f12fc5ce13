//! Rebalance command - promote and demote competitors between league tiers
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: rebalance_format(), report_results()
//! - Level 3: apply_summary()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use arena_core::BattleFormat;
use arena_league::{LeagueConfig, LeagueStanding, RebalanceSummary, Standings, TierChange};

use crate::{print_json, read_json};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct RebalanceArgs {
    /// Standings JSON file (array)
    #[arg(long, value_name = "FILE")]
    pub standings: PathBuf,

    /// Rebalance the tag-team league instead of the 1v1 league
    #[arg(long)]
    pub tag_team: bool,

    /// Where to write the rebalanced standings
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run rebalance command
///
/// Decisions are taken on the standings as loaded; changes are applied
/// only once the whole pass is done.
pub fn run(args: RebalanceArgs, config: &LeagueConfig) -> Result<()> {
    let entries: Vec<LeagueStanding> = read_json(&args.standings, "standings")?;
    let format = if args.tag_team {
        BattleFormat::TagTeam
    } else {
        BattleFormat::Duel
    };

    let summary = rebalance_format(&entries, format, config);

    let mut standings = Standings::from_entries(entries);
    apply_summary(&mut standings, &summary);

    if let Some(output) = &args.output {
        let content =
            serde_json::to_string_pretty(&standings.snapshot()).context("Failed to serialize standings")?;
        std::fs::write(output, content)
            .with_context(|| format!("Failed to write standings: {}", output.display()))?;
    }

    report_results(&summary, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Rebalance one format's league with that league's thresholds
fn rebalance_format(entries: &[LeagueStanding], format: BattleFormat, config: &LeagueConfig) -> RebalanceSummary {
    let league: Vec<LeagueStanding> = entries.iter().filter(|s| s.format() == format).cloned().collect();
    tracing::info!("Rebalancing {:?} league: {} competitors", format, league.len());
    config.rebalancer(format).rebalance(&league)
}

fn report_results(summary: &RebalanceSummary, json: bool) -> Result<()> {
    if json {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            promoted: usize,
            demoted: usize,
            changes: Vec<&'a TierChange>,
            tiers: &'a RebalanceSummary,
        }

        print_json(&JsonOutput {
            promoted: summary.total_promoted(),
            demoted: summary.total_demoted(),
            changes: summary.changes().collect(),
            tiers: summary,
        })
    } else {
        print_text_results(summary);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn apply_summary(standings: &mut Standings, summary: &RebalanceSummary) {
    standings.apply_changes(summary.changes());
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn print_text_results(summary: &RebalanceSummary) {
    println!("\n=== Rebalance Results ===");
    println!("Promoted: {}", summary.total_promoted());
    println!("Demoted:  {}", summary.total_demoted());

    println!("\nTiers:");
    for tier in &summary.tiers {
        if tier.skipped {
            println!("  {}: {} eligible, skipped", tier.tier, tier.eligible);
        } else {
            println!(
                "  {}: {} eligible, {} up, {} down",
                tier.tier,
                tier.eligible,
                tier.promoted.len(),
                tier.demoted.len()
            );
        }
    }

    let changes: Vec<&TierChange> = summary.changes().collect();
    if !changes.is_empty() {
        println!("\nChanges:");
        for change in changes {
            let direction = if change.is_promotion() { "up" } else { "down" };
            println!("  {}: {} -> {} ({})", change.competitor, change.from, change.to, direction);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::{CombatantId, Competitor, TeamId};
    use arena_league::LeagueTier;

    fn robot(id: u32, points: u32) -> LeagueStanding {
        LeagueStanding::new(Competitor::Robot(CombatantId(id)), LeagueTier::Silver, 1000)
            .with_points(points)
            .with_cycles(5)
    }

    fn team(id: u32, points: u32) -> LeagueStanding {
        LeagueStanding::new(Competitor::Team(TeamId(id)), LeagueTier::Silver, 2000)
            .with_points(points)
            .with_cycles(5)
    }

    #[test]
    fn test_only_selected_format_moves() {
        let mut entries: Vec<LeagueStanding> = (0..10).map(|i| robot(i, i * 3)).collect();
        entries.extend((0..10).map(|i| team(i, i * 3)));

        let config = LeagueConfig::default();
        let summary = rebalance_format(&entries, BattleFormat::Duel, &config);
        let mut standings = Standings::from_entries(entries);
        apply_summary(&mut standings, &summary);

        let top_robot = standings.get(&Competitor::Robot(CombatantId(9))).unwrap();
        assert_eq!(top_robot.tier, LeagueTier::Gold);
        assert_eq!(top_robot.league_points, 0);
        let top_team = standings.get(&Competitor::Team(TeamId(9))).unwrap();
        assert_eq!(top_team.tier, LeagueTier::Silver);
    }

    #[test]
    fn test_tag_team_threshold_applies() {
        // top team has 18 points, under the 25 needed
        let entries: Vec<LeagueStanding> = (0..10).map(|i| team(i, i * 2)).collect();
        let summary = rebalance_format(&entries, BattleFormat::TagTeam, &LeagueConfig::default());
        assert_eq!(summary.total_promoted(), 0);
        assert_eq!(summary.total_demoted(), 1);
    }

    #[test]
    fn test_promoted_team_keeps_points() {
        let entries: Vec<LeagueStanding> = (0..10).map(|i| team(i, 30 + i)).collect();
        let summary = rebalance_format(&entries, BattleFormat::TagTeam, &LeagueConfig::default());
        let mut standings = Standings::from_entries(entries);
        apply_summary(&mut standings, &summary);

        let promoted = standings.get(&Competitor::Team(TeamId(9))).unwrap();
        assert_eq!(promoted.tier, LeagueTier::Gold);
        assert_eq!(promoted.league_points, 39);
        assert_eq!(promoted.cycles_in_tier, 0);
        let demoted = standings.get(&Competitor::Team(TeamId(0))).unwrap();
        assert_eq!(demoted.tier, LeagueTier::Bronze);
        assert_eq!(demoted.league_points, 30);
    }
}
