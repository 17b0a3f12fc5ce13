//! Battle commands - fight a single duel or tag-team battle
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_duel(), run_tag_team() - orchestration
//! - Level 2: load_teams(), report_battle()
//! - Level 3: summarize()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use arena_core::{
    AttributeModel, BattleOutcome, BattleResolver, Combatant, Corner, RatingChange, RatingEngine,
    Team, TeamRecord,
};
use arena_league::LeagueConfig;

use crate::{print_json, read_json};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct DuelArgs {
    /// Red corner robot JSON file
    #[arg(long, value_name = "FILE")]
    pub red: PathBuf,

    /// Blue corner robot JSON file
    #[arg(long, value_name = "FILE")]
    pub blue: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TagTeamArgs {
    /// Red corner team JSON file
    #[arg(long, value_name = "FILE")]
    pub red: PathBuf,

    /// Blue corner team JSON file
    #[arg(long, value_name = "FILE")]
    pub blue: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// What gets printed for one battle
#[derive(Clone, Debug, serde::Serialize)]
struct BattleSummary {
    red: String,
    blue: String,
    winner: Option<String>,
    end_reason: String,
    duration_ms: u64,
    red_rating_delta: i32,
    blue_rating_delta: i32,
    tag_events: Vec<String>,
    participants: Vec<ParticipantLine>,
}

#[derive(Clone, Debug, serde::Serialize)]
struct ParticipantLine {
    combatant: String,
    corner: String,
    damage_dealt: i32,
    damage_taken: i32,
    final_hp: i32,
    max_hp: i32,
    survival_ms: u64,
    destroyed: bool,
    yielded: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run a single 1v1 battle
pub fn run_duel(args: DuelArgs, config: &LeagueConfig) -> Result<()> {
    let red: Combatant = read_json(&args.red, "red robot")?;
    let blue: Combatant = read_json(&args.blue, "blue robot")?;

    tracing::info!("Duel: {} {} vs {} {}", red.id, red.name, blue.id, blue.name);

    let mut resolver = BattleResolver::new(config.battle, combat_model(config));
    let outcome = resolver.resolve_duel(&red, &blue);
    let ratings = RatingEngine::new(config.k_factor).duel_change(&red, &blue, outcome.winner());

    report_battle(&summarize(&outcome, ratings), args.json)
}

/// Run a single tag-team battle
pub fn run_tag_team(args: TagTeamArgs, config: &LeagueConfig) -> Result<()> {
    let (red, blue) = load_teams(&args)?;

    let unready: Vec<String> = red
        .unready_members()
        .into_iter()
        .chain(blue.unready_members())
        .map(|id| id.to_string())
        .collect();
    if !unready.is_empty() {
        bail!("Teams not ready for battle, members below 75% HP or at yield: {}", unready.join(", "));
    }

    tracing::info!("Tag-team: {} vs {}", red.id(), blue.id());

    let mut resolver = BattleResolver::new(config.battle, combat_model(config));
    let outcome = resolver.resolve_tag_team(&red, &blue);
    let ratings = RatingEngine::new(config.k_factor).team_change(&red, &blue, outcome.winner());

    report_battle(&summarize(&outcome, ratings), args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load and validate both teams
fn load_teams(args: &TagTeamArgs) -> Result<(Team, Team)> {
    let red: TeamRecord = read_json(&args.red, "red team")?;
    let blue: TeamRecord = read_json(&args.blue, "blue team")?;

    let red = Team::try_from(red).with_context(|| format!("Invalid red team: {}", args.red.display()))?;
    let blue = Team::try_from(blue).with_context(|| format!("Invalid blue team: {}", args.blue.display()))?;
    Ok((red, blue))
}

fn report_battle(summary: &BattleSummary, json: bool) -> Result<()> {
    if json {
        print_json(summary)
    } else {
        print_text_summary(summary);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn summarize(outcome: &BattleOutcome, ratings: RatingChange) -> BattleSummary {
    BattleSummary {
        red: outcome.competitor(Corner::Red).to_string(),
        blue: outcome.competitor(Corner::Blue).to_string(),
        winner: outcome.winner().map(|corner| outcome.competitor(corner).to_string()),
        end_reason: format!("{:?}", outcome.end_reason()),
        duration_ms: outcome.duration_ms(),
        red_rating_delta: ratings.red,
        blue_rating_delta: ratings.blue,
        tag_events: outcome
            .tag_events()
            .iter()
            .map(|event| match event.incoming {
                Some(incoming) => format!(
                    "{}ms {:?}: {} {:?}, {} tagged in",
                    event.at_ms, event.corner, event.outgoing, event.reason, incoming
                ),
                None => format!(
                    "{}ms {:?}: {} {:?}, team defeated",
                    event.at_ms, event.corner, event.outgoing, event.reason
                ),
            })
            .collect(),
        participants: outcome
            .participants()
            .iter()
            .map(|p| ParticipantLine {
                combatant: p.combatant.to_string(),
                corner: format!("{:?}", p.corner),
                damage_dealt: p.damage_dealt,
                damage_taken: p.damage_taken,
                final_hp: p.final_hp,
                max_hp: p.max_hp,
                survival_ms: p.survival_ms,
                destroyed: p.destroyed,
                yielded: p.yielded,
            })
            .collect(),
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn combat_model(config: &LeagueConfig) -> AttributeModel {
    AttributeModel::seeded(config.seed.unwrap_or(42))
}

fn print_text_summary(summary: &BattleSummary) {
    println!("\n=== {} vs {} ===", summary.red, summary.blue);
    match &summary.winner {
        Some(winner) => println!("Winner:   {}", winner),
        None => println!("Winner:   draw"),
    }
    println!("Reason:   {}", summary.end_reason);
    println!("Duration: {:.1}s", summary.duration_ms as f64 / 1000.0);
    println!("ELO:      red {:+}, blue {:+}", summary.red_rating_delta, summary.blue_rating_delta);

    if !summary.tag_events.is_empty() {
        println!("\nTag events:");
        for event in &summary.tag_events {
            println!("  {}", event);
        }
    }

    println!("\nParticipants:");
    for p in &summary.participants {
        let status = if p.destroyed {
            "destroyed"
        } else if p.yielded {
            "yielded"
        } else {
            "standing"
        };
        println!(
            "  {} ({}): dealt {}, took {}, HP {}/{}, {} after {}ms",
            p.combatant, p.corner, p.damage_dealt, p.damage_taken, p.final_hp, p.max_hp, status, p.survival_ms
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::{BattleConfig, ScriptedModel};

    #[test]
    fn test_summarize_knockout() {
        let red = Combatant::new(1, 100, 0, 1000);
        let blue = Combatant::new(2, 100, 0, 1000);
        let model = ScriptedModel::new(vec![ScriptedModel::hit(1000, Corner::Red, 100)]);
        let outcome = BattleResolver::new(BattleConfig::default(), model).resolve_duel(&red, &blue);
        let ratings = RatingEngine::default().change(1000, 1000, outcome.winner());

        let summary = summarize(&outcome, ratings);
        assert_eq!(summary.winner.as_deref(), Some("robot #1"));
        assert_eq!(summary.end_reason, "Defeat");
        assert_eq!(summary.red_rating_delta, 16);
        assert_eq!(summary.blue_rating_delta, -16);
        assert_eq!(summary.participants.len(), 2);
        assert!(summary.participants[1].destroyed);
    }

    #[test]
    fn test_summarize_timeout_draw() {
        let red = Combatant::new(1, 100, 0, 1000);
        let blue = Combatant::new(2, 100, 0, 1000);
        let outcome = BattleResolver::new(BattleConfig::default(), ScriptedModel::default()).resolve_duel(&red, &blue);
        let summary = summarize(&outcome, RatingChange { red: 0, blue: 0 });
        assert_eq!(summary.winner, None);
        assert_eq!(summary.end_reason, "Timeout");
        assert_eq!(summary.duration_ms, 300_000);
    }
}
