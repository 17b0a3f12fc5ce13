//! Cycle runner - resolve a batch of battles and price every result
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: `run_cycle` - orchestration
//! - Level 2: `execute_battles` (sequential or rayon), `CycleReport::summary`
//! - Level 3: `resolve_battle` - one battle from request to report
//! - Level 4: request and report types
//!
//! Each battle reads only its own request and writes only its own report,
//! so a failed battle never touches its siblings.

use arena_core::{
    ArenaError, AttributeModel, BattleFormat, BattleOutcome, BattleResolver, Combatant, CombatantId,
    Competitor, Corner, RatingDelta, RatingEngine, TagTeamRecord, Team, TeamRecord,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LeagueConfig;
use crate::economy::LeagueTier;
use crate::rewards::{Audience, RewardCalculator, RewardResult, SideContext, StableContext};

// ============================================================================
// Level 4 - Requests and reports
// ============================================================================

/// Who fights whom
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum Matchup {
    Duel { red: Combatant, blue: Combatant },
    TagTeam { red: TeamRecord, blue: TeamRecord },
}

/// One battle scheduled for this cycle
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleRequest {
    pub id: u64,
    /// League tier name as stored; validated per battle
    pub tier: String,
    pub matchup: Matchup,
    #[serde(default)]
    pub red_stable: StableContext,
    #[serde(default)]
    pub blue_stable: StableContext,
}

/// League points owed to a competitor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingDelta {
    pub competitor: Competitor,
    pub league_points: i32,
}

/// Lifetime tag-team counters owed to one combatant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecordDelta {
    pub combatant: CombatantId,
    pub record: TagTeamRecord,
}

impl TagRecordDelta {
    pub fn apply_to(&self, combatant: &mut Combatant) {
        combatant.tag_record = combatant.tag_record.combine(&self.record);
    }
}

/// Everything produced by one fought battle. Deltas only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub battle_id: u64,
    pub tier: LeagueTier,
    pub outcome: BattleOutcome,
    pub ratings: Vec<RatingDelta>,
    /// Red first, then blue
    pub rewards: Vec<RewardResult>,
    pub standings: Vec<StandingDelta>,
    /// Empty for 1v1 battles
    #[serde(default)]
    pub tag_records: Vec<TagRecordDelta>,
}

impl BattleReport {
    /// Rating change of a corner's standing: the fighter's delta in a 1v1,
    /// the sum of both members' deltas for a team's combined rating
    pub fn rating_change(&self, corner: Corner) -> i32 {
        self.outcome
            .participants_in(corner)
            .filter_map(|p| self.ratings.iter().find(|r| r.combatant == p.combatant))
            .map(|r| r.delta)
            .sum()
    }
}

/// A battle that was not fought
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedBattle {
    pub battle_id: u64,
    /// Team members below the readiness bar
    pub unready: Vec<CombatantId>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Fought(BattleReport),
    Skipped(SkippedBattle),
}

/// A battle that could not be resolved
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("battle {battle_id}: {error}")]
pub struct BattleFailure {
    pub battle_id: u64,
    #[source]
    pub error: ArenaError,
}

pub type BattleResult = Result<Resolution, BattleFailure>;

/// Per-battle results, in request order
#[derive(Clone, Debug, Default)]
pub struct CycleReport {
    pub results: Vec<BattleResult>,
}

/// Counts over a cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub total: usize,
    pub fought: usize,
    pub skipped: usize,
    pub failed: usize,
    pub draws: usize,
}

impl CycleReport {
    pub fn summary(&self) -> CycleSummary {
        let mut summary = CycleSummary {
            total: self.results.len(),
            ..Default::default()
        };
        for result in &self.results {
            match result {
                Ok(Resolution::Fought(report)) => {
                    summary.fought += 1;
                    if report.outcome.is_draw() {
                        summary.draws += 1;
                    }
                }
                Ok(Resolution::Skipped(_)) => summary.skipped += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn reports(&self) -> impl Iterator<Item = &BattleReport> {
        self.results.iter().filter_map(|r| match r {
            Ok(Resolution::Fought(report)) => Some(report),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &BattleFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }
}

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

/// Resolve every battle of a cycle.
///
/// Battle `i` uses combat seed `base_seed + i`, so results do not depend on
/// whether the batch ran in parallel.
pub fn run_cycle(requests: &[BattleRequest], config: &LeagueConfig) -> CycleReport {
    let context = CycleContext::new(config);
    let results = execute_battles(requests, &context, config.parallel);

    let report = CycleReport { results };
    let summary = report.summary();
    tracing::info!(
        "Cycle complete: {} battles, {} fought, {} skipped, {} failed, {} draws",
        summary.total,
        summary.fought,
        summary.skipped,
        summary.failed,
        summary.draws
    );
    for failure in report.failures() {
        tracing::warn!("{}", failure);
    }
    report
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

/// Shared read-only state for a cycle
struct CycleContext<'a> {
    config: &'a LeagueConfig,
    ratings: RatingEngine,
    rewards: RewardCalculator,
    base_seed: u64,
}

impl<'a> CycleContext<'a> {
    fn new(config: &'a LeagueConfig) -> Self {
        Self {
            config,
            ratings: RatingEngine::new(config.k_factor),
            rewards: RewardCalculator::new(config.economy.clone()),
            base_seed: config.seed.unwrap_or(42),
        }
    }
}

fn execute_battles(requests: &[BattleRequest], context: &CycleContext, parallel: bool) -> Vec<BattleResult> {
    if parallel {
        requests
            .par_iter()
            .enumerate()
            .map(|(index, request)| resolve_battle(request, context, index))
            .collect()
    } else {
        requests
            .iter()
            .enumerate()
            .map(|(index, request)| resolve_battle(request, context, index))
            .collect()
    }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// One battle from request to report
fn resolve_battle(request: &BattleRequest, context: &CycleContext, index: usize) -> BattleResult {
    let fail = |error: ArenaError| BattleFailure {
        battle_id: request.id,
        error,
    };

    let tier: LeagueTier = request.tier.parse().map_err(fail)?;
    context.rewards.table().row(tier).map_err(fail)?;

    let seed = context.base_seed.wrapping_add(index as u64);
    let mut resolver = BattleResolver::new(context.config.battle, AttributeModel::seeded(seed));

    let (outcome, ratings, audiences) = match &request.matchup {
        Matchup::Duel { red, blue } => {
            let outcome = resolver.resolve_duel(red, blue);
            let ratings = context.ratings.participant_deltas(&outcome, red.elo, blue.elo);
            (outcome, ratings, [Audience::of([red]), Audience::of([blue])])
        }
        Matchup::TagTeam { red, blue } => {
            let red = Team::try_from(red.clone()).map_err(fail)?;
            let blue = Team::try_from(blue.clone()).map_err(fail)?;

            let unready: Vec<CombatantId> = red
                .unready_members()
                .into_iter()
                .chain(blue.unready_members())
                .collect();
            if !unready.is_empty() {
                tracing::debug!("Battle {}: skipped, {} members not ready", request.id, unready.len());
                return Ok(Resolution::Skipped(SkippedBattle {
                    battle_id: request.id,
                    unready,
                }));
            }

            let outcome = resolver.resolve_tag_team(&red, &blue);
            let ratings = context
                .ratings
                .participant_deltas(&outcome, red.combined_elo(), blue.combined_elo());
            (outcome, ratings, [Audience::of(red.members()), Audience::of(blue.members())])
        }
    };

    let sides = [
        (Corner::Red, request.red_stable, audiences[0]),
        (Corner::Blue, request.blue_stable, audiences[1]),
    ];
    let rewards = sides
        .iter()
        .map(|&(corner, stable, audience)| {
            let side = SideContext { tier, stable, audience };
            context.rewards.side_rewards(&outcome, corner, &side)
        })
        .collect::<arena_core::Result<Vec<_>>>()
        .map_err(fail)?;

    let standings = rewards
        .iter()
        .map(|reward| StandingDelta {
            competitor: outcome.competitor(reward.corner),
            league_points: reward.league_points,
        })
        .collect();

    let tag_records = match outcome.format() {
        BattleFormat::TagTeam => outcome
            .participants()
            .iter()
            .map(|p| TagRecordDelta {
                combatant: p.combatant,
                record: p.tag_record_delta(outcome.score_for(p.corner)),
            })
            .collect(),
        BattleFormat::Duel => Vec::new(),
    };

    tracing::debug!(
        "Battle {}: {:?} {:?} after {}ms",
        request.id,
        outcome.format(),
        outcome.winner(),
        outcome.duration_ms()
    );

    Ok(Resolution::Fought(BattleReport {
        battle_id: request.id,
        tier,
        outcome,
        ratings,
        rewards,
        standings,
        tag_records,
    }))
}
