//! League rebalancing - percentile promotion and demotion per tier
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: `LeagueRebalancer::rebalance` - every tier of every format
//! - Level 2: `LeagueRebalancer::rebalance_tier` - one tier
//! - Level 3: eligibility filter, ranking
//! - Level 4: configuration and instructions

use std::cmp::Ordering;

use arena_core::{BattleFormat, Competitor};
use serde::{Deserialize, Serialize};

use crate::economy::LeagueTier;
use crate::standing::LeagueStanding;

// ============================================================================
// Level 4 - Configuration and instructions
// ============================================================================

/// Rebalancing thresholds
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// Cycles a competitor must have spent in its tier to be ranked
    pub min_cycles_in_tier: u32,
    /// Tiers with fewer eligible competitors are left alone
    pub min_population: usize,
    pub promotion_fraction: f64,
    pub demotion_fraction: f64,
    /// League points required on top of ranking to be promoted
    pub min_promotion_points: u32,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            min_cycles_in_tier: 5,
            min_population: 10,
            promotion_fraction: 0.10,
            demotion_fraction: 0.10,
            min_promotion_points: 0,
        }
    }
}

impl RebalanceConfig {
    /// Tag-team leagues also require 25 league points to go up
    pub fn tag_team() -> Self {
        Self::default().with_min_promotion_points(25)
    }

    pub fn with_min_promotion_points(mut self, points: u32) -> Self {
        self.min_promotion_points = points;
        self
    }
}

/// Instruction to move a competitor one tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChange {
    pub competitor: Competitor,
    pub from: LeagueTier,
    pub to: LeagueTier,
}

impl TierChange {
    pub fn is_promotion(&self) -> bool {
        self.to > self.from
    }
}

/// What happened to one tier of one format
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierRebalance {
    pub format: BattleFormat,
    pub tier: LeagueTier,
    pub eligible: usize,
    /// Too few eligible competitors: nothing moved
    pub skipped: bool,
    pub promoted: Vec<TierChange>,
    pub demoted: Vec<TierChange>,
}

/// Result of a full pass
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RebalanceSummary {
    pub tiers: Vec<TierRebalance>,
}

impl RebalanceSummary {
    /// Every tier change, promotions before demotions within a tier
    pub fn changes(&self) -> impl Iterator<Item = &TierChange> {
        self.tiers
            .iter()
            .flat_map(|t| t.promoted.iter().chain(t.demoted.iter()))
    }

    pub fn total_promoted(&self) -> usize {
        self.tiers.iter().map(|t| t.promoted.len()).sum()
    }

    pub fn total_demoted(&self) -> usize {
        self.tiers.iter().map(|t| t.demoted.len()).sum()
    }
}

// ============================================================================
// Level 1/2 - Rebalancer
// ============================================================================

/// Percentile-based promotion and demotion
#[derive(Clone, Copy, Debug, Default)]
pub struct LeagueRebalancer {
    config: RebalanceConfig,
}

impl LeagueRebalancer {
    pub fn new(config: RebalanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    /// Rebalance every tier of every format present in `standings`.
    ///
    /// All decisions come from the snapshot as given. Apply the returned
    /// changes only after the whole pass.
    pub fn rebalance(&self, standings: &[LeagueStanding]) -> RebalanceSummary {
        let mut tiers = Vec::new();
        for format in [BattleFormat::Duel, BattleFormat::TagTeam] {
            if !standings.iter().any(|s| s.format() == format) {
                continue;
            }
            for tier in LeagueTier::ALL {
                tiers.push(self.rebalance_tier(format, tier, standings));
            }
        }
        RebalanceSummary { tiers }
    }

    /// Rebalance one tier of one format
    pub fn rebalance_tier(
        &self,
        format: BattleFormat,
        tier: LeagueTier,
        standings: &[LeagueStanding],
    ) -> TierRebalance {
        let mut ranked = eligible(&self.config, format, tier, standings);
        let eligible = ranked.len();

        if eligible < self.config.min_population {
            tracing::info!(
                "{:?} {}: {} eligible, below minimum of {}, skipped",
                format,
                tier,
                eligible,
                self.config.min_population
            );
            return TierRebalance {
                format,
                tier,
                eligible,
                skipped: true,
                promoted: Vec::new(),
                demoted: Vec::new(),
            };
        }

        ranked.sort_by(|a, b| rank_descending(a, b));

        let promote_count = fraction_of(eligible, self.config.promotion_fraction);
        let demote_count = fraction_of(eligible, self.config.demotion_fraction);

        let promoted: Vec<TierChange> = match tier.promoted() {
            Some(to) => ranked
                .iter()
                .filter(|s| s.league_points >= self.config.min_promotion_points)
                .take(promote_count)
                .map(|s| TierChange {
                    competitor: s.competitor,
                    from: tier,
                    to,
                })
                .collect(),
            None => Vec::new(),
        };

        let demoted: Vec<TierChange> = match tier.demoted() {
            Some(to) => ranked
                .iter()
                .rev()
                .filter(|s| !promoted.iter().any(|p| p.competitor == s.competitor))
                .take(demote_count)
                .map(|s| TierChange {
                    competitor: s.competitor,
                    from: tier,
                    to,
                })
                .collect(),
            None => Vec::new(),
        };

        tracing::info!(
            "{:?} {}: {} eligible, {} promoted, {} demoted",
            format,
            tier,
            eligible,
            promoted.len(),
            demoted.len()
        );

        TierRebalance {
            format,
            tier,
            eligible,
            skipped: false,
            promoted,
            demoted,
        }
    }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

fn eligible<'a>(
    config: &RebalanceConfig,
    format: BattleFormat,
    tier: LeagueTier,
    standings: &'a [LeagueStanding],
) -> Vec<&'a LeagueStanding> {
    standings
        .iter()
        .filter(|s| s.format() == format && s.tier == tier)
        .filter(|s| s.cycles_in_tier >= config.min_cycles_in_tier)
        .collect()
}

/// Best first: points, then ELO, then competitor id for a total order
fn rank_descending(a: &LeagueStanding, b: &LeagueStanding) -> Ordering {
    b.league_points
        .cmp(&a.league_points)
        .then_with(|| b.elo.cmp(&a.elo))
        .then_with(|| a.competitor.cmp(&b.competitor))
}

/// `floor(fraction * count)`
fn fraction_of(count: usize, fraction: f64) -> usize {
    (count as f64 * fraction + 1e-9).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::{CombatantId, TeamId};

    fn robots(count: u32, tier: LeagueTier) -> Vec<LeagueStanding> {
        (0..count)
            .map(|i| {
                LeagueStanding::new(Competitor::Robot(CombatantId(i)), tier, 1000)
                    .with_points(i)
                    .with_cycles(5)
            })
            .collect()
    }

    #[test]
    fn test_fraction_of() {
        assert_eq!(fraction_of(25, 0.10), 2);
        assert_eq!(fraction_of(10, 0.10), 1);
        assert_eq!(fraction_of(30, 0.10), 3);
        assert_eq!(fraction_of(9, 0.10), 0);
    }

    #[test]
    fn test_skip_small_tier() {
        let rebalancer = LeagueRebalancer::default();
        let result = rebalancer.rebalance_tier(BattleFormat::Duel, LeagueTier::Silver, &robots(9, LeagueTier::Silver));
        assert!(result.skipped);
        assert_eq!(result.eligible, 9);
        assert!(result.promoted.is_empty());
        assert!(result.demoted.is_empty());
    }

    #[test]
    fn test_promote_and_demote_ten_percent() {
        let rebalancer = LeagueRebalancer::default();
        let result = rebalancer.rebalance_tier(BattleFormat::Duel, LeagueTier::Silver, &robots(25, LeagueTier::Silver));
        assert!(!result.skipped);
        let up: Vec<_> = result.promoted.iter().map(|c| c.competitor).collect();
        let down: Vec<_> = result.demoted.iter().map(|c| c.competitor).collect();
        assert_eq!(up, vec![Competitor::Robot(CombatantId(24)), Competitor::Robot(CombatantId(23))]);
        assert_eq!(down, vec![Competitor::Robot(CombatantId(0)), Competitor::Robot(CombatantId(1))]);
        assert!(result.promoted.iter().all(|c| c.to == LeagueTier::Gold));
        assert!(result.demoted.iter().all(|c| c.to == LeagueTier::Bronze));
    }

    #[test]
    fn test_new_arrivals_not_eligible() {
        let mut standings = robots(12, LeagueTier::Gold);
        standings.iter_mut().take(3).for_each(|s| s.cycles_in_tier = 4);
        let result = LeagueRebalancer::default().rebalance_tier(BattleFormat::Duel, LeagueTier::Gold, &standings);
        assert!(result.skipped);
        assert_eq!(result.eligible, 9);
    }

    #[test]
    fn test_champion_never_promotes_bronze_never_demotes() {
        let rebalancer = LeagueRebalancer::default();
        let top = rebalancer.rebalance_tier(BattleFormat::Duel, LeagueTier::Champion, &robots(20, LeagueTier::Champion));
        assert!(top.promoted.is_empty());
        assert_eq!(top.demoted.len(), 2);

        let bottom = rebalancer.rebalance_tier(BattleFormat::Duel, LeagueTier::Bronze, &robots(20, LeagueTier::Bronze));
        assert_eq!(bottom.promoted.len(), 2);
        assert!(bottom.demoted.is_empty());
    }

    #[test]
    fn test_ties_broken_by_elo() {
        let mut standings = robots(10, LeagueTier::Silver);
        for s in standings.iter_mut() {
            s.league_points = 10;
        }
        standings[3].elo = 1500;
        standings[7].elo = 500;
        let result = LeagueRebalancer::default().rebalance_tier(BattleFormat::Duel, LeagueTier::Silver, &standings);
        assert_eq!(result.promoted[0].competitor, Competitor::Robot(CombatantId(3)));
        assert_eq!(result.demoted[0].competitor, Competitor::Robot(CombatantId(7)));
    }

    #[test]
    fn test_tag_team_needs_points_to_promote() {
        let standings: Vec<LeagueStanding> = (0..10)
            .map(|i| {
                LeagueStanding::new(Competitor::Team(TeamId(i)), LeagueTier::Bronze, 2000)
                    .with_points(i * 2)
                    .with_cycles(6)
            })
            .collect();
        let rebalancer = LeagueRebalancer::new(RebalanceConfig::tag_team());
        let result = rebalancer.rebalance_tier(BattleFormat::TagTeam, LeagueTier::Bronze, &standings);
        assert!(!result.skipped);
        assert!(result.promoted.is_empty());
    }

    #[test]
    fn test_formats_ranked_separately() {
        let mut standings = robots(10, LeagueTier::Silver);
        standings.push(
            LeagueStanding::new(Competitor::Team(TeamId(1)), LeagueTier::Silver, 2000)
                .with_points(99)
                .with_cycles(9),
        );
        let summary = LeagueRebalancer::default().rebalance(&standings);
        assert_eq!(summary.tiers.len(), 12);
        let duel_silver = summary
            .tiers
            .iter()
            .find(|t| t.format == BattleFormat::Duel && t.tier == LeagueTier::Silver)
            .unwrap();
        assert_eq!(duel_silver.eligible, 10);
        assert_eq!(duel_silver.promoted[0].competitor, Competitor::Robot(CombatantId(9)));
        assert_eq!(summary.total_promoted(), 1);
        assert_eq!(summary.changes().count(), 2);
    }
}
