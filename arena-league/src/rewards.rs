//! Reward calculator - currency, prestige, fame and repairs per battle
//!
//! Level 2 - Phase-level implementation

use arena_core::{
    round_half_up, BattleFormat, BattleOutcome, Combatant, CombatantId, Corner, MatchScore,
    ParticipantResult, Result,
};
use serde::{Deserialize, Serialize};

use crate::economy::{EconomyTierTable, LeagueTier};

/// Share of the tier midpoint paid to every participant
pub const PARTICIPATION_RATE: f64 = 0.30;
/// Tag-team currency relative to the same 1v1 result
pub const TAG_TEAM_REWARD_MULTIPLIER: u32 = 2;
/// Tag-team prestige relative to the tier's 1v1 prestige
pub const TAG_TEAM_PRESTIGE_MULTIPLIER: f64 = 1.6;

/// League points for a win, draw and loss
pub fn league_points(score: MatchScore) -> i32 {
    match score {
        MatchScore::Win => 3,
        MatchScore::Draw => 1,
        MatchScore::Loss => -1,
    }
}

/// Facility levels of the stable that owns a competitor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityLevels {
    pub repair_bay: u32,
    pub income_generator: u32,
    pub streaming_studio: u32,
    pub training_facility: u32,
}

/// Economic snapshot of a stable
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StableContext {
    pub prestige: u32,
    pub facilities: FacilityLevels,
}

impl StableContext {
    pub fn new(prestige: u32) -> Self {
        Self {
            prestige,
            facilities: FacilityLevels::default(),
        }
    }

    pub fn with_facilities(mut self, facilities: FacilityLevels) -> Self {
        self.facilities = facilities;
        self
    }
}

/// Viewership inputs for streaming revenue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    pub battles: u32,
    pub fame: u32,
}

impl Audience {
    /// Highest battle count and highest fame among `members`
    pub fn of<'a>(members: impl IntoIterator<Item = &'a Combatant>) -> Self {
        members.into_iter().fold(Audience::default(), |acc, m| Audience {
            battles: acc.battles.max(m.total_battles()),
            fame: acc.fame.max(m.career.fame),
        })
    }
}

/// Per-combatant part of a reward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantReward {
    pub combatant: CombatantId,
    pub fame: u32,
    pub repair_cost: u32,
}

/// Everything one side earns or owes for one battle.
///
/// All amounts are deltas. Only `league_points` can be negative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardResult {
    pub corner: Corner,
    pub score: MatchScore,
    pub currency: u32,
    pub prestige: u32,
    pub streaming_revenue: u32,
    pub league_points: i32,
    pub combatants: Vec<CombatantReward>,
}

impl RewardResult {
    pub fn total_fame(&self) -> u32 {
        self.combatants.iter().map(|c| c.fame).sum()
    }

    pub fn total_repair_cost(&self) -> u32 {
        self.combatants.iter().map(|c| c.repair_cost).sum()
    }

    /// Currency plus streaming minus repairs
    pub fn net_credits(&self) -> i64 {
        self.currency as i64 + self.streaming_revenue as i64 - self.total_repair_cost() as i64
    }
}

/// Side-level inputs to [`RewardCalculator::side_rewards`]
#[derive(Clone, Copy, Debug)]
pub struct SideContext {
    pub tier: LeagueTier,
    pub stable: StableContext,
    pub audience: Audience,
}

/// Merchandising-only passive income for one cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveIncome {
    pub merchandising: u32,
    pub total: u32,
}

/// Turns battle outcomes into reward deltas using an [`EconomyTierTable`]
#[derive(Clone, Debug, Default)]
pub struct RewardCalculator {
    table: EconomyTierTable,
}

impl RewardCalculator {
    pub fn new(table: EconomyTierTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &EconomyTierTable {
        &self.table
    }

    /// `round(0.30 * midpoint)` for the tier
    pub fn participation_reward(&self, tier: LeagueTier) -> Result<u32> {
        let midpoint = self.table.row(tier)?.midpoint();
        Ok(round_half_up(PARTICIPATION_RATE * midpoint as f64) as u32)
    }

    /// Winnings before the prestige multiplier
    pub fn base_winnings(&self, tier: LeagueTier, score: MatchScore, format: BattleFormat) -> Result<u32> {
        let participation = self.participation_reward(tier)?;
        let standard = match score {
            MatchScore::Win => self.table.row(tier)?.midpoint() + participation,
            MatchScore::Draw | MatchScore::Loss => participation,
        };
        Ok(match format {
            BattleFormat::Duel => standard,
            BattleFormat::TagTeam => standard * TAG_TEAM_REWARD_MULTIPLIER,
        })
    }

    /// Final currency: `round(base_winnings * prestige_multiplier)`
    pub fn currency(
        &self,
        tier: LeagueTier,
        score: MatchScore,
        format: BattleFormat,
        prestige: u32,
    ) -> Result<u32> {
        let winnings = self.base_winnings(tier, score, format)?;
        let multiplier = self.table.prestige_multiplier(prestige);
        Ok(round_half_up(winnings as f64 * multiplier) as u32)
    }

    /// Prestige awarded, wins only
    pub fn prestige_award(&self, tier: LeagueTier, score: MatchScore, format: BattleFormat) -> Result<u32> {
        let standard = self.table.row(tier)?.prestige;
        if score != MatchScore::Win {
            return Ok(0);
        }
        Ok(match format {
            BattleFormat::Duel => standard,
            BattleFormat::TagTeam => round_half_up(standard as f64 * TAG_TEAM_PRESTIGE_MULTIPLIER) as u32,
        })
    }

    /// Fame for one combatant, scaled by its damage and time on the field.
    /// Zero on a draw.
    pub fn fame(
        &self,
        tier: LeagueTier,
        score: MatchScore,
        damage_dealt: i32,
        survival_ms: u64,
        duration_ms: u64,
    ) -> Result<u32> {
        let base = self.table.row(tier)?.fame;
        let outcome_mult = match score {
            MatchScore::Win => 1.2,
            MatchScore::Loss => 0.8,
            MatchScore::Draw => return Ok(0),
        };
        let damage_mult = (damage_dealt.max(0) as f64 / 100.0).clamp(0.5, 1.5);
        let survival_ratio = if duration_ms == 0 {
            1.0
        } else {
            survival_ms as f64 / duration_ms as f64
        };
        let survival_mult = survival_ratio.clamp(0.5, 1.5);
        Ok(round_half_up(base as f64 * damage_mult * survival_mult * outcome_mult).max(0) as u32)
    }

    /// `damage * 50`, doubled if destroyed, then discounted by `discount_percent`
    pub fn repair_cost(&self, damage_taken: i32, destroyed: bool, discount_percent: u32) -> u32 {
        let multiplier = if destroyed { 2 } else { 1 };
        let base = damage_taken.max(0) as i64 * self.table.repair_cost_per_hp as i64 * multiplier;
        let keep = 100 - discount_percent.min(100) as i64;
        // round half up on a non-negative integer ratio
        ((base * keep + 50) / 100).max(0) as u32
    }

    /// Repair cost for a participant given its stable's repair bay level
    pub fn participant_repair_cost(&self, participant: &ParticipantResult, repair_bay_level: u32) -> u32 {
        self.repair_cost(
            participant.damage_taken,
            participant.destroyed,
            self.table.repair_discount_percent(repair_bay_level),
        )
    }

    /// Per-battle streaming revenue
    pub fn streaming_revenue(&self, audience: Audience, studio_level: u32) -> u32 {
        let revenue = self.table.streaming_base as f64
            * (1.0 + audience.battles as f64 / 1000.0)
            * (1.0 + audience.fame as f64 / 5000.0)
            * (1.0 + studio_level as f64 * 0.1);
        revenue.floor() as u32
    }

    /// Merchandising income for one cycle. Streaming is never part of it.
    pub fn passive_income(&self, income_generator_level: u32, prestige: u32) -> Result<PassiveIncome> {
        let rate = self.table.merchandising_rate(income_generator_level)?;
        let merchandising = round_half_up(rate as f64 * (1.0 + prestige as f64 / 10_000.0)) as u32;
        Ok(PassiveIncome {
            merchandising,
            total: merchandising,
        })
    }

    /// Full reward for the side standing in `corner`
    pub fn side_rewards(&self, outcome: &BattleOutcome, corner: Corner, side: &SideContext) -> Result<RewardResult> {
        let score = outcome.score_for(corner);
        let format = outcome.format();

        let combatants = outcome
            .participants_in(corner)
            .map(|p| -> Result<CombatantReward> {
                Ok(CombatantReward {
                    combatant: p.combatant,
                    fame: self.fame(side.tier, score, p.damage_dealt, p.survival_ms, outcome.duration_ms())?,
                    repair_cost: self.participant_repair_cost(p, side.stable.facilities.repair_bay),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RewardResult {
            corner,
            score,
            currency: self.currency(side.tier, score, format, side.stable.prestige)?,
            prestige: self.prestige_award(side.tier, score, format)?,
            streaming_revenue: self.streaming_revenue(side.audience, side.stable.facilities.streaming_studio),
            league_points: league_points(score),
            combatants,
        })
    }
}
