//! Arena League - economy, standings and league cycles
//!
//! Builds on `arena-core` to run a whole league cycle:
//! - Economy tier table and reward calculator
//! - League points and time-in-tier bookkeeping
//! - Promotion and demotion between tiers
//! - Parallel batch resolution of a cycle's battles
//!
//! ## Architecture
//!
//! - Level 1: `cycle::run_cycle`, `LeagueRebalancer::rebalance`
//! - Level 2: `RewardCalculator`, `Standings`
//! - Level 3/4: economy tables and configuration

pub mod config;
pub mod economy;
pub mod rewards;
pub mod standing;
pub mod rebalance;
pub mod cycle;

pub use config::LeagueConfig;
pub use economy::{EconomyTierTable, LeagueTier, PrestigeBracket, TierRow};
pub use rewards::{
    league_points, Audience, CombatantReward, FacilityLevels, PassiveIncome, RewardCalculator,
    RewardResult, SideContext, StableContext,
};
pub use standing::{LeagueStanding, Standings};
pub use rebalance::{LeagueRebalancer, RebalanceConfig, RebalanceSummary, TierChange, TierRebalance};
pub use cycle::{
    run_cycle, BattleFailure, BattleReport, BattleRequest, BattleResult, CycleReport, CycleSummary,
    Matchup, Resolution, SkippedBattle, StandingDelta, TagRecordDelta,
};
