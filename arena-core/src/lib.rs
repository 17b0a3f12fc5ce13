//! Arena Core - battle resolution and ratings
//!
//! This crate provides the per-battle logic of the robot arena:
//! - Combatant and team data model
//! - Tag-out state machine for two-member teams
//! - Combat models (attribute-driven and scripted)
//! - Battle resolver with the timeout rule
//! - ELO rating engine for duels and tag teams

pub mod error;
pub mod math;
pub mod combatant;
pub mod team;
pub mod tag;
pub mod combat;
pub mod battle;
pub mod rating;

// Re-exports for convenient access
pub use error::{ArenaError, Result};
pub use math::round_half_up;
pub use combatant::{CareerStats, CombatAttributes, Combatant, CombatantId, Stance, TagTeamRecord};
pub use team::{Team, TeamId, TeamRecord};
pub use tag::{tag_out_reason, yield_hp, DownReason, Lineup, MemberState, Slot, TagOutStateMachine, TagTransition};
pub use combat::{AttributeModel, CombatModel, Corner, ScriptedModel, Strike, TickWindow, TimedStrike};
pub use battle::{
    decide, BattleConfig, BattleFormat, BattleOutcome, BattleResolver, Competitor, Decision,
    EndReason, ParticipantResult, ParticipantRole, TagEvent,
};
pub use rating::{MatchScore, RatingChange, RatingDelta, RatingEngine, DEFAULT_K_FACTOR};
