//! Error types for battle resolution and league bookkeeping

use thiserror::Error;

use crate::combatant::CombatantId;
use crate::team::TeamId;

/// Result type alias using [`ArenaError`].
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Everything that can go wrong while resolving a battle or pricing its rewards.
///
/// None of these abort a batch: the cycle runner reports them per battle.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// A vital was outside its legal range on input. Clamped, never fatal.
    #[error("combatant {combatant}: {attribute} = {value} outside [{min}, {max}]")]
    InvalidAttributeRange {
        /// Offending combatant.
        combatant: CombatantId,
        /// Field name.
        attribute: &'static str,
        /// Value as supplied.
        value: i64,
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },

    /// League tier missing from the economy table.
    #[error("unknown league tier: {0}")]
    UnknownLeagueTier(String),

    /// Team without exactly two distinct members.
    #[error("malformed team {team}: {reason}")]
    MalformedTeam {
        /// Offending team.
        team: TeamId,
        /// What is wrong with it.
        reason: String,
    },

    /// Facility level outside its table.
    #[error("invalid {facility} level: {level}")]
    InvalidFacilityLevel {
        /// Facility name.
        facility: &'static str,
        /// Level as supplied.
        level: u32,
    },

    /// Attribute cannot be upgraded any further.
    #[error("attribute already at maximum level {level}")]
    AttributeAtMaximum {
        /// Current level.
        level: u32,
    },
}
