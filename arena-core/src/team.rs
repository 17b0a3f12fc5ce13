//! Team - two combatants fighting as one tag-team entry
//!
//! Level 4 - Data model

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, CombatantId};
use crate::error::{ArenaError, Result};

/// Minimum HP, in percent of max, for a member to be sent into a team battle
pub const READY_HP_PERCENT: i64 = 75;

/// Stable identifier of a team
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// A tag team: always exactly one `active` and one `reserve`.
///
/// Construction goes through [`Team::new`] (or deserialization, which calls
/// it), so a `Team` value never has a missing or duplicated member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TeamRecord", into = "TeamRecord")]
pub struct Team {
    id: TeamId,
    active: Combatant,
    reserve: Combatant,
}

/// Wire shape of a team, as handed over by the persistence layer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub active: Option<Combatant>,
    pub reserve: Option<Combatant>,
}

impl Team {
    /// Build a team, rejecting a combatant paired with itself
    pub fn new(id: TeamId, active: Combatant, reserve: Combatant) -> Result<Self> {
        if active.id == reserve.id {
            return Err(ArenaError::MalformedTeam {
                team: id,
                reason: format!("{} cannot be both active and reserve", active.id),
            });
        }
        Ok(Self { id, active, reserve })
    }

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn active(&self) -> &Combatant {
        &self.active
    }

    pub fn reserve(&self) -> &Combatant {
        &self.reserve
    }

    /// Both members, active first
    pub fn members(&self) -> [&Combatant; 2] {
        [&self.active, &self.reserve]
    }

    /// Sum of both members' ratings. Recomputed on every call.
    pub fn combined_elo(&self) -> i32 {
        self.active.elo + self.reserve.elo
    }

    /// Members not fit to start a team battle.
    ///
    /// A member is fit with HP at or above 75% of max and strictly above
    /// its own yield threshold.
    pub fn unready_members(&self) -> Vec<CombatantId> {
        self.members()
            .into_iter()
            .filter(|member| !is_battle_ready(member))
            .map(|member| member.id)
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.unready_members().is_empty()
    }
}

fn is_battle_ready(member: &Combatant) -> bool {
    let hp = member.current_hp as i64;
    let max = member.max_hp as i64;
    let yield_hp = member.yield_threshold as i64 * max / 100;
    hp * 100 >= max * READY_HP_PERCENT && hp > yield_hp
}

impl TryFrom<TeamRecord> for Team {
    type Error = ArenaError;

    fn try_from(record: TeamRecord) -> Result<Self> {
        let missing = |role: &str| ArenaError::MalformedTeam {
            team: record.id,
            reason: format!("missing {} member", role),
        };
        let active = record.active.ok_or_else(|| missing("active"))?;
        let reserve = record.reserve.ok_or_else(|| missing("reserve"))?;
        Team::new(record.id, active, reserve)
    }
}

impl From<Team> for TeamRecord {
    fn from(team: Team) -> Self {
        TeamRecord {
            id: team.id,
            active: Some(team.active),
            reserve: Some(team.reserve),
        }
    }
}
