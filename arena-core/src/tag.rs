//! Tag-out state machine for two-member teams
//!
//! Level 3 - Steps
//!
//! The machine tracks the whole team's lineup as one enum, so member
//! states are derived rather than stored and two members can never be
//! `Active` at once.

use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;

/// Why a member left the fight
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownReason {
    /// HP reached 0 (repairs cost double)
    Destroyed,
    /// HP fell to the yield threshold
    Yielded,
}

/// State of a single team member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberState {
    Active,
    Reserve,
    Down(DownReason),
}

/// Position within the team's lineup
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Started the battle active
    Starter,
    /// Started the battle in reserve
    Substitute,
}

impl Slot {
    pub const BOTH: [Slot; 2] = [Slot::Starter, Slot::Substitute];

    pub fn index(self) -> usize {
        match self {
            Slot::Starter => 0,
            Slot::Substitute => 1,
        }
    }
}

/// The team's lineup over the course of a battle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lineup {
    /// Starter active, substitute in reserve
    #[default]
    Starting,
    /// Starter down, substitute active
    Substituted { starter: DownReason },
    /// Both down: the team has lost
    Defeated {
        starter: DownReason,
        substitute: DownReason,
    },
}

impl Lineup {
    /// State of the member in `slot`
    pub fn state_of(&self, slot: Slot) -> MemberState {
        match (*self, slot) {
            (Lineup::Starting, Slot::Starter) => MemberState::Active,
            (Lineup::Starting, Slot::Substitute) => MemberState::Reserve,
            (Lineup::Substituted { starter }, Slot::Starter) => MemberState::Down(starter),
            (Lineup::Substituted { .. }, Slot::Substitute) => MemberState::Active,
            (Lineup::Defeated { starter, .. }, Slot::Starter) => MemberState::Down(starter),
            (Lineup::Defeated { substitute, .. }, Slot::Substitute) => {
                MemberState::Down(substitute)
            }
        }
    }

    /// The member currently fighting, if any
    pub fn fielded(&self) -> Option<Slot> {
        match self {
            Lineup::Starting => Some(Slot::Starter),
            Lineup::Substituted { .. } => Some(Slot::Substitute),
            Lineup::Defeated { .. } => None,
        }
    }

    pub fn is_defeated(&self) -> bool {
        matches!(self, Lineup::Defeated { .. })
    }
}

/// What a tag-out led to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagTransition {
    /// Active went down, reserve came in at full HP and shield
    TaggedIn { outgoing: DownReason },
    /// Active went down with nobody left to tag in
    TeamDefeated { outgoing: DownReason },
}

/// HP at or below which a combatant yields: `floor(threshold% of max_hp)`
pub fn yield_hp(max_hp: i32, yield_threshold: u8) -> i32 {
    (yield_threshold as i64 * max_hp.max(0) as i64 / 100) as i32
}

/// Tag-out trigger: `hp <= 0` or `hp <= floor(threshold% of max_hp)`
pub fn tag_out_reason(current_hp: i32, max_hp: i32, yield_threshold: u8) -> Option<DownReason> {
    if current_hp <= 0 {
        Some(DownReason::Destroyed)
    } else if current_hp <= yield_hp(max_hp, yield_threshold) {
        Some(DownReason::Yielded)
    } else {
        None
    }
}

/// Per-team tag-out state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagOutStateMachine {
    lineup: Lineup,
}

impl TagOutStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lineup(&self) -> Lineup {
        self.lineup
    }

    pub fn fielded(&self) -> Option<Slot> {
        self.lineup.fielded()
    }

    pub fn is_defeated(&self) -> bool {
        self.lineup.is_defeated()
    }

    /// Check the fielded member of `members` (indexed by [`Slot::index`])
    /// against the tag-out trigger and advance the lineup.
    ///
    /// On tag-in the substitute is reset to exactly its max HP and shield.
    pub fn evaluate(&mut self, members: &mut [Combatant; 2]) -> Option<TagTransition> {
        let slot = self.fielded()?;
        let fielded = &members[slot.index()];
        let outgoing = tag_out_reason(fielded.current_hp, fielded.max_hp, fielded.yield_threshold)?;

        match self.lineup {
            Lineup::Starting => {
                self.lineup = Lineup::Substituted { starter: outgoing };
                members[Slot::Substitute.index()].restore();
                Some(TagTransition::TaggedIn { outgoing })
            }
            Lineup::Substituted { starter } => {
                self.lineup = Lineup::Defeated {
                    starter,
                    substitute: outgoing,
                };
                Some(TagTransition::TeamDefeated { outgoing })
            }
            Lineup::Defeated { .. } => None,
        }
    }
}
