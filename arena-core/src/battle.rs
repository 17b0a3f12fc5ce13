//! Battle resolution - one deterministic pass over simulated time
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: `BattleResolver::resolve_duel`, `BattleResolver::resolve_tag_team`
//! - Level 2: `run` - the tick loop
//! - Level 3: `decide`, strike exchange, tag-out checks
//! - Level 4: outcome records

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::{CombatModel, Corner, Strike, TickWindow};
use crate::combatant::{Combatant, CombatantId, TagTeamRecord};
use crate::rating::MatchScore;
use crate::tag::{tag_out_reason, DownReason, Slot, TagOutStateMachine, TagTransition};
use crate::team::{Team, TeamId};

// ============================================================================
// Level 4 - Configuration and records
// ============================================================================

/// Battle timing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Simulated time after which the battle is a draw
    pub time_limit_ms: u64,
    /// Length of one combat tick
    pub tick_ms: u64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 300_000,
            tick_ms: 100,
        }
    }
}

impl BattleConfig {
    pub fn with_time_limit_ms(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }

    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleFormat {
    Duel,
    TagTeam,
}

/// Who stands in a corner: a single robot or a team
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Competitor {
    Robot(CombatantId),
    Team(TeamId),
}

impl Competitor {
    pub fn format(&self) -> BattleFormat {
        match self {
            Competitor::Robot(_) => BattleFormat::Duel,
            Competitor::Team(_) => BattleFormat::TagTeam,
        }
    }
}

impl fmt::Display for Competitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Competitor::Robot(id) => write!(f, "robot {}", id),
            Competitor::Team(id) => write!(f, "team {}", id),
        }
    }
}

/// How the battle ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// One side went down
    Defeat,
    /// Both sides went down in the same tick
    MutualDefeat,
    /// The clock ran out
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// 1v1 fighter
    Solo,
    /// Tag team member who started active
    Starter,
    /// Tag team member who started in reserve
    Substitute,
}

/// One combatant's part in a battle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantResult {
    pub combatant: CombatantId,
    pub corner: Corner,
    pub role: ParticipantRole,
    /// HP plus shield damage inflicted
    pub damage_dealt: i32,
    /// HP lost during this battle
    pub damage_taken: i32,
    pub final_hp: i32,
    pub final_shield: i32,
    pub max_hp: i32,
    /// Time spent fielded
    pub survival_ms: u64,
    pub destroyed: bool,
    pub yielded: bool,
    pub tagged_in: bool,
    pub tagged_out: bool,
}

impl ParticipantResult {
    /// Lifetime tag-team counters to add for this battle
    pub fn tag_record_delta(&self, score: MatchScore) -> TagTeamRecord {
        if self.role == ParticipantRole::Solo {
            return TagTeamRecord::default();
        }
        TagTeamRecord {
            tag_ins: self.tagged_in as u32,
            tag_outs: self.tagged_out as u32,
            wins: (score == MatchScore::Win) as u32,
            losses: (score == MatchScore::Loss) as u32,
            draws: (score == MatchScore::Draw) as u32,
        }
    }
}

/// A tag-out, and the tag-in it triggered if any
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEvent {
    pub at_ms: u64,
    pub corner: Corner,
    pub outgoing: CombatantId,
    pub reason: DownReason,
    /// `None` when the outgoing member was the last one standing
    pub incoming: Option<CombatantId>,
}

/// Audit record of one resolved battle. Read-only once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleOutcome {
    format: BattleFormat,
    red: Competitor,
    blue: Competitor,
    winner: Option<Corner>,
    end_reason: EndReason,
    duration_ms: u64,
    tag_events: Vec<TagEvent>,
    participants: Vec<ParticipantResult>,
}

impl BattleOutcome {
    pub fn format(&self) -> BattleFormat {
        self.format
    }

    pub fn competitor(&self, corner: Corner) -> Competitor {
        match corner {
            Corner::Red => self.red,
            Corner::Blue => self.blue,
        }
    }

    /// Winning corner, `None` for a draw
    pub fn winner(&self) -> Option<Corner> {
        self.winner
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    pub fn end_reason(&self) -> EndReason {
        self.end_reason
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn tag_events(&self) -> &[TagEvent] {
        &self.tag_events
    }

    pub fn participants(&self) -> &[ParticipantResult] {
        &self.participants
    }

    pub fn participants_in(&self, corner: Corner) -> impl Iterator<Item = &ParticipantResult> {
        self.participants.iter().filter(move |p| p.corner == corner)
    }

    pub fn score_for(&self, corner: Corner) -> MatchScore {
        match self.winner {
            None => MatchScore::Draw,
            Some(w) if w == corner => MatchScore::Win,
            Some(_) => MatchScore::Loss,
        }
    }
}

// ============================================================================
// Level 3 - Decision rule
// ============================================================================

/// The moment a battle stops, and who won
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub winner: Option<Corner>,
    pub reason: EndReason,
}

/// Decide whether the battle is over.
///
/// The time limit is checked first: reaching it is a draw whatever the
/// state of either side.
pub fn decide(
    elapsed_ms: u64,
    time_limit_ms: u64,
    red_defeated: bool,
    blue_defeated: bool,
) -> Option<Decision> {
    if elapsed_ms >= time_limit_ms {
        return Some(Decision {
            winner: None,
            reason: EndReason::Timeout,
        });
    }
    match (red_defeated, blue_defeated) {
        (true, true) => Some(Decision {
            winner: None,
            reason: EndReason::MutualDefeat,
        }),
        (true, false) => Some(Decision {
            winner: Some(Corner::Blue),
            reason: EndReason::Defeat,
        }),
        (false, true) => Some(Decision {
            winner: Some(Corner::Red),
            reason: EndReason::Defeat,
        }),
        (false, false) => None,
    }
}

/// Running totals for one member
#[derive(Clone, Copy, Debug, Default)]
struct MemberLog {
    damage_dealt: i32,
    damage_taken: i32,
    entered_ms: Option<u64>,
    left_ms: Option<u64>,
    down: Option<DownReason>,
}

impl MemberLog {
    fn fielded_from(at_ms: u64) -> Self {
        Self {
            entered_ms: Some(at_ms),
            ..Default::default()
        }
    }

    fn leave(&mut self, at_ms: u64, reason: DownReason) {
        self.left_ms = Some(at_ms);
        self.down = Some(reason);
    }
}

enum Roster {
    Solo {
        fighter: Combatant,
        down: Option<DownReason>,
    },
    Tag {
        members: [Combatant; 2],
        machine: TagOutStateMachine,
    },
}

/// Everything the resolver tracks for one corner
struct SideState {
    corner: Corner,
    competitor: Competitor,
    roster: Roster,
    logs: Vec<MemberLog>,
}

impl SideState {
    fn solo(corner: Corner, fighter: Combatant) -> Self {
        Self {
            corner,
            competitor: Competitor::Robot(fighter.id),
            roster: Roster::Solo { fighter, down: None },
            logs: vec![MemberLog::fielded_from(0)],
        }
    }

    fn tag(corner: Corner, team_id: TeamId, members: [Combatant; 2]) -> Self {
        Self {
            corner,
            competitor: Competitor::Team(team_id),
            roster: Roster::Tag {
                members,
                machine: TagOutStateMachine::new(),
            },
            logs: vec![MemberLog::fielded_from(0), MemberLog::default()],
        }
    }

    fn fielded_index(&self) -> Option<usize> {
        match &self.roster {
            Roster::Solo { down: None, .. } => Some(0),
            Roster::Solo { down: Some(_), .. } => None,
            Roster::Tag { machine, .. } => machine.fielded().map(Slot::index),
        }
    }

    fn member(&self, index: usize) -> &Combatant {
        match &self.roster {
            Roster::Solo { fighter, .. } => fighter,
            Roster::Tag { members, .. } => &members[index],
        }
    }

    fn member_mut(&mut self, index: usize) -> &mut Combatant {
        match &mut self.roster {
            Roster::Solo { fighter, .. } => fighter,
            Roster::Tag { members, .. } => &mut members[index],
        }
    }

    fn fielded(&self) -> Option<&Combatant> {
        self.fielded_index().map(|i| self.member(i))
    }

    fn is_defeated(&self) -> bool {
        self.fielded_index().is_none()
    }

    /// Apply the tag-out trigger to the fielded member
    fn check_tag_out(&mut self, at_ms: u64) -> Option<TagEvent> {
        let corner = self.corner;
        match &mut self.roster {
            Roster::Solo { fighter, down } => {
                if down.is_some() {
                    return None;
                }
                let reason =
                    tag_out_reason(fighter.current_hp, fighter.max_hp, fighter.yield_threshold)?;
                *down = Some(reason);
                self.logs[0].leave(at_ms, reason);
                None
            }
            Roster::Tag { members, machine } => {
                let outgoing_slot = machine.fielded()?;
                let outgoing = members[outgoing_slot.index()].id;
                let transition = machine.evaluate(members)?;
                let (reason, incoming) = match transition {
                    TagTransition::TaggedIn { outgoing } => {
                        let substitute = Slot::Substitute.index();
                        self.logs[substitute] = MemberLog::fielded_from(at_ms);
                        (outgoing, Some(members[substitute].id))
                    }
                    TagTransition::TeamDefeated { outgoing } => (outgoing, None),
                };
                self.logs[outgoing_slot.index()].leave(at_ms, reason);
                Some(TagEvent {
                    at_ms,
                    corner,
                    outgoing,
                    reason,
                    incoming,
                })
            }
        }
    }

    fn participants(&self, duration_ms: u64) -> Vec<ParticipantResult> {
        self.logs
            .iter()
            .enumerate()
            .map(|(index, log)| {
                let member = self.member(index);
                let role = match (&self.roster, index) {
                    (Roster::Solo { .. }, _) => ParticipantRole::Solo,
                    (Roster::Tag { .. }, 0) => ParticipantRole::Starter,
                    (Roster::Tag { .. }, _) => ParticipantRole::Substitute,
                };
                let survival_ms = match log.entered_ms {
                    Some(entered) => log.left_ms.unwrap_or(duration_ms).saturating_sub(entered),
                    None => 0,
                };
                // A substitute that never entered is recorded at full HP
                let final_hp = if role == ParticipantRole::Substitute && log.entered_ms.is_none() {
                    member.max_hp
                } else {
                    member.current_hp
                };
                ParticipantResult {
                    combatant: member.id,
                    corner: self.corner,
                    role,
                    damage_dealt: log.damage_dealt,
                    damage_taken: log.damage_taken,
                    final_hp,
                    final_shield: member.current_shield,
                    max_hp: member.max_hp,
                    survival_ms,
                    destroyed: log.down == Some(DownReason::Destroyed),
                    yielded: log.down == Some(DownReason::Yielded),
                    tagged_in: role == ParticipantRole::Substitute && log.entered_ms.is_some(),
                    tagged_out: role == ParticipantRole::Starter && log.down.is_some(),
                }
            })
            .collect()
    }
}

// ============================================================================
// Level 1 - Resolver
// ============================================================================

/// Drives a battle from the first tick to a [`BattleOutcome`]
pub struct BattleResolver<M: CombatModel> {
    config: BattleConfig,
    model: M,
}

impl<M: CombatModel> BattleResolver<M> {
    pub fn new(config: BattleConfig, model: M) -> Self {
        Self { config, model }
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Resolve a 1v1. Both fighters start at their current (clamped) vitals.
    pub fn resolve_duel(&mut self, red: &Combatant, blue: &Combatant) -> BattleOutcome {
        let red = SideState::solo(Corner::Red, sanitized(red));
        let blue = SideState::solo(Corner::Blue, sanitized(blue));
        self.run(BattleFormat::Duel, red, blue)
    }

    /// Resolve a tag-team battle. Both starters enter at full HP and shield.
    pub fn resolve_tag_team(&mut self, red: &Team, blue: &Team) -> BattleOutcome {
        let red = SideState::tag(Corner::Red, red.id(), lineup(red));
        let blue = SideState::tag(Corner::Blue, blue.id(), lineup(blue));
        self.run(BattleFormat::TagTeam, red, blue)
    }

    // ========================================================================
    // Level 2 - Tick loop
    // ========================================================================

    fn run(&mut self, format: BattleFormat, mut red: SideState, mut blue: SideState) -> BattleOutcome {
        let tick_ms = self.config.tick_ms.max(1);
        let time_limit_ms = self.config.time_limit_ms;
        let mut elapsed_ms = 0u64;
        let mut tag_events = Vec::new();

        let decision = loop {
            for side in [&mut red, &mut blue] {
                while let Some(event) = side.check_tag_out(elapsed_ms) {
                    if event.incoming.is_some() {
                        self.model.on_tag_in(side.corner, elapsed_ms);
                    }
                    tag_events.push(event);
                }
            }

            if let Some(decision) = decide(elapsed_ms, time_limit_ms, red.is_defeated(), blue.is_defeated()) {
                break decision;
            }

            let window = TickWindow {
                start_ms: elapsed_ms,
                end_ms: (elapsed_ms + tick_ms).min(time_limit_ms),
            };
            self.exchange(window, &mut red, &mut blue);
            elapsed_ms = window.end_ms;
        };

        let mut participants = red.participants(elapsed_ms);
        participants.extend(blue.participants(elapsed_ms));

        BattleOutcome {
            format,
            red: red.competitor,
            blue: blue.competitor,
            winner: decision.winner,
            end_reason: decision.reason,
            duration_ms: elapsed_ms,
            tag_events,
            participants,
        }
    }

    /// Both fielded combatants attack from the state at the start of the
    /// tick, then every strike lands. A knockout never cancels the other
    /// corner's swing in the same tick.
    fn exchange(&mut self, window: TickWindow, red: &mut SideState, blue: &mut SideState) {
        let mut strikes = Vec::new();
        for corner in Corner::BOTH {
            let (attacker, defender) = match corner {
                Corner::Red => (red.fielded(), blue.fielded()),
                Corner::Blue => (blue.fielded(), red.fielded()),
            };
            if let (Some(a), Some(d)) = (attacker, defender) {
                if a.current_hp > 0 {
                    strikes.extend(self.model.attack(corner, window, a, d));
                }
            }
        }
        for strike in &strikes {
            match strike.attacker {
                Corner::Red => apply_strike(strike, red, blue),
                Corner::Blue => apply_strike(strike, blue, red),
            }
        }
    }
}

// ============================================================================
// Level 4 - Helpers
// ============================================================================

fn apply_strike(strike: &Strike, striker: &mut SideState, target: &mut SideState) {
    let (Some(striker_index), Some(target_index)) = (striker.fielded_index(), target.fielded_index())
    else {
        return;
    };

    let defender = target.member_mut(target_index);
    let shield_damage = strike.shield_damage.clamp(0, defender.current_shield.max(0));
    let hp_damage = strike.hp_damage.clamp(0, defender.current_hp.max(0));
    defender.current_shield -= shield_damage;
    defender.current_hp -= hp_damage;

    target.logs[target_index].damage_taken += hp_damage;
    striker.logs[striker_index].damage_dealt += hp_damage + shield_damage;
}

/// Copy a combatant with vitals clamped into range, logging what moved
fn sanitized(combatant: &Combatant) -> Combatant {
    let mut combatant = combatant.clone();
    for violation in combatant.clamp_vitals() {
        tracing::warn!("clamping input: {}", violation);
    }
    combatant
}

/// Starter restored to full, substitute as supplied
fn lineup(team: &Team) -> [Combatant; 2] {
    let mut starter = sanitized(team.active());
    starter.restore();
    [starter, sanitized(team.reserve())]
}
