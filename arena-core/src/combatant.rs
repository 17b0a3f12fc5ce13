//! Combatant - a single robot as seen by the battle engine
//!
//! Level 4 - Data model

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArenaError;

/// Highest yield threshold a combatant may configure, in percent of max HP
pub const MAX_YIELD_THRESHOLD: u8 = 50;

/// Stable identifier of a combatant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Battle stance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Offensive,
    Defensive,
    #[default]
    Balanced,
}

/// Attribute values consumed by the attribute combat model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatAttributes {
    pub combat_power: f64,
    pub targeting_systems: f64,
    pub critical_systems: f64,
    pub penetration: f64,
    pub weapon_control: f64,
    pub attack_speed: f64,
    pub armor_plating: f64,
    pub evasion_thrusters: f64,
    pub damage_dampeners: f64,
    pub counter_protocols: f64,
    pub gyro_stabilizers: f64,
    /// Damage of the equipped weapon before any multiplier
    pub weapon_damage: f64,
    /// Two-handed loadout: bigger crits, more of them
    pub two_handed: bool,
}

impl Default for CombatAttributes {
    fn default() -> Self {
        Self {
            combat_power: 1.0,
            targeting_systems: 1.0,
            critical_systems: 1.0,
            penetration: 1.0,
            weapon_control: 1.0,
            attack_speed: 1.0,
            armor_plating: 1.0,
            evasion_thrusters: 1.0,
            damage_dampeners: 1.0,
            counter_protocols: 1.0,
            gyro_stabilizers: 1.0,
            weapon_damage: 20.0,
            two_handed: false,
        }
    }
}

/// Lifetime tag-team counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagTeamRecord {
    pub tag_ins: u32,
    pub tag_outs: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl TagTeamRecord {
    /// Add another record (usually a single battle's delta) to this one
    pub fn combine(&self, other: &TagTeamRecord) -> TagTeamRecord {
        TagTeamRecord {
            tag_ins: self.tag_ins + other.tag_ins,
            tag_outs: self.tag_outs + other.tag_outs,
            wins: self.wins + other.wins,
            losses: self.losses + other.losses,
            draws: self.draws + other.draws,
        }
    }

    /// Team battles played
    pub fn battles(&self) -> u32 {
        self.wins + self.losses + self.draws
    }
}

/// Career numbers that feed streaming revenue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerStats {
    /// 1v1 battles fought
    pub duels: u32,
    pub fame: u32,
}

/// A robot entering the arena
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    #[serde(default)]
    pub name: String,
    pub current_hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub current_shield: i32,
    #[serde(default)]
    pub max_shield: i32,
    pub elo: i32,
    /// Percent of max HP at which the robot leaves the fight (0-50)
    #[serde(default)]
    pub yield_threshold: u8,
    #[serde(default)]
    pub stance: Stance,
    #[serde(default)]
    pub attributes: CombatAttributes,
    #[serde(default)]
    pub tag_record: TagTeamRecord,
    #[serde(default)]
    pub career: CareerStats,
}

impl Combatant {
    /// Create a combatant at full health with default attributes
    pub fn new(id: u32, max_hp: i32, max_shield: i32, elo: i32) -> Self {
        Self {
            id: CombatantId(id),
            name: format!("robot-{}", id),
            current_hp: max_hp,
            max_hp,
            current_shield: max_shield,
            max_shield,
            elo,
            yield_threshold: 0,
            stance: Stance::Balanced,
            attributes: CombatAttributes::default(),
            tag_record: TagTeamRecord::default(),
            career: CareerStats::default(),
        }
    }

    /// Set yield threshold (percent of max HP)
    pub fn with_yield_threshold(mut self, threshold: u8) -> Self {
        self.yield_threshold = threshold;
        self
    }

    /// Set current HP, leaving max HP alone
    pub fn with_hp(mut self, current_hp: i32) -> Self {
        self.current_hp = current_hp;
        self
    }

    /// Set attributes
    pub fn with_attributes(mut self, attributes: CombatAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Hard reset to 100% HP and shield
    pub fn restore(&mut self) {
        self.current_hp = self.max_hp;
        self.current_shield = self.max_shield;
    }

    /// Battles fought across both formats
    pub fn total_battles(&self) -> u32 {
        self.career.duels + self.tag_record.battles()
    }

    /// Force vitals into their legal ranges.
    ///
    /// Returns one [`ArenaError::InvalidAttributeRange`] per field that had to
    /// move. The caller logs them and carries on with the clamped values.
    pub fn clamp_vitals(&mut self) -> Vec<ArenaError> {
        let id = self.id;
        let mut violations = Vec::new();

        clamp_field(id, "max_hp", &mut self.max_hp, 0, i32::MAX, &mut violations);
        clamp_field(id, "current_hp", &mut self.current_hp, 0, self.max_hp, &mut violations);
        clamp_field(id, "max_shield", &mut self.max_shield, 0, i32::MAX, &mut violations);
        clamp_field(
            id,
            "current_shield",
            &mut self.current_shield,
            0,
            self.max_shield,
            &mut violations,
        );

        if self.yield_threshold > MAX_YIELD_THRESHOLD {
            violations.push(ArenaError::InvalidAttributeRange {
                combatant: id,
                attribute: "yield_threshold",
                value: self.yield_threshold as i64,
                min: 0,
                max: MAX_YIELD_THRESHOLD as i64,
            });
            self.yield_threshold = MAX_YIELD_THRESHOLD;
        }

        violations
    }
}

fn clamp_field(
    combatant: CombatantId,
    attribute: &'static str,
    value: &mut i32,
    min: i32,
    max: i32,
    violations: &mut Vec<ArenaError>,
) {
    if *value < min || *value > max {
        violations.push(ArenaError::InvalidAttributeRange {
            combatant,
            attribute,
            value: *value as i64,
            min: min as i64,
            max: max as i64,
        });
        *value = (*value).clamp(min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_combatant_is_full() {
        let c = Combatant::new(1, 200, 50, 1000);
        assert_eq!(c.current_hp, 200);
        assert_eq!(c.current_shield, 50);
        assert_eq!(c.stance, Stance::Balanced);
    }

    #[test]
    fn test_clamp_vitals_in_range_is_silent() {
        let mut c = Combatant::new(1, 100, 20, 1000).with_hp(40);
        assert!(c.clamp_vitals().is_empty());
        assert_eq!(c.current_hp, 40);
    }

    #[test]
    fn test_clamp_vitals_over_max() {
        let mut c = Combatant::new(1, 100, 20, 1000).with_hp(150);
        c.current_shield = -5;
        let violations = c.clamp_vitals();
        assert_eq!(violations.len(), 2);
        assert_eq!(c.current_hp, 100);
        assert_eq!(c.current_shield, 0);
        assert!(matches!(
            violations[0],
            ArenaError::InvalidAttributeRange { attribute: "current_hp", value: 150, .. }
        ));
    }

    #[test]
    fn test_clamp_vitals_yield_threshold() {
        let mut c = Combatant::new(1, 100, 0, 1000).with_yield_threshold(80);
        let violations = c.clamp_vitals();
        assert_eq!(violations.len(), 1);
        assert_eq!(c.yield_threshold, MAX_YIELD_THRESHOLD);
    }

    #[test]
    fn test_restore() {
        let mut c = Combatant::new(1, 100, 30, 1000).with_hp(1);
        c.current_shield = 0;
        c.restore();
        assert_eq!(c.current_hp, 100);
        assert_eq!(c.current_shield, 30);
    }

    #[test]
    fn test_tag_record_combine() {
        let a = TagTeamRecord { tag_ins: 1, tag_outs: 2, wins: 3, losses: 0, draws: 1 };
        let b = TagTeamRecord { tag_ins: 0, tag_outs: 1, wins: 0, losses: 1, draws: 0 };
        let c = a.combine(&b);
        assert_eq!(c.tag_outs, 3);
        assert_eq!(c.battles(), 5);
    }

    #[test]
    fn test_deserialize_minimal_combatant() {
        let json = r#"{"id": 7, "current_hp": 80, "max_hp": 100, "elo": 1200}"#;
        let c: Combatant = serde_json::from_str(json).unwrap();
        assert_eq!(c.id, CombatantId(7));
        assert_eq!(c.max_shield, 0);
        assert_eq!(c.attributes.weapon_damage, 20.0);
    }
}
