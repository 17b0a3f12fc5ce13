//! Combat models - where strikes come from
//!
//! Level 3 - Steps
//!
//! The battle resolver only knows about [`Strike`]s. A [`CombatModel`]
//! decides which strikes land in each tick: [`AttributeModel`] rolls them
//! from combatant attributes, [`ScriptedModel`] replays a fixed list.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, Stance};
use crate::math::round_half_up;

/// Side of the arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    Red,
    Blue,
}

impl Corner {
    pub const BOTH: [Corner; 2] = [Corner::Red, Corner::Blue];

    pub fn opponent(self) -> Corner {
        match self {
            Corner::Red => Corner::Blue,
            Corner::Blue => Corner::Red,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Corner::Red => 0,
            Corner::Blue => 1,
        }
    }
}

/// Damage dealt by the fielded combatant of `attacker` to the opposing one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    pub attacker: Corner,
    pub hp_damage: i32,
    #[serde(default)]
    pub shield_damage: i32,
}

/// Half-open slice of simulated time `[start_ms, end_ms)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickWindow {
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Source of strikes for the battle resolver
pub trait CombatModel {
    /// Strikes produced when `corner`'s fielded combatant gets its turn in
    /// `window`. Counter-strikes carry the defender's corner.
    fn attack(
        &mut self,
        corner: Corner,
        window: TickWindow,
        attacker: &Combatant,
        defender: &Combatant,
    ) -> Vec<Strike>;

    /// A fresh combatant entered `corner` at `at_ms`
    fn on_tag_in(&mut self, _corner: Corner, _at_ms: u64) {}
}

// ============================================================================
// Scripted
// ============================================================================

/// A strike pinned to a moment in the battle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedStrike {
    pub at_ms: u64,
    #[serde(flatten)]
    pub strike: Strike,
}

/// Replays a fixed list of strikes, each in the tick whose window holds it
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScriptedModel {
    strikes: Vec<TimedStrike>,
}

impl ScriptedModel {
    pub fn new(mut strikes: Vec<TimedStrike>) -> Self {
        strikes.sort_by_key(|s| s.at_ms);
        Self { strikes }
    }

    /// Shorthand for a strike with no shield damage
    pub fn hit(at_ms: u64, attacker: Corner, hp_damage: i32) -> TimedStrike {
        TimedStrike {
            at_ms,
            strike: Strike {
                attacker,
                hp_damage,
                shield_damage: 0,
            },
        }
    }
}

impl CombatModel for ScriptedModel {
    fn attack(
        &mut self,
        corner: Corner,
        window: TickWindow,
        _attacker: &Combatant,
        _defender: &Combatant,
    ) -> Vec<Strike> {
        self.strikes
            .iter()
            .filter(|s| s.strike.attacker == corner)
            .filter(|s| s.at_ms >= window.start_ms && s.at_ms < window.end_ms)
            .map(|s| s.strike)
            .collect()
    }
}

// ============================================================================
// Attribute-driven
// ============================================================================

const BASE_WEAPON_COOLDOWN_MS: f64 = 4000.0;
const SHIELD_ABSORPTION: f64 = 0.7;
const SHIELD_BLEED_THROUGH: f64 = 0.3;
const COUNTER_DAMAGE: f64 = 0.7;

/// Seeded model rolling hits, crits and counters from combatant attributes
#[derive(Clone, Debug)]
pub struct AttributeModel {
    rng: ChaCha8Rng,
    last_attack_ms: [u64; 2],
}

impl AttributeModel {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            last_attack_ms: [0; 2],
        }
    }

    fn roll(&mut self) -> f64 {
        self.rng.gen_range(0.0..100.0)
    }

    fn variance(&mut self) -> f64 {
        self.rng.gen_range(-10.0..10.0)
    }
}

impl CombatModel for AttributeModel {
    fn attack(
        &mut self,
        corner: Corner,
        window: TickWindow,
        attacker: &Combatant,
        defender: &Combatant,
    ) -> Vec<Strike> {
        let slot = corner.index();
        if window.end_ms.saturating_sub(self.last_attack_ms[slot]) < cooldown_ms(attacker) {
            return Vec::new();
        }
        self.last_attack_ms[slot] = window.end_ms;

        let hit_chance = (hit_chance(attacker, defender) + self.variance()).clamp(10.0, 95.0);
        if self.roll() >= hit_chance {
            return Vec::new();
        }

        let crit_chance = (crit_chance(attacker) + self.variance()).clamp(0.0, 50.0);
        let critical = self.roll() < crit_chance;
        let damage = base_damage(attacker);

        let strike = land_strike(corner, damage, critical, attacker, defender);
        let mut strikes = vec![strike];

        if defender.current_hp - strike.hp_damage > 0 && self.roll() < counter_chance(defender) {
            let counter = land_strike(
                corner.opponent(),
                damage * COUNTER_DAMAGE,
                false,
                defender,
                attacker,
            );
            strikes.push(counter);
        }

        strikes
    }

    fn on_tag_in(&mut self, corner: Corner, at_ms: u64) {
        self.last_attack_ms[corner.index()] = at_ms;
    }
}

fn cooldown_ms(attacker: &Combatant) -> u64 {
    (BASE_WEAPON_COOLDOWN_MS / (1.0 + attacker.attributes.attack_speed / 50.0)) as u64
}

fn hit_chance(attacker: &Combatant, defender: &Combatant) -> f64 {
    let stance_bonus = if attacker.stance == Stance::Offensive { 5.0 } else { 0.0 };
    70.0 + attacker.attributes.targeting_systems / 2.0 + stance_bonus
        - defender.attributes.evasion_thrusters / 3.0
        - defender.attributes.gyro_stabilizers / 5.0
}

fn crit_chance(attacker: &Combatant) -> f64 {
    let loadout_bonus = if attacker.attributes.two_handed { 10.0 } else { 0.0 };
    5.0 + attacker.attributes.critical_systems / 8.0
        + attacker.attributes.targeting_systems / 25.0
        + loadout_bonus
}

fn counter_chance(defender: &Combatant) -> f64 {
    let stance_mult = if defender.stance == Stance::Defensive { 1.15 } else { 1.0 };
    (defender.attributes.counter_protocols * stance_mult).clamp(0.0, 40.0)
}

fn base_damage(attacker: &Combatant) -> f64 {
    let attrs = &attacker.attributes;
    let stance_mult = match attacker.stance {
        Stance::Offensive => 1.15,
        Stance::Defensive => 0.90,
        Stance::Balanced => 1.0,
    };
    attrs.weapon_damage
        * (1.0 + attrs.combat_power / 100.0)
        * (1.0 + attrs.weapon_control / 100.0)
        * stance_mult
}

/// Split damage between the defender's shield and HP
fn land_strike(
    attacker_corner: Corner,
    damage: f64,
    critical: bool,
    attacker: &Combatant,
    defender: &Combatant,
) -> Strike {
    let mut damage = damage;
    if critical {
        let base_mult = if attacker.attributes.two_handed { 2.5 } else { 2.0 };
        damage *= (base_mult - defender.attributes.damage_dampeners / 100.0).max(1.2);
    }

    let penetration = attacker.attributes.penetration;
    let armor = defender.attributes.armor_plating * (1.0 - penetration / 150.0);
    let shield = defender.current_shield.max(0) as f64;

    let (shield_damage, hp_damage) = if shield > 0.0 {
        let against_shield = damage * SHIELD_ABSORPTION * (1.0 + penetration / 200.0);
        let absorbed = against_shield.min(shield);
        let bleed = if against_shield > shield {
            ((against_shield - shield) * SHIELD_BLEED_THROUGH - armor).max(1.0)
        } else {
            0.0
        };
        (absorbed, bleed)
    } else {
        (0.0, (damage - armor).max(1.0))
    };

    Strike {
        attacker: attacker_corner,
        hp_damage: round_half_up(hp_damage) as i32,
        shield_damage: round_half_up(shield_damage) as i32,
    }
}
