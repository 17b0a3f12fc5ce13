//! Economy tables - league tiers, reward ranges, multiplier brackets
//!
//! Level 4 - Utilities and configuration
//!
//! Every number the reward formulas look up lives here as data. Nothing in
//! this module branches on a tier or a level; it indexes a table.

use std::fmt;
use std::str::FromStr;

use arena_core::{round_half_up, ArenaError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Competitive tiers, lowest first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeagueTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Champion,
}

impl LeagueTier {
    pub const ALL: [LeagueTier; 6] = [
        LeagueTier::Bronze,
        LeagueTier::Silver,
        LeagueTier::Gold,
        LeagueTier::Platinum,
        LeagueTier::Diamond,
        LeagueTier::Champion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeagueTier::Bronze => "bronze",
            LeagueTier::Silver => "silver",
            LeagueTier::Gold => "gold",
            LeagueTier::Platinum => "platinum",
            LeagueTier::Diamond => "diamond",
            LeagueTier::Champion => "champion",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }

    /// One tier up, `None` from champion
    pub fn promoted(self) -> Option<LeagueTier> {
        Self::ALL.get(self.position() + 1).copied()
    }

    /// One tier down, `None` from bronze
    pub fn demoted(self) -> Option<LeagueTier> {
        self.position().checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl fmt::Display for LeagueTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeagueTier {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        LeagueTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == wanted)
            .ok_or_else(|| ArenaError::UnknownLeagueTier(s.to_string()))
    }
}

/// Per-tier constants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRow {
    pub reward_min: u32,
    pub reward_max: u32,
    /// Prestige for a 1v1 win
    pub prestige: u32,
    /// Base fame before contribution scaling
    pub fame: u32,
}

impl TierRow {
    /// Canonical base reward: `round((min + max) / 2)`
    pub fn midpoint(&self) -> u32 {
        round_half_up((self.reward_min as f64 + self.reward_max as f64) / 2.0) as u32
    }
}

/// Lower bound of a prestige bracket and the currency multiplier it grants
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrestigeBracket {
    pub min_prestige: u32,
    pub multiplier: f64,
}

/// All lookup tables used by the reward calculator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTierTable {
    pub tiers: FxHashMap<LeagueTier, TierRow>,
    /// Sorted by `min_prestige`, ascending
    pub prestige_brackets: Vec<PrestigeBracket>,
    /// Merchandising base rate, indexed by income generator level
    pub merchandising_rates: Vec<u32>,
    pub repair_cost_per_hp: u32,
    pub repair_discount_per_level: u32,
    pub repair_discount_cap: u32,
    pub streaming_base: u32,
    pub attribute_base_cost: u32,
    pub max_attribute_level: u32,
    pub training_discount_per_level: u32,
    pub max_facility_level: u32,
}

impl Default for EconomyTierTable {
    fn default() -> Self {
        let rows = [
            (LeagueTier::Bronze, 5_000, 10_000, 5, 2),
            (LeagueTier::Silver, 10_000, 20_000, 10, 5),
            (LeagueTier::Gold, 20_000, 40_000, 20, 10),
            (LeagueTier::Platinum, 40_000, 80_000, 30, 15),
            (LeagueTier::Diamond, 80_000, 150_000, 50, 25),
            (LeagueTier::Champion, 150_000, 300_000, 75, 40),
        ];
        let tiers = rows
            .into_iter()
            .map(|(tier, reward_min, reward_max, prestige, fame)| {
                (
                    tier,
                    TierRow {
                        reward_min,
                        reward_max,
                        prestige,
                        fame,
                    },
                )
            })
            .collect();

        let prestige_brackets = [(0, 1.0), (5_000, 1.05), (10_000, 1.10), (25_000, 1.15), (50_000, 1.20)]
            .into_iter()
            .map(|(min_prestige, multiplier)| PrestigeBracket {
                min_prestige,
                multiplier,
            })
            .collect();

        Self {
            tiers,
            prestige_brackets,
            merchandising_rates: vec![
                0, 5_000, 8_000, 8_000, 12_000, 12_000, 18_000, 18_000, 25_000, 25_000, 35_000,
            ],
            repair_cost_per_hp: 50,
            repair_discount_per_level: 5,
            repair_discount_cap: 50,
            streaming_base: 1_000,
            attribute_base_cost: 1_000,
            max_attribute_level: 50,
            training_discount_per_level: 5,
            max_facility_level: 10,
        }
    }
}

impl EconomyTierTable {
    /// Row for `tier`, or `UnknownLeagueTier` when the table lacks it
    pub fn row(&self, tier: LeagueTier) -> Result<&TierRow> {
        self.tiers
            .get(&tier)
            .ok_or_else(|| ArenaError::UnknownLeagueTier(tier.to_string()))
    }

    /// Currency multiplier for a stable's prestige
    pub fn prestige_multiplier(&self, prestige: u32) -> f64 {
        self.prestige_brackets
            .iter()
            .rev()
            .find(|bracket| prestige >= bracket.min_prestige)
            .map_or(1.0, |bracket| bracket.multiplier)
    }

    pub fn merchandising_rate(&self, income_generator_level: u32) -> Result<u32> {
        self.merchandising_rates
            .get(income_generator_level as usize)
            .copied()
            .ok_or(ArenaError::InvalidFacilityLevel {
                facility: "income_generator",
                level: income_generator_level,
            })
    }

    /// Repair discount in percent for a repair bay level
    pub fn repair_discount_percent(&self, repair_bay_level: u32) -> u32 {
        repair_bay_level
            .saturating_mul(self.repair_discount_per_level)
            .min(self.repair_discount_cap)
    }

    /// Cost to raise an attribute from `current_level` by one.
    ///
    /// `floor((level + 1) * base * (1 - training_level * 5%))`
    pub fn attribute_upgrade_cost(&self, current_level: u32, training_facility_level: u32) -> Result<u32> {
        if current_level >= self.max_attribute_level {
            return Err(ArenaError::AttributeAtMaximum { level: current_level });
        }
        if training_facility_level > self.max_facility_level {
            return Err(ArenaError::InvalidFacilityLevel {
                facility: "training_facility",
                level: training_facility_level,
            });
        }
        let base = (current_level as u64 + 1) * self.attribute_base_cost as u64;
        let discount = (training_facility_level * self.training_discount_per_level).min(100) as u64;
        Ok((base * (100 - discount) / 100) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parse() {
        assert_eq!("gold".parse::<LeagueTier>().unwrap(), LeagueTier::Gold);
        assert_eq!(" Champion ".parse::<LeagueTier>().unwrap(), LeagueTier::Champion);
        assert_eq!(
            "mithril".parse::<LeagueTier>().unwrap_err(),
            ArenaError::UnknownLeagueTier("mithril".to_string())
        );
    }

    #[test]
    fn test_tier_order() {
        assert_eq!(LeagueTier::Bronze.promoted(), Some(LeagueTier::Silver));
        assert_eq!(LeagueTier::Champion.promoted(), None);
        assert_eq!(LeagueTier::Bronze.demoted(), None);
        assert_eq!(LeagueTier::Diamond.demoted(), Some(LeagueTier::Platinum));
        assert!(LeagueTier::Bronze < LeagueTier::Champion);
    }

    #[test]
    fn test_midpoints() {
        let table = EconomyTierTable::default();
        let midpoints: Vec<u32> = LeagueTier::ALL
            .iter()
            .map(|&t| table.row(t).unwrap().midpoint())
            .collect();
        assert_eq!(midpoints, vec![7_500, 15_000, 30_000, 60_000, 115_000, 225_000]);
    }

    #[test]
    fn test_missing_tier_row() {
        let mut table = EconomyTierTable::default();
        table.tiers.remove(&LeagueTier::Diamond);
        assert_eq!(
            table.row(LeagueTier::Diamond).unwrap_err(),
            ArenaError::UnknownLeagueTier("diamond".to_string())
        );
    }

    #[test]
    fn test_prestige_multiplier_boundaries() {
        let table = EconomyTierTable::default();
        assert_eq!(table.prestige_multiplier(0), 1.0);
        assert_eq!(table.prestige_multiplier(4_999), 1.0);
        assert_eq!(table.prestige_multiplier(5_000), 1.05);
        assert_eq!(table.prestige_multiplier(9_999), 1.05);
        assert_eq!(table.prestige_multiplier(10_000), 1.10);
        assert_eq!(table.prestige_multiplier(25_000), 1.15);
        assert_eq!(table.prestige_multiplier(49_999), 1.15);
        assert_eq!(table.prestige_multiplier(50_000), 1.20);
        assert_eq!(table.prestige_multiplier(u32::MAX), 1.20);
    }

    #[test]
    fn test_merchandising_rates() {
        let table = EconomyTierTable::default();
        assert_eq!(table.merchandising_rate(0).unwrap(), 0);
        assert_eq!(table.merchandising_rate(1).unwrap(), 5_000);
        assert_eq!(table.merchandising_rate(5).unwrap(), 12_000);
        assert_eq!(table.merchandising_rate(10).unwrap(), 35_000);
        assert!(table.merchandising_rate(11).is_err());
    }

    #[test]
    fn test_repair_discount_caps() {
        let table = EconomyTierTable::default();
        assert_eq!(table.repair_discount_percent(0), 0);
        assert_eq!(table.repair_discount_percent(5), 25);
        assert_eq!(table.repair_discount_percent(10), 50);
        assert_eq!(table.repair_discount_percent(40), 50);
    }

    #[test]
    fn test_attribute_upgrade_cost() {
        let table = EconomyTierTable::default();
        assert_eq!(table.attribute_upgrade_cost(1, 0).unwrap(), 2_000);
        assert_eq!(table.attribute_upgrade_cost(9, 3).unwrap(), 8_500);
        assert_eq!(
            table.attribute_upgrade_cost(50, 0).unwrap_err(),
            ArenaError::AttributeAtMaximum { level: 50 }
        );
        assert!(table.attribute_upgrade_cost(1, 11).is_err());
    }

    #[test]
    fn test_table_deserializes_with_defaults() {
        let table: EconomyTierTable = serde_json::from_str(r#"{"repair_cost_per_hp": 40}"#).unwrap();
        assert_eq!(table.repair_cost_per_hp, 40);
        assert_eq!(table.tiers.len(), 6);
    }
}
