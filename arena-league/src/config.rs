//! Configuration types for league cycles
//!
//! Level 4 - Utilities and configuration

use std::path::Path;

use anyhow::Context;
use arena_core::{BattleConfig, BattleFormat, DEFAULT_K_FACTOR};
use serde::{Deserialize, Serialize};

use crate::economy::EconomyTierTable;
use crate::rebalance::{LeagueRebalancer, RebalanceConfig};

/// Everything a cycle needs, passed explicitly to each component
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    pub battle: BattleConfig,
    /// ELO K-factor
    pub k_factor: f64,
    pub economy: EconomyTierTable,
    /// Rebalancing for 1v1 leagues
    pub rebalance: RebalanceConfig,
    /// Rebalancing for tag-team leagues
    pub tag_team_rebalance: RebalanceConfig,
    /// Whether to resolve battles in parallel
    pub parallel: bool,
    /// Base seed for the combat model (None = 42)
    pub seed: Option<u64>,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            k_factor: DEFAULT_K_FACTOR,
            economy: EconomyTierTable::default(),
            rebalance: RebalanceConfig::default(),
            tag_team_rebalance: RebalanceConfig::tag_team(),
            parallel: true,
            seed: None,
        }
    }
}

impl LeagueConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_battle(mut self, battle: BattleConfig) -> Self {
        self.battle = battle;
        self
    }

    /// Rebalancer with the thresholds of `format`'s league
    pub fn rebalancer(&self, format: BattleFormat) -> LeagueRebalancer {
        match format {
            BattleFormat::Duel => LeagueRebalancer::new(self.rebalance),
            BattleFormat::TagTeam => LeagueRebalancer::new(self.tag_team_rebalance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_config_defaults() {
        let config = LeagueConfig::default();
        assert_eq!(config.k_factor, 32.0);
        assert_eq!(config.battle.time_limit_ms, 300_000);
        assert_eq!(config.tag_team_rebalance.min_promotion_points, 25);
        assert_eq!(config.rebalance.min_promotion_points, 0);
        assert!(config.parallel);
    }

    #[test]
    fn test_partial_json() {
        let config: LeagueConfig =
            serde_json::from_str(r#"{"parallel": false, "battle": {"tick_ms": 50}}"#).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.battle.tick_ms, 50);
        assert_eq!(config.battle.time_limit_ms, 300_000);
        assert_eq!(config.k_factor, 32.0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = LeagueConfig::load(Path::new("/nonexistent/league.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_builders() {
        let config = LeagueConfig::default().with_seed(7).with_parallel(false);
        assert_eq!(config.seed, Some(7));
        assert!(!config.parallel);
    }

    #[test]
    fn test_rebalancer_per_format() {
        let config = LeagueConfig::default();
        assert_eq!(config.rebalancer(BattleFormat::Duel).config().min_promotion_points, 0);
        assert_eq!(config.rebalancer(BattleFormat::TagTeam).config().min_promotion_points, 25);
    }
}
