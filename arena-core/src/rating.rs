//! ELO rating engine for duels and tag teams
//!
//! Level 2 - Phase-level implementation
//!
//! The engine only produces signed deltas. Applying them to stored ratings
//! is left to the persistence layer, so deltas from a parallel batch can be
//! committed in any order.

use serde::{Deserialize, Serialize};

use crate::battle::BattleOutcome;
use crate::combat::Corner;
use crate::combatant::{Combatant, CombatantId};
use crate::math::round_half_up;
use crate::team::Team;

/// Default K-factor
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Result of a battle from one side's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchScore {
    Win,
    Draw,
    Loss,
}

impl MatchScore {
    /// Actual score fed to the ELO formula
    pub fn actual(self) -> f64 {
        match self {
            MatchScore::Win => 1.0,
            MatchScore::Draw => 0.5,
            MatchScore::Loss => 0.0,
        }
    }

    pub fn opposite(self) -> MatchScore {
        match self {
            MatchScore::Win => MatchScore::Loss,
            MatchScore::Draw => MatchScore::Draw,
            MatchScore::Loss => MatchScore::Win,
        }
    }
}

/// Rating change for both corners of one battle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    pub red: i32,
    pub blue: i32,
}

impl RatingChange {
    pub fn for_corner(&self, corner: Corner) -> i32 {
        match corner {
            Corner::Red => self.red,
            Corner::Blue => self.blue,
        }
    }
}

/// Rating delta owed to one combatant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDelta {
    pub combatant: CombatantId,
    pub delta: i32,
}

/// Logistic ELO with a fixed K-factor
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingEngine {
    k_factor: f64,
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_K_FACTOR)
    }
}

impl RatingEngine {
    pub fn new(k_factor: f64) -> Self {
        Self { k_factor }
    }

    pub fn k_factor(&self) -> f64 {
        self.k_factor
    }

    /// `E(A, B) = 1 / (1 + 10^((B - A) / 400))`
    pub fn expected_score(&self, rating: i32, opponent: i32) -> f64 {
        1.0 / (1.0 + 10f64.powf((opponent as f64 - rating as f64) / 400.0))
    }

    /// Unrounded `K * (actual - expected)`
    pub fn raw_delta(&self, rating: i32, opponent: i32, score: MatchScore) -> f64 {
        self.k_factor * (score.actual() - self.expected_score(rating, opponent))
    }

    /// Rounded rating delta for one side
    pub fn delta(&self, rating: i32, opponent: i32, score: MatchScore) -> i32 {
        round_half_up(self.raw_delta(rating, opponent, score)) as i32
    }

    /// Deltas for both corners given their ratings and the winner.
    ///
    /// Each side is rounded on its own, so the pair need not sum to zero.
    pub fn change(&self, red: i32, blue: i32, winner: Option<Corner>) -> RatingChange {
        let red_score = match winner {
            None => MatchScore::Draw,
            Some(Corner::Red) => MatchScore::Win,
            Some(Corner::Blue) => MatchScore::Loss,
        };
        RatingChange {
            red: self.delta(red, blue, red_score),
            blue: self.delta(blue, red, red_score.opposite()),
        }
    }

    /// 1v1 rating change
    pub fn duel_change(&self, red: &Combatant, blue: &Combatant, winner: Option<Corner>) -> RatingChange {
        self.change(red.elo, blue.elo, winner)
    }

    /// Tag-team rating change, from each team's combined ELO.
    /// Both members of a team receive their team's delta unchanged.
    pub fn team_change(&self, red: &Team, blue: &Team, winner: Option<Corner>) -> RatingChange {
        self.change(red.combined_elo(), blue.combined_elo(), winner)
    }

    /// Per-combatant deltas for every participant of a resolved battle.
    ///
    /// `red_rating` and `blue_rating` are the individual ratings for a duel
    /// and the combined ratings for a tag-team battle.
    pub fn participant_deltas(
        &self,
        outcome: &BattleOutcome,
        red_rating: i32,
        blue_rating: i32,
    ) -> Vec<RatingDelta> {
        let change = self.change(red_rating, blue_rating, outcome.winner());
        outcome
            .participants()
            .iter()
            .map(|p| RatingDelta {
                combatant: p.combatant,
                delta: change.for_corner(p.corner),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::TeamId;

    #[test]
    fn test_equal_ratings_win() {
        let engine = RatingEngine::default();
        let change = engine.change(1000, 1000, Some(Corner::Red));
        assert_eq!(change, RatingChange { red: 16, blue: -16 });
    }

    #[test]
    fn test_equal_ratings_draw() {
        let engine = RatingEngine::default();
        assert_eq!(engine.change(1000, 1000, None), RatingChange { red: 0, blue: 0 });
    }

    #[test]
    fn test_expected_score_symmetry() {
        let engine = RatingEngine::default();
        let e = engine.expected_score(1200, 1000) + engine.expected_score(1000, 1200);
        assert!((e - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_underdog_win_pays_more() {
        let engine = RatingEngine::default();
        let change = engine.change(1000, 1400, Some(Corner::Red));
        // E = 1/11, 32 * 10/11 = 29.09
        assert_eq!(change.red, 29);
        assert_eq!(change.blue, -29);
    }

    #[test]
    fn test_team_change_uses_combined_elo() {
        let engine = RatingEngine::default();
        let red = Team::new(
            TeamId(1),
            Combatant::new(1, 100, 0, 900),
            Combatant::new(2, 100, 0, 1100),
        )
        .unwrap();
        let blue = Team::new(
            TeamId(2),
            Combatant::new(3, 100, 0, 1000),
            Combatant::new(4, 100, 0, 1000),
        )
        .unwrap();
        let change = engine.team_change(&red, &blue, Some(Corner::Blue));
        assert_eq!(change, RatingChange { red: -16, blue: 16 });
    }

    #[test]
    fn test_custom_k_factor() {
        let engine = RatingEngine::new(16.0);
        assert_eq!(engine.delta(1000, 1000, MatchScore::Win), 8);
    }

    #[test]
    fn test_match_score_opposite() {
        assert_eq!(MatchScore::Win.opposite(), MatchScore::Loss);
        assert_eq!(MatchScore::Draw.opposite(), MatchScore::Draw);
    }
}
