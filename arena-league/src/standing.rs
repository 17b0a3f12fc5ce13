//! League standings - points and time in tier per competitor
//!
//! Level 4 - Data model
//!
//! 1v1 standings are keyed by robot and tag-team standings by team, so the
//! two point counters never touch even when the same robot appears in both.

use arena_core::{BattleFormat, Competitor, Corner};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cycle::BattleReport;
use crate::economy::LeagueTier;
use crate::rebalance::TierChange;

/// One competitor's place in a league
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueStanding {
    pub competitor: Competitor,
    pub tier: LeagueTier,
    #[serde(default)]
    pub league_points: u32,
    #[serde(default)]
    pub cycles_in_tier: u32,
    /// Individual ELO for a robot, combined ELO for a team
    pub elo: i32,
}

impl LeagueStanding {
    pub fn new(competitor: Competitor, tier: LeagueTier, elo: i32) -> Self {
        Self {
            competitor,
            tier,
            league_points: 0,
            cycles_in_tier: 0,
            elo,
        }
    }

    pub fn with_points(mut self, league_points: u32) -> Self {
        self.league_points = league_points;
        self
    }

    pub fn with_cycles(mut self, cycles_in_tier: u32) -> Self {
        self.cycles_in_tier = cycles_in_tier;
        self
    }

    pub fn format(&self) -> BattleFormat {
        self.competitor.format()
    }

    /// Apply a league points delta; the total never drops below zero
    pub fn apply_points(&mut self, delta: i32) {
        self.league_points = if delta >= 0 {
            self.league_points.saturating_add(delta as u32)
        } else {
            self.league_points.saturating_sub(delta.unsigned_abs())
        };
    }

    pub fn advance_cycle(&mut self) {
        self.cycles_in_tier += 1;
    }

    pub fn apply_rating(&mut self, delta: i32) {
        self.elo += delta;
    }

    /// Move to the tier named by `change`. The tier clock restarts; 1v1
    /// points reset while tag-team points carry over.
    pub fn apply_change(&mut self, change: &TierChange) {
        self.tier = change.to;
        self.cycles_in_tier = 0;
        if self.format() == BattleFormat::Duel {
            self.league_points = 0;
        }
    }
}

/// All standings of a league, both formats
#[derive(Clone, Debug, Default)]
pub struct Standings {
    entries: FxHashMap<Competitor, LeagueStanding>,
}

impl Standings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = LeagueStanding>) -> Self {
        Self {
            entries: entries.into_iter().map(|s| (s.competitor, s)).collect(),
        }
    }

    pub fn insert(&mut self, standing: LeagueStanding) {
        self.entries.insert(standing.competitor, standing);
    }

    pub fn get(&self, competitor: &Competitor) -> Option<&LeagueStanding> {
        self.entries.get(competitor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a points delta. Returns false for an unknown competitor.
    pub fn apply_points(&mut self, competitor: &Competitor, delta: i32) -> bool {
        match self.entries.get_mut(competitor) {
            Some(standing) => {
                standing.apply_points(delta);
                true
            }
            None => false,
        }
    }

    /// Credit the league points and rating change of a fought battle.
    /// Returns the competitors that had no standing.
    pub fn apply_report(&mut self, report: &BattleReport) -> Vec<Competitor> {
        for corner in Corner::BOTH {
            let competitor = report.outcome.competitor(corner);
            if let Some(standing) = self.entries.get_mut(&competitor) {
                standing.apply_rating(report.rating_change(corner));
            }
        }
        report
            .standings
            .iter()
            .filter(|delta| !self.apply_points(&delta.competitor, delta.league_points))
            .map(|delta| delta.competitor)
            .collect()
    }

    /// Close a cycle: everyone has spent one more cycle in their tier
    pub fn advance_cycle(&mut self) {
        self.entries.values_mut().for_each(LeagueStanding::advance_cycle);
    }

    /// Apply tier changes from a rebalancing pass
    pub fn apply_changes<'a>(&mut self, changes: impl IntoIterator<Item = &'a TierChange>) {
        for change in changes {
            if let Some(standing) = self.entries.get_mut(&change.competitor) {
                standing.apply_change(change);
            }
        }
    }

    /// Snapshot sorted by competitor, for rebalancing and output
    pub fn snapshot(&self) -> Vec<LeagueStanding> {
        let mut all: Vec<LeagueStanding> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| a.competitor.cmp(&b.competitor));
        all
    }
}
