//! Integration tests for the robot arena
//!
//! Tests the full stack: battle resolution, ratings, rewards, standings and
//! league rebalancing over several cycles.

use arena_core::{
    AttributeModel, BattleConfig, BattleResolver, CombatAttributes, Combatant, CombatantId,
    Competitor, Corner, EndReason, MatchScore, Team, TeamId, TeamRecord,
};
use arena_league::{
    run_cycle, BattleRequest, LeagueConfig, LeagueStanding, LeagueTier, Matchup, Resolution,
    RewardCalculator, StableContext, Standings,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// A robot with randomized attributes
fn random_robot(id: u32, rng: &mut ChaCha8Rng) -> Combatant {
    let mut attr = || rng.gen_range(1.0..30.0);
    let attributes = CombatAttributes {
        combat_power: attr(),
        targeting_systems: attr(),
        critical_systems: attr(),
        penetration: attr(),
        weapon_control: attr(),
        attack_speed: attr(),
        armor_plating: attr(),
        evasion_thrusters: attr(),
        damage_dampeners: attr(),
        counter_protocols: attr(),
        gyro_stabilizers: attr(),
        ..Default::default()
    };
    let max_hp = rng.gen_range(80..200);
    let max_shield = rng.gen_range(0..40);
    let yield_threshold = rng.gen_range(0..=30);
    Combatant::new(id, max_hp, max_shield, rng.gen_range(900..1300))
        .with_yield_threshold(yield_threshold)
        .with_attributes(attributes)
}

fn random_team(id: u32, rng: &mut ChaCha8Rng) -> Team {
    Team::new(TeamId(id), random_robot(id * 10, rng), random_robot(id * 10 + 1, rng)).unwrap()
}

/// Pair robots 0-1, 2-3, ... in one tier
fn duel_requests(robots: &[Combatant], tier: LeagueTier, first_id: u64) -> Vec<BattleRequest> {
    robots
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| BattleRequest {
            id: first_id + i as u64,
            tier: tier.to_string(),
            matchup: Matchup::Duel {
                red: pair[0].clone(),
                blue: pair[1].clone(),
            },
            red_stable: StableContext::default(),
            blue_stable: StableContext::default(),
        })
        .collect()
}

fn sequential(seed: u64) -> LeagueConfig {
    LeagueConfig::default().with_seed(seed).with_parallel(false)
}

// ============================================================================
// BATTLE TESTS
// ============================================================================

#[test]
fn test_attribute_battles_terminate_within_limit() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for seed in 0..20 {
        let red = random_robot(1, &mut rng);
        let blue = random_robot(2, &mut rng);
        let mut resolver = BattleResolver::new(BattleConfig::default(), AttributeModel::seeded(seed));
        let outcome = resolver.resolve_duel(&red, &blue);

        assert!(outcome.duration_ms() <= 300_000);
        if outcome.end_reason() == EndReason::Timeout {
            assert!(outcome.is_draw());
        }
        for p in outcome.participants() {
            assert!(p.final_hp >= 0 && p.final_hp <= p.max_hp);
            assert!(p.damage_taken >= 0);
        }
    }
}

#[test]
fn test_same_seed_same_battle() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let red = random_team(1, &mut rng);
    let blue = random_team(2, &mut rng);

    let first = BattleResolver::new(BattleConfig::default(), AttributeModel::seeded(99)).resolve_tag_team(&red, &blue);
    let second = BattleResolver::new(BattleConfig::default(), AttributeModel::seeded(99)).resolve_tag_team(&red, &blue);
    assert_eq!(first, second);
}

#[test]
fn test_tag_team_events_are_consistent() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for seed in 0..10 {
        let red = random_team(1, &mut rng);
        let blue = random_team(2, &mut rng);
        let outcome =
            BattleResolver::new(BattleConfig::default(), AttributeModel::seeded(seed)).resolve_tag_team(&red, &blue);

        for corner in Corner::BOTH {
            let events: Vec<_> = outcome.tag_events().iter().filter(|e| e.corner == corner).collect();
            assert!(events.len() <= 2);
            if let Some(first) = events.first() {
                if first.incoming.is_some() {
                    let substitute = outcome.participants_in(corner).nth(1).unwrap();
                    assert!(substitute.tagged_in);
                }
            }
            if events.len() == 2 {
                assert_eq!(events[1].incoming, None);
                if outcome.end_reason() == EndReason::Defeat {
                    assert_eq!(outcome.winner(), Some(corner.opponent()));
                }
            }
        }
    }
}

// ============================================================================
// LEAGUE TESTS
// ============================================================================

#[test]
fn test_league_over_several_cycles() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let robots: Vec<Combatant> = (0..40).map(|i| random_robot(i, &mut rng)).collect();

    let mut standings = Standings::from_entries(
        robots
            .iter()
            .map(|r| LeagueStanding::new(Competitor::Robot(r.id), LeagueTier::Silver, r.elo)),
    );

    let mut expected_elo: Vec<i32> = robots.iter().map(|r| r.elo).collect();
    for cycle in 0..5u64 {
        let requests = duel_requests(&robots, LeagueTier::Silver, cycle * 100);
        let report = run_cycle(&requests, &LeagueConfig::default().with_seed(cycle));
        assert_eq!(report.summary().fought, 20);
        assert_eq!(report.summary().failed, 0);

        for battle in report.reports() {
            assert!(standings.apply_report(battle).is_empty());
            assert!(battle.tag_records.is_empty());
            for rating in &battle.ratings {
                expected_elo[rating.combatant.0 as usize] += rating.delta;
            }
        }
        standings.advance_cycle();
    }

    let snapshot = standings.snapshot();
    assert!(snapshot.iter().all(|s| s.cycles_in_tier == 5));
    for s in &snapshot {
        if let Competitor::Robot(id) = s.competitor {
            assert_eq!(s.elo, expected_elo[id.0 as usize]);
        }
    }
    let total_elo: i32 = snapshot.iter().map(|s| s.elo).sum();
    assert_eq!(total_elo, robots.iter().map(|r| r.elo).sum::<i32>());

    let config = LeagueConfig::default();
    let summary = config.rebalancer(arena_core::BattleFormat::Duel).rebalance(&snapshot);
    assert_eq!(summary.total_promoted(), 4);
    assert_eq!(summary.total_demoted(), 4);

    standings.apply_changes(summary.changes());
    let moved: Vec<_> = standings.snapshot().into_iter().filter(|s| s.tier != LeagueTier::Silver).collect();
    assert_eq!(moved.len(), 8);
    assert!(moved.iter().all(|s| s.league_points == 0 && s.cycles_in_tier == 0));
    assert_eq!(moved.iter().filter(|s| s.tier == LeagueTier::Gold).count(), 4);
    assert_eq!(moved.iter().filter(|s| s.tier == LeagueTier::Bronze).count(), 4);
}

#[test]
fn test_tag_team_cycle_pays_double() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let requests: Vec<BattleRequest> = (0..6)
        .map(|i| BattleRequest {
            id: i,
            tier: "gold".to_string(),
            matchup: Matchup::TagTeam {
                red: TeamRecord::from(random_team(i as u32 * 2 + 1, &mut rng)),
                blue: TeamRecord::from(random_team(i as u32 * 2 + 2, &mut rng)),
            },
            red_stable: StableContext::default(),
            blue_stable: StableContext::default(),
        })
        .collect();

    let report = run_cycle(&requests, &sequential(1));
    assert_eq!(report.summary().fought, 6);

    let calc = RewardCalculator::default();
    for battle in report.reports() {
        for reward in &battle.rewards {
            let duel_currency = calc
                .currency(LeagueTier::Gold, reward.score, arena_core::BattleFormat::Duel, 0)
                .unwrap();
            assert_eq!(reward.currency, duel_currency * 2);
            let expected_prestige = if reward.score == MatchScore::Win { 32 } else { 0 };
            assert_eq!(reward.prestige, expected_prestige);
            assert_eq!(reward.combatants.len(), 2);
        }
        assert_eq!(battle.ratings.len(), 4);
    }
}

#[test]
fn test_batch_from_json() {
    let batch = r#"[
        {
            "id": 1,
            "tier": "Bronze",
            "matchup": {
                "format": "duel",
                "red": {"id": 1, "current_hp": 100, "max_hp": 100, "elo": 1000},
                "blue": {"id": 2, "current_hp": 100, "max_hp": 100, "elo": 1200}
            },
            "red_stable": {"prestige": 6000, "facilities": {"repair_bay": 2}}
        },
        {
            "id": 2,
            "tier": "silver",
            "matchup": {
                "format": "tag_team",
                "red": {
                    "id": 1,
                    "active": {"id": 3, "current_hp": 100, "max_hp": 100, "elo": 1000},
                    "reserve": {"id": 4, "current_hp": 60, "max_hp": 100, "elo": 1000}
                },
                "blue": {
                    "id": 2,
                    "active": {"id": 5, "current_hp": 100, "max_hp": 100, "elo": 1000},
                    "reserve": {"id": 6, "current_hp": 100, "max_hp": 100, "elo": 1000}
                }
            }
        },
        {
            "id": 3,
            "tier": "gold",
            "matchup": {
                "format": "tag_team",
                "red": {"id": 3, "active": {"id": 7, "current_hp": 100, "max_hp": 100, "elo": 1000}},
                "blue": {
                    "id": 4,
                    "active": {"id": 8, "current_hp": 100, "max_hp": 100, "elo": 1000},
                    "reserve": {"id": 9, "current_hp": 100, "max_hp": 100, "elo": 1000}
                }
            }
        }
    ]"#;

    let requests: Vec<BattleRequest> = serde_json::from_str(batch).unwrap();
    assert_eq!(requests[0].red_stable.prestige, 6000);
    assert_eq!(requests[0].red_stable.facilities.repair_bay, 2);
    assert_eq!(requests[0].blue_stable, StableContext::default());

    let report = run_cycle(&requests, &sequential(42));
    let summary = report.summary();
    assert_eq!((summary.fought, summary.skipped, summary.failed), (1, 1, 1));

    match &report.results[1] {
        Ok(Resolution::Skipped(skipped)) => assert_eq!(skipped.unready, vec![CombatantId(4)]),
        other => panic!("expected skip, got {:?}", other),
    }
    assert!(report.results[2].is_err());
}
