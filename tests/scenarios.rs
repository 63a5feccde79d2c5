mod common;

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use common::{favourite_wins, field, played_round, rematches, report, simulate};
use swiss_bracket::bracket::seed_brackets;
use swiss_bracket::config::{PairingSettings, ScoringSettings};
use swiss_bracket::domain::{History, PlayerId, StandingsTable};
use swiss_bracket::errors::EngineError;
use swiss_bracket::finalize::finalize;
use swiss_bracket::pairing::{generate_round, seed_spread};
use swiss_bracket::scoring::compute_standings;

#[test]
fn test_chalk_tournament_of_32() {
    let settings = PairingSettings::default();

    let first = generate_round(&field(32), 1, 12345, &settings).unwrap();
    let opening: Vec<_> = first.matches.iter().map(|m| m.players).collect();
    let fold: Vec<_> = (1..=16).map(|s| (s, s + 16)).collect();
    assert_eq!(opening, fold);

    let history = simulate(32, 5, 12345, &settings, favourite_wins);
    assert!(rematches(&history).is_empty());

    let ranked = compute_standings(&history, &ScoringSettings::default()).unwrap();
    let seeds: Vec<_> = ranked.iter().map(|r| r.seed).collect();
    assert_eq!(seeds, (1..=32).collect::<Vec<_>>());
    assert!(ranked.iter().all(|r| r.breakdown.quality == 0.0));
    assert!(ranked.iter().all(|r| r.breakdown.cinderella == 0.0));

    // no bracket phase: final standings are the Swiss ranking
    let finals = finalize(&ranked, None).unwrap();
    let order: Vec<_> = finals.iter().map(|p| p.player_id).collect();
    assert_eq!(order, ranked.iter().map(|r| r.player_id).collect::<Vec<_>>());
}

#[test]
fn test_same_inputs_same_round() {
    let settings = PairingSettings::default();
    let history = simulate(24, 2, 99, &settings, favourite_wins);

    let a = generate_round(&history, 3, 7, &settings).unwrap();
    let b = generate_round(&history, 3, 7, &settings).unwrap();
    assert_eq!(a, b);

    let ranked_a = compute_standings(&history, &ScoringSettings::default()).unwrap();
    let ranked_b = compute_standings(&history, &ScoringSettings::default()).unwrap();
    assert_eq!(ranked_a, ranked_b);
}

/// Four rounds of a 32-player event after which eight players sit at 2-2
fn even_record_history() -> History {
    let rounds: [&[(PlayerId, PlayerId)]; 4] = [
        &[
            (1, 2), (4, 3), (5, 6), (7, 8), (9, 10), (11, 12), (13, 14), (15, 16),
            (18, 17), (20, 19), (21, 22), (23, 24), (26, 25), (27, 28), (29, 30), (31, 32),
        ],
        &[
            (3, 1), (4, 2), (7, 5), (8, 6), (9, 11), (10, 12), (15, 13), (16, 14),
            (18, 20), (19, 17), (21, 23), (22, 24), (26, 28), (27, 25), (29, 31), (30, 32),
        ],
        &[
            (2, 6), (4, 8), (5, 1), (7, 3), (9, 13), (10, 14), (11, 15), (16, 12),
            (20, 24), (21, 17), (22, 18), (23, 19), (26, 30), (27, 31), (28, 32), (29, 25),
        ],
        &[
            (1, 9), (2, 10), (3, 11), (4, 12), (5, 13), (6, 14), (7, 15), (8, 16),
            (17, 25), (18, 26), (20, 28), (21, 29), (22, 30), (23, 31), (24, 32), (27, 19),
        ],
    ];

    rounds
        .iter()
        .enumerate()
        .fold(field(32), |history, (i, results)| {
            history.with_round(played_round(i as u8 + 1, results)).unwrap()
        })
}

/// Smallest seed spread over every rematch-free way of pairing `players`
fn brute_force_spread(players: &[PlayerId], table: &StandingsTable) -> Option<u32> {
    fn search(
        remaining: &[PlayerId],
        pairs: &mut Vec<(u32, u32)>,
        table: &StandingsTable,
        best: &mut Option<u32>,
    ) {
        let Some((&first, rest)) = remaining.split_first() else {
            let spread = seed_spread(pairs);
            if best.is_none_or(|b| spread < b) {
                *best = Some(spread);
            }
            return;
        };
        for (i, &partner) in rest.iter().enumerate() {
            if table.have_met(first, partner) {
                continue;
            }
            let mut left = rest.to_vec();
            left.remove(i);
            pairs.push((first as u32, partner as u32));
            search(&left, pairs, table, best);
            pairs.pop();
        }
    }

    let mut best = None;
    search(players, &mut Vec::new(), table, &mut best);
    best
}

#[test]
fn test_cut_round_reaches_minimum_spread() {
    let history = even_record_history();
    let table = StandingsTable::from_history(&history);

    let even: Vec<PlayerId> = table.iter().filter(|s| s.score() == 0).map(|s| s.player_id).collect();
    assert_eq!(even, vec![1, 2, 3, 8, 10, 11, 15, 16]);

    let round = generate_round(&history, 5, 12345, &PairingSettings::default()).unwrap();
    let in_group: HashSet<PlayerId> = even.iter().copied().collect();
    let group_pairs: Vec<(u32, u32)> = round
        .matches
        .iter()
        .filter(|m| in_group.contains(&m.players.0) || in_group.contains(&m.players.1))
        .map(|m| (m.players.0 as u32, m.players.1 as u32))
        .collect();

    // nobody floats in or out of the cut-line group
    assert_eq!(group_pairs.len(), 4);
    assert!(group_pairs
        .iter()
        .all(|&(a, b)| in_group.contains(&(a as u64)) && in_group.contains(&(b as u64))));
    assert!(group_pairs.iter().all(|&(a, b)| !table.have_met(a as u64, b as u64)));

    let minimum = brute_force_spread(&even, &table).unwrap();
    assert_eq!(minimum, 6);
    assert_eq!(seed_spread(&group_pairs), minimum);
}

fn round_robin_of_four() -> History {
    [
        played_round(1, &[(1, 2), (3, 4)]),
        played_round(2, &[(1, 3), (2, 4)]),
        played_round(3, &[(1, 4), (2, 3)]),
    ]
    .into_iter()
    .fold(field(4), |history, round| history.with_round(round).unwrap())
}

#[test]
fn test_exhausted_search_reports_infeasible() {
    let history = round_robin_of_four();
    let tight = PairingSettings {
        max_attempts: 3,
        ..PairingSettings::default()
    };

    match generate_round(&history, 4, 1, &tight) {
        Err(EngineError::InfeasiblePairing { round, players }) => {
            assert_eq!(round, 4);
            assert!(!players.is_empty());
        }
        other => panic!("expected an infeasible pairing, got {:?}", other),
    }
}

#[test]
fn test_relaxed_search_uses_oldest_rematches() {
    let history = round_robin_of_four();
    let round = generate_round(&history, 4, 1, &PairingSettings::default()).unwrap();

    let pairs: HashSet<(PlayerId, PlayerId)> = round.matches.iter().map(|m| m.players).collect();
    assert_eq!(pairs, HashSet::from([(1, 2), (3, 4)]));
}

#[test]
fn test_odd_field_byes() {
    let settings = PairingSettings::default();
    let mut history = field(9);
    let mut byes = Vec::new();

    for number in 1..=5 {
        let round = generate_round(&history, number, 3, &settings).unwrap();
        assert_eq!(round.matches.len(), 4);
        let bye = round.bye.unwrap();
        assert!(!byes.contains(&bye), "player {} got a second bye", bye);
        byes.push(bye);
        history = history.with_round(report(&round, favourite_wins)).unwrap();
    }

    let ranked = compute_standings(&history, &ScoringSettings::default()).unwrap();
    for player in &byes {
        let entry = ranked.iter().find(|r| r.player_id == *player).unwrap();
        assert_eq!(entry.wins + entry.losses, 5);
        assert_eq!(entry.breakdown.quality_entries.len(), 4);
    }
}

#[test]
fn test_brackets_after_full_swiss() {
    let history = simulate(20, 5, 5, &PairingSettings::default(), favourite_wins);
    let ranked = compute_standings(&history, &ScoringSettings::default()).unwrap();
    let assignment = seed_brackets(&ranked, 16).unwrap();

    assert_eq!(assignment.main.len(), 16);
    assert_eq!(assignment.redemption.len(), 4);
    let worst_main = assignment.main.iter().map(|e| e.swiss_rank).max().unwrap();
    let best_redemption = assignment.redemption.iter().map(|e| e.swiss_rank).min().unwrap();
    assert!(worst_main < best_redemption);
}

#[test]
fn test_large_fields_finish_the_swiss_with_random_results() {
    let settings = PairingSettings::default();

    for size in [64, 96, 127, 128] {
        let mut coin = ChaCha8Rng::seed_from_u64(size as u64);
        let history = simulate(size, settings.swiss_rounds, 2024, &settings, |a, b| {
            if coin.gen_bool(0.5) { a } else { b }
        });

        assert_eq!(history.swiss_round_count(), settings.swiss_rounds);
        assert!(rematches(&history).is_empty(), "rematch in a field of {}", size);

        let cut = history.swiss_rounds().last().unwrap();
        assert_eq!(cut.participants().count(), size as usize);
    }
}
