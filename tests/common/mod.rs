#![allow(dead_code)]

use std::collections::HashSet;

use swiss_bracket::config::PairingSettings;
use swiss_bracket::domain::{History, Match, Outcome, Player, PlayerId, Round, RoundTag};
use swiss_bracket::pairing::generate_round;

/// A field of `n` players whose ids equal their seeds
pub fn field(n: u32) -> History {
    let players = (1..=n).map(|s| Player::new(s as u64, format!("Player {}", s), s)).collect();
    History::new(players, Vec::new()).unwrap()
}

/// A reported Swiss round from (winner, loser) pairs
pub fn played_round(number: u8, results: &[(PlayerId, PlayerId)]) -> Round {
    let tag = RoundTag::Swiss(number);
    let mut round = Round::new(tag);
    for &(winner, loser) in results {
        let mut game = Match::pending(winner, loser, tag);
        game.outcome = Outcome::Winner(winner);
        round.matches.push(game);
    }
    round
}

pub fn favourite_wins(a: PlayerId, b: PlayerId) -> PlayerId {
    a.min(b)
}

/// Fill in every result of a generated round
pub fn report(round: &Round, mut decide: impl FnMut(PlayerId, PlayerId) -> PlayerId) -> Round {
    let mut reported = round.clone();
    for game in &mut reported.matches {
        let (a, b) = game.players;
        game.outcome = Outcome::Winner(decide(a, b));
    }
    reported
}

/// Pair and report `rounds` Swiss rounds on a fresh field
pub fn simulate(
    n: u32,
    rounds: u8,
    seed: u64,
    settings: &PairingSettings,
    mut decide: impl FnMut(PlayerId, PlayerId) -> PlayerId,
) -> History {
    let mut history = field(n);
    for number in 1..=rounds {
        let round = generate_round(&history, number, seed, settings).unwrap();
        history = history.with_round(report(&round, &mut decide)).unwrap();
    }
    history
}

/// Every pair of players that met more than once
pub fn rematches(history: &History) -> Vec<(PlayerId, PlayerId)> {
    let mut seen = HashSet::new();
    let mut repeated = Vec::new();
    for game in history.swiss_rounds().flat_map(|r| r.matches.iter()) {
        let (a, b) = game.players;
        let key = (a.min(b), a.max(b));
        if !seen.insert(key) {
            repeated.push(key);
        }
    }
    repeated
}
