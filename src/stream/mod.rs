//! Which matches of a round are worth putting on stream.

use std::cmp::Ordering;

use log::debug;
use serde::Serialize;

use crate::config::{PairingSettings, StreamSettings};
use crate::domain::{Match, PlayerId, Round, Score, Seed, StandingsTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamPick {
    /// 1-based position of the match in its round
    pub index: usize,
    pub game: Match,
    pub hype: f64,
    pub stakes: f64,
    pub reasons: Vec<String>,
    /// Top seeds meeting early are held back for the bracket
    pub demoted: bool,
}

#[derive(Debug, Clone, Copy)]
struct Side {
    seed: Seed,
    score: Score,
    played: u32,
}

/// Rank a round's matches by broadcast value. `table` holds the standings
/// entering the round. Advisory only; pairings are never changed.
pub fn rank_for_stream(
    round: &Round,
    table: &StandingsTable,
    settings: &StreamSettings,
    schedule: &PairingSettings,
) -> Vec<StreamPick> {
    let number = round.tag.swiss_number().unwrap_or(table.rounds_played() + 1);
    let field = table.len();

    let mut picks: Vec<StreamPick> = round
        .matches
        .iter()
        .enumerate()
        .map(|(i, game)| score_match(i + 1, game, table, number, field, settings, schedule))
        .collect();

    demote_top_seed_clashes(&mut picks, table, settings);
    let picks = order_picks(picks);

    for pick in picks.iter().take(settings.shown) {
        debug!("Stream candidate #{}: hype {:.1} {:?}", pick.index, pick.hype, pick.reasons);
    }
    picks
}

fn side(table: &StandingsTable, id: PlayerId) -> Side {
    table
        .get(id)
        .map(|s| Side {
            seed: s.seed,
            score: s.score(),
            played: s.wins + s.losses,
        })
        .unwrap_or(Side {
            seed: Seed::MAX,
            score: 0,
            played: 0,
        })
}

fn score_match(
    index: usize,
    game: &Match,
    table: &StandingsTable,
    round: u8,
    field: usize,
    settings: &StreamSettings,
    schedule: &PairingSettings,
) -> StreamPick {
    let (a, b) = (side(table, game.players.0), side(table, game.players.1));
    let (favourite, underdog) = if a.seed <= b.seed { (a, b) } else { (b, a) };
    let mut reasons = Vec::new();

    let stakes = cut_line_stakes(a, b, round, schedule, settings, &mut reasons);
    let mut hype = stakes;

    let gap = underdog.seed.saturating_sub(favourite.seed);
    if gap >= settings.giant_killer_min_gap && underdog.score >= favourite.score {
        let rarity = gap as f64 / field.saturating_sub(1).max(1) as f64;
        hype += settings.giant_killer_weight * (1.0 + rarity);
        reasons.push(format!(
            "Giant-killer watch: seed {} level with or ahead of seed {}",
            underdog.seed, favourite.seed
        ));
    }

    for player in [a, b] {
        if is_cinderella(player, field) {
            hype += settings.cinderella_weight;
            reasons.push(format!("Cinderella run: seed {} at {:+}", player.seed, player.score));
        }
    }

    StreamPick {
        index,
        game: game.clone(),
        hype,
        stakes,
        reasons,
        demoted: false,
    }
}

/// How close both players sit to the bracket cut line (even record), scaled by progress
fn cut_line_stakes(
    a: Side,
    b: Side,
    round: u8,
    schedule: &PairingSettings,
    settings: &StreamSettings,
    reasons: &mut Vec<String>,
) -> f64 {
    let rounds = schedule.swiss_rounds.max(1) as f64;
    let progress = (round as f64 / rounds).min(1.0);
    let left = (schedule.swiss_rounds as i32 - round as i32 + 1).max(1) as f64;

    let closeness = |s: Side| (1.0 - s.score.abs() as f64 / left).max(0.0);
    let mut value = settings.stakes_weight * progress * closeness(a) * closeness(b);

    if round == schedule.cut_round && a.score == 0 && b.score == 0 {
        value += settings.cut_line_bonus;
        reasons.push("Bracket qualification on the line".to_string());
    } else if value > 0.0 && round > 1 {
        reasons.push("Both players still racing for the cut line".to_string());
    }
    value
}

/// Bottom-half seed whose score beats the pace its seed implies
fn is_cinderella(player: Side, field: usize) -> bool {
    if field < 2 || (player.seed as usize) <= field / 2 || player.played == 0 {
        return false;
    }
    let strength = 1.0 - 2.0 * (player.seed as f64 - 1.0) / (field as f64 - 1.0);
    let pace = player.played as f64 * strength;
    player.score as f64 > pace + 0.5
}

fn demote_top_seed_clashes(picks: &mut [StreamPick], table: &StandingsTable, settings: &StreamSettings) {
    let protected = |pick: &StreamPick| {
        let (a, b) = (side(table, pick.game.players.0), side(table, pick.game.players.1));
        a.seed <= settings.protected_seeds && b.seed <= settings.protected_seeds
    };

    let clashes: Vec<usize> = picks
        .iter()
        .enumerate()
        .filter(|(_, p)| protected(p))
        .map(|(i, _)| i)
        .collect();

    for i in clashes {
        let others_matter = picks
            .iter()
            .enumerate()
            .any(|(j, p)| j != i && p.stakes > 0.0);
        if others_matter {
            picks[i].demoted = true;
            picks[i].reasons.push("Top-seed clash held back for the bracket".to_string());
        }
    }
}

fn by_hype(a: &StreamPick, b: &StreamPick) -> Ordering {
    b.hype.total_cmp(&a.hype).then_with(|| a.index.cmp(&b.index))
}

/// Hype order, except that demoted clashes go below every match with stakes
fn order_picks(picks: Vec<StreamPick>) -> Vec<StreamPick> {
    let (mut held, mut ordered): (Vec<_>, Vec<_>) = picks.into_iter().partition(|p| p.demoted);
    ordered.sort_by(by_hype);
    held.sort_by(by_hype);

    let floor = ordered.iter().rposition(|p| p.stakes > 0.0).map_or(0, |i| i + 1);
    for pick in held {
        let at = ordered[floor..]
            .iter()
            .position(|p| by_hype(&pick, p) == Ordering::Less)
            .map_or(ordered.len(), |i| floor + i);
        ordered.insert(at, pick);
    }
    ordered
}
