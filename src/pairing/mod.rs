//! Swiss round generation.
//!
//! Players are split into score groups and folded top half against bottom
//! half. Odd groups float one player down, groups that cannot be paired
//! merge into the next one, and rematches are only accepted once a
//! rematch-free round has been shown impossible.

pub mod cut_round;
pub mod groups;
pub mod search;

use log::{info, warn};

use crate::config::PairingSettings;
use crate::domain::{History, Match, PlayerId, Round, RoundTag, Score, StandingsTable};
use crate::errors::{EngineError, EngineResult};

pub use cut_round::seed_spread;
use groups::{build_groups, variance_rng, ScoreGroup};
use search::{Assignment, Mode, Planner, SearchBudget};

/// Generate the pairings for Swiss round `round_number`.
///
/// The result is deterministic for a given history, round and `seed`.
pub fn generate_round(
    history: &History,
    round_number: u8,
    seed: u64,
    settings: &PairingSettings,
) -> EngineResult<Round> {
    check_phase(history, round_number, settings)?;

    info!("=== Pairing Swiss round {} ===", round_number);

    let table = StandingsTable::from_history(history);
    let bye = choose_bye(&table);
    if let Some(id) = bye {
        info!("  → Bye: player {}", id);
    }

    let mut rng = variance_rng(seed, round_number);
    let groups = build_groups(&table, bye, round_number, &mut rng, settings);
    info!(
        "  → {} score groups: {}",
        groups.len(),
        groups
            .iter()
            .map(|g| format!("{:+}x{}", g.score, g.members.len()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let cut_group = cut_group_index(&groups, round_number, settings);
    let assignment = search_round(&groups, &table, round_number, cut_group, settings)?;

    let round = build_round(&assignment, &table, round_number, bye);
    info!(
        "  → {} matches generated ({} rematches)",
        round.matches.len(),
        assignment.rematches()
    );
    Ok(round)
}

fn check_phase(history: &History, round_number: u8, settings: &PairingSettings) -> EngineResult<()> {
    if round_number == 0 || round_number > settings.swiss_rounds {
        return Err(EngineError::phase(format!(
            "round {} is outside the {} Swiss rounds",
            round_number, settings.swiss_rounds
        )));
    }
    if history.bracket_rounds().next().is_some() {
        return Err(EngineError::phase("bracket phase has already started"));
    }

    let played = history.swiss_round_count();
    if round_number != played + 1 {
        return Err(EngineError::phase(format!(
            "cannot pair round {} after {} recorded Swiss rounds",
            round_number, played
        )));
    }
    history.ensure_swiss_complete()?;

    if history.field_size() < 2 {
        return Err(EngineError::phase("at least two players are needed to pair a round"));
    }
    Ok(())
}

/// Bye for odd fields: lowest score among players without one, worst seed first
fn choose_bye(table: &StandingsTable) -> Option<PlayerId> {
    if table.len() % 2 == 0 {
        return None;
    }
    table
        .iter()
        .min_by_key(|s| (s.has_had_bye(), s.score(), std::cmp::Reverse(s.seed)))
        .map(|s| s.player_id)
}

/// The even-record group of the cut round decides who reaches the main bracket
fn cut_group_index(groups: &[ScoreGroup], round_number: u8, settings: &PairingSettings) -> Option<usize> {
    if round_number != settings.cut_round {
        return None;
    }
    groups.iter().position(|g| g.score == 0)
}

fn search_round(
    groups: &[ScoreGroup],
    table: &StandingsTable,
    round_number: u8,
    cut_group: Option<usize>,
    settings: &PairingSettings,
) -> EngineResult<Assignment> {
    let mut budget = SearchBudget::new(settings.max_attempts);
    let pair_count = groups.iter().map(|g| g.members.len()).sum::<usize>() / 2;

    let mut planner = Planner::new(groups, table, &mut budget, Mode::Strict)
        .with_cut_group(cut_group, settings.cut_round_budget);
    if let Some(found) = planner.run(0) {
        return Ok(found);
    }
    let mut stuck = planner.stuck().to_vec();

    warn!(
        "Round {}: no rematch-free pairing exists, relaxing rematch rule",
        round_number
    );

    for allowance in 1..=pair_count {
        if budget.exhausted() {
            break;
        }
        let mut planner = Planner::new(groups, table, &mut budget, Mode::Relaxed);
        if let Some(found) = planner.run(allowance) {
            return Ok(found);
        }
        stuck = planner.stuck().to_vec();
    }

    stuck.sort_unstable();
    Err(EngineError::InfeasiblePairing {
        round: round_number,
        players: stuck,
    })
}

fn build_round(
    assignment: &Assignment,
    table: &StandingsTable,
    round_number: u8,
    bye: Option<PlayerId>,
) -> Round {
    let tag = RoundTag::Swiss(round_number);

    let mut pairs: Vec<(Score, u32, Match)> = assignment
        .pairs()
        .iter()
        .map(|&(a, b)| {
            let (better, worse) = if a.seed <= b.seed { (a, b) } else { (b, a) };
            if table.have_met(better.id, worse.id) {
                warn!(
                    "Round {}: rematch between seeds {} and {}",
                    round_number, better.seed, worse.seed
                );
            }
            (
                better.score.max(worse.score),
                better.seed,
                Match::pending(better.id, worse.id, tag),
            )
        })
        .collect();
    pairs.sort_by_key(|&(score, seed, _)| (std::cmp::Reverse(score), seed));

    Round {
        tag,
        matches: pairs.into_iter().map(|(_, _, game)| game).collect(),
        bye,
    }
}
