use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::PairingSettings;
use crate::domain::{PlayerId, Score, Seed, StandingsTable};

/// A player waiting to be paired this round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entrant {
    pub id: PlayerId,
    pub seed: Seed,
    pub score: Score,
    pub floats: usize,
}

/// Players sharing a score, in pairing preference order
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGroup {
    pub score: Score,
    pub members: Vec<Entrant>,
}

/// Variance RNG for one round; the same seed and round always give the same stream
pub fn variance_rng(seed: u64, round: u8) -> ChaCha8Rng {
    let key = seed ^ (round as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    ChaCha8Rng::seed_from_u64(key)
}

/// Partition everyone except the bye into score groups, highest first
pub fn build_groups(
    table: &StandingsTable,
    bye: Option<PlayerId>,
    round: u8,
    rng: &mut ChaCha8Rng,
    settings: &PairingSettings,
) -> Vec<ScoreGroup> {
    table
        .score_groups()
        .into_iter()
        .filter_map(|(score, standings)| {
            let members: Vec<Entrant> = standings
                .into_iter()
                .filter(|s| Some(s.player_id) != bye)
                .map(|s| Entrant {
                    id: s.player_id,
                    seed: s.seed,
                    score,
                    floats: s.float_count(),
                })
                .collect();

            if members.is_empty() {
                return None;
            }

            let members = apply_variance(members, round, rng, settings);
            Some(ScoreGroup { score, members })
        })
        .collect()
}

/// Shuffle inside small seed windows that never cross the half boundary
fn apply_variance(
    mut members: Vec<Entrant>,
    round: u8,
    rng: &mut ChaCha8Rng,
    settings: &PairingSettings,
) -> Vec<Entrant> {
    let eligible = round > 1
        && round < settings.cut_round
        && settings.variance_window > 1
        && members.len() >= settings.variance_min_group;
    if !eligible {
        return members;
    }

    let half = members.len() / 2;
    let (top, bottom) = members.split_at_mut(half);
    for chunk in top
        .chunks_mut(settings.variance_window)
        .chain(bottom.chunks_mut(settings.variance_window))
    {
        chunk.shuffle(rng);
    }

    debug!(
        "Round {}: varied order of score group {:+} ({} players)",
        round,
        members[0].score,
        members.len()
    );
    members
}
