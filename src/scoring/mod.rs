//! Swiss standings: record, opponent quality and the Cinderella bonus.

pub mod cinderella;
pub mod points;

use std::cmp::Ordering;

use log::{debug, info};
use serde::Serialize;

use crate::config::ScoringSettings;
use crate::domain::{History, PlayerId, Score, Seed, StandingsTable};
use crate::errors::EngineResult;

pub use cinderella::{cinderella_bonus, CinderellaInputs};
pub use points::QualityEntry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub record: f64,
    pub quality: f64,
    pub cinderella: f64,
    pub total: f64,
    pub quality_entries: Vec<QualityEntry>,
    pub cinderella_inputs: CinderellaInputs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    /// 1-based Swiss rank
    pub rank: usize,
    pub player_id: PlayerId,
    pub seed: Seed,
    pub wins: u32,
    pub losses: u32,
    pub breakdown: ScoreBreakdown,
}

impl RankedPlayer {
    pub fn score(&self) -> Score {
        self.wins as Score - self.losses as Score
    }

    pub fn record(&self) -> String {
        format!("{}-{}", self.wins, self.losses)
    }
}

/// Rank every player on the recorded Swiss rounds.
///
/// Order is score, then total points, then initial seed, so the result is
/// a total order and identical histories always rank identically.
pub fn compute_standings(history: &History, settings: &ScoringSettings) -> EngineResult<Vec<RankedPlayer>> {
    history.ensure_swiss_complete()?;

    let table = StandingsTable::from_history(history);
    info!(
        "=== Scoring {} players after {} Swiss rounds ===",
        table.len(),
        table.rounds_played()
    );

    let mut ranked: Vec<RankedPlayer> = table
        .iter()
        .map(|standing| {
            let quality_entries = points::quality_entries(standing, settings);
            let record = points::record_points(standing, settings);
            let quality: f64 = quality_entries.iter().map(|e| e.adjustment).sum();

            let group_floor = table.players_at_or_above(standing.score());
            let cinderella_inputs = cinderella_bonus(standing.seed, group_floor, table.len(), settings);
            let cinderella = cinderella_inputs.bonus;

            RankedPlayer {
                rank: 0,
                player_id: standing.player_id,
                seed: standing.seed,
                wins: standing.wins,
                losses: standing.losses,
                breakdown: ScoreBreakdown {
                    record,
                    quality,
                    cinderella,
                    total: record + quality + cinderella,
                    quality_entries,
                    cinderella_inputs,
                },
            }
        })
        .collect();

    ranked.sort_by(compare_ranked);
    for (index, player) in ranked.iter_mut().enumerate() {
        player.rank = index + 1;
    }

    if let Some(leader) = ranked.first() {
        debug!(
            "Leader: seed {} at {} ({:.1} points)",
            leader.seed,
            leader.record(),
            leader.breakdown.total
        );
    }
    info!("  → {} players ranked", ranked.len());
    Ok(ranked)
}

fn compare_ranked(a: &RankedPlayer, b: &RankedPlayer) -> Ordering {
    b.score()
        .cmp(&a.score())
        .then_with(|| b.breakdown.total.total_cmp(&a.breakdown.total))
        .then_with(|| a.seed.cmp(&b.seed))
}
