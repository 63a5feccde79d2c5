//! Split the Swiss ranking into the Main and Redemption brackets.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::BracketSettings;
use crate::domain::{BracketKind, PlayerId, Seed, StandingsTable};
use crate::errors::{EngineError, EngineResult};
use crate::scoring::RankedPlayer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketEntry {
    pub player_id: PlayerId,
    pub bracket: BracketKind,
    /// Seed inside the bracket, 1-based
    pub seed: Seed,
    pub swiss_rank: usize,
    pub points: f64,
}

/// Once the bracket phase starts this is an input, not something to recompute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketAssignment {
    pub main_size: usize,
    pub main: Vec<BracketEntry>,
    pub redemption: Vec<BracketEntry>,
}

impl BracketAssignment {
    pub fn bracket(&self, kind: BracketKind) -> &[BracketEntry] {
        match kind {
            BracketKind::Main => &self.main,
            BracketKind::Redemption => &self.redemption,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &BracketEntry> {
        self.main.iter().chain(self.redemption.iter())
    }

    pub fn entry_for(&self, player: PlayerId) -> Option<&BracketEntry> {
        self.entries().find(|e| e.player_id == player)
    }

    pub fn len(&self) -> usize {
        self.main.len() + self.redemption.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Top `main_size` of the ranking go to Main, everyone else to Redemption,
/// both reseeded from 1 in ranking order
pub fn seed_brackets(standings: &[RankedPlayer], main_size: usize) -> EngineResult<BracketAssignment> {
    if main_size > standings.len() {
        return Err(EngineError::InvalidBracketSize {
            main_size,
            players: standings.len(),
        });
    }

    let mut ranked: Vec<&RankedPlayer> = standings.iter().collect();
    ranked.sort_by_key(|p| p.rank);
    let (main, redemption) = ranked.split_at(main_size);

    let assignment = BracketAssignment {
        main_size,
        main: reseed(main, BracketKind::Main),
        redemption: reseed(redemption, BracketKind::Redemption),
    };

    info!(
        "Brackets seeded: {} Main, {} Redemption",
        assignment.main.len(),
        assignment.redemption.len()
    );
    Ok(assignment)
}

/// `seed_brackets` followed by rematch avoidance inside each bracket.
/// Every caller that needs the assignment the operator sees goes through here.
pub fn arrange_brackets(
    standings: &[RankedPlayer],
    main_size: usize,
    table: &StandingsTable,
    settings: &BracketSettings,
) -> EngineResult<BracketAssignment> {
    let mut assignment = seed_brackets(standings, main_size)?;
    assignment.main = avoid_first_round_rematches(&assignment.main, table, settings);
    assignment.redemption = avoid_first_round_rematches(&assignment.redemption, table, settings);
    Ok(assignment)
}

fn reseed(players: &[&RankedPlayer], bracket: BracketKind) -> Vec<BracketEntry> {
    players
        .iter()
        .enumerate()
        .map(|(index, p)| BracketEntry {
            player_id: p.player_id,
            bracket,
            seed: index as Seed + 1,
            swiss_rank: p.rank,
            points: p.breakdown.total,
        })
        .collect()
}

/// Opening pairs of a standard layout (1 v k, 2 v k-1, ...) that repeat a Swiss meeting
pub fn first_round_rematches(entries: &[BracketEntry], table: &StandingsTable) -> Vec<(PlayerId, PlayerId)> {
    opening_pairs(entries)
        .filter(|(a, b)| table.have_met(a.player_id, b.player_id))
        .map(|(a, b)| (a.player_id, b.player_id))
        .collect()
}

fn opening_pairs(entries: &[BracketEntry]) -> impl Iterator<Item = (&BracketEntry, &BracketEntry)> {
    let size = entries.len();
    (0..size / 2).map(move |i| (&entries[i], &entries[size - 1 - i]))
}

/// Reorder one bracket to cut down first-round rematches.
///
/// Adjacent seeds are swapped first; if rematches remain, seeds two to four
/// apart are swapped when their Swiss points are close. A swap is kept only
/// when it lowers the rematch count. Players never change bracket.
pub fn avoid_first_round_rematches(
    entries: &[BracketEntry],
    table: &StandingsTable,
    settings: &BracketSettings,
) -> Vec<BracketEntry> {
    let mut best = entries.to_vec();
    let mut best_count = first_round_rematches(&best, table).len();
    if best_count == 0 {
        return best;
    }

    let kind = entries[0].bracket;
    warn!("{} bracket opens with {} rematch(es)", kind, best_count);

    let try_swap = |best: &mut Vec<BracketEntry>, best_count: &mut usize, i: usize, j: usize| {
        let mut candidate = best.clone();
        candidate.swap(i, j);
        let count = first_round_rematches(&candidate, table).len();
        if count < *best_count {
            debug!("  → swapped bracket seeds {} and {}: {} rematch(es) left", i + 1, j + 1, count);
            *best = candidate;
            *best_count = count;
        }
    };

    for i in 0..best.len().saturating_sub(1) {
        try_swap(&mut best, &mut best_count, i, i + 1);
    }

    'wide: for i in 0..best.len() {
        for j in (i + 2)..(i + 5).min(best.len()) {
            if best_count == 0 {
                break 'wide;
            }
            if (best[i].points - best[j].points).abs() < settings.swap_points_window {
                try_swap(&mut best, &mut best_count, i, j);
            }
        }
    }

    for (index, entry) in best.iter_mut().enumerate() {
        entry.seed = index as Seed + 1;
    }

    if best_count > 0 {
        warn!("{} bracket keeps {} unavoidable rematch(es)", kind, best_count);
    } else {
        info!("{} bracket rearranged without first-round rematches", kind);
    }
    best
}
