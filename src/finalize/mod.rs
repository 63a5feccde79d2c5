//! Final tournament standings: Swiss ranking merged with bracket placements.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::bracket::BracketAssignment;
use crate::domain::{BracketKind, History, PlayerId};
use crate::errors::{with_parse_context, EngineError, EngineResult};
use crate::scoring::RankedPlayer;

/// Bracket placements as reported by the platform (1 = winner)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placements {
    #[serde(default)]
    pub main: BTreeMap<PlayerId, u32>,
    #[serde(default)]
    pub redemption: BTreeMap<PlayerId, u32>,
}

impl Placements {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read placements file {}", path.display()))?;
        let placements: Self = with_parse_context(serde_json::from_str(&text), "bracket placements")?;
        info!(
            "Loaded placements: {} Main, {} Redemption",
            placements.main.len(),
            placements.redemption.len()
        );
        Ok(placements)
    }

    pub fn bracket(&self, kind: BracketKind) -> &BTreeMap<PlayerId, u32> {
        match kind {
            BracketKind::Main => &self.main,
            BracketKind::Redemption => &self.redemption,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BracketRecord {
    pub wins: u32,
    pub losses: u32,
}

/// Win/loss record of every player over the bracket rounds of a history
pub fn bracket_records(history: &History) -> BTreeMap<PlayerId, BracketRecord> {
    let mut records: BTreeMap<PlayerId, BracketRecord> = BTreeMap::new();
    for game in history.bracket_rounds().flat_map(|r| r.matches.iter()) {
        if let (Some(winner), Some(loser)) = (game.winner(), game.loser()) {
            records.entry(winner).or_default().wins += 1;
            records.entry(loser).or_default().losses += 1;
        }
    }
    records
}

/// Everything known about the bracket phase
#[derive(Debug, Clone, PartialEq)]
pub struct BracketResults {
    pub assignment: BracketAssignment,
    pub placements: Placements,
    pub records: BTreeMap<PlayerId, BracketRecord>,
}

impl BracketResults {
    pub fn new(assignment: BracketAssignment, placements: Placements, history: &History) -> Self {
        Self {
            assignment,
            placements,
            records: bracket_records(history),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalPlacement {
    /// 1-based overall finishing position
    pub position: usize,
    pub player_id: PlayerId,
    pub swiss_rank: usize,
    pub bracket: Option<BracketKind>,
    pub bracket_placement: Option<u32>,
    pub label: String,
    pub bracket_record: Option<BracketRecord>,
}

/// Merge the Swiss ranking with bracket results.
///
/// Without a bracket phase the Swiss ranking is returned unchanged. With one,
/// every Main finisher ranks above every Redemption finisher; inside a bracket
/// players are ordered by placement, then Swiss rank.
pub fn finalize(swiss: &[RankedPlayer], brackets: Option<&BracketResults>) -> EngineResult<Vec<FinalPlacement>> {
    let Some(results) = brackets else {
        return Ok(swiss
            .iter()
            .map(|p| FinalPlacement {
                position: p.rank,
                player_id: p.player_id,
                swiss_rank: p.rank,
                bracket: None,
                bracket_placement: None,
                label: format!("Swiss {}", p.record()),
                bracket_record: None,
            })
            .collect());
    };

    info!("=== Final standings ===");

    if let Some(missing) = swiss.iter().find(|p| results.assignment.entry_for(p.player_id).is_none()) {
        return Err(EngineError::phase(format!(
            "player {} has no bracket assignment",
            missing.player_id
        )));
    }

    let mut finishers = Vec::with_capacity(swiss.len());
    for kind in [BracketKind::Main, BracketKind::Redemption] {
        let placements = results.placements.bracket(kind);
        let mut bracket: Vec<(u32, usize, PlayerId)> = Vec::new();

        for entry in results.assignment.bracket(kind) {
            let Some(&placement) = placements.get(&entry.player_id) else {
                return Err(EngineError::phase(format!(
                    "{} bracket has no placement for player {}",
                    kind, entry.player_id
                )));
            };
            bracket.push((placement, entry.swiss_rank, entry.player_id));
        }

        bracket.sort_unstable();
        finishers.extend(bracket.into_iter().map(|(placement, rank, id)| (kind, placement, rank, id)));
    }

    let extra = results
        .placements
        .main
        .keys()
        .chain(results.placements.redemption.keys())
        .filter(|id| results.assignment.entry_for(**id).is_none())
        .count();
    if extra > 0 {
        warn!("Ignoring {} placements for players outside the brackets", extra);
    }

    let placements = finishers
        .into_iter()
        .enumerate()
        .map(|(index, (kind, placement, swiss_rank, player_id))| FinalPlacement {
            position: index + 1,
            player_id,
            swiss_rank,
            bracket: Some(kind),
            bracket_placement: Some(placement),
            label: placement_label(kind, placement),
            bracket_record: results.records.get(&player_id).copied(),
        })
        .collect::<Vec<_>>();

    info!("  → {} players placed", placements.len());
    Ok(placements)
}

/// Human-readable finishing label for a bracket placement
pub fn placement_label(kind: BracketKind, placement: u32) -> String {
    let label = match placement {
        1 => "Champion",
        2 => "Runner-up",
        3 => "3rd place",
        4 => "4th place",
        5..=6 => "5th-6th place",
        7..=8 => "7th-8th place",
        9..=12 => "9th-12th place",
        13..=16 => "13th-16th place",
        _ => return format!("{}{} place", prefix(kind), ordinal(placement)),
    };
    format!("{}{}", prefix(kind), label)
}

fn prefix(kind: BracketKind) -> &'static str {
    match kind {
        BracketKind::Main => "",
        BracketKind::Redemption => "Redemption ",
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::seed_brackets;
    use crate::domain::{Match, Outcome, Player, Round, RoundTag};
    use crate::scoring::{CinderellaInputs, ScoreBreakdown};

    fn ranked(n: usize) -> Vec<RankedPlayer> {
        (1..=n)
            .map(|rank| RankedPlayer {
                rank,
                player_id: rank as u64,
                seed: rank as u32,
                wins: 1,
                losses: 1,
                breakdown: ScoreBreakdown {
                    record: 0.0,
                    quality: 0.0,
                    cinderella: 0.0,
                    total: 0.0,
                    quality_entries: Vec::new(),
                    cinderella_inputs: CinderellaInputs {
                        seed: rank as u32,
                        group_floor: n,
                        tolerance: 0,
                        places: 0,
                        quartile: 0,
                        multiplier: 0.5,
                        bonus: 0.0,
                    },
                },
            })
            .collect()
    }

    fn history(n: u64, bracket_games: &[(u64, u64)]) -> History {
        let players = (1..=n).map(|s| Player::new(s, format!("P{}", s), s as u32)).collect();
        let tag = RoundTag::Bracket {
            bracket: BracketKind::Main,
            round: 1,
        };
        let mut rounds = Vec::new();
        if !bracket_games.is_empty() {
            let mut round = Round::new(tag);
            for &(winner, loser) in bracket_games {
                let mut game = Match::pending(winner, loser, tag);
                game.outcome = Outcome::Winner(winner);
                round.matches.push(game);
            }
            rounds.push(round);
        }
        History::new(players, rounds).unwrap()
    }

    #[test]
    fn test_identity_without_brackets() {
        let swiss = ranked(5);
        let placements = finalize(&swiss, None).unwrap();
        let ids: Vec<_> = placements.iter().map(|p| p.player_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(placements.iter().all(|p| p.position == p.swiss_rank));
    }

    #[test]
    fn test_main_outranks_redemption() {
        let swiss = ranked(6);
        let assignment = seed_brackets(&swiss, 4).unwrap();
        let placements = Placements {
            main: BTreeMap::from([(1, 3), (2, 1), (3, 2), (4, 3)]),
            redemption: BTreeMap::from([(5, 2), (6, 1)]),
        };
        let results = BracketResults::new(assignment, placements, &history(6, &[(2, 3), (1, 4)]));
        let finals = finalize(&swiss, Some(&results)).unwrap();

        let order: Vec<_> = finals.iter().map(|p| p.player_id).collect();
        assert_eq!(order, vec![2, 3, 1, 4, 6, 5]);
        assert_eq!(finals[0].label, "Champion");
        assert_eq!(finals[2].label, "3rd place");
        assert_eq!(finals[4].label, "Redemption Champion");
        assert_eq!(finals[0].bracket_record, Some(BracketRecord { wins: 1, losses: 0 }));
        assert_eq!(finals[5].bracket_record, None);
    }

    #[test]
    fn test_missing_placement_is_a_phase_error() {
        let swiss = ranked(4);
        let assignment = seed_brackets(&swiss, 2).unwrap();
        let placements = Placements {
            main: BTreeMap::from([(1, 1), (2, 2)]),
            redemption: BTreeMap::from([(3, 1)]),
        };
        let results = BracketResults::new(assignment, placements, &history(4, &[]));
        assert!(matches!(
            finalize(&swiss, Some(&results)),
            Err(EngineError::InvalidPhaseState { .. })
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(placement_label(BracketKind::Main, 2), "Runner-up");
        assert_eq!(placement_label(BracketKind::Main, 6), "5th-6th place");
        assert_eq!(placement_label(BracketKind::Redemption, 13), "Redemption 13th-16th place");
        assert_eq!(placement_label(BracketKind::Main, 21), "21st place");
        assert_eq!(placement_label(BracketKind::Main, 17), "17th place");
    }

    #[test]
    fn test_placements_parse_from_json() {
        let placements: Placements = serde_json::from_str(r#"{"main": {"7": 1}, "redemption": {"9": 2}}"#).unwrap();
        assert_eq!(placements.bracket(BracketKind::Main).get(&7), Some(&1));
        assert_eq!(placements.bracket(BracketKind::Redemption).get(&9), Some(&2));
    }
}
