//! The "why" report: every decision the engine made about one player.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::bracket::{arrange_brackets, BracketAssignment};
use crate::config::EngineConfig;
use crate::domain::{BracketKind, History, Player, PlayerId, RoundTag, Score, Seed, StandingsTable};
use crate::errors::{EngineError, EngineResult};
use crate::scoring::{compute_standings, ScoreBreakdown};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentLine {
    pub round: u8,
    pub opponent: PlayerId,
    pub opponent_name: String,
    pub opponent_seed: Seed,
    pub won: Option<bool>,
    pub own_score: Score,
    pub opponent_score: Score,
    /// Record after this round, e.g. "2-1"
    pub running_record: String,
    pub floated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketRationale {
    pub swiss_rank: usize,
    pub main_size: usize,
    pub bracket: BracketKind,
    pub bracket_seed: Seed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketMatchLine {
    pub label: String,
    pub opponent: PlayerId,
    pub opponent_name: String,
    pub won: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerReport {
    pub player: Player,
    pub record: String,
    pub opponents: Vec<OpponentLine>,
    pub score_history: Vec<(u8, Score)>,
    pub floats: Vec<u8>,
    pub byes: Vec<u8>,
    pub swiss_rank: Option<usize>,
    pub breakdown: Option<ScoreBreakdown>,
    /// Why no breakdown is available yet
    pub pending: Option<String>,
    pub bracket: Option<BracketRationale>,
    pub bracket_matches: Vec<BracketMatchLine>,
}

/// Reconstruct the full decision trail for the player called `name`.
///
/// `brackets` is the assignment the bracket phase actually uses. Without one
/// it is derived the same way the `bracket` command derives it.
pub fn explain_player(
    history: &History,
    name: &str,
    config: &EngineConfig,
    brackets: Option<&BracketAssignment>,
) -> EngineResult<PlayerReport> {
    let player = history
        .player_by_name(name)
        .cloned()
        .ok_or_else(|| EngineError::UnknownPlayer { name: name.to_string() })?;
    debug!("Explaining player {} (seed {})", player.name, player.seed);

    let table = StandingsTable::from_history(history);
    let standing = table.get(player.id).ok_or_else(|| EngineError::UnknownPlayer {
        name: name.to_string(),
    })?;

    let opponents = opponent_lines(history, standing.player_id, &standing.meetings, &standing.byes);

    let mut report = PlayerReport {
        record: standing.record(),
        opponents,
        score_history: standing.score_history.clone(),
        floats: standing.floats.clone(),
        byes: standing.byes.clone(),
        swiss_rank: None,
        breakdown: None,
        pending: None,
        bracket: None,
        bracket_matches: bracket_lines(history, player.id),
        player,
    };

    match compute_standings(history, &config.scoring) {
        Ok(ranked) => {
            if let Some(entry) = ranked.iter().find(|r| r.player_id == report.player.id) {
                report.swiss_rank = Some(entry.rank);
                report.breakdown = Some(entry.breakdown.clone());
            }
            report.bracket = bracket_rationale(history, &ranked, report.player.id, config, brackets);
        }
        Err(EngineError::InvalidPhaseState { reason }) => report.pending = Some(reason),
        Err(other) => return Err(other),
    }

    Ok(report)
}

fn opponent_lines(
    history: &History,
    player: PlayerId,
    meetings: &[crate::domain::Meeting],
    byes: &[u8],
) -> Vec<OpponentLine> {
    let mut wins = 0;
    let mut losses = 0;
    let mut lines = Vec::new();

    let rounds = meetings
        .iter()
        .map(|m| m.round)
        .chain(byes.iter().copied())
        .max()
        .unwrap_or(0);

    for round in 1..=rounds {
        if byes.contains(&round) {
            wins += 1;
            continue;
        }
        let Some(meeting) = meetings.iter().find(|m| m.round == round) else {
            continue;
        };
        match meeting.won {
            Some(true) => wins += 1,
            Some(false) => losses += 1,
            None => {}
        }
        let opponent = history.player(meeting.opponent);
        lines.push(OpponentLine {
            round,
            opponent: meeting.opponent,
            opponent_name: opponent.map(|p| p.name.clone()).unwrap_or_default(),
            opponent_seed: opponent.map(|p| p.seed).unwrap_or_default(),
            won: meeting.won,
            own_score: meeting.own_score,
            opponent_score: meeting.opponent_score,
            running_record: format!("{}-{}", wins, losses),
            floated: meeting.own_score > meeting.opponent_score,
        });
    }

    debug!("Player {}: {} Swiss meetings", player, lines.len());
    lines
}

fn bracket_rationale(
    history: &History,
    ranked: &[crate::scoring::RankedPlayer],
    player: PlayerId,
    config: &EngineConfig,
    brackets: Option<&BracketAssignment>,
) -> Option<BracketRationale> {
    let derived;
    let assignment = match brackets {
        Some(assignment) => assignment,
        None => {
            let finished = history.swiss_round_count() >= config.pairing.swiss_rounds;
            if !finished || config.bracket.main_size > ranked.len() {
                return None;
            }
            let table = StandingsTable::from_history(history);
            derived = arrange_brackets(ranked, config.bracket.main_size, &table, &config.bracket).ok()?;
            &derived
        }
    };
    let entry = assignment.entry_for(player)?;
    Some(BracketRationale {
        swiss_rank: entry.swiss_rank,
        main_size: assignment.main_size,
        bracket: entry.bracket,
        bracket_seed: entry.seed,
    })
}

fn bracket_lines(history: &History, player: PlayerId) -> Vec<BracketMatchLine> {
    history
        .bracket_rounds()
        .flat_map(|round| round.matches.iter())
        .filter_map(|game| {
            let opponent = game.opponent_of(player)?;
            let RoundTag::Bracket { .. } = game.round else {
                return None;
            };
            Some(BracketMatchLine {
                label: game.round.to_string(),
                opponent,
                opponent_name: history.player(opponent).map(|p| p.name.clone()).unwrap_or_default(),
                won: game.winner().map(|w| w == player),
            })
        })
        .collect()
}

fn result_word(won: Option<bool>) -> &'static str {
    match won {
        Some(true) => "W",
        Some(false) => "L",
        None => "-",
    }
}

impl fmt::Display for PlayerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (seed {}) - Swiss record {}", self.player.name, self.player.seed, self.record)?;

        writeln!(f, "Opponents:")?;
        for line in &self.opponents {
            writeln!(
                f,
                "  R{}: {} vs {} (seed {}) at {:+} vs {:+}{} -> {}",
                line.round,
                result_word(line.won),
                line.opponent_name,
                line.opponent_seed,
                line.own_score,
                line.opponent_score,
                if line.floated { ", floated down" } else { "" },
                line.running_record
            )?;
        }
        for round in &self.byes {
            writeln!(f, "  R{}: bye (counted as a win)", round)?;
        }

        let groups: Vec<String> = self
            .score_history
            .iter()
            .map(|(round, score)| format!("R{} {:+}", round, score))
            .collect();
        writeln!(f, "Score groups: {}", groups.join(", "))?;
        if !self.floats.is_empty() {
            writeln!(f, "Floated down in rounds {:?}", self.floats)?;
        }

        match (&self.breakdown, &self.pending) {
            (Some(b), _) => {
                writeln!(
                    f,
                    "Points: record {:.1} + quality {:.1} + cinderella {:.1} = {:.1}",
                    b.record, b.quality, b.cinderella, b.total
                )?;
                for q in b.quality_entries.iter().filter(|q| q.adjustment != 0.0) {
                    writeln!(
                        f,
                        "  R{} quality {:+.1} ({} at {:+} vs {:+})",
                        q.round,
                        q.adjustment,
                        if q.won { "won" } else { "lost" },
                        q.own_score,
                        q.opponent_score
                    )?;
                }
                let c = &b.cinderella_inputs;
                writeln!(
                    f,
                    "  Cinderella: seed {} vs group floor {} (tolerance {}) = {} places, x{:.1} -> {:.1}",
                    c.seed, c.group_floor, c.tolerance, c.places, c.multiplier, c.bonus
                )?;
            }
            (None, Some(reason)) => writeln!(f, "Points: pending ({})", reason)?,
            (None, None) => {}
        }

        if let Some(rank) = self.swiss_rank {
            writeln!(f, "Swiss rank: {}", rank)?;
        }
        if let Some(b) = &self.bracket {
            writeln!(
                f,
                "Bracket: rank {} vs main size {} -> {} seed {}",
                b.swiss_rank, b.main_size, b.bracket, b.bracket_seed
            )?;
        }
        for line in &self.bracket_matches {
            writeln!(f, "  {}: {} vs {}", line.label, result_word(line.won), line.opponent_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Match, Outcome, Round};

    fn played(tag: RoundTag, winner: PlayerId, loser: PlayerId) -> Match {
        let mut game = Match::pending(winner, loser, tag);
        game.outcome = Outcome::Winner(winner);
        game
    }

    fn sample() -> History {
        let players = vec![
            Player::new(11, "Alice", 1),
            Player::new(12, "Bob", 2),
            Player::new(13, "Cara", 3),
            Player::new(14, "Dan", 4),
        ];
        let r1 = RoundTag::Swiss(1);
        let r2 = RoundTag::Swiss(2);
        let rounds = vec![
            Round {
                tag: r1,
                matches: vec![played(r1, 11, 13), played(r1, 14, 12)],
                bye: None,
            },
            Round {
                tag: r2,
                matches: vec![played(r2, 14, 11), played(r2, 12, 13)],
                bye: None,
            },
        ];
        History::new(players, rounds).unwrap()
    }

    #[test]
    fn test_unknown_player() {
        let err = explain_player(&sample(), "Zed", &EngineConfig::default(), None).unwrap_err();
        assert_eq!(err, EngineError::UnknownPlayer { name: "Zed".into() });
    }

    #[test]
    fn test_report_trail() {
        let config = EngineConfig::default();
        let report = explain_player(&sample(), "dan", &config, None).unwrap();

        assert_eq!(report.record, "2-0");
        let trail: Vec<_> = report
            .opponents
            .iter()
            .map(|o| (o.round, o.opponent_name.as_str(), o.won, o.running_record.as_str()))
            .collect();
        assert_eq!(trail, vec![(1, "Bob", Some(true), "1-0"), (2, "Alice", Some(true), "2-0")]);
        assert_eq!(report.score_history, vec![(1, 0), (2, 1)]);
        assert_eq!(report.swiss_rank, Some(1));
        assert!(report.breakdown.as_ref().unwrap().cinderella > 0.0);
        // only two of five Swiss rounds played
        assert!(report.bracket.is_none());

        let text = report.to_string();
        assert!(text.contains("Dan (seed 4)"));
        assert!(text.contains("Swiss rank: 1"));
    }

    #[test]
    fn test_pending_round_is_reported() {
        let history = sample();
        let r3 = RoundTag::Swiss(3);
        let round = Round {
            tag: r3,
            matches: vec![Match::pending(14, 12, r3), Match::pending(11, 13, r3)],
            bye: None,
        };
        let history = history.with_round(round).unwrap();
        let report = explain_player(&history, "Bob", &EngineConfig::default(), None).unwrap();

        assert!(report.breakdown.is_none());
        assert!(report.pending.is_some());
        assert_eq!(report.opponents.last().map(|o| o.won), Some(None));
    }

    #[test]
    fn test_bracket_matches_are_labelled() {
        let history = sample();
        let tag = RoundTag::Bracket {
            bracket: BracketKind::Redemption,
            round: -1,
        };
        let mut round = Round::new(tag);
        round.matches.push(played(tag, 13, 12));
        let history = history.with_round(round).unwrap();

        let report = explain_player(&history, "Bob", &EngineConfig::default(), None).unwrap();
        assert_eq!(report.bracket_matches.len(), 1);
        assert_eq!(report.bracket_matches[0].label, "Redemption L1");
        assert_eq!(report.bracket_matches[0].won, Some(false));
    }

    #[test]
    fn test_given_brackets_are_reported_as_is() {
        use crate::bracket::BracketEntry;

        let mut config = EngineConfig::default();
        config.pairing.swiss_rounds = 2;
        config.bracket.main_size = 4;

        // Main of two, seeded away from the Swiss order
        let entry = |player_id, bracket, seed, swiss_rank| BracketEntry {
            player_id,
            bracket,
            seed,
            swiss_rank,
            points: 0.0,
        };
        let assignment = BracketAssignment {
            main_size: 2,
            main: vec![entry(12, BracketKind::Main, 1, 2), entry(14, BracketKind::Main, 2, 1)],
            redemption: vec![
                entry(11, BracketKind::Redemption, 1, 3),
                entry(13, BracketKind::Redemption, 2, 4),
            ],
        };

        let report = explain_player(&sample(), "Dan", &config, Some(&assignment)).unwrap();
        let rationale = report.bracket.unwrap();
        assert_eq!(rationale.main_size, 2);
        assert_eq!(rationale.bracket, BracketKind::Main);
        assert_eq!(rationale.bracket_seed, 2);

        // without one, the whole field of four goes to Main in ranking order
        let derived = explain_player(&sample(), "Dan", &config, None).unwrap();
        let rationale = derived.bracket.unwrap();
        assert_eq!(rationale.main_size, 4);
        assert_eq!(rationale.bracket_seed, 1);
    }
}
