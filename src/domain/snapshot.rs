use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use super::history::History;
use super::models::{BracketKind, GameScore, Match, Outcome, Player, PlayerId, Round, RoundTag, Seed};
use crate::errors::{excerpt, EngineError, EngineResult};

/// Tournament state as exported from the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    pub tournament: String,
    pub players: Vec<SnapshotPlayer>,
    #[serde(default)]
    pub rounds: Vec<SnapshotRound>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPlayer {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub seed: Option<Seed>,
}

/// Either `swiss` or `bracket` + `round` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swiss: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket: Option<BracketKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<i32>,
    #[serde(default)]
    pub matches: Vec<SnapshotMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bye: Option<PlayerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMatch {
    pub players: [PlayerId; 2],
    #[serde(default)]
    pub winner: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games: Option<[u8; 2]>,
}

impl TournamentSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
        let snapshot: Self = serde_json::from_str(&json).with_context(|| {
            format!(
                "Failed to parse snapshot {}. First 200 chars: {}",
                path.display(),
                excerpt(&json, 200)
            )
        })?;
        info!(
            "Loaded snapshot for {} ({} players, {} rounds)",
            snapshot.tournament,
            snapshot.players.len(),
            snapshot.rounds.len()
        );
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        fs::write(path, json).with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(())
    }

    /// Initial seeds present in the snapshot itself
    pub fn listed_seeds(&self) -> HashMap<PlayerId, Seed> {
        self.players
            .iter()
            .filter_map(|p| p.seed.map(|seed| (p.id, seed)))
            .collect()
    }

    /// Convert into a validated history; `stored` fills in missing seeds
    pub fn to_history(&self, stored: Option<&HashMap<PlayerId, Seed>>) -> EngineResult<History> {
        let players = self
            .players
            .iter()
            .map(|p| {
                let seed = p
                    .seed
                    .or_else(|| stored.and_then(|s| s.get(&p.id).copied()))
                    .ok_or_else(|| {
                        EngineError::inconsistent("seeding", vec![p.id], format!("no initial seed for {}", p.name))
                    })?;
                Ok(Player::new(p.id, p.name.clone(), seed))
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let rounds = self
            .rounds
            .iter()
            .map(SnapshotRound::to_round)
            .collect::<EngineResult<Vec<_>>>()?;

        History::new(players, rounds)
    }

    pub fn from_history(tournament: &str, history: &History) -> Self {
        Self {
            tournament: tournament.to_string(),
            players: history
                .players()
                .iter()
                .map(|p| SnapshotPlayer {
                    id: p.id,
                    name: p.name.clone(),
                    seed: Some(p.seed),
                })
                .collect(),
            rounds: history.rounds().iter().map(SnapshotRound::from_round).collect(),
        }
    }
}

impl SnapshotRound {
    fn tag(&self) -> EngineResult<RoundTag> {
        match (self.swiss, self.bracket, self.round) {
            (Some(number), None, _) => Ok(RoundTag::Swiss(number)),
            (None, Some(bracket), Some(round)) => Ok(RoundTag::Bracket { bracket, round }),
            _ => Err(EngineError::inconsistent(
                "snapshot",
                Vec::new(),
                "round must set either `swiss` or both `bracket` and `round`",
            )),
        }
    }

    fn to_round(&self) -> EngineResult<Round> {
        let tag = self.tag()?;
        let matches = self
            .matches
            .iter()
            .map(|m| Match {
                players: (m.players[0], m.players[1]),
                round: tag,
                outcome: m.winner.map(Outcome::Winner).unwrap_or(Outcome::Unplayed),
                score: m.games.map(|[first, second]| GameScore { first, second }),
            })
            .collect();

        Ok(Round {
            tag,
            matches,
            bye: self.bye,
        })
    }

    pub fn from_round(round: &Round) -> Self {
        let (swiss, bracket, number) = match round.tag {
            RoundTag::Swiss(n) => (Some(n), None, None),
            RoundTag::Bracket { bracket, round } => (None, Some(bracket), Some(round)),
        };
        Self {
            swiss,
            bracket,
            round: number,
            matches: round
                .matches
                .iter()
                .map(|m| SnapshotMatch {
                    players: [m.players.0, m.players.1],
                    winner: m.winner(),
                    games: m.score.map(|s| [s.first, s.second]),
                })
                .collect(),
            bye: round.bye,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "tournament": "weekly-42",
        "players": [
            {"id": 11, "name": "Alex", "seed": 1},
            {"id": 12, "name": "Blake", "seed": 2},
            {"id": 13, "name": "Casey"},
            {"id": 14, "name": "Drew", "seed": 4}
        ],
        "rounds": [
            {"swiss": 1, "matches": [
                {"players": [11, 13], "winner": 13, "games": [1, 2]},
                {"players": [12, 14], "winner": 12}
            ]},
            {"bracket": "main", "round": -1, "matches": [
                {"players": [11, 14]}
            ]}
        ]
    }"#;

    #[test]
    fn test_missing_seed_comes_from_store() {
        let snapshot: TournamentSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        assert!(snapshot.to_history(None).is_err());

        let stored = HashMap::from([(13, 3)]);
        let history = snapshot.to_history(Some(&stored)).unwrap();
        assert_eq!(history.seed_of(13), Some(3));

        let first = &history.rounds()[0];
        assert_eq!(first.matches[0].winner(), Some(13));
        assert_eq!(first.matches[0].score, Some(GameScore { first: 1, second: 2 }));

        let bracket = &history.rounds()[1];
        assert_eq!(
            bracket.tag,
            RoundTag::Bracket {
                bracket: BracketKind::Main,
                round: -1
            }
        );
        assert!(!bracket.is_complete());
    }

    #[test]
    fn test_rejects_ambiguous_round() {
        let mut snapshot: TournamentSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        snapshot.rounds[0].bracket = Some(BracketKind::Main);
        let stored = HashMap::from([(13, 3)]);
        assert!(snapshot.to_history(Some(&stored)).is_err());
    }

    #[test]
    fn test_history_export_keeps_rounds() {
        let snapshot: TournamentSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
        let stored = HashMap::from([(13, 3)]);
        let history = snapshot.to_history(Some(&stored)).unwrap();

        let exported = TournamentSnapshot::from_history("weekly-42", &history);
        assert_eq!(exported.listed_seeds().len(), 4);
        assert_eq!(exported.rounds[1].round, Some(-1));
        assert_eq!(exported.to_history(None).unwrap(), history);
    }

    #[test]
    fn test_broken_file_with_accent_at_excerpt_edge() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        // 'é' spans bytes 199 and 200
        let body = format!("{{\"tournament\": \"{}é and no closing quote", "x".repeat(183));
        assert_eq!(body.find('é'), Some(199));
        fs::write(&path, &body).unwrap();

        let err = TournamentSnapshot::load(&path).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to parse snapshot"));
        assert!(message.contains("xé"));
        assert!(!message.contains("no closing"));
    }
}
