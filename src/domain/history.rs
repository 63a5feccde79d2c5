use std::collections::{BTreeSet, HashMap, HashSet};

use super::models::{Player, PlayerId, Round, RoundTag};
use crate::errors::{EngineError, EngineResult};

/// Immutable log of everything that happened in a tournament
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    players: Vec<Player>,
    rounds: Vec<Round>,
}

impl History {
    /// Build a history and check it against the tournament invariants
    pub fn new(players: Vec<Player>, rounds: Vec<Round>) -> EngineResult<Self> {
        let history = Self { players, rounds };
        history.validate()?;
        Ok(history)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn field_size(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Case-insensitive lookup by display name
    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        let wanted = name.trim().to_lowercase();
        self.players.iter().find(|p| p.name.to_lowercase() == wanted)
    }

    pub fn seed_of(&self, id: PlayerId) -> Option<u32> {
        self.player(id).map(|p| p.seed)
    }

    /// Players ordered by initial seed
    pub fn players_by_seed(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.iter().collect();
        players.sort_by_key(|p| p.seed);
        players
    }

    pub fn swiss_rounds(&self) -> impl Iterator<Item = &Round> {
        self.rounds.iter().filter(|r| r.tag.is_swiss())
    }

    pub fn bracket_rounds(&self) -> impl Iterator<Item = &Round> {
        self.rounds.iter().filter(|r| !r.tag.is_swiss())
    }

    pub fn swiss_round_count(&self) -> u8 {
        self.swiss_rounds().count() as u8
    }

    /// Copy of this history containing only the Swiss phase
    pub fn swiss_only(&self) -> History {
        Self {
            players: self.players.clone(),
            rounds: self.swiss_rounds().cloned().collect(),
        }
    }

    /// Append a round, re-checking every invariant
    pub fn with_round(&self, round: Round) -> EngineResult<History> {
        let mut rounds = self.rounds.clone();
        rounds.push(round);
        History::new(self.players.clone(), rounds)
    }

    /// Replace the outcomes of the last round, re-checking every invariant
    pub fn with_last_round_replaced(&self, round: Round) -> EngineResult<History> {
        let mut rounds = self.rounds.clone();
        rounds.pop();
        rounds.push(round);
        History::new(self.players.clone(), rounds)
    }

    /// Every recorded Swiss round must be complete
    pub fn ensure_swiss_complete(&self) -> EngineResult<()> {
        for round in self.swiss_rounds() {
            if !round.is_complete() {
                let pending: Vec<PlayerId> = round
                    .matches
                    .iter()
                    .filter(|m| !m.is_played())
                    .flat_map(|m| [m.players.0, m.players.1])
                    .collect();
                return Err(EngineError::phase(format!(
                    "{} still has unreported matches (players {:?})",
                    round.tag, pending
                )));
            }
        }
        Ok(())
    }

    /// The whole Swiss phase (`rounds` rounds) must be recorded and complete
    pub fn ensure_swiss_finished(&self, rounds: u8) -> EngineResult<()> {
        let recorded = self.swiss_round_count();
        if recorded < rounds {
            return Err(EngineError::phase(format!(
                "only {} of {} Swiss rounds have been played",
                recorded, rounds
            )));
        }
        self.ensure_swiss_complete()
    }

    fn validate(&self) -> EngineResult<()> {
        self.validate_players()?;

        let known: HashSet<PlayerId> = self.players.iter().map(|p| p.id).collect();
        let mut expected_swiss = 1u8;
        let mut bracket_started = false;

        for round in &self.rounds {
            self.validate_round(round, &known)?;

            match round.tag {
                RoundTag::Swiss(number) => {
                    if bracket_started {
                        return Err(EngineError::inconsistent(
                            round.tag,
                            Vec::new(),
                            "Swiss round recorded after the bracket phase started",
                        ));
                    }
                    if number != expected_swiss {
                        return Err(EngineError::inconsistent(
                            round.tag,
                            Vec::new(),
                            format!("expected Swiss round {}", expected_swiss),
                        ));
                    }
                    expected_swiss += 1;
                    self.validate_swiss_coverage(round)?;
                }
                RoundTag::Bracket { .. } => {
                    bracket_started = true;
                    if let Some(bye) = round.bye {
                        return Err(EngineError::inconsistent(
                            round.tag,
                            vec![bye],
                            "bracket rounds cannot carry a bye",
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_players(&self) -> EngineResult<()> {
        let mut ids = HashSet::new();
        for player in &self.players {
            if !ids.insert(player.id) {
                return Err(EngineError::inconsistent(
                    "seeding",
                    vec![player.id],
                    "player id registered twice",
                ));
            }
        }

        let seeds: BTreeSet<u32> = self.players.iter().map(|p| p.seed).collect();
        let expected: BTreeSet<u32> = (1..=self.players.len() as u32).collect();
        if seeds != expected {
            let offenders = self
                .players
                .iter()
                .filter(|p| p.seed == 0 || p.seed as usize > self.players.len())
                .map(|p| p.id)
                .collect();
            return Err(EngineError::inconsistent(
                "seeding",
                offenders,
                format!("seeds must be unique and cover 1..={}", self.players.len()),
            ));
        }

        Ok(())
    }

    fn validate_round(&self, round: &Round, known: &HashSet<PlayerId>) -> EngineResult<()> {
        let mut seen: HashMap<PlayerId, usize> = HashMap::new();

        for game in &round.matches {
            let (a, b) = game.players;
            if a == b {
                return Err(EngineError::inconsistent(round.tag, vec![a], "player paired with themselves"));
            }
            for id in [a, b] {
                if !known.contains(&id) {
                    return Err(EngineError::inconsistent(round.tag, vec![id], "unknown player in match"));
                }
            }
            if let Some(winner) = game.winner() {
                if winner != a && winner != b {
                    return Err(EngineError::inconsistent(
                        round.tag,
                        vec![a, b, winner],
                        "reported winner did not play in the match",
                    ));
                }
            }
            if game.round != round.tag {
                return Err(EngineError::inconsistent(
                    round.tag,
                    vec![a, b],
                    format!("match tagged {} filed under another round", game.round),
                ));
            }
        }

        if let Some(bye) = round.bye {
            if !known.contains(&bye) {
                return Err(EngineError::inconsistent(round.tag, vec![bye], "unknown player given a bye"));
            }
        }

        for id in round.participants() {
            *seen.entry(id).or_insert(0) += 1;
        }
        let mut repeated: Vec<PlayerId> = seen.into_iter().filter(|&(_, n)| n > 1).map(|(id, _)| id).collect();
        if !repeated.is_empty() {
            repeated.sort_unstable();
            return Err(EngineError::inconsistent(round.tag, repeated, "player appears more than once"));
        }

        Ok(())
    }

    fn validate_swiss_coverage(&self, round: &Round) -> EngineResult<()> {
        let present: HashSet<PlayerId> = round.participants().collect();
        let mut missing: Vec<PlayerId> = self
            .players
            .iter()
            .map(|p| p.id)
            .filter(|id| !present.contains(id))
            .collect();

        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(EngineError::inconsistent(round.tag, missing, "player missing from Swiss round"));
        }

        if round.bye.is_some() && self.players.len() % 2 == 0 {
            return Err(EngineError::inconsistent(
                round.tag,
                round.bye.into_iter().collect(),
                "bye given in an even field",
            ));
        }

        Ok(())
    }
}
