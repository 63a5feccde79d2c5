use std::collections::BTreeMap;

use super::history::History;
use super::models::{PlayerId, Score, Seed};

/// One Swiss meeting seen from a single player's side
#[derive(Debug, Clone, PartialEq)]
pub struct Meeting {
    pub round: u8,
    pub opponent: PlayerId,
    /// `None` while the result is unreported
    pub won: Option<bool>,
    pub own_score: Score,
    pub opponent_score: Score,
}

/// Per-player state derived from the match log
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub player_id: PlayerId,
    pub seed: Seed,
    pub wins: u32,
    pub losses: u32,
    pub byes: Vec<u8>,
    pub meetings: Vec<Meeting>,
    /// Score entering each Swiss round
    pub score_history: Vec<(u8, Score)>,
    /// Rounds in which the player was paired down into a lower score group
    pub floats: Vec<u8>,
}

impl Standing {
    fn new(player_id: PlayerId, seed: Seed) -> Self {
        Self {
            player_id,
            seed,
            wins: 0,
            losses: 0,
            byes: Vec::new(),
            meetings: Vec::new(),
            score_history: Vec::new(),
            floats: Vec::new(),
        }
    }

    pub fn score(&self) -> Score {
        self.wins as Score - self.losses as Score
    }

    pub fn record(&self) -> String {
        format!("{}-{}", self.wins, self.losses)
    }

    pub fn has_faced(&self, opponent: PlayerId) -> bool {
        self.meetings.iter().any(|m| m.opponent == opponent)
    }

    /// Most recent round in which the two players met
    pub fn last_met(&self, opponent: PlayerId) -> Option<u8> {
        self.meetings
            .iter()
            .filter(|m| m.opponent == opponent)
            .map(|m| m.round)
            .max()
    }

    pub fn float_count(&self) -> usize {
        self.floats.len()
    }

    pub fn has_had_bye(&self) -> bool {
        !self.byes.is_empty()
    }
}

/// Standings of every player after a number of Swiss rounds
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsTable {
    entries: BTreeMap<PlayerId, Standing>,
    rounds_played: u8,
}

impl StandingsTable {
    /// Standings after every recorded Swiss round
    pub fn from_history(history: &History) -> Self {
        Self::build(history, u8::MAX)
    }

    /// Standings as they stood when `round` was paired
    pub fn entering(history: &History, round: u8) -> Self {
        Self::build(history, round)
    }

    fn build(history: &History, before: u8) -> Self {
        let mut entries: BTreeMap<PlayerId, Standing> = history
            .players()
            .iter()
            .map(|p| (p.id, Standing::new(p.id, p.seed)))
            .collect();
        let mut rounds_played = 0;

        for round in history.swiss_rounds() {
            let number = match round.tag.swiss_number() {
                Some(n) if n < before => n,
                _ => continue,
            };

            let entering: BTreeMap<PlayerId, Score> =
                entries.iter().map(|(&id, s)| (id, s.score())).collect();

            for standing in entries.values_mut() {
                standing.score_history.push((number, entering[&standing.player_id]));
            }

            for game in &round.matches {
                for (me, opponent) in [game.players, (game.players.1, game.players.0)] {
                    let own_score = entering[&me];
                    let opponent_score = entering[&opponent];
                    let won = game.winner().map(|w| w == me);

                    if let Some(standing) = entries.get_mut(&me) {
                        match won {
                            Some(true) => standing.wins += 1,
                            Some(false) => standing.losses += 1,
                            None => {}
                        }
                        if own_score > opponent_score {
                            standing.floats.push(number);
                        }
                        standing.meetings.push(Meeting {
                            round: number,
                            opponent,
                            won,
                            own_score,
                            opponent_score,
                        });
                    }
                }
            }

            if let Some(standing) = round.bye.and_then(|id| entries.get_mut(&id)) {
                standing.wins += 1;
                standing.byes.push(number);
            }

            rounds_played = number;
        }

        Self {
            entries,
            rounds_played,
        }
    }

    pub fn rounds_played(&self) -> u8 {
        self.rounds_played
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Standing> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Standing> {
        self.entries.values()
    }

    pub fn score_of(&self, id: PlayerId) -> Score {
        self.entries.get(&id).map(Standing::score).unwrap_or(0)
    }

    pub fn have_met(&self, a: PlayerId, b: PlayerId) -> bool {
        self.entries.get(&a).is_some_and(|s| s.has_faced(b))
    }

    /// Score groups, highest score first, members by seed
    pub fn score_groups(&self) -> Vec<(Score, Vec<&Standing>)> {
        let mut groups: BTreeMap<Score, Vec<&Standing>> = BTreeMap::new();
        for standing in self.entries.values() {
            groups.entry(standing.score()).or_default().push(standing);
        }
        groups
            .into_iter()
            .rev()
            .map(|(score, mut members)| {
                members.sort_by_key(|s| s.seed);
                (score, members)
            })
            .collect()
    }

    /// Number of players whose score is at least `score`
    pub fn players_at_or_above(&self, score: Score) -> usize {
        self.entries.values().filter(|s| s.score() >= score).count()
    }
}
