use serde::{Deserialize, Serialize};
use std::fmt;

pub type PlayerId = u64;
pub type Seed = u32;
pub type Score = i32;

/// Entrant as registered on the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub seed: Seed,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, seed: Seed) -> Self {
        Self {
            id,
            name: name.into(),
            seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Winner(PlayerId),
    Unplayed,
}

/// Games won by each side, in the same order as `Match::players`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameScore {
    pub first: u8,
    pub second: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketKind {
    Main,
    Redemption,
}

impl BracketKind {
    pub fn as_str(&self) -> &str {
        match self {
            BracketKind::Main => "main",
            BracketKind::Redemption => "redemption",
        }
    }
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Main => write!(f, "Main"),
            BracketKind::Redemption => write!(f, "Redemption"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundTag {
    Swiss(u8),
    /// Negative rounds are losers-side rounds
    Bracket { bracket: BracketKind, round: i32 },
}

impl RoundTag {
    pub fn swiss_number(&self) -> Option<u8> {
        match self {
            RoundTag::Swiss(n) => Some(*n),
            RoundTag::Bracket { .. } => None,
        }
    }

    pub fn is_swiss(&self) -> bool {
        matches!(self, RoundTag::Swiss(_))
    }
}

impl fmt::Display for RoundTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundTag::Swiss(n) => write!(f, "Round {}", n),
            RoundTag::Bracket { bracket, round } if *round < 0 => {
                write!(f, "{} L{}", bracket, round.abs())
            }
            RoundTag::Bracket { bracket, round } => write!(f, "{} W{}", bracket, round),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub players: (PlayerId, PlayerId),
    pub round: RoundTag,
    pub outcome: Outcome,
    #[serde(default)]
    pub score: Option<GameScore>,
}

impl Match {
    pub fn pending(first: PlayerId, second: PlayerId, round: RoundTag) -> Self {
        Self {
            players: (first, second),
            round,
            outcome: Outcome::Unplayed,
            score: None,
        }
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.players.0 == player || self.players.1 == player
    }

    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if self.players.0 == player {
            Some(self.players.1)
        } else if self.players.1 == player {
            Some(self.players.0)
        } else {
            None
        }
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome {
            Outcome::Winner(id) => Some(id),
            Outcome::Unplayed => None,
        }
    }

    pub fn loser(&self) -> Option<PlayerId> {
        self.winner().and_then(|w| self.opponent_of(w))
    }

    pub fn is_played(&self) -> bool {
        matches!(self.outcome, Outcome::Winner(_))
    }

    /// Same two players, in either order
    pub fn same_pair(&self, a: PlayerId, b: PlayerId) -> bool {
        (self.players.0 == a && self.players.1 == b) || (self.players.0 == b && self.players.1 == a)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub tag: RoundTag,
    pub matches: Vec<Match>,
    #[serde(default)]
    pub bye: Option<PlayerId>,
}

impl Round {
    pub fn new(tag: RoundTag) -> Self {
        Self {
            tag,
            matches: Vec::new(),
            bye: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(Match::is_played)
    }

    pub fn match_for(&self, player: PlayerId) -> Option<&Match> {
        self.matches.iter().find(|m| m.involves(player))
    }

    /// Every player listed in this round, byes included
    pub fn participants(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.matches
            .iter()
            .flat_map(|m| [m.players.0, m.players.1])
            .chain(self.bye)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_sides() {
        let mut game = Match::pending(4, 9, RoundTag::Swiss(1));
        assert_eq!(game.opponent_of(4), Some(9));
        assert_eq!(game.opponent_of(9), Some(4));
        assert_eq!(game.opponent_of(1), None);
        assert_eq!(game.loser(), None);

        game.outcome = Outcome::Winner(9);
        assert_eq!(game.winner(), Some(9));
        assert_eq!(game.loser(), Some(4));
        assert!(game.same_pair(9, 4));
    }

    #[test]
    fn test_round_tag_labels() {
        assert_eq!(RoundTag::Swiss(3).to_string(), "Round 3");
        let losers = RoundTag::Bracket {
            bracket: BracketKind::Redemption,
            round: -2,
        };
        assert_eq!(losers.to_string(), "Redemption L2");
    }

    #[test]
    fn test_round_participants_include_bye() {
        let mut round = Round::new(RoundTag::Swiss(1));
        round.matches.push(Match::pending(1, 2, RoundTag::Swiss(1)));
        round.bye = Some(3);
        let ids: Vec<_> = round.participants().collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(!round.is_complete());
    }
}
