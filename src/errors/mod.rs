use anyhow::Context as _;
use thiserror::Error;

use crate::domain::PlayerId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("no valid pairing for round {round} within the search budget (players: {players:?})")]
    InfeasiblePairing { round: u8, players: Vec<PlayerId> },

    #[error("inconsistent history in {round}: {reason} (players: {players:?})")]
    InconsistentHistory {
        round: String,
        players: Vec<PlayerId>,
        reason: String,
    },

    #[error("invalid phase state: {reason}")]
    InvalidPhaseState { reason: String },

    #[error("main bracket of {main_size} cannot be filled from {players} players")]
    InvalidBracketSize { main_size: usize, players: usize },

    #[error("unknown player: {name}")]
    UnknownPlayer { name: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn inconsistent(round: impl ToString, players: Vec<PlayerId>, reason: impl Into<String>) -> Self {
        EngineError::InconsistentHistory {
            round: round.to_string(),
            players,
            reason: reason.into(),
        }
    }

    pub fn phase(reason: impl Into<String>) -> Self {
        EngineError::InvalidPhaseState {
            reason: reason.into(),
        }
    }
}

/// Add context to snapshot load errors
pub fn snapshot_context(path: &str) -> String {
    format!("Failed to load tournament snapshot from: {}", path)
}

/// Add context to parse errors
pub fn parse_context(data_type: &str) -> String {
    format!("Failed to parse {}", data_type)
}

/// Add context to seeding store errors
pub fn seeding_context(operation: &str, tournament: &str) -> String {
    format!("Failed to {} seeding for tournament: {}", operation, tournament)
}

/// First `limit` characters of `text`, for parse error messages
pub fn excerpt(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Wrap result with parse context
pub fn with_parse_context<T, E>(result: Result<T, E>, data_type: &str) -> anyhow::Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    result.context(parse_context(data_type))
}
