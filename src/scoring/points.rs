use serde::Serialize;

use crate::config::ScoringSettings;
use crate::domain::{PlayerId, Score, Standing};

/// Quality adjustment earned in one Swiss match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityEntry {
    pub round: u8,
    pub opponent: PlayerId,
    pub won: bool,
    pub own_score: Score,
    pub opponent_score: Score,
    pub adjustment: f64,
}

pub fn record_points(standing: &Standing, settings: &ScoringSettings) -> f64 {
    settings.record_weight * standing.score() as f64
}

/// Per-match adjustments, using the scores both players carried into the match.
/// Beating a stronger record earns points, losing to a weaker one costs points.
pub fn quality_entries(standing: &Standing, settings: &ScoringSettings) -> Vec<QualityEntry> {
    standing
        .meetings
        .iter()
        .filter_map(|meeting| {
            let won = meeting.won?;
            let gap = (meeting.opponent_score - meeting.own_score) as f64;
            let adjustment = match won {
                true if gap > 0.0 => settings.quality_win_weight * gap,
                false if gap < 0.0 => settings.quality_loss_weight * gap,
                _ => 0.0,
            };
            Some(QualityEntry {
                round: meeting.round,
                opponent: meeting.opponent,
                won,
                own_score: meeting.own_score,
                opponent_score: meeting.opponent_score,
                adjustment,
            })
        })
        .collect()
}
