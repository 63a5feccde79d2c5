use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingSettings {
    pub swiss_rounds: u8,
    /// Round whose even-record group decides bracket qualification
    pub cut_round: u8,
    /// Search nodes shared by the strict and relaxed passes
    pub max_attempts: usize,
    /// Cap on the nodes the cut-line optimiser may take from `max_attempts`
    pub cut_round_budget: usize,
    pub variance_window: usize,
    pub variance_min_group: usize,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            swiss_rounds: 5,
            cut_round: 5,
            max_attempts: 200_000,
            cut_round_budget: 50_000,
            variance_window: 4,
            variance_min_group: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub record_weight: f64,
    pub quality_win_weight: f64,
    pub quality_loss_weight: f64,
    pub cinderella_per_place: f64,
    pub cinderella_acceleration: f64,
    pub cinderella_tolerance: u32,
    /// Strongest seed quartile first
    pub cinderella_multipliers: [f64; 4],
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            record_weight: 100.0,
            quality_win_weight: 2.0,
            quality_loss_weight: 2.0,
            cinderella_per_place: 1.0,
            cinderella_acceleration: 0.25,
            cinderella_tolerance: 0,
            cinderella_multipliers: [0.5, 1.0, 1.5, 2.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketSettings {
    pub main_size: usize,
    /// Largest points difference between two players swapped to avoid a rematch
    pub swap_points_window: f64,
}

impl Default for BracketSettings {
    fn default() -> Self {
        Self {
            main_size: 16,
            swap_points_window: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub stakes_weight: f64,
    pub cut_line_bonus: f64,
    pub giant_killer_weight: f64,
    pub giant_killer_min_gap: u32,
    pub cinderella_weight: f64,
    pub protected_seeds: u32,
    /// Picks shown by the command line
    pub shown: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            stakes_weight: 30.0,
            cut_line_bonus: 50.0,
            giant_killer_weight: 20.0,
            giant_killer_min_gap: 8,
            cinderella_weight: 15.0,
            protected_seeds: 2,
            shown: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pairing: PairingSettings,
    pub scoring: ScoringSettings,
    pub bracket: BracketSettings,
    pub stream: StreamSettings,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, overridden by whatever the TOML file sets
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::new());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!("Loaded engine configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [pairing]
            max_attempts = 50

            [scoring]
            cinderella_multipliers = [1.0, 1.0, 2.0, 3.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.pairing.max_attempts, 50);
        assert_eq!(config.pairing.swiss_rounds, 5);
        assert_eq!(config.scoring.cinderella_multipliers[3], 3.0);
        assert_eq!(config.scoring.record_weight, 100.0);
        assert_eq!(config.bracket.main_size, 16);
    }

    #[test]
    fn test_missing_path_gives_defaults() {
        assert_eq!(EngineConfig::load(None).unwrap(), EngineConfig::new());
    }

    #[test]
    fn test_unreadable_path_is_an_error() {
        let missing = std::env::temp_dir().join("swiss_bracket_no_such_config.toml");
        let err = EngineConfig::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
