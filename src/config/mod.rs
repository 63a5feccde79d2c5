pub mod settings;

pub use settings::{BracketSettings, EngineConfig, PairingSettings, ScoringSettings, StreamSettings};
