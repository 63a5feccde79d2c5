use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::bracket::BracketAssignment;
use crate::domain::{Player, PlayerId, Seed};
use crate::errors::{excerpt, seeding_context};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeededPlayer {
    pub id: PlayerId,
    pub name: String,
    pub seed: Seed,
}

/// Initial seed order captured before round 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedingRecord {
    pub tournament: String,
    pub recorded_at: DateTime<Utc>,
    pub players: Vec<SeededPlayer>,
}

impl SeedingRecord {
    pub fn seeds(&self) -> HashMap<PlayerId, Seed> {
        self.players.iter().map(|p| (p.id, p.seed)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Recorded(SeedingRecord),
    /// A record already existed and was left untouched
    AlreadyRecorded(SeedingRecord),
}

/// File-based store of initial seedings and bracket assignments, one JSON
/// file per tournament for each
pub struct SeedingStore {
    dir: PathBuf,
}

impl SeedingStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create seeding store directory")?;
        Ok(Self { dir })
    }

    /// Save the seed order unless one is already stored; the first recording wins
    pub fn record(&self, tournament: &str, players: &[Player]) -> Result<RecordOutcome> {
        if let Some(existing) = self.load(tournament)? {
            warn!(
                "Seeding for {} already recorded at {}, keeping it",
                tournament, existing.recorded_at
            );
            return Ok(RecordOutcome::AlreadyRecorded(existing));
        }

        let mut seeded: Vec<SeededPlayer> = players
            .iter()
            .map(|p| SeededPlayer {
                id: p.id,
                name: p.name.clone(),
                seed: p.seed,
            })
            .collect();
        seeded.sort_by_key(|p| p.seed);

        let record = SeedingRecord {
            tournament: tournament.to_string(),
            recorded_at: Utc::now(),
            players: seeded,
        };

        let path = self.build_path(tournament);
        self.write_json(&path, &record)
            .with_context(|| seeding_context("record", tournament))?;
        info!("Recorded seeding for {} players: {}", record.players.len(), path.display());
        Ok(RecordOutcome::Recorded(record))
    }

    pub fn load(&self, tournament: &str) -> Result<Option<SeedingRecord>> {
        let path = self.build_path(tournament);
        self.read_json_opt(&path)
            .with_context(|| seeding_context("load", tournament))
    }

    /// Stored seeds by player id, if this tournament was recorded
    pub fn seeds_for(&self, tournament: &str) -> Result<Option<HashMap<PlayerId, Seed>>> {
        Ok(self.load(tournament)?.map(|record| record.seeds()))
    }

    /// Save the bracket assignment, replacing any earlier one
    pub fn record_brackets(&self, tournament: &str, assignment: &BracketAssignment) -> Result<()> {
        let path = self.brackets_path(tournament);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create bracket store directory")?;
        }
        self.write_json(&path, assignment)
            .with_context(|| seeding_context("record brackets", tournament))?;
        info!(
            "Recorded brackets (Main size {}): {}",
            assignment.main_size,
            path.display()
        );
        Ok(())
    }

    pub fn load_brackets(&self, tournament: &str) -> Result<Option<BracketAssignment>> {
        let path = self.brackets_path(tournament);
        self.read_json_opt(&path)
            .with_context(|| seeding_context("load brackets", tournament))
    }

    fn build_path(&self, tournament: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_key(tournament)))
    }

    fn brackets_path(&self, tournament: &str) -> PathBuf {
        self.dir.join("brackets").join(format!("{}.json", file_key(tournament)))
    }

    fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        fs::write(path, json).context("Failed to write seeding file")?;
        Ok(())
    }

    fn read_json_opt<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(path)?;
        let data = serde_json::from_str(&json).with_context(|| {
            format!(
                "Failed to parse JSON from {:?}. First 200 chars: {}",
                path,
                excerpt(&json, 200)
            )
        })?;
        Ok(Some(data))
    }
}

/// Percent-encoded tournament id, so distinct ids never share a file
fn file_key(tournament: &str) -> String {
    urlencoding::encode(tournament).into_owned()
}
