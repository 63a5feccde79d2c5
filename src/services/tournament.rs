use anyhow::{Context, Result};
use colored::Colorize;
use log::{info, warn};
use std::path::Path;

use crate::bracket::{self, BracketAssignment};
use crate::cache::{RecordOutcome, SeedingStore};
use crate::config::EngineConfig;
use crate::diagnostics::{explain_player, PlayerReport};
use crate::domain::snapshot::SnapshotRound;
use crate::domain::{BracketKind, History, PlayerId, Round, StandingsTable, TournamentSnapshot};
use crate::errors::{snapshot_context, EngineError};
use crate::finalize::{self, BracketResults, FinalPlacement, Placements};
use crate::pairing;
use crate::scoring::{self, RankedPlayer};
use crate::stream;

/// Runs the engine against a tournament snapshot on disk
pub struct TournamentService {
    config: EngineConfig,
    store: SeedingStore,
}

impl TournamentService {
    pub fn new(config: EngineConfig, store_dir: &Path) -> Result<Self> {
        Ok(Self {
            config,
            store: SeedingStore::new(store_dir)?,
        })
    }

    /// Load a snapshot; missing seeds come from the seeding store
    pub fn load(&self, state: &Path) -> Result<(TournamentSnapshot, History)> {
        let snapshot =
            TournamentSnapshot::load(state).with_context(|| snapshot_context(&state.display().to_string()))?;
        let stored = self.store.seeds_for(&snapshot.tournament)?;
        let history = snapshot
            .to_history(stored.as_ref())
            .with_context(|| snapshot_context(&state.display().to_string()))?;
        Ok((snapshot, history))
    }

    pub fn record_seeding(&self, state: &Path) -> Result<()> {
        let (snapshot, history) = self.load(state)?;
        match self.store.record(&snapshot.tournament, history.players())? {
            RecordOutcome::Recorded(record) => {
                println!(
                    "{} seeding for {} ({} players)",
                    "Recorded".green().bold(),
                    record.tournament,
                    record.players.len()
                );
            }
            RecordOutcome::AlreadyRecorded(record) => {
                println!(
                    "{} seeding for {} was recorded at {}",
                    "Kept".yellow().bold(),
                    record.tournament,
                    record.recorded_at
                );
            }
        }
        Ok(())
    }

    pub fn pair(&self, state: &Path, round: Option<u8>, seed: u64, out: Option<&Path>) -> Result<()> {
        let (mut snapshot, history) = self.load(state)?;
        let number = round.unwrap_or(history.swiss_round_count() + 1);

        info!("=== Pairing {} round {} ===", snapshot.tournament, number);
        if number == 1 {
            self.store.record(&snapshot.tournament, history.players())?;
        }

        let paired = pairing::generate_round(&history, number, seed, &self.config.pairing)
            .with_context(|| format!("Failed to pair round {} of {}", number, snapshot.tournament))?;
        print_round(&history, &paired);

        if let Some(out) = out {
            snapshot.rounds.push(SnapshotRound::from_round(&paired));
            snapshot.save(out)?;
            info!("  → Snapshot with round {} written to {}", number, out.display());
        }
        Ok(())
    }

    pub fn stream(&self, state: &Path, round: Option<u8>) -> Result<()> {
        let (_, history) = self.load(state)?;
        let number = round.unwrap_or(history.swiss_round_count());
        let round = history
            .swiss_rounds()
            .find(|r| r.tag.swiss_number() == Some(number))
            .with_context(|| format!("Swiss round {} is not in the snapshot", number))?;

        let table = StandingsTable::entering(&history, number);
        let picks = stream::rank_for_stream(round, &table, &self.config.stream, &self.config.pairing);

        println!("{}", format!("Stream picks for round {}", number).bold());
        for pick in picks.iter().take(self.config.stream.shown) {
            let (a, b) = pick.game.players;
            let line = format!(
                "#{:<3} {} vs {}  hype {:.1}",
                pick.index,
                name(&history, a),
                name(&history, b),
                pick.hype
            );
            if pick.demoted {
                println!("{}", line.dimmed());
            } else {
                println!("{}", line);
            }
            for reason in &pick.reasons {
                println!("       {}", reason);
            }
        }
        Ok(())
    }

    /// Seed the brackets and record the assignment. Once bracket rounds are
    /// in the snapshot the recorded assignment is shown instead.
    pub fn bracket(&self, state: &Path, main_size: Option<usize>) -> Result<BracketAssignment> {
        let (snapshot, history) = self.load(state)?;
        let stored = self.store.load_brackets(&snapshot.tournament)?;

        let assignment = match stored {
            Some(stored) if history.bracket_rounds().next().is_some() => {
                if let Some(size) = main_size.filter(|&size| size != stored.main_size) {
                    return Err(EngineError::phase(format!(
                        "brackets already started with Main size {}, cannot reseed with {}",
                        stored.main_size, size
                    ))
                    .into());
                }
                info!("  → Bracket phase under way, showing the recorded assignment");
                stored
            }
            _ => {
                let assignment = self.assign_brackets(&history, main_size)?;
                self.store.record_brackets(&snapshot.tournament, &assignment)?;
                assignment
            }
        };

        for kind in [BracketKind::Main, BracketKind::Redemption] {
            let entries = assignment.bracket(kind);
            if entries.is_empty() {
                continue;
            }
            println!("{}", format!("{} bracket", kind).bold());
            for entry in entries {
                println!(
                    "  {:>3}. {:<24} Swiss rank {:>3} ({:.1} points)",
                    entry.seed,
                    name(&history, entry.player_id),
                    entry.swiss_rank,
                    entry.points
                );
            }
        }
        Ok(assignment)
    }

    pub fn standings(&self, state: &Path, placements: Option<&Path>) -> Result<Vec<FinalPlacement>> {
        let (snapshot, history) = self.load(state)?;
        let ranked = self.ranked(&history)?;

        let results = match placements {
            Some(path) => {
                let placements = Placements::load(path)?;
                let assignment = match self.store.load_brackets(&snapshot.tournament)? {
                    Some(assignment) => assignment,
                    None => {
                        warn!(
                            "No bracket assignment recorded for {}, deriving it with Main size {}",
                            snapshot.tournament, self.config.bracket.main_size
                        );
                        self.assign_brackets(&history, None)?
                    }
                };
                Some(BracketResults::new(assignment, placements, &history))
            }
            None => None,
        };

        let finals = finalize::finalize(&ranked, results.as_ref())?;
        print_standings(&history, &ranked, &finals);
        Ok(finals)
    }

    /// Decision trail for one player, against the recorded brackets if any
    pub fn explain(&self, state: &Path, player: &str) -> Result<PlayerReport> {
        let (snapshot, history) = self.load(state)?;
        let brackets = self.store.load_brackets(&snapshot.tournament)?;
        Ok(explain_player(&history, player, &self.config, brackets.as_ref())?)
    }

    pub fn why(&self, state: &Path, players: &[String]) -> Result<()> {
        for player in players {
            let report = self.explain(state, player)?;
            println!("{}", report.player.name.bold());
            print!("{}", report);
            println!();
        }
        Ok(())
    }

    fn ranked(&self, history: &History) -> Result<Vec<RankedPlayer>> {
        Ok(scoring::compute_standings(history, &self.config.scoring)?)
    }

    /// Swiss ranking split into brackets, each reordered away from opening rematches
    fn assign_brackets(&self, history: &History, main_size: Option<usize>) -> Result<BracketAssignment> {
        history.ensure_swiss_finished(self.config.pairing.swiss_rounds)?;
        let ranked = self.ranked(history)?;
        let size = main_size.unwrap_or(self.config.bracket.main_size);

        info!("=== Seeding brackets (Main size {}) ===", size);
        let table = StandingsTable::from_history(history);
        Ok(bracket::arrange_brackets(&ranked, size, &table, &self.config.bracket)?)
    }
}

fn name(history: &History, id: PlayerId) -> String {
    history
        .player(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| format!("#{}", id))
}

fn print_round(history: &History, round: &Round) {
    println!("{}", round.tag.to_string().bold());
    for (index, game) in round.matches.iter().enumerate() {
        let (a, b) = game.players;
        println!(
            "  {:>2}. ({:>2}) {:<24} vs ({:>2}) {}",
            index + 1,
            history.seed_of(a).unwrap_or_default(),
            name(history, a),
            history.seed_of(b).unwrap_or_default(),
            name(history, b)
        );
    }
    if let Some(bye) = round.bye {
        println!("  {} {}", "bye:".yellow(), name(history, bye));
    }
}

fn print_standings(history: &History, ranked: &[RankedPlayer], finals: &[FinalPlacement]) {
    println!("{}", "Final standings".bold());
    for placement in finals {
        let swiss = ranked.iter().find(|r| r.player_id == placement.player_id);
        let points = swiss.map(|r| r.breakdown.total).unwrap_or_default();
        let line = format!(
            "  {:>3}. {:<24} {:<22} ({:.1} Swiss points)",
            placement.position,
            name(history, placement.player_id),
            placement.label,
            points
        );
        if placement.position == 1 {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }
}
