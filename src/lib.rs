pub mod bracket;
pub mod cache;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod errors;
pub mod finalize;
pub mod pairing;
pub mod scoring;
pub mod services;
pub mod stream;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use std::path::Path;

use crate::config::EngineConfig;
use crate::services::TournamentService;

pub fn interpret() -> Cli {
    Cli::parse()
}

fn service(cli: &Cli) -> Result<TournamentService> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    TournamentService::new(config, &cli.store)
}

pub fn handle_pair(cli: &Cli, state: &Path, round: Option<u8>, seed: u64, out: Option<&Path>) -> Result<()> {
    service(cli)?.pair(state, round, seed, out)
}

pub fn handle_stream(cli: &Cli, state: &Path, round: Option<u8>) -> Result<()> {
    service(cli)?.stream(state, round)
}

pub fn handle_bracket(cli: &Cli, state: &Path, main_size: Option<usize>) -> Result<()> {
    service(cli)?.bracket(state, main_size).map(|_| ())
}

pub fn handle_standings(cli: &Cli, state: &Path, placements: Option<&Path>) -> Result<()> {
    service(cli)?.standings(state, placements).map(|_| ())
}

pub fn handle_why(cli: &Cli, state: &Path, players: &[String]) -> Result<()> {
    service(cli)?.why(state, players)
}

pub fn handle_record_seeding(cli: &Cli, state: &Path) -> Result<()> {
    service(cli)?.record_seeding(state)
}
