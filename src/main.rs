use anyhow::Result;

use swiss_bracket::cli::{Cli, Command};
use swiss_bracket::{
    handle_bracket, handle_pair, handle_record_seeding, handle_standings, handle_stream, handle_why, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let cli = interpret();
    execute_command(&cli)
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Pair {
            state,
            round,
            seed,
            out,
        } => handle_pair(cli, state, *round, *seed, out.as_deref()),
        Command::Stream { state, round } => handle_stream(cli, state, *round),
        Command::Bracket { state, main_size } => handle_bracket(cli, state, *main_size),
        Command::Standings { state, placements } => handle_standings(cli, state, placements.as_deref()),
        Command::Why { state, players } => handle_why(cli, state, players),
        Command::RecordSeeding { state } => handle_record_seeding(cli, state),
    }
}
