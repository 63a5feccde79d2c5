use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Swiss pairing, scoring and bracket seeding")]
pub struct Cli {
    /// Engine configuration (TOML); defaults apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding recorded initial seedings
    #[arg(long, global = true, default_value = "seedings")]
    pub store: PathBuf,

    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Pair the next Swiss round
    Pair {
        /// Tournament snapshot (JSON)
        #[arg(long)]
        state: PathBuf,
        /// Round to pair (defaults to the next one)
        #[arg(long)]
        round: Option<u8>,
        /// Seed for the in-window variance
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Write the snapshot with the new round here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rank a round's matches for the stream table
    Stream {
        #[arg(long)]
        state: PathBuf,
        /// Round to rank (defaults to the latest one)
        #[arg(long)]
        round: Option<u8>,
    },
    /// Split the finished Swiss phase into Main and Redemption brackets
    Bracket {
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        main_size: Option<usize>,
    },
    /// Show Swiss or final standings
    Standings {
        #[arg(long)]
        state: PathBuf,
        /// Bracket placements (JSON); final standings are shown when given
        #[arg(long)]
        placements: Option<PathBuf>,
    },
    /// Explain every decision made about the given players
    Why {
        #[arg(long)]
        state: PathBuf,
        #[arg(required = true)]
        players: Vec<String>,
    },
    /// Store the initial seed order before round 1
    RecordSeeding {
        #[arg(long)]
        state: PathBuf,
    },
}
