pub mod history;
pub mod models;
pub mod snapshot;
pub mod standings;

pub use history::History;
pub use models::*;
pub use snapshot::TournamentSnapshot;
pub use standings::{Meeting, Standing, StandingsTable};
