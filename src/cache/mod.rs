pub mod seeding;

pub use seeding::{RecordOutcome, SeededPlayer, SeedingRecord, SeedingStore};
