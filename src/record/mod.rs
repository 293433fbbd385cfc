pub mod storage;
pub mod types;

pub use storage::{load_scored_responses, save_scored_responses};
pub use types::{ScoreArchive, ScoredResponse};
