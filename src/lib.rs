//! Workout tracking: guided sessions over an exercise catalog, with a capped
//! local history and per-user progress notes.

pub mod catalog;
pub mod db;
pub mod models;
pub mod progress;
pub mod runner;
pub mod session;
pub mod stats;
pub mod storage;
pub mod types;
pub mod utils;

pub use models::{Difficulty, Exercise, SessionSetup, WorkoutRecord};
pub use session::{Clock, Progress, SessionError, SessionState, SystemClock, WorkoutSession};
pub use storage::HistoryStore;
