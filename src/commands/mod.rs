pub mod calendar;
pub mod config;
pub mod exercise;
pub mod history;
pub mod progress;
pub mod status;
pub mod workout;
