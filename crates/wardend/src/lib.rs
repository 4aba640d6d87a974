//! Warden daemon library - exposes modules for testing.

pub mod config;
pub mod delta;
pub mod monitor;
pub mod probe;
pub mod report;
pub mod scheduler;
pub mod score;
pub mod series;
pub mod store;
