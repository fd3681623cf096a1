//! Snapshot generation: allocation snapshots, performance roll-ups and
//! the run orchestrator joining them.

pub mod allocation;
mod granularity;
pub mod performance;
pub mod returns;
pub mod runner;

pub use granularity::Granularity;
