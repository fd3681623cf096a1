//! Orchestrates tracked snapshot runs across portfolios.

mod runner_model;
mod runner_service;

pub use runner_model::*;
pub use runner_service::SnapshotRunner;
