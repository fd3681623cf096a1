//! Asset, asset-group and portfolio performance roll-ups.

mod performance_model;
mod performance_service;
mod performance_traits;

pub use performance_model::*;
pub use performance_service::PerformanceAggregator;
pub use performance_traits::{PerformanceAggregatorTrait, PerformanceSnapshotRepositoryTrait};
