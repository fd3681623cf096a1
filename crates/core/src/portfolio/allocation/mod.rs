//! Per-asset allocation snapshots.

mod allocation_calculator;
mod allocation_model;
mod allocation_service;
mod allocation_traits;

pub use allocation_calculator::calculate_allocation_snapshot;
pub use allocation_model::*;
pub use allocation_service::AllocationService;
pub use allocation_traits::{AllocationServiceTrait, AllocationSnapshotRepositoryTrait};
