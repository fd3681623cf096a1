//! Snapshot execution tracker.

mod executions_model;
mod executions_service;
mod executions_traits;

pub use executions_model::*;
pub use executions_service::ExecutionTracker;
pub use executions_traits::{ExecutionRepositoryTrait, ExecutionTrackerTrait};
