//! SQLite storage for snapshot execution records.

mod model;
mod repository;

pub use model::SnapshotExecutionDB;
pub use repository::ExecutionRepository;
