mod model;
mod repository;

pub use model::AssetAllocationSnapshotDB;
pub use repository::AllocationSnapshotRepository;
