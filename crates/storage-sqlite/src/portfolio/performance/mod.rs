mod model;
mod repository;

pub use model::{
    AssetGroupPerformanceSnapshotDB, AssetPerformanceSnapshotDB, PortfolioPerformanceSnapshotDB,
};
pub use repository::PerformanceSnapshotRepository;
