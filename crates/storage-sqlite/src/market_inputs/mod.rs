//! SQLite storage for positions, prices and asset groups.

mod model;
mod repository;

pub use model::{AssetGroupMembershipDB, AssetPositionDB, AssetPriceDB};
pub use repository::MarketInputRepository;
