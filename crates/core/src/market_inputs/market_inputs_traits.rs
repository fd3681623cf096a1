use async_trait::async_trait;
use chrono::NaiveDate;

use super::market_inputs_model::{AssetGroup, AssetGroupMembership, AssetPosition, AssetPrice};
use crate::errors::Result;

/// Read side used by snapshot runs. Lookups may be slow or remote, so the
/// runner wraps every call in a timeout.
#[async_trait]
pub trait MarketInputProviderTrait: Send + Sync {
    /// Asset ids with a position in the portfolio.
    async fn list_portfolio_assets(&self, portfolio_id: &str) -> Result<Vec<String>>;

    async fn get_position(&self, portfolio_id: &str, asset_id: &str) -> Result<AssetPosition>;

    /// Latest price on or before `as_of`.
    async fn get_price(&self, asset_id: &str, as_of: NaiveDate) -> Result<AssetPrice>;

    async fn get_asset_groups(&self, portfolio_id: &str) -> Result<Vec<AssetGroup>>;
}

/// Write side used by external collaborators to load inputs.
#[async_trait]
pub trait MarketInputRepositoryTrait: Send + Sync {
    async fn upsert_positions(&self, positions: Vec<AssetPosition>) -> Result<usize>;

    async fn upsert_prices(&self, prices: Vec<AssetPrice>) -> Result<usize>;

    /// Replaces all group memberships of the portfolios present in `memberships`.
    async fn replace_group_memberships(
        &self,
        memberships: Vec<AssetGroupMembership>,
    ) -> Result<usize>;
}
