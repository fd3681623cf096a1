use async_trait::async_trait;
use chrono::NaiveDate;

use super::performance_model::{
    AggregationRequest, AssetGroupPerformanceSnapshot, AssetPerformanceSnapshot,
    PerformanceRollup, PortfolioPerformanceSnapshot,
};
use crate::errors::Result;
use crate::portfolio::Granularity;

#[async_trait]
pub trait PerformanceSnapshotRepositoryTrait: Send + Sync {
    /// Upserts the portfolio, group and asset rows in one transaction.
    async fn save_rollup(&self, rollup: PerformanceRollup) -> Result<()>;

    fn get_latest_asset_before(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<AssetPerformanceSnapshot>>;

    fn get_latest_group_before(
        &self,
        portfolio_id: &str,
        group_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<AssetGroupPerformanceSnapshot>>;

    fn get_latest_portfolio_before(
        &self,
        portfolio_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<PortfolioPerformanceSnapshot>>;

    fn get_portfolio_history(
        &self,
        portfolio_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PortfolioPerformanceSnapshot>>;

    fn get_group_snapshots(
        &self,
        portfolio_id: &str,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetGroupPerformanceSnapshot>>;

    fn get_asset_snapshots(
        &self,
        portfolio_id: &str,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetPerformanceSnapshot>>;
}

#[async_trait]
pub trait PerformanceAggregatorTrait: Send + Sync {
    /// Rolls the allocation rows of one portfolio/date up into asset, group
    /// and portfolio performance. Refuses to run on an incomplete asset set.
    async fn aggregate(&self, request: AggregationRequest) -> Result<PerformanceRollup>;

    fn get_portfolio_performance_history(
        &self,
        portfolio_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PortfolioPerformanceSnapshot>>;

    fn get_group_performance(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetGroupPerformanceSnapshot>>;

    fn get_asset_performance(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetPerformanceSnapshot>>;
}
