use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::allocation_model::{AllocationInput, AssetAllocationSnapshot};
use crate::errors::Result;
use crate::portfolio::Granularity;

/// Trait defining the contract for allocation snapshot persistence.
#[async_trait]
pub trait AllocationSnapshotRepositoryTrait: Send + Sync {
    /// Inserts or replaces rows by their unique key, all in one transaction.
    async fn upsert_snapshots(&self, snapshots: Vec<AssetAllocationSnapshot>) -> Result<usize>;

    /// Most recent snapshot of the series strictly before `before`.
    fn get_latest_before(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<AssetAllocationSnapshot>>;

    fn get_snapshots_for_date(
        &self,
        portfolio_id: &str,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetAllocationSnapshot>>;

    /// Series of one asset in date order.
    fn get_asset_history(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AssetAllocationSnapshot>>;
}

#[async_trait]
pub trait AllocationServiceTrait: Send + Sync {
    async fn generate(
        &self,
        input: AllocationInput,
        portfolio_total_value: Decimal,
    ) -> Result<AssetAllocationSnapshot>;

    /// Generates all inputs of one portfolio and commits them together.
    async fn generate_batch(
        &self,
        inputs: Vec<AllocationInput>,
        portfolio_total_value: Decimal,
    ) -> Result<Vec<AssetAllocationSnapshot>>;

    fn get_snapshots_for_date(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetAllocationSnapshot>>;

    fn get_asset_history(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AssetAllocationSnapshot>>;
}
