//! Generates and stores per-asset allocation snapshots.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::allocation_calculator::calculate_allocation_snapshot;
use super::allocation_model::{AllocationInput, AssetAllocationSnapshot};
use super::allocation_traits::{AllocationServiceTrait, AllocationSnapshotRepositoryTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::portfolio::Granularity;

pub struct AllocationService {
    repository: Arc<dyn AllocationSnapshotRepositoryTrait>,
}

impl AllocationService {
    pub fn new(repository: Arc<dyn AllocationSnapshotRepositoryTrait>) -> Self {
        Self { repository }
    }

    fn compute(
        &self,
        input: &AllocationInput,
        portfolio_total_value: Decimal,
    ) -> Result<AssetAllocationSnapshot> {
        if input.price < Decimal::ZERO {
            return Err(Error::SnapshotComputation {
                asset_id: input.asset_id.clone(),
                message: format!("negative price {}", input.price),
            });
        }
        let bucket = input.granularity.bucket_date(input.as_of);
        let previous = self.repository.get_latest_before(
            &input.portfolio_id,
            &input.asset_id,
            input.granularity,
            bucket,
        )?;
        calculate_allocation_snapshot(input, portfolio_total_value, previous.as_ref())
    }
}

#[async_trait]
impl AllocationServiceTrait for AllocationService {
    async fn generate(
        &self,
        input: AllocationInput,
        portfolio_total_value: Decimal,
    ) -> Result<AssetAllocationSnapshot> {
        let mut stored = self.generate_batch(vec![input], portfolio_total_value).await?;
        stored
            .pop()
            .ok_or_else(|| Error::Unexpected("allocation batch returned no snapshot".to_string()))
    }

    async fn generate_batch(
        &self,
        inputs: Vec<AllocationInput>,
        portfolio_total_value: Decimal,
    ) -> Result<Vec<AssetAllocationSnapshot>> {
        ValidationError::ensure_non_negative("portfolioTotalValue", portfolio_total_value)?;
        let snapshots = inputs
            .iter()
            .map(|input| self.compute(input, portfolio_total_value))
            .collect::<Result<Vec<_>>>()?;
        if snapshots.is_empty() {
            return Ok(snapshots);
        }

        let written = self.repository.upsert_snapshots(snapshots.clone()).await?;
        debug!(
            "Upserted {} allocation snapshots for portfolio {} ({})",
            written, snapshots[0].portfolio_id, snapshots[0].snapshot_date
        );
        Ok(snapshots)
    }

    fn get_snapshots_for_date(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetAllocationSnapshot>> {
        self.repository.get_snapshots_for_date(
            portfolio_id,
            granularity.bucket_date(as_of),
            granularity,
        )
    }

    fn get_asset_history(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AssetAllocationSnapshot>> {
        self.repository
            .get_asset_history(portfolio_id, asset_id, granularity, from, to)
    }
}
