use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::performance_model::{
    member_snapshot_id, portfolio_snapshot_id, AggregationRequest, AssetGroupPerformanceSnapshot,
    AssetPerformanceSnapshot, PerformanceRollup, PortfolioPerformanceSnapshot,
};
use super::performance_traits::{PerformanceAggregatorTrait, PerformanceSnapshotRepositoryTrait};
use crate::errors::{Error, Result};
use crate::portfolio::allocation::{AllocationSnapshotRepositoryTrait, AssetAllocationSnapshot};
use crate::portfolio::returns::{overflow, PerformanceFigures, ValuationTotals};
use crate::portfolio::Granularity;

/// Rolls allocation snapshots into asset, group and portfolio performance.
pub struct PerformanceAggregator {
    allocation_repository: Arc<dyn AllocationSnapshotRepositoryTrait>,
    repository: Arc<dyn PerformanceSnapshotRepositoryTrait>,
}

fn totals_of(snapshot: &AssetAllocationSnapshot) -> ValuationTotals {
    ValuationTotals {
        current_value: snapshot.figures.current_value,
        cost_basis: snapshot.figures.cost_basis,
        realized_pl: snapshot.figures.realized_pl,
    }
}

impl PerformanceAggregator {
    pub fn new(
        allocation_repository: Arc<dyn AllocationSnapshotRepositoryTrait>,
        repository: Arc<dyn PerformanceSnapshotRepositoryTrait>,
    ) -> Self {
        Self {
            allocation_repository,
            repository,
        }
    }

    /// Allocation rows for exactly the expected assets, or
    /// `AggregationIncomplete` when any is missing.
    fn load_expected_rows(
        &self,
        request: &AggregationRequest,
        snapshot_date: NaiveDate,
    ) -> Result<Vec<AssetAllocationSnapshot>> {
        let expected: BTreeSet<&str> = request
            .expected_asset_ids
            .iter()
            .map(String::as_str)
            .collect();
        let mut rows: Vec<AssetAllocationSnapshot> = self
            .allocation_repository
            .get_snapshots_for_date(&request.portfolio_id, snapshot_date, request.granularity)?
            .into_iter()
            .filter(|row| expected.contains(row.asset_id.as_str()))
            .collect();
        rows.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));

        let present: BTreeSet<&str> = rows.iter().map(|r| r.asset_id.as_str()).collect();
        let missing: Vec<String> = expected
            .difference(&present)
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            warn!(
                "Refusing to aggregate portfolio {} on {}: {} of {} asset snapshots missing",
                request.portfolio_id,
                snapshot_date,
                missing.len(),
                expected.len()
            );
            return Err(Error::AggregationIncomplete {
                expected: expected.len(),
                produced: present.len(),
                missing,
            });
        }
        Ok(rows)
    }

    fn asset_rollup(
        &self,
        row: &AssetAllocationSnapshot,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<AssetPerformanceSnapshot> {
        let previous = self.repository.get_latest_asset_before(
            &row.portfolio_id,
            &row.asset_id,
            granularity,
            snapshot_date,
        )?;
        Ok(AssetPerformanceSnapshot {
            id: member_snapshot_id(&row.portfolio_id, &row.asset_id, snapshot_date, granularity),
            portfolio_id: row.portfolio_id.clone(),
            asset_id: row.asset_id.clone(),
            snapshot_date,
            granularity,
            quantity: row.quantity,
            figures: PerformanceFigures::compute(
                totals_of(row),
                previous.as_ref().map(|p| &p.figures),
            )
            .ok_or_else(|| overflow(&row.asset_id, "asset performance"))?,
        })
    }
}

#[async_trait]
impl PerformanceAggregatorTrait for PerformanceAggregator {
    async fn aggregate(&self, request: AggregationRequest) -> Result<PerformanceRollup> {
        let granularity = request.granularity;
        let snapshot_date = granularity.bucket_date(request.snapshot_date);
        let portfolio_id = request.portfolio_id.as_str();
        let rows = self.load_expected_rows(&request, snapshot_date)?;

        let assets = rows
            .iter()
            .map(|row| self.asset_rollup(row, snapshot_date, granularity))
            .collect::<Result<Vec<_>>>()?;

        let by_asset: HashMap<&str, &AssetAllocationSnapshot> =
            rows.iter().map(|r| (r.asset_id.as_str(), r)).collect();
        let mut groups = Vec::with_capacity(request.asset_groups.len());
        for group in &request.asset_groups {
            let members: Vec<&AssetAllocationSnapshot> = group
                .asset_ids
                .iter()
                .filter_map(|id| by_asset.get(id.as_str()).copied())
                .collect();
            if members.is_empty() {
                continue;
            }
            let previous = self.repository.get_latest_group_before(
                portfolio_id,
                &group.group_id,
                granularity,
                snapshot_date,
            )?;
            groups.push(AssetGroupPerformanceSnapshot {
                id: member_snapshot_id(portfolio_id, &group.group_id, snapshot_date, granularity),
                portfolio_id: portfolio_id.to_string(),
                group_id: group.group_id.clone(),
                snapshot_date,
                granularity,
                asset_count: members.len(),
                figures: ValuationTotals::checked_sum(members.iter().map(|m| totals_of(m)))
                    .and_then(|totals| {
                        PerformanceFigures::compute(totals, previous.as_ref().map(|p| &p.figures))
                    })
                    .ok_or_else(|| overflow(&group.group_id, "group performance"))?,
            });
        }

        let previous =
            self.repository
                .get_latest_portfolio_before(portfolio_id, granularity, snapshot_date)?;
        let portfolio = PortfolioPerformanceSnapshot {
            id: portfolio_snapshot_id(portfolio_id, snapshot_date, granularity),
            portfolio_id: portfolio_id.to_string(),
            snapshot_date,
            granularity,
            asset_count: rows.len(),
            expected_asset_count: request.expected_asset_ids.len(),
            figures: ValuationTotals::checked_sum(rows.iter().map(totals_of))
                .and_then(|totals| {
                    PerformanceFigures::compute(totals, previous.as_ref().map(|p| &p.figures))
                })
                .ok_or_else(|| overflow(portfolio_id, "portfolio performance"))?,
        };

        let rollup = PerformanceRollup {
            portfolio,
            groups,
            assets,
        };
        self.repository.save_rollup(rollup.clone()).await?;
        debug!(
            "Aggregated portfolio {} on {} ({}): {} assets, {} groups, value {}",
            portfolio_id,
            snapshot_date,
            granularity,
            rollup.assets.len(),
            rollup.groups.len(),
            rollup.portfolio.figures.current_value
        );
        Ok(rollup)
    }

    fn get_portfolio_performance_history(
        &self,
        portfolio_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PortfolioPerformanceSnapshot>> {
        self.repository
            .get_portfolio_history(portfolio_id, granularity, from, to)
    }

    fn get_group_performance(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetGroupPerformanceSnapshot>> {
        self.repository
            .get_group_snapshots(portfolio_id, granularity.bucket_date(as_of), granularity)
    }

    fn get_asset_performance(
        &self,
        portfolio_id: &str,
        as_of: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetPerformanceSnapshot>> {
        self.repository
            .get_asset_snapshots(portfolio_id, granularity.bucket_date(as_of), granularity)
    }
}
