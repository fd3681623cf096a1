use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use super::model::AssetAllocationSnapshotDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::asset_allocation_snapshots::dsl;
use crate::utils::date_text;
use navfolio_core::portfolio::allocation::{
    AllocationSnapshotRepositoryTrait, AssetAllocationSnapshot,
};
use navfolio_core::portfolio::Granularity;
use navfolio_core::Result;

pub struct AllocationSnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AllocationSnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn to_domain(rows: Vec<AssetAllocationSnapshotDB>) -> Result<Vec<AssetAllocationSnapshot>> {
    rows.into_iter()
        .map(|row| AssetAllocationSnapshot::try_from(row).map_err(Into::into))
        .collect()
}

#[async_trait]
impl AllocationSnapshotRepositoryTrait for AllocationSnapshotRepository {
    async fn upsert_snapshots(&self, snapshots: Vec<AssetAllocationSnapshot>) -> Result<usize> {
        if snapshots.is_empty() {
            return Ok(0);
        }
        self.writer
            .exec(move |conn| {
                let mut written = 0;
                for snapshot in &snapshots {
                    written += diesel::replace_into(dsl::asset_allocation_snapshots)
                        .values(AssetAllocationSnapshotDB::from(snapshot))
                        .execute(conn)
                        .into_core()?;
                }
                debug!("Upserted {} allocation snapshots", written);
                Ok(written)
            })
            .await
    }

    fn get_latest_before(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<AssetAllocationSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        dsl::asset_allocation_snapshots
            .filter(dsl::portfolio_id.eq(portfolio_id))
            .filter(dsl::asset_id.eq(asset_id))
            .filter(dsl::granularity.eq(granularity.as_str()))
            .filter(dsl::snapshot_date.lt(date_text(before)))
            .order(dsl::snapshot_date.desc())
            .select(AssetAllocationSnapshotDB::as_select())
            .first::<AssetAllocationSnapshotDB>(&mut conn)
            .optional()
            .into_core()?
            .map(|row| AssetAllocationSnapshot::try_from(row).map_err(Into::into))
            .transpose()
    }

    fn get_snapshots_for_date(
        &self,
        portfolio_id: &str,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetAllocationSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = dsl::asset_allocation_snapshots
            .filter(dsl::portfolio_id.eq(portfolio_id))
            .filter(dsl::snapshot_date.eq(date_text(snapshot_date)))
            .filter(dsl::granularity.eq(granularity.as_str()))
            .order(dsl::asset_id.asc())
            .select(AssetAllocationSnapshotDB::as_select())
            .load::<AssetAllocationSnapshotDB>(&mut conn)
            .into_core()?;
        to_domain(rows)
    }

    fn get_asset_history(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AssetAllocationSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = dsl::asset_allocation_snapshots
            .filter(dsl::portfolio_id.eq(portfolio_id))
            .filter(dsl::asset_id.eq(asset_id))
            .filter(dsl::granularity.eq(granularity.as_str()))
            .select(AssetAllocationSnapshotDB::as_select())
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(dsl::snapshot_date.ge(date_text(from)));
        }
        if let Some(to) = to {
            query = query.filter(dsl::snapshot_date.le(date_text(to)));
        }
        let rows = query
            .order(dsl::snapshot_date.asc())
            .load::<AssetAllocationSnapshotDB>(&mut conn)
            .into_core()?;
        to_domain(rows)
    }
}
