use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use super::model::{
    AssetGroupPerformanceSnapshotDB, AssetPerformanceSnapshotDB, PortfolioPerformanceSnapshotDB,
};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{
    asset_group_performance_snapshots as groups, asset_performance_snapshots as assets,
    portfolio_performance_snapshots as totals,
};
use crate::utils::date_text;
use navfolio_core::portfolio::performance::{
    AssetGroupPerformanceSnapshot, AssetPerformanceSnapshot, PerformanceRollup,
    PerformanceSnapshotRepositoryTrait, PortfolioPerformanceSnapshot,
};
use navfolio_core::portfolio::Granularity;
use navfolio_core::Result;

pub struct PerformanceSnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PerformanceSnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn convert_all<D, T>(rows: Vec<D>) -> Result<Vec<T>>
where
    T: TryFrom<D, Error = crate::errors::StorageError>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(Into::into))
        .collect()
}

#[async_trait]
impl PerformanceSnapshotRepositoryTrait for PerformanceSnapshotRepository {
    async fn save_rollup(&self, rollup: PerformanceRollup) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::replace_into(totals::table)
                    .values(PortfolioPerformanceSnapshotDB::from(&rollup.portfolio))
                    .execute(conn)
                    .into_core()?;
                for group in &rollup.groups {
                    diesel::replace_into(groups::table)
                        .values(AssetGroupPerformanceSnapshotDB::from(group))
                        .execute(conn)
                        .into_core()?;
                }
                for asset in &rollup.assets {
                    diesel::replace_into(assets::table)
                        .values(AssetPerformanceSnapshotDB::from(asset))
                        .execute(conn)
                        .into_core()?;
                }
                debug!(
                    "Saved performance rollup for {} on {} ({} groups, {} assets)",
                    rollup.portfolio.portfolio_id,
                    rollup.portfolio.snapshot_date,
                    rollup.groups.len(),
                    rollup.assets.len()
                );
                Ok(())
            })
            .await
    }

    fn get_latest_asset_before(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<AssetPerformanceSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        assets::table
            .filter(assets::portfolio_id.eq(portfolio_id))
            .filter(assets::asset_id.eq(asset_id))
            .filter(assets::granularity.eq(granularity.as_str()))
            .filter(assets::snapshot_date.lt(date_text(before)))
            .order(assets::snapshot_date.desc())
            .select(AssetPerformanceSnapshotDB::as_select())
            .first::<AssetPerformanceSnapshotDB>(&mut conn)
            .optional()
            .into_core()?
            .map(|row| AssetPerformanceSnapshot::try_from(row).map_err(Into::into))
            .transpose()
    }

    fn get_latest_group_before(
        &self,
        portfolio_id: &str,
        group_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<AssetGroupPerformanceSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        groups::table
            .filter(groups::portfolio_id.eq(portfolio_id))
            .filter(groups::group_id.eq(group_id))
            .filter(groups::granularity.eq(granularity.as_str()))
            .filter(groups::snapshot_date.lt(date_text(before)))
            .order(groups::snapshot_date.desc())
            .select(AssetGroupPerformanceSnapshotDB::as_select())
            .first::<AssetGroupPerformanceSnapshotDB>(&mut conn)
            .optional()
            .into_core()?
            .map(|row| AssetGroupPerformanceSnapshot::try_from(row).map_err(Into::into))
            .transpose()
    }

    fn get_latest_portfolio_before(
        &self,
        portfolio_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<PortfolioPerformanceSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        totals::table
            .filter(totals::portfolio_id.eq(portfolio_id))
            .filter(totals::granularity.eq(granularity.as_str()))
            .filter(totals::snapshot_date.lt(date_text(before)))
            .order(totals::snapshot_date.desc())
            .select(PortfolioPerformanceSnapshotDB::as_select())
            .first::<PortfolioPerformanceSnapshotDB>(&mut conn)
            .optional()
            .into_core()?
            .map(|row| PortfolioPerformanceSnapshot::try_from(row).map_err(Into::into))
            .transpose()
    }

    fn get_portfolio_history(
        &self,
        portfolio_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PortfolioPerformanceSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = totals::table
            .filter(totals::portfolio_id.eq(portfolio_id))
            .filter(totals::granularity.eq(granularity.as_str()))
            .select(PortfolioPerformanceSnapshotDB::as_select())
            .into_boxed();
        if let Some(from) = from {
            query = query.filter(totals::snapshot_date.ge(date_text(from)));
        }
        if let Some(to) = to {
            query = query.filter(totals::snapshot_date.le(date_text(to)));
        }
        let rows = query
            .order(totals::snapshot_date.asc())
            .load::<PortfolioPerformanceSnapshotDB>(&mut conn)
            .into_core()?;
        convert_all(rows)
    }

    fn get_group_snapshots(
        &self,
        portfolio_id: &str,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetGroupPerformanceSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = groups::table
            .filter(groups::portfolio_id.eq(portfolio_id))
            .filter(groups::snapshot_date.eq(date_text(snapshot_date)))
            .filter(groups::granularity.eq(granularity.as_str()))
            .order(groups::group_id.asc())
            .select(AssetGroupPerformanceSnapshotDB::as_select())
            .load::<AssetGroupPerformanceSnapshotDB>(&mut conn)
            .into_core()?;
        convert_all(rows)
    }

    fn get_asset_snapshots(
        &self,
        portfolio_id: &str,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetPerformanceSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = assets::table
            .filter(assets::portfolio_id.eq(portfolio_id))
            .filter(assets::snapshot_date.eq(date_text(snapshot_date)))
            .filter(assets::granularity.eq(granularity.as_str()))
            .order(assets::asset_id.asc())
            .select(AssetPerformanceSnapshotDB::as_select())
            .load::<AssetPerformanceSnapshotDB>(&mut conn)
            .into_core()?;
        convert_all(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_db;
    use navfolio_core::portfolio::performance::{member_snapshot_id, portfolio_snapshot_id};
    use navfolio_core::portfolio::returns::PerformanceFigures;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    fn figures(value: Decimal) -> PerformanceFigures {
        PerformanceFigures {
            current_value: value,
            cost_basis: dec!(2500),
            unrealized_pl: value - dec!(2500),
            total_pl: value - dec!(2500),
            return_percentage: dec!(8),
            ..Default::default()
        }
    }

    fn rollup(day: &str, value: Decimal) -> PerformanceRollup {
        rollup_for("p1", "core", &["AAPL", "MSFT"], day, value)
    }

    fn rollup_for(
        portfolio: &str,
        group: &str,
        assets: &[&str],
        day: &str,
        value: Decimal,
    ) -> PerformanceRollup {
        let snapshot_date = date(day);
        let granularity = Granularity::Daily;
        PerformanceRollup {
            portfolio: PortfolioPerformanceSnapshot {
                id: portfolio_snapshot_id(portfolio, snapshot_date, granularity),
                portfolio_id: portfolio.to_string(),
                snapshot_date,
                granularity,
                asset_count: assets.len(),
                expected_asset_count: assets.len(),
                figures: figures(value),
            },
            groups: vec![AssetGroupPerformanceSnapshot {
                id: member_snapshot_id(portfolio, group, snapshot_date, granularity),
                portfolio_id: portfolio.to_string(),
                group_id: group.to_string(),
                snapshot_date,
                granularity,
                asset_count: assets.len(),
                figures: figures(value),
            }],
            assets: assets
                .iter()
                .map(|asset| AssetPerformanceSnapshot {
                    id: member_snapshot_id(portfolio, asset, snapshot_date, granularity),
                    portfolio_id: portfolio.to_string(),
                    asset_id: asset.to_string(),
                    snapshot_date,
                    granularity,
                    quantity: dec!(10),
                    figures: figures(value / Decimal::from(assets.len())),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_rollup_round_trip_and_overwrite() {
        let (pool, writer, _dir) = create_test_db();
        let repo = PerformanceSnapshotRepository::new(pool, writer);

        repo.save_rollup(rollup("2024-06-03", dec!(2700))).await.unwrap();
        repo.save_rollup(rollup("2024-06-03", dec!(2800))).await.unwrap();

        let history = repo
            .get_portfolio_history("p1", Granularity::Daily, None, None)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], rollup("2024-06-03", dec!(2800)).portfolio);

        let groups = repo
            .get_group_snapshots("p1", date("2024-06-03"), Granularity::Daily)
            .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].asset_count, 2);

        let assets = repo
            .get_asset_snapshots("p1", date("2024-06-03"), Granularity::Daily)
            .unwrap();
        let ids: Vec<_> = assets.iter().map(|a| a.asset_id.as_str()).collect();
        assert_eq!(ids, vec!["AAPL", "MSFT"]);
        assert_eq!(assets[0].figures.current_value, dec!(1400));
    }

    #[tokio::test]
    async fn test_latest_before_per_level() {
        let (pool, writer, _dir) = create_test_db();
        let repo = PerformanceSnapshotRepository::new(pool, writer);
        repo.save_rollup(rollup("2024-06-03", dec!(2700))).await.unwrap();
        repo.save_rollup(rollup("2024-06-04", dec!(2430))).await.unwrap();

        let on = date("2024-06-04");
        let portfolio = repo
            .get_latest_portfolio_before("p1", Granularity::Daily, on)
            .unwrap()
            .unwrap();
        assert_eq!(portfolio.figures.current_value, dec!(2700));
        let group = repo
            .get_latest_group_before("p1", "core", Granularity::Daily, on)
            .unwrap()
            .unwrap();
        assert_eq!(group.snapshot_date, date("2024-06-03"));
        let asset = repo
            .get_latest_asset_before("p1", "MSFT", Granularity::Daily, on)
            .unwrap()
            .unwrap();
        assert_eq!(asset.figures.current_value, dec!(1350));

        assert!(repo
            .get_latest_portfolio_before("p1", Granularity::Daily, date("2024-06-03"))
            .unwrap()
            .is_none());
        let ranged = repo
            .get_portfolio_history("p1", Granularity::Daily, None, Some(date("2024-06-03")))
            .unwrap();
        assert_eq!(ranged.len(), 1);
    }

    #[tokio::test]
    async fn test_underscore_ids_keep_separate_rows() {
        let (pool, writer, _dir) = create_test_db();
        let repo = PerformanceSnapshotRepository::new(pool, writer);

        repo.save_rollup(rollup_for("A", "B_core", &["B_C"], "2024-06-03", dec!(1100)))
            .await
            .unwrap();
        repo.save_rollup(rollup_for("A_B", "core", &["C"], "2024-06-03", dec!(700)))
            .await
            .unwrap();

        let on = date("2024-06-03");
        let assets = repo.get_asset_snapshots("A", on, Granularity::Daily).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].asset_id, "B_C");
        assert_eq!(assets[0].figures.current_value, dec!(1100));
        let groups = repo.get_group_snapshots("A", on, Granularity::Daily).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_id, "B_core");
        assert_eq!(
            repo.get_asset_snapshots("A_B", on, Granularity::Daily).unwrap().len(),
            1
        );
    }
}
