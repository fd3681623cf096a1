use chrono::Utc;
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::portfolio::{count_value, figure_texts, parse_count, parse_figures};
use crate::utils::{date_text, decimal_text, parse_date, parse_decimal, parse_enum, timestamp_text};
use navfolio_core::portfolio::performance::{
    AssetGroupPerformanceSnapshot, AssetPerformanceSnapshot, PortfolioPerformanceSnapshot,
};

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::asset_performance_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetPerformanceSnapshotDB {
    pub id: String,
    pub portfolio_id: String,
    pub asset_id: String,
    pub snapshot_date: String,
    pub granularity: String,
    pub quantity: String,
    pub current_value: String,
    pub cost_basis: String,
    pub realized_pl: String,
    pub unrealized_pl: String,
    pub total_pl: String,
    pub return_percentage: String,
    pub daily_return: String,
    pub cumulative_return: String,
    pub previous_cumulative_return: String,
    pub calculated_at: String,
}

impl TryFrom<AssetPerformanceSnapshotDB> for AssetPerformanceSnapshot {
    type Error = StorageError;

    fn try_from(db: AssetPerformanceSnapshotDB) -> Result<Self, Self::Error> {
        let figures = parse_figures(
            "asset_performance_snapshots",
            [
                &db.current_value,
                &db.cost_basis,
                &db.realized_pl,
                &db.unrealized_pl,
                &db.total_pl,
                &db.return_percentage,
                &db.daily_return,
                &db.cumulative_return,
                &db.previous_cumulative_return,
            ],
        )?;
        Ok(AssetPerformanceSnapshot {
            snapshot_date: parse_date("asset_performance_snapshots.snapshot_date", &db.snapshot_date)?,
            granularity: parse_enum("asset_performance_snapshots.granularity", &db.granularity)?,
            quantity: parse_decimal("asset_performance_snapshots.quantity", &db.quantity)?,
            id: db.id,
            portfolio_id: db.portfolio_id,
            asset_id: db.asset_id,
            figures,
        })
    }
}

impl From<&AssetPerformanceSnapshot> for AssetPerformanceSnapshotDB {
    fn from(s: &AssetPerformanceSnapshot) -> Self {
        let [current_value, cost_basis, realized_pl, unrealized_pl, total_pl, return_percentage, daily_return, cumulative_return, previous_cumulative_return] =
            figure_texts(&s.figures);
        AssetPerformanceSnapshotDB {
            id: s.id.clone(),
            portfolio_id: s.portfolio_id.clone(),
            asset_id: s.asset_id.clone(),
            quantity: decimal_text(s.quantity),
            snapshot_date: date_text(s.snapshot_date),
            granularity: s.granularity.as_str().to_string(),
            current_value,
            cost_basis,
            realized_pl,
            unrealized_pl,
            total_pl,
            return_percentage,
            daily_return,
            cumulative_return,
            previous_cumulative_return,
            calculated_at: timestamp_text(Utc::now()),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::asset_group_performance_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetGroupPerformanceSnapshotDB {
    pub id: String,
    pub portfolio_id: String,
    pub group_id: String,
    pub snapshot_date: String,
    pub granularity: String,
    pub asset_count: i64,
    pub current_value: String,
    pub cost_basis: String,
    pub realized_pl: String,
    pub unrealized_pl: String,
    pub total_pl: String,
    pub return_percentage: String,
    pub daily_return: String,
    pub cumulative_return: String,
    pub previous_cumulative_return: String,
    pub calculated_at: String,
}

impl TryFrom<AssetGroupPerformanceSnapshotDB> for AssetGroupPerformanceSnapshot {
    type Error = StorageError;

    fn try_from(db: AssetGroupPerformanceSnapshotDB) -> Result<Self, Self::Error> {
        let figures = parse_figures(
            "asset_group_performance_snapshots",
            [
                &db.current_value,
                &db.cost_basis,
                &db.realized_pl,
                &db.unrealized_pl,
                &db.total_pl,
                &db.return_percentage,
                &db.daily_return,
                &db.cumulative_return,
                &db.previous_cumulative_return,
            ],
        )?;
        Ok(AssetGroupPerformanceSnapshot {
            snapshot_date: parse_date("asset_group_performance_snapshots.snapshot_date", &db.snapshot_date)?,
            granularity: parse_enum("asset_group_performance_snapshots.granularity", &db.granularity)?,
            asset_count: parse_count("asset_group_performance_snapshots.asset_count", db.asset_count)?,
            id: db.id,
            portfolio_id: db.portfolio_id,
            group_id: db.group_id,
            figures,
        })
    }
}

impl From<&AssetGroupPerformanceSnapshot> for AssetGroupPerformanceSnapshotDB {
    fn from(s: &AssetGroupPerformanceSnapshot) -> Self {
        let [current_value, cost_basis, realized_pl, unrealized_pl, total_pl, return_percentage, daily_return, cumulative_return, previous_cumulative_return] =
            figure_texts(&s.figures);
        AssetGroupPerformanceSnapshotDB {
            id: s.id.clone(),
            portfolio_id: s.portfolio_id.clone(),
            group_id: s.group_id.clone(),
            asset_count: count_value(s.asset_count),
            snapshot_date: date_text(s.snapshot_date),
            granularity: s.granularity.as_str().to_string(),
            current_value,
            cost_basis,
            realized_pl,
            unrealized_pl,
            total_pl,
            return_percentage,
            daily_return,
            cumulative_return,
            previous_cumulative_return,
            calculated_at: timestamp_text(Utc::now()),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::portfolio_performance_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioPerformanceSnapshotDB {
    pub id: String,
    pub portfolio_id: String,
    pub snapshot_date: String,
    pub granularity: String,
    pub asset_count: i64,
    pub expected_asset_count: i64,
    pub current_value: String,
    pub cost_basis: String,
    pub realized_pl: String,
    pub unrealized_pl: String,
    pub total_pl: String,
    pub return_percentage: String,
    pub daily_return: String,
    pub cumulative_return: String,
    pub previous_cumulative_return: String,
    pub calculated_at: String,
}

impl TryFrom<PortfolioPerformanceSnapshotDB> for PortfolioPerformanceSnapshot {
    type Error = StorageError;

    fn try_from(db: PortfolioPerformanceSnapshotDB) -> Result<Self, Self::Error> {
        let figures = parse_figures(
            "portfolio_performance_snapshots",
            [
                &db.current_value,
                &db.cost_basis,
                &db.realized_pl,
                &db.unrealized_pl,
                &db.total_pl,
                &db.return_percentage,
                &db.daily_return,
                &db.cumulative_return,
                &db.previous_cumulative_return,
            ],
        )?;
        Ok(PortfolioPerformanceSnapshot {
            snapshot_date: parse_date("portfolio_performance_snapshots.snapshot_date", &db.snapshot_date)?,
            granularity: parse_enum("portfolio_performance_snapshots.granularity", &db.granularity)?,
            asset_count: parse_count("portfolio_performance_snapshots.asset_count", db.asset_count)?,
            expected_asset_count: parse_count(
                "portfolio_performance_snapshots.expected_asset_count",
                db.expected_asset_count,
            )?,
            id: db.id,
            portfolio_id: db.portfolio_id,
            figures,
        })
    }
}

impl From<&PortfolioPerformanceSnapshot> for PortfolioPerformanceSnapshotDB {
    fn from(s: &PortfolioPerformanceSnapshot) -> Self {
        let [current_value, cost_basis, realized_pl, unrealized_pl, total_pl, return_percentage, daily_return, cumulative_return, previous_cumulative_return] =
            figure_texts(&s.figures);
        PortfolioPerformanceSnapshotDB {
            id: s.id.clone(),
            portfolio_id: s.portfolio_id.clone(),
            asset_count: count_value(s.asset_count),
            expected_asset_count: count_value(s.expected_asset_count),
            snapshot_date: date_text(s.snapshot_date),
            granularity: s.granularity.as_str().to_string(),
            current_value,
            cost_basis,
            realized_pl,
            unrealized_pl,
            total_pl,
            return_percentage,
            daily_return,
            cumulative_return,
            previous_cumulative_return,
            calculated_at: timestamp_text(Utc::now()),
        }
    }
}
