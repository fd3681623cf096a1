use chrono::Utc;
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::portfolio::{figure_texts, parse_figures};
use crate::utils::{date_text, decimal_text, parse_date, parse_decimal, parse_enum, timestamp_text};
use navfolio_core::portfolio::allocation::AssetAllocationSnapshot;

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::asset_allocation_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetAllocationSnapshotDB {
    pub id: String,
    pub portfolio_id: String,
    pub asset_id: String,
    pub snapshot_date: String,
    pub granularity: String,
    pub quantity: String,
    pub current_price: String,
    pub avg_cost: String,
    pub current_value: String,
    pub cost_basis: String,
    pub realized_pl: String,
    pub unrealized_pl: String,
    pub total_pl: String,
    pub return_percentage: String,
    pub daily_return: String,
    pub cumulative_return: String,
    pub previous_cumulative_return: String,
    pub allocation_percentage: String,
    pub portfolio_total_value: String,
    pub is_active: bool,
    pub calculated_at: String,
}

impl TryFrom<AssetAllocationSnapshotDB> for AssetAllocationSnapshot {
    type Error = StorageError;

    fn try_from(db: AssetAllocationSnapshotDB) -> Result<Self, Self::Error> {
        const TABLE: &str = "asset_allocation_snapshots";
        let figures = parse_figures(
            TABLE,
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
        Ok(AssetAllocationSnapshot {
            snapshot_date: parse_date("asset_allocation_snapshots.snapshot_date", &db.snapshot_date)?,
            granularity: parse_enum("asset_allocation_snapshots.granularity", &db.granularity)?,
            quantity: parse_decimal("asset_allocation_snapshots.quantity", &db.quantity)?,
            current_price: parse_decimal("asset_allocation_snapshots.current_price", &db.current_price)?,
            avg_cost: parse_decimal("asset_allocation_snapshots.avg_cost", &db.avg_cost)?,
            allocation_percentage: parse_decimal(
                "asset_allocation_snapshots.allocation_percentage",
                &db.allocation_percentage,
            )?,
            portfolio_total_value: parse_decimal(
                "asset_allocation_snapshots.portfolio_total_value",
                &db.portfolio_total_value,
            )?,
            figures,
            is_active: db.is_active,
            id: db.id,
            portfolio_id: db.portfolio_id,
            asset_id: db.asset_id,
        })
    }
}

impl From<&AssetAllocationSnapshot> for AssetAllocationSnapshotDB {
    fn from(s: &AssetAllocationSnapshot) -> Self {
        let [current_value, cost_basis, realized_pl, unrealized_pl, total_pl, return_percentage, daily_return, cumulative_return, previous_cumulative_return] =
            figure_texts(&s.figures);
        AssetAllocationSnapshotDB {
            id: s.id.clone(),
            portfolio_id: s.portfolio_id.clone(),
            asset_id: s.asset_id.clone(),
            snapshot_date: date_text(s.snapshot_date),
            granularity: s.granularity.as_str().to_string(),
            quantity: decimal_text(s.quantity),
            current_price: decimal_text(s.current_price),
            avg_cost: decimal_text(s.avg_cost),
            current_value,
            cost_basis,
            realized_pl,
            unrealized_pl,
            total_pl,
            return_percentage,
            daily_return,
            cumulative_return,
            previous_cumulative_return,
            allocation_percentage: decimal_text(s.allocation_percentage),
            portfolio_total_value: decimal_text(s.portfolio_total_value),
            is_active: s.is_active,
            calculated_at: timestamp_text(Utc::now()),
        }
    }
}
