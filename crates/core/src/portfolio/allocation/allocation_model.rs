//! Allocation snapshot models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::market_inputs::AssetPosition;
use crate::portfolio::returns::{overflow, PerformanceFigures};
use crate::portfolio::Granularity;

/// Everything needed to value one asset of one portfolio on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationInput {
    pub portfolio_id: String,
    pub asset_id: String,
    pub as_of: NaiveDate,
    pub granularity: Granularity,
    pub position: AssetPosition,
    pub price: Decimal,
}

impl AllocationInput {
    /// `quantity × price`, failing the asset when the product overflows.
    pub fn current_value(&self) -> Result<Decimal> {
        self.position
            .quantity
            .checked_mul(self.price)
            .ok_or_else(|| overflow(&self.asset_id, "quantity × price"))
    }
}

/// Point-in-time valuation of one asset, uniquely keyed by
/// (portfolio, asset, snapshot date, granularity).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetAllocationSnapshot {
    pub id: String,
    pub portfolio_id: String,
    pub asset_id: String,
    pub snapshot_date: NaiveDate,
    pub granularity: Granularity,
    pub quantity: Decimal,
    pub current_price: Decimal,
    pub avg_cost: Decimal,
    #[serde(flatten)]
    pub figures: PerformanceFigures,
    pub allocation_percentage: Decimal,
    /// Portfolio total at snapshot time, denormalized.
    pub portfolio_total_value: Decimal,
    pub is_active: bool,
}

pub fn allocation_snapshot_id(
    portfolio_id: &str,
    asset_id: &str,
    snapshot_date: NaiveDate,
    granularity: Granularity,
) -> String {
    granularity.snapshot_key(&[portfolio_id, asset_id], snapshot_date)
}
