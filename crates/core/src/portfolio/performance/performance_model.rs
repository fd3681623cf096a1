//! Performance snapshot models at asset, group and portfolio level.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::market_inputs::AssetGroup;
use crate::portfolio::returns::PerformanceFigures;
use crate::portfolio::Granularity;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetPerformanceSnapshot {
    pub id: String,
    pub portfolio_id: String,
    pub asset_id: String,
    pub snapshot_date: NaiveDate,
    pub granularity: Granularity,
    pub quantity: Decimal,
    #[serde(flatten)]
    pub figures: PerformanceFigures,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupPerformanceSnapshot {
    pub id: String,
    pub portfolio_id: String,
    pub group_id: String,
    pub snapshot_date: NaiveDate,
    pub granularity: Granularity,
    pub asset_count: usize,
    #[serde(flatten)]
    pub figures: PerformanceFigures,
}

/// Whole-portfolio roll-up. `figures.current_value` is the authoritative
/// portfolio total for the date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPerformanceSnapshot {
    pub id: String,
    pub portfolio_id: String,
    pub snapshot_date: NaiveDate,
    pub granularity: Granularity,
    pub asset_count: usize,
    pub expected_asset_count: usize,
    #[serde(flatten)]
    pub figures: PerformanceFigures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRequest {
    pub portfolio_id: String,
    pub snapshot_date: NaiveDate,
    pub granularity: Granularity,
    /// Assets the caller generated (or tried to generate) snapshots for.
    pub expected_asset_ids: Vec<String>,
    #[serde(default)]
    pub asset_groups: Vec<AssetGroup>,
}

/// All performance rows of one portfolio/date/granularity, saved together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRollup {
    pub portfolio: PortfolioPerformanceSnapshot,
    pub groups: Vec<AssetGroupPerformanceSnapshot>,
    pub assets: Vec<AssetPerformanceSnapshot>,
}

pub fn portfolio_snapshot_id(
    portfolio_id: &str,
    snapshot_date: NaiveDate,
    granularity: Granularity,
) -> String {
    granularity.snapshot_key(&[portfolio_id], snapshot_date)
}

/// Key of an asset or group row; members share the same key space per table.
pub fn member_snapshot_id(
    portfolio_id: &str,
    member_id: &str,
    snapshot_date: NaiveDate,
    granularity: Granularity,
) -> String {
    granularity.snapshot_key(&[portfolio_id, member_id], snapshot_date)
}
