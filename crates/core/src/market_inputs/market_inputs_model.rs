//! Externally supplied valuation inputs: positions, prices and group tags.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Quantity and cost figures of one asset in one portfolio, as derived from
/// the portfolio's trade history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetPosition {
    pub portfolio_id: String,
    pub asset_id: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub avg_cost: Decimal,
    /// Accumulated P&L of closed lots.
    pub realized_pl: Decimal,
}

impl AssetPosition {
    pub fn validate(&self) -> Result<()> {
        ValidationError::ensure_present("portfolioId", &self.portfolio_id)?;
        ValidationError::ensure_present("assetId", &self.asset_id)?;
        ValidationError::ensure_non_negative("costBasis", self.cost_basis)?;
        ValidationError::ensure_non_negative("avgCost", self.avg_cost)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetPrice {
    pub asset_id: String,
    pub price_date: NaiveDate,
    pub price: Decimal,
}

impl AssetPrice {
    pub fn validate(&self) -> Result<()> {
        ValidationError::ensure_present("assetId", &self.asset_id)?;
        ValidationError::ensure_non_negative("price", self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroupMembership {
    pub portfolio_id: String,
    pub group_id: String,
    pub asset_id: String,
}

/// A user-defined group of assets within one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetGroup {
    pub group_id: String,
    pub asset_ids: Vec<String>,
}

/// Collapses membership rows into groups, ordered by group id.
pub fn group_memberships(memberships: &[AssetGroupMembership]) -> Vec<AssetGroup> {
    let mut grouped: std::collections::BTreeMap<&str, Vec<String>> = Default::default();
    for m in memberships {
        grouped
            .entry(m.group_id.as_str())
            .or_default()
            .push(m.asset_id.clone());
    }
    grouped
        .into_iter()
        .map(|(group_id, mut asset_ids)| {
            asset_ids.sort();
            asset_ids.dedup();
            AssetGroup {
                group_id: group_id.to_string(),
                asset_ids,
            }
        })
        .collect()
}
