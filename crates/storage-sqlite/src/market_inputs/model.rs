use chrono::Utc;
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{date_text, decimal_text, naive_timestamp_text, parse_date, parse_decimal};
use navfolio_core::market_inputs::{AssetGroupMembership, AssetPosition, AssetPrice};

#[derive(Queryable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::asset_positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetPositionDB {
    pub portfolio_id: String,
    pub asset_id: String,
    pub quantity: String,
    pub cost_basis: String,
    pub avg_cost: String,
    pub realized_pl: String,
    pub updated_at: String,
}

impl TryFrom<AssetPositionDB> for AssetPosition {
    type Error = StorageError;

    fn try_from(db: AssetPositionDB) -> Result<Self, Self::Error> {
        Ok(AssetPosition {
            quantity: parse_decimal("asset_positions.quantity", &db.quantity)?,
            cost_basis: parse_decimal("asset_positions.cost_basis", &db.cost_basis)?,
            avg_cost: parse_decimal("asset_positions.avg_cost", &db.avg_cost)?,
            realized_pl: parse_decimal("asset_positions.realized_pl", &db.realized_pl)?,
            portfolio_id: db.portfolio_id,
            asset_id: db.asset_id,
        })
    }
}

impl From<&AssetPosition> for AssetPositionDB {
    fn from(p: &AssetPosition) -> Self {
        AssetPositionDB {
            portfolio_id: p.portfolio_id.clone(),
            asset_id: p.asset_id.clone(),
            quantity: decimal_text(p.quantity),
            cost_basis: decimal_text(p.cost_basis),
            avg_cost: decimal_text(p.avg_cost),
            realized_pl: decimal_text(p.realized_pl),
            updated_at: naive_timestamp_text(Utc::now().naive_utc()),
        }
    }
}

#[derive(Queryable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::asset_prices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetPriceDB {
    pub asset_id: String,
    pub price_date: String,
    pub price: String,
}

impl TryFrom<AssetPriceDB> for AssetPrice {
    type Error = StorageError;

    fn try_from(db: AssetPriceDB) -> Result<Self, Self::Error> {
        Ok(AssetPrice {
            price_date: parse_date("asset_prices.price_date", &db.price_date)?,
            price: parse_decimal("asset_prices.price", &db.price)?,
            asset_id: db.asset_id,
        })
    }
}

impl From<&AssetPrice> for AssetPriceDB {
    fn from(p: &AssetPrice) -> Self {
        AssetPriceDB {
            asset_id: p.asset_id.clone(),
            price_date: date_text(p.price_date),
            price: decimal_text(p.price),
        }
    }
}

#[derive(Queryable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::asset_group_memberships)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetGroupMembershipDB {
    pub portfolio_id: String,
    pub group_id: String,
    pub asset_id: String,
}

impl From<AssetGroupMembershipDB> for AssetGroupMembership {
    fn from(db: AssetGroupMembershipDB) -> Self {
        AssetGroupMembership {
            portfolio_id: db.portfolio_id,
            group_id: db.group_id,
            asset_id: db.asset_id,
        }
    }
}

impl From<&AssetGroupMembership> for AssetGroupMembershipDB {
    fn from(m: &AssetGroupMembership) -> Self {
        AssetGroupMembershipDB {
            portfolio_id: m.portfolio_id.clone(),
            group_id: m.group_id.clone(),
            asset_id: m.asset_id.clone(),
        }
    }
}
