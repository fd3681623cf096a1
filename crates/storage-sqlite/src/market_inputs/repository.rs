use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::model::{AssetGroupMembershipDB, AssetPositionDB, AssetPriceDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{asset_group_memberships, asset_positions, asset_prices};
use crate::utils::date_text;
use navfolio_core::errors::Error;
use navfolio_core::market_inputs::{
    group_memberships, AssetGroup, AssetGroupMembership, AssetPosition, AssetPrice,
    MarketInputProviderTrait, MarketInputRepositoryTrait,
};
use navfolio_core::Result;

/// Serves snapshot inputs from the local database and accepts loads of
/// positions, prices and group memberships.
pub struct MarketInputRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl MarketInputRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl MarketInputProviderTrait for MarketInputRepository {
    async fn list_portfolio_assets(&self, portfolio_id: &str) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        asset_positions::table
            .filter(asset_positions::portfolio_id.eq(portfolio_id))
            .order(asset_positions::asset_id.asc())
            .select(asset_positions::asset_id)
            .load::<String>(&mut conn)
            .into_core()
    }

    async fn get_position(&self, portfolio_id: &str, asset_id: &str) -> Result<AssetPosition> {
        let mut conn = get_connection(&self.pool)?;
        let row = asset_positions::table
            .find((portfolio_id, asset_id))
            .select(AssetPositionDB::as_select())
            .first::<AssetPositionDB>(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No position for asset {} in portfolio {}",
                    asset_id, portfolio_id
                ))
            })?;
        Ok(AssetPosition::try_from(row)?)
    }

    async fn get_price(&self, asset_id: &str, as_of: NaiveDate) -> Result<AssetPrice> {
        let mut conn = get_connection(&self.pool)?;
        let row = asset_prices::table
            .filter(asset_prices::asset_id.eq(asset_id))
            .filter(asset_prices::price_date.le(date_text(as_of)))
            .order(asset_prices::price_date.desc())
            .select(AssetPriceDB::as_select())
            .first::<AssetPriceDB>(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| {
                Error::NotFound(format!("No price for asset {} on or before {}", asset_id, as_of))
            })?;
        Ok(AssetPrice::try_from(row)?)
    }

    async fn get_asset_groups(&self, portfolio_id: &str) -> Result<Vec<AssetGroup>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = asset_group_memberships::table
            .filter(asset_group_memberships::portfolio_id.eq(portfolio_id))
            .order((
                asset_group_memberships::group_id.asc(),
                asset_group_memberships::asset_id.asc(),
            ))
            .select(AssetGroupMembershipDB::as_select())
            .load::<AssetGroupMembershipDB>(&mut conn)
            .into_core()?;
        let memberships: Vec<AssetGroupMembership> = rows.into_iter().map(Into::into).collect();
        Ok(group_memberships(&memberships))
    }
}

#[async_trait]
impl MarketInputRepositoryTrait for MarketInputRepository {
    async fn upsert_positions(&self, positions: Vec<AssetPosition>) -> Result<usize> {
        for position in &positions {
            position.validate()?;
        }
        self.writer
            .exec(move |conn| {
                let mut written = 0;
                for position in &positions {
                    written += diesel::replace_into(asset_positions::table)
                        .values(AssetPositionDB::from(position))
                        .execute(conn)
                        .into_core()?;
                }
                Ok(written)
            })
            .await
    }

    async fn upsert_prices(&self, prices: Vec<AssetPrice>) -> Result<usize> {
        for price in &prices {
            price.validate()?;
        }
        self.writer
            .exec(move |conn| {
                let mut written = 0;
                for price in &prices {
                    written += diesel::replace_into(asset_prices::table)
                        .values(AssetPriceDB::from(price))
                        .execute(conn)
                        .into_core()?;
                }
                Ok(written)
            })
            .await
    }

    async fn replace_group_memberships(
        &self,
        memberships: Vec<AssetGroupMembership>,
    ) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let portfolio_ids: BTreeSet<&str> =
                    memberships.iter().map(|m| m.portfolio_id.as_str()).collect();
                for portfolio_id in &portfolio_ids {
                    diesel::delete(
                        asset_group_memberships::table
                            .filter(asset_group_memberships::portfolio_id.eq(*portfolio_id)),
                    )
                    .execute(conn)
                    .into_core()?;
                }
                let rows: Vec<AssetGroupMembershipDB> =
                    memberships.iter().map(AssetGroupMembershipDB::from).collect();
                if rows.is_empty() {
                    return Ok(0);
                }
                let written = diesel::insert_or_ignore_into(asset_group_memberships::table)
                    .values(&rows)
                    .execute(conn)
                    .into_core()?;
                debug!(
                    "Replaced group memberships of {} portfolios ({} rows)",
                    portfolio_ids.len(),
                    written
                );
                Ok(written)
            })
            .await
    }
}
