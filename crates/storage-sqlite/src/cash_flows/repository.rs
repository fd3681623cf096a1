use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use super::model::CashFlowDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found, IntoCore};
use crate::portfolios::adjust_cash_balance;
use crate::schema::cash_flows;
use navfolio_core::cash_flows::{CashFlow, CashFlowRepositoryTrait};
use navfolio_core::Result;

pub struct CashFlowRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CashFlowRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Inserts the row and applies its signed amount to the portfolio balance.
/// Callers run this inside a write job so both land together.
pub(crate) fn insert_cash_flow(conn: &mut SqliteConnection, cash_flow: &CashFlow) -> Result<()> {
    diesel::insert_into(cash_flows::table)
        .values(CashFlowDB::from(cash_flow))
        .execute(conn)
        .into_core()?;
    adjust_cash_balance(conn, &cash_flow.portfolio_id, cash_flow.signed_amount())?;
    Ok(())
}

#[async_trait]
impl CashFlowRepositoryTrait for CashFlowRepository {
    async fn insert(&self, cash_flow: CashFlow) -> Result<CashFlow> {
        self.writer
            .exec(move |conn| {
                insert_cash_flow(conn, &cash_flow)?;
                Ok(cash_flow)
            })
            .await
    }

    fn get_by_id(&self, cash_flow_id: &str) -> Result<CashFlow> {
        let mut conn = get_connection(&self.pool)?;
        let row = cash_flows::table
            .find(cash_flow_id)
            .select(CashFlowDB::as_select())
            .first::<CashFlowDB>(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| not_found("Cash flow", cash_flow_id))?;
        Ok(CashFlow::try_from(row)?)
    }

    fn list_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<CashFlow>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = cash_flows::table
            .filter(cash_flows::portfolio_id.eq(portfolio_id))
            .order((cash_flows::flow_date.asc(), cash_flows::created_at.asc()))
            .select(CashFlowDB::as_select())
            .load::<CashFlowDB>(&mut conn)
            .into_core()?;
        rows.into_iter()
            .map(|row| CashFlow::try_from(row).map_err(Into::into))
            .collect()
    }

    async fn delete(&self, cash_flow_id: &str) -> Result<usize> {
        let cash_flow_id = cash_flow_id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(cash_flows::table.find(cash_flow_id))
                    .execute(conn)
                    .into_core()
            })
            .await
    }
}
