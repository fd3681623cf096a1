use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::{FundUnitTransactionDB, InvestorHoldingDB};
use crate::cash_flows::insert_cash_flow;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found, IntoCore};
use crate::portfolios::{load_portfolio, write_fund_state};
use crate::schema::{cash_flows, fund_unit_transactions, investor_holdings};
use crate::utils::{chunk_for_sqlite, decimal_text, naive_timestamp_text};
use navfolio_core::funds::{
    FundMutation, FundRepositoryTrait, FundResetCounts, FundResetPlan, FundResetStep,
    FundTransactionResult, FundUnitTransaction, HoldingChange, InvestorHolding,
};
use navfolio_core::portfolios::FundState;
use navfolio_core::Result;

pub struct FundRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl FundRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn load_holding(conn: &mut SqliteConnection, holding_id: &str) -> Result<InvestorHolding> {
    let row = investor_holdings::table
        .find(holding_id)
        .select(InvestorHoldingDB::as_select())
        .first::<InvestorHoldingDB>(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| not_found("Holding", holding_id))?;
    Ok(InvestorHolding::try_from(row)?)
}

fn to_transactions(rows: Vec<FundUnitTransactionDB>) -> Result<Vec<FundUnitTransaction>> {
    rows.into_iter()
        .map(|row| FundUnitTransaction::try_from(row).map_err(Into::into))
        .collect()
}

fn apply_holding_change(conn: &mut SqliteConnection, change: HoldingChange) -> Result<InvestorHolding> {
    match change {
        HoldingChange::Create(holding) => {
            diesel::insert_into(investor_holdings::table)
                .values(InvestorHoldingDB::from(&holding))
                .execute(conn)
                .into_core()?;
            Ok(holding)
        }
        HoldingChange::Update {
            holding_id,
            units_held,
        } => {
            let updated = diesel::update(investor_holdings::table.find(&holding_id))
                .set((
                    investor_holdings::units_held.eq(decimal_text(units_held)),
                    investor_holdings::updated_at
                        .eq(naive_timestamp_text(Utc::now().naive_utc())),
                ))
                .execute(conn)
                .into_core()?;
            if updated == 0 {
                return Err(not_found("Holding", &holding_id));
            }
            load_holding(conn, &holding_id)
        }
    }
}

#[async_trait]
impl FundRepositoryTrait for FundRepository {
    fn get_holding(&self, holding_id: &str) -> Result<InvestorHolding> {
        let mut conn = get_connection(&self.pool)?;
        load_holding(&mut conn, holding_id)
    }

    fn find_holding(
        &self,
        portfolio_id: &str,
        investor_id: &str,
    ) -> Result<Option<InvestorHolding>> {
        let mut conn = get_connection(&self.pool)?;
        investor_holdings::table
            .filter(investor_holdings::portfolio_id.eq(portfolio_id))
            .filter(investor_holdings::investor_id.eq(investor_id))
            .select(InvestorHoldingDB::as_select())
            .first::<InvestorHoldingDB>(&mut conn)
            .optional()
            .into_core()?
            .map(|row| InvestorHolding::try_from(row).map_err(Into::into))
            .transpose()
    }

    fn list_holdings(&self, portfolio_id: &str) -> Result<Vec<InvestorHolding>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = investor_holdings::table
            .filter(investor_holdings::portfolio_id.eq(portfolio_id))
            .order(investor_holdings::created_at.asc())
            .select(InvestorHoldingDB::as_select())
            .load::<InvestorHoldingDB>(&mut conn)
            .into_core()?;
        rows.into_iter()
            .map(|row| InvestorHolding::try_from(row).map_err(Into::into))
            .collect()
    }

    fn list_transactions_for_holding(&self, holding_id: &str) -> Result<Vec<FundUnitTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = fund_unit_transactions::table
            .filter(fund_unit_transactions::holding_id.eq(holding_id))
            .order(fund_unit_transactions::executed_at.asc())
            .select(FundUnitTransactionDB::as_select())
            .load::<FundUnitTransactionDB>(&mut conn)
            .into_core()?;
        to_transactions(rows)
    }

    fn list_transactions_for_portfolio(
        &self,
        portfolio_id: &str,
    ) -> Result<Vec<FundUnitTransaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = fund_unit_transactions::table
            .filter(fund_unit_transactions::portfolio_id.eq(portfolio_id))
            .order(fund_unit_transactions::executed_at.asc())
            .select(FundUnitTransactionDB::as_select())
            .load::<FundUnitTransactionDB>(&mut conn)
            .into_core()?;
        to_transactions(rows)
    }

    async fn apply_mutation(&self, mutation: FundMutation) -> Result<FundTransactionResult> {
        self.writer
            .exec(move |conn| {
                load_portfolio(conn, &mutation.portfolio_id)?;
                let holding = apply_holding_change(conn, mutation.holding)?;

                // The cash flow references the transaction, so it goes second.
                diesel::insert_into(fund_unit_transactions::table)
                    .values(FundUnitTransactionDB::from(&mutation.transaction))
                    .execute(conn)
                    .into_core()?;
                insert_cash_flow(conn, &mutation.cash_flow)?;
                let portfolio =
                    write_fund_state(conn, &mutation.portfolio_id, &mutation.fund_state)?;

                Ok(FundTransactionResult {
                    holding,
                    transaction: mutation.transaction,
                    cash_flow: mutation.cash_flow,
                    portfolio,
                })
            })
            .await
    }

    async fn apply_reset_plan(&self, plan: FundResetPlan) -> Result<FundResetCounts> {
        self.writer
            .exec(move |conn| {
                let mut counts = FundResetCounts::default();
                for step in plan.steps() {
                    match step {
                        FundResetStep::DeleteCashFlows(ids) => {
                            for chunk in chunk_for_sqlite(ids) {
                                counts.cash_flows +=
                                    diesel::delete(cash_flows::table.filter(cash_flows::id.eq_any(chunk)))
                                        .execute(conn)
                                        .into_core()?;
                            }
                        }
                        FundResetStep::DeleteFundTransactions(ids) => {
                            for chunk in chunk_for_sqlite(ids) {
                                counts.transactions += diesel::delete(
                                    fund_unit_transactions::table
                                        .filter(fund_unit_transactions::id.eq_any(chunk)),
                                )
                                .execute(conn)
                                .into_core()?;
                            }
                        }
                        FundResetStep::DeleteHoldings(ids) => {
                            for chunk in chunk_for_sqlite(ids) {
                                counts.holdings += diesel::delete(
                                    investor_holdings::table
                                        .filter(investor_holdings::id.eq_any(chunk)),
                                )
                                .execute(conn)
                                .into_core()?;
                            }
                        }
                        FundResetStep::ResetPortfolioFundState => {
                            write_fund_state(conn, plan.portfolio_id(), &FundState::not_fund())?;
                        }
                    }
                }
                debug!(
                    "Reset fund {}: {} cash flows, {} transactions, {} holdings",
                    plan.portfolio_id(),
                    counts.cash_flows,
                    counts.transactions,
                    counts.holdings
                );
                Ok(counts)
            })
            .await
    }
}
