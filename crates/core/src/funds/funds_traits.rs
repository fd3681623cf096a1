//! Fund repository and service traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::funds_model::{
    FundMutation, FundResetCounts, FundResetPlan, FundResetSummary, FundTransactionResult,
    FundUnitTransaction, HoldingDetail, InvestorHolding, SubscribeRequest,
};
use crate::errors::Result;
use crate::portfolios::Portfolio;

/// Trait defining the contract for fund ledger persistence.
#[async_trait]
pub trait FundRepositoryTrait: Send + Sync {
    fn get_holding(&self, holding_id: &str) -> Result<InvestorHolding>;

    fn find_holding(&self, portfolio_id: &str, investor_id: &str)
        -> Result<Option<InvestorHolding>>;

    fn list_holdings(&self, portfolio_id: &str) -> Result<Vec<InvestorHolding>>;

    /// Transactions of one holding, oldest first.
    fn list_transactions_for_holding(&self, holding_id: &str) -> Result<Vec<FundUnitTransaction>>;

    fn list_transactions_for_portfolio(
        &self,
        portfolio_id: &str,
    ) -> Result<Vec<FundUnitTransaction>>;

    /// Applies a subscribe/redeem in one transaction. Nothing is written on error.
    async fn apply_mutation(&self, mutation: FundMutation) -> Result<FundTransactionResult>;

    /// Runs the plan's steps in order inside one transaction.
    async fn apply_reset_plan(&self, plan: FundResetPlan) -> Result<FundResetCounts>;
}

/// Trait defining the contract for fund unit accounting.
#[async_trait]
pub trait FundServiceTrait: Send + Sync {
    /// One-way switch of a plain portfolio into fund mode.
    async fn convert_to_fund(&self, portfolio_id: &str) -> Result<Portfolio>;

    async fn subscribe(
        &self,
        portfolio_id: &str,
        request: SubscribeRequest,
    ) -> Result<FundTransactionResult>;

    async fn redeem(&self, holding_id: &str, units: Decimal) -> Result<FundTransactionResult>;

    async fn recalculate_nav(
        &self,
        portfolio_id: &str,
        market_value: Decimal,
        as_of: NaiveDate,
    ) -> Result<Portfolio>;

    /// Administrative cleanup: removes all fund data and returns the portfolio
    /// to the non-fund state.
    async fn reset_fund(&self, portfolio_id: &str) -> Result<FundResetSummary>;

    async fn reset_all_funds(&self) -> Result<Vec<FundResetSummary>>;

    fn get_holding_detail(&self, holding_id: &str) -> Result<HoldingDetail>;

    fn list_holdings(&self, portfolio_id: &str) -> Result<Vec<InvestorHolding>>;
}
