//! Cash flow repository and ledger traits.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::cash_flows_model::{CashFlow, NewCashFlow};
use crate::errors::Result;
use crate::locks::PortfolioGuard;

/// Trait defining the contract for CashFlow repository operations.
#[async_trait]
pub trait CashFlowRepositoryTrait: Send + Sync {
    /// Appends a row and applies its signed amount to the owning portfolio's
    /// cash balance, atomically.
    async fn insert(&self, cash_flow: CashFlow) -> Result<CashFlow>;

    /// Retrieves a cash flow by its ID.
    fn get_by_id(&self, cash_flow_id: &str) -> Result<CashFlow>;

    /// Lists all cash flows of a portfolio ordered by flow date.
    fn list_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<CashFlow>>;

    /// Removes a row without touching the balance. Returns deleted row count.
    async fn delete(&self, cash_flow_id: &str) -> Result<usize>;
}

/// The cash-flow ledger. Every mutation serializes on the portfolio lock.
#[async_trait]
pub trait CashFlowServiceTrait: Send + Sync {
    /// Records a cash movement and updates the balance by its signed amount.
    async fn record(&self, new_cash_flow: NewCashFlow) -> Result<CashFlow>;

    /// Deletes a cash flow and recomputes the balance from the remaining rows.
    /// Returns the new balance.
    async fn delete_cash_flow(&self, cash_flow_id: &str) -> Result<Decimal>;

    /// Recomputes the cash balance from scratch and writes it back.
    async fn recompute_balance(&self, portfolio_id: &str) -> Result<Decimal>;

    /// Same as `recompute_balance`, for callers already holding the portfolio lock.
    async fn recompute_balance_with_guard(&self, guard: &PortfolioGuard) -> Result<Decimal>;

    fn get_cash_flow(&self, cash_flow_id: &str) -> Result<CashFlow>;

    fn list_cash_flows(&self, portfolio_id: &str) -> Result<Vec<CashFlow>>;
}
