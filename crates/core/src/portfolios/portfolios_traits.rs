//! Portfolio repository and service traits.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::portfolios_model::{FundState, NewPortfolio, Portfolio};
use crate::errors::Result;

/// Trait defining the contract for Portfolio repository operations.
///
/// The trait is database-agnostic - storage-specific details are handled
/// by concrete implementations.
#[async_trait]
pub trait PortfolioRepositoryTrait: Send + Sync {
    /// Creates a new portfolio in the non-fund state with a zero balance.
    async fn create(&self, new_portfolio: NewPortfolio) -> Result<Portfolio>;

    /// Retrieves a portfolio by its ID.
    fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio>;

    /// Lists portfolios, optionally only funds or only non-funds.
    fn list(&self, is_fund_filter: Option<bool>) -> Result<Vec<Portfolio>>;

    /// Overwrites the fund fields of a portfolio.
    async fn update_fund_state(&self, portfolio_id: &str, state: FundState) -> Result<Portfolio>;

    /// Overwrites the cash balance of a portfolio.
    async fn update_cash_balance(&self, portfolio_id: &str, balance: Decimal) -> Result<Portfolio>;
}

/// Trait defining the contract for Portfolio service operations.
#[async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    async fn create_portfolio(&self, new_portfolio: NewPortfolio) -> Result<Portfolio>;

    fn get_portfolio(&self, portfolio_id: &str) -> Result<Portfolio>;

    fn list_portfolios(&self, is_fund_filter: Option<bool>) -> Result<Vec<Portfolio>>;
}
