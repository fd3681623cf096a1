use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::cash_flows_model::{compute_balance, CashFlow, NewCashFlow};
use super::cash_flows_traits::{CashFlowRepositoryTrait, CashFlowServiceTrait};
use crate::errors::{Error, Result};
use crate::locks::{PortfolioGuard, PortfolioLocks};
use crate::portfolios::PortfolioRepositoryTrait;

/// Append-only ledger of typed cash movements per portfolio.
pub struct CashFlowService {
    repository: Arc<dyn CashFlowRepositoryTrait>,
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    locks: Arc<PortfolioLocks>,
}

impl CashFlowService {
    pub fn new(
        repository: Arc<dyn CashFlowRepositoryTrait>,
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        locks: Arc<PortfolioLocks>,
    ) -> Self {
        Self {
            repository,
            portfolio_repository,
            locks,
        }
    }

    async fn recompute_locked(&self, portfolio_id: &str) -> Result<Decimal> {
        let flows = self.repository.list_by_portfolio(portfolio_id)?;
        let balance = compute_balance(&flows);
        self.portfolio_repository
            .update_cash_balance(portfolio_id, balance)
            .await?;
        debug!(
            "Recomputed cash balance for portfolio {} from {} flows: {}",
            portfolio_id,
            flows.len(),
            balance
        );
        Ok(balance)
    }
}

#[async_trait]
impl CashFlowServiceTrait for CashFlowService {
    async fn record(&self, new_cash_flow: NewCashFlow) -> Result<CashFlow> {
        new_cash_flow.validate()?;
        let _guard = self.locks.acquire(&new_cash_flow.portfolio_id).await;

        // Fails with NotFound before anything is written.
        self.portfolio_repository
            .get_by_id(&new_cash_flow.portfolio_id)?;

        let cash_flow = new_cash_flow.into_cash_flow(None);
        debug!(
            "Recording {} of {} for portfolio {}",
            cash_flow.flow_type, cash_flow.amount, cash_flow.portfolio_id
        );
        self.repository.insert(cash_flow).await
    }

    async fn delete_cash_flow(&self, cash_flow_id: &str) -> Result<Decimal> {
        let existing = self.repository.get_by_id(cash_flow_id)?;
        let guard = self.locks.acquire(&existing.portfolio_id).await;

        // Re-read under the lock; a concurrent reset may have removed it.
        let cash_flow = self.repository.get_by_id(cash_flow_id)?;
        if let Some(tx_id) = &cash_flow.fund_transaction_id {
            return Err(Error::ConstraintViolation(format!(
                "Cash flow {} belongs to fund transaction {}; use the fund reset tool instead",
                cash_flow_id, tx_id
            )));
        }

        self.repository.delete(cash_flow_id).await?;
        info!(
            "Deleted cash flow {} ({} {}) from portfolio {}",
            cash_flow.id, cash_flow.flow_type, cash_flow.amount, cash_flow.portfolio_id
        );
        self.recompute_balance_with_guard(&guard).await
    }

    async fn recompute_balance(&self, portfolio_id: &str) -> Result<Decimal> {
        let _guard = self.locks.acquire(portfolio_id).await;
        self.portfolio_repository.get_by_id(portfolio_id)?;
        self.recompute_locked(portfolio_id).await
    }

    async fn recompute_balance_with_guard(&self, guard: &PortfolioGuard) -> Result<Decimal> {
        self.recompute_locked(guard.portfolio_id()).await
    }

    fn get_cash_flow(&self, cash_flow_id: &str) -> Result<CashFlow> {
        self.repository.get_by_id(cash_flow_id)
    }

    fn list_cash_flows(&self, portfolio_id: &str) -> Result<Vec<CashFlow>> {
        self.repository.list_by_portfolio(portfolio_id)
    }
}
