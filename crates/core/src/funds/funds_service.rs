use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::funds_model::{
    FundMutation, FundResetPlan, FundResetSummary, FundTransactionResult, FundTransactionType,
    FundUnitTransaction, HoldingChange, HoldingDetail, InvestorHolding, SubscribeRequest,
};
use super::funds_traits::{FundRepositoryTrait, FundServiceTrait};
use crate::cash_flows::{CashFlowServiceTrait, CashFlowType, NewCashFlow};
use crate::config::FundConfig;
use crate::constants::{DECIMAL_PRECISION, UNIT_PRECISION};
use crate::errors::{Error, Result, ValidationError};
use crate::locks::PortfolioLocks;
use crate::portfolios::{FundState, Portfolio, PortfolioRepositoryTrait};

/// Converts investor cash into fund units and back, against the
/// portfolio's NAV per unit.
pub struct FundService {
    repository: Arc<dyn FundRepositoryTrait>,
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    cash_flow_service: Arc<dyn CashFlowServiceTrait>,
    locks: Arc<PortfolioLocks>,
    config: FundConfig,
}

impl FundService {
    pub fn new(
        repository: Arc<dyn FundRepositoryTrait>,
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        cash_flow_service: Arc<dyn CashFlowServiceTrait>,
        locks: Arc<PortfolioLocks>,
        config: FundConfig,
    ) -> Self {
        Self {
            repository,
            portfolio_repository,
            cash_flow_service,
            locks,
            config,
        }
    }

    fn require_fund(portfolio: &Portfolio) -> Result<()> {
        if !portfolio.is_fund {
            return Err(Error::ConstraintViolation(format!(
                "Portfolio {} is not a fund",
                portfolio.id
            )));
        }
        Ok(())
    }

    /// NAV to issue units at. A fund with no units and no NAV yet starts
    /// from the bootstrap NAV.
    fn subscription_nav(&self, portfolio: &Portfolio) -> Result<Decimal> {
        if portfolio.nav_per_unit > Decimal::ZERO {
            return Ok(portfolio.nav_per_unit);
        }
        if portfolio.total_outstanding_units.is_zero() {
            return Ok(self.config.bootstrap_nav);
        }
        Err(Error::InsufficientData(format!(
            "Portfolio {} has {} units outstanding but no NAV per unit",
            portfolio.id, portfolio.total_outstanding_units
        )))
    }

    fn divide(numerator: Decimal, denominator: Decimal, what: &str) -> Result<Decimal> {
        numerator
            .checked_div(denominator)
            .ok_or_else(|| Error::Unexpected(format!("Arithmetic overflow computing {}", what)))
    }

    fn multiply(lhs: Decimal, rhs: Decimal, what: &str) -> Result<Decimal> {
        lhs.checked_mul(rhs)
            .ok_or_else(|| Error::Unexpected(format!("Arithmetic overflow computing {}", what)))
    }
}

#[async_trait]
impl FundServiceTrait for FundService {
    async fn convert_to_fund(&self, portfolio_id: &str) -> Result<Portfolio> {
        let _guard = self.locks.acquire(portfolio_id).await;
        let portfolio = self.portfolio_repository.get_by_id(portfolio_id)?;
        if portfolio.is_fund {
            return Err(Error::ConstraintViolation(format!(
                "Portfolio {} is already a fund",
                portfolio_id
            )));
        }

        let state = FundState {
            is_fund: true,
            ..FundState::not_fund()
        };
        let updated = self
            .portfolio_repository
            .update_fund_state(portfolio_id, state)
            .await?;
        info!("Converted portfolio {} to a fund", portfolio_id);
        Ok(updated)
    }

    async fn subscribe(
        &self,
        portfolio_id: &str,
        request: SubscribeRequest,
    ) -> Result<FundTransactionResult> {
        request.validate()?;
        let _guard = self.locks.acquire(portfolio_id).await;

        let portfolio = self.portfolio_repository.get_by_id(portfolio_id)?;
        Self::require_fund(&portfolio)?;
        let nav = self.subscription_nav(&portfolio)?;

        let units = Self::divide(request.cash_amount, nav, "units issued")?.round_dp(UNIT_PRECISION);
        if units.is_zero() {
            return Err(ValidationError::InvalidInput(format!(
                "Cash amount {} is too small to issue units at NAV {}",
                request.cash_amount, nav
            ))
            .into());
        }

        let now = Utc::now();
        let holding = match self
            .repository
            .find_holding(portfolio_id, &request.investor_id)?
        {
            Some(existing) => HoldingChange::Update {
                units_held: existing.units_held + units,
                holding_id: existing.id,
            },
            None => HoldingChange::Create(InvestorHolding {
                id: uuid::Uuid::now_v7().to_string(),
                portfolio_id: portfolio_id.to_string(),
                investor_id: request.investor_id.clone(),
                investor_name: request.investor_name.clone(),
                units_held: units,
                created_at: now.naive_utc(),
                updated_at: now.naive_utc(),
            }),
        };
        let holding_id = match &holding {
            HoldingChange::Create(h) => h.id.clone(),
            HoldingChange::Update { holding_id, .. } => holding_id.clone(),
        };

        let transaction_id = uuid::Uuid::now_v7().to_string();
        let cash_flow = NewCashFlow {
            portfolio_id: portfolio_id.to_string(),
            flow_type: CashFlowType::Subscribe,
            amount: request.cash_amount,
            flow_date: now,
            description: Some(format!("Subscription by {}", request.investor_id)),
        }
        .into_cash_flow(Some(transaction_id.clone()));

        let transaction = FundUnitTransaction {
            id: transaction_id,
            holding_id,
            portfolio_id: portfolio_id.to_string(),
            transaction_type: FundTransactionType::Subscribe,
            units_delta: units,
            nav_per_unit_at_execution: nav,
            cash_amount: request.cash_amount,
            cash_flow_id: cash_flow.id.clone(),
            executed_at: now,
        };

        let fund_state = FundState {
            total_outstanding_units: portfolio.total_outstanding_units + units,
            nav_per_unit: nav,
            ..portfolio.fund_state()
        };

        debug!(
            "Issuing {} units at NAV {} to investor {} in portfolio {}",
            units, nav, request.investor_id, portfolio_id
        );
        let result = self
            .repository
            .apply_mutation(FundMutation {
                portfolio_id: portfolio_id.to_string(),
                holding,
                transaction,
                cash_flow,
                fund_state,
            })
            .await?;
        info!(
            "Subscription of {} into portfolio {} issued {} units",
            request.cash_amount, portfolio_id, units
        );
        Ok(result)
    }

    async fn redeem(&self, holding_id: &str, units: Decimal) -> Result<FundTransactionResult> {
        ValidationError::ensure_positive("units", units)?;
        let portfolio_id = self.repository.get_holding(holding_id)?.portfolio_id;
        let _guard = self.locks.acquire(&portfolio_id).await;

        let holding = self.repository.get_holding(holding_id)?;
        let portfolio = self.portfolio_repository.get_by_id(&portfolio_id)?;
        Self::require_fund(&portfolio)?;

        if units > holding.units_held {
            return Err(Error::InsufficientUnits {
                holding_id: holding.id,
                requested: units,
                available: holding.units_held,
            });
        }
        let nav = portfolio.nav_per_unit;
        if nav <= Decimal::ZERO {
            return Err(Error::InsufficientData(format!(
                "Portfolio {} has no NAV per unit to redeem at",
                portfolio_id
            )));
        }

        let cash_out = Self::multiply(units, nav, "redemption cash")?.round_dp(DECIMAL_PRECISION);
        let now = Utc::now();
        let transaction_id = uuid::Uuid::now_v7().to_string();
        let cash_flow = NewCashFlow {
            portfolio_id: portfolio_id.clone(),
            flow_type: CashFlowType::Redeem,
            amount: cash_out,
            flow_date: now,
            description: Some(format!("Redemption by {}", holding.investor_id)),
        }
        .into_cash_flow(Some(transaction_id.clone()));

        let transaction = FundUnitTransaction {
            id: transaction_id,
            holding_id: holding.id.clone(),
            portfolio_id: portfolio_id.clone(),
            transaction_type: FundTransactionType::Redeem,
            units_delta: -units,
            nav_per_unit_at_execution: nav,
            cash_amount: cash_out,
            cash_flow_id: cash_flow.id.clone(),
            executed_at: now,
        };

        let fund_state = FundState {
            total_outstanding_units: portfolio.total_outstanding_units - units,
            ..portfolio.fund_state()
        };

        let result = self
            .repository
            .apply_mutation(FundMutation {
                portfolio_id: portfolio_id.clone(),
                holding: HoldingChange::Update {
                    holding_id: holding.id.clone(),
                    units_held: holding.units_held - units,
                },
                transaction,
                cash_flow,
                fund_state,
            })
            .await?;
        info!(
            "Redeemed {} units from holding {} at NAV {} for {}",
            units, holding.id, nav, cash_out
        );
        Ok(result)
    }

    async fn recalculate_nav(
        &self,
        portfolio_id: &str,
        market_value: Decimal,
        as_of: NaiveDate,
    ) -> Result<Portfolio> {
        ValidationError::ensure_non_negative("marketValue", market_value)?;
        let _guard = self.locks.acquire(portfolio_id).await;

        let portfolio = self.portfolio_repository.get_by_id(portfolio_id)?;
        Self::require_fund(&portfolio)?;

        let nav = if portfolio.total_outstanding_units > Decimal::ZERO {
            Self::divide(market_value, portfolio.total_outstanding_units, "NAV per unit")?
                .round_dp(UNIT_PRECISION)
        } else {
            Decimal::ZERO
        };

        let state = FundState {
            nav_per_unit: nav,
            last_nav_date: Some(as_of),
            ..portfolio.fund_state()
        };
        let updated = self
            .portfolio_repository
            .update_fund_state(portfolio_id, state)
            .await?;
        debug!(
            "NAV for portfolio {} as of {}: {} ({} units)",
            portfolio_id, as_of, nav, portfolio.total_outstanding_units
        );
        Ok(updated)
    }

    async fn reset_fund(&self, portfolio_id: &str) -> Result<FundResetSummary> {
        let guard = self.locks.acquire(portfolio_id).await;
        self.portfolio_repository.get_by_id(portfolio_id)?;

        let holdings = self.repository.list_holdings(portfolio_id)?;
        let transactions = self.repository.list_transactions_for_portfolio(portfolio_id)?;
        let plan = FundResetPlan::builder(portfolio_id)
            .transactions(&transactions)
            .holdings(&holdings)
            .build();

        let counts = self.repository.apply_reset_plan(plan).await?;
        let cash_balance = self
            .cash_flow_service
            .recompute_balance_with_guard(&guard)
            .await?;

        info!(
            "Reset fund data for portfolio {}: {} cash flows, {} transactions, {} holdings removed; cash balance now {}",
            portfolio_id, counts.cash_flows, counts.transactions, counts.holdings, cash_balance
        );
        Ok(FundResetSummary {
            portfolio_id: portfolio_id.to_string(),
            cash_flows_deleted: counts.cash_flows,
            transactions_deleted: counts.transactions,
            holdings_deleted: counts.holdings,
            cash_balance,
        })
    }

    async fn reset_all_funds(&self) -> Result<Vec<FundResetSummary>> {
        let funds = self.portfolio_repository.list(Some(true))?;
        let mut summaries = Vec::with_capacity(funds.len());
        for portfolio in funds {
            summaries.push(self.reset_fund(&portfolio.id).await?);
        }
        Ok(summaries)
    }

    fn get_holding_detail(&self, holding_id: &str) -> Result<HoldingDetail> {
        let holding = self.repository.get_holding(holding_id)?;
        let portfolio = self.portfolio_repository.get_by_id(&holding.portfolio_id)?;
        let transactions = self.repository.list_transactions_for_holding(holding_id)?;

        let nav = portfolio.nav_per_unit;
        let current_value =
            Self::multiply(holding.units_held, nav, "holding value")?.round_dp(DECIMAL_PRECISION);
        let ownership_percentage = if portfolio.total_outstanding_units > Decimal::ZERO {
            (holding.units_held / portfolio.total_outstanding_units * Decimal::ONE_HUNDRED)
                .round_dp(DECIMAL_PRECISION)
        } else {
            Decimal::ZERO
        };

        Ok(HoldingDetail {
            holding,
            transactions,
            nav_per_unit: nav,
            current_value,
            ownership_percentage,
        })
    }

    fn list_holdings(&self, portfolio_id: &str) -> Result<Vec<InvestorHolding>> {
        self.repository.list_holdings(portfolio_id)
    }
}
