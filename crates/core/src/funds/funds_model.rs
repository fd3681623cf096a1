//! Fund unit accounting domain models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::cash_flows::CashFlow;
use crate::errors::{Result, ValidationError};
use crate::portfolios::{FundState, Portfolio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundTransactionType {
    Subscribe,
    Redeem,
}

impl FundTransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            FundTransactionType::Subscribe => "SUBSCRIBE",
            FundTransactionType::Redeem => "REDEEM",
        }
    }
}

impl fmt::Display for FundTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FundTransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SUBSCRIBE" => Ok(FundTransactionType::Subscribe),
            "REDEEM" => Ok(FundTransactionType::Redeem),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown fund transaction type '{}'",
                other
            ))),
        }
    }
}

/// Units of one fund held by one investor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestorHolding {
    pub id: String,
    pub portfolio_id: String,
    pub investor_id: String,
    pub investor_name: Option<String>,
    pub units_held: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Immutable record of a unit issuance or cancellation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundUnitTransaction {
    pub id: String,
    pub holding_id: String,
    pub portfolio_id: String,
    pub transaction_type: FundTransactionType,
    /// Positive for subscriptions, negative for redemptions.
    pub units_delta: Decimal,
    pub nav_per_unit_at_execution: Decimal,
    pub cash_amount: Decimal,
    pub cash_flow_id: String,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub investor_id: String,
    pub investor_name: Option<String>,
    pub cash_amount: Decimal,
}

impl SubscribeRequest {
    pub fn validate(&self) -> Result<()> {
        ValidationError::ensure_present("investorId", &self.investor_id)?;
        ValidationError::ensure_positive("cashAmount", self.cash_amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub units: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateNavRequest {
    pub market_value: Decimal,
    pub as_of: NaiveDate,
}

/// How a subscribe/redeem touches the investor holding.
#[derive(Debug, Clone, PartialEq)]
pub enum HoldingChange {
    Create(InvestorHolding),
    Update {
        holding_id: String,
        units_held: Decimal,
    },
}

/// Everything a subscribe or redeem writes. Repositories apply it as a
/// single transaction: holding, unit transaction, linked cash flow, the
/// portfolio's fund fields, and the cash balance shifted by the flow's
/// signed amount.
#[derive(Debug, Clone)]
pub struct FundMutation {
    pub portfolio_id: String,
    pub holding: HoldingChange,
    pub transaction: FundUnitTransaction,
    pub cash_flow: CashFlow,
    pub fund_state: FundState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundTransactionResult {
    pub holding: InvestorHolding,
    pub transaction: FundUnitTransaction,
    pub cash_flow: CashFlow,
    pub portfolio: Portfolio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingDetail {
    pub holding: InvestorHolding,
    pub transactions: Vec<FundUnitTransaction>,
    pub nav_per_unit: Decimal,
    pub current_value: Decimal,
    pub ownership_percentage: Decimal,
}

/// One step of a fund reset, in the order it must run.
#[derive(Debug, Clone, PartialEq)]
pub enum FundResetStep {
    DeleteCashFlows(Vec<String>),
    DeleteFundTransactions(Vec<String>),
    DeleteHoldings(Vec<String>),
    ResetPortfolioFundState,
}

/// Ordered deletion plan that tears a fund back down to a plain portfolio.
///
/// Steps always run cash flows, then transactions, then holdings, then the
/// portfolio fund fields, so no step leaves a dangling reference behind.
/// Only cash flows linked to the portfolio's fund transactions are touched.
#[derive(Debug, Clone, PartialEq)]
pub struct FundResetPlan {
    portfolio_id: String,
    steps: Vec<FundResetStep>,
}

impl FundResetPlan {
    pub fn builder(portfolio_id: impl Into<String>) -> FundResetPlanBuilder {
        FundResetPlanBuilder {
            portfolio_id: portfolio_id.into(),
            cash_flow_ids: BTreeSet::new(),
            transaction_ids: BTreeSet::new(),
            holding_ids: BTreeSet::new(),
        }
    }

    pub fn portfolio_id(&self) -> &str {
        &self.portfolio_id
    }

    pub fn steps(&self) -> &[FundResetStep] {
        &self.steps
    }
}

pub struct FundResetPlanBuilder {
    portfolio_id: String,
    cash_flow_ids: BTreeSet<String>,
    transaction_ids: BTreeSet<String>,
    holding_ids: BTreeSet<String>,
}

impl FundResetPlanBuilder {
    /// Schedules a transaction and the cash flow it generated.
    pub fn transaction(mut self, transaction: &FundUnitTransaction) -> Self {
        self.cash_flow_ids.insert(transaction.cash_flow_id.clone());
        self.transaction_ids.insert(transaction.id.clone());
        self
    }

    pub fn transactions<'a>(
        self,
        transactions: impl IntoIterator<Item = &'a FundUnitTransaction>,
    ) -> Self {
        transactions.into_iter().fold(self, |b, tx| b.transaction(tx))
    }

    pub fn holding(mut self, holding: &InvestorHolding) -> Self {
        self.holding_ids.insert(holding.id.clone());
        self
    }

    pub fn holdings<'a>(self, holdings: impl IntoIterator<Item = &'a InvestorHolding>) -> Self {
        holdings.into_iter().fold(self, |b, h| b.holding(h))
    }

    pub fn build(self) -> FundResetPlan {
        let mut steps = Vec::with_capacity(4);
        if !self.cash_flow_ids.is_empty() {
            steps.push(FundResetStep::DeleteCashFlows(
                self.cash_flow_ids.into_iter().collect(),
            ));
        }
        if !self.transaction_ids.is_empty() {
            steps.push(FundResetStep::DeleteFundTransactions(
                self.transaction_ids.into_iter().collect(),
            ));
        }
        if !self.holding_ids.is_empty() {
            steps.push(FundResetStep::DeleteHoldings(
                self.holding_ids.into_iter().collect(),
            ));
        }
        steps.push(FundResetStep::ResetPortfolioFundState);
        FundResetPlan {
            portfolio_id: self.portfolio_id,
            steps,
        }
    }
}

/// Row counts removed by applying a `FundResetPlan`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundResetCounts {
    pub cash_flows: usize,
    pub transactions: usize,
    pub holdings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundResetSummary {
    pub portfolio_id: String,
    pub cash_flows_deleted: usize,
    pub transactions_deleted: usize,
    pub holdings_deleted: usize,
    pub cash_balance: Decimal,
}
