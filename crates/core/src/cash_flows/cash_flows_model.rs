//! Cash flow domain models.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::DECIMAL_PRECISION;
use crate::errors::{Result, ValidationError};

/// Typed category of a cash movement. Each type has a fixed sign
/// contribution to the portfolio cash balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowType {
    Deposit,
    Withdrawal,
    Dividend,
    Interest,
    BuyTrade,
    SellTrade,
    Fee,
    Tax,
    DepositSettlement,
    Subscribe,
    Redeem,
}

impl CashFlowType {
    pub const ALL: [CashFlowType; 11] = [
        CashFlowType::Deposit,
        CashFlowType::Withdrawal,
        CashFlowType::Dividend,
        CashFlowType::Interest,
        CashFlowType::BuyTrade,
        CashFlowType::SellTrade,
        CashFlowType::Fee,
        CashFlowType::Tax,
        CashFlowType::DepositSettlement,
        CashFlowType::Subscribe,
        CashFlowType::Redeem,
    ];

    /// Inflow types add to the balance; every other type subtracts.
    pub fn is_inflow(self) -> bool {
        matches!(
            self,
            CashFlowType::Deposit
                | CashFlowType::Dividend
                | CashFlowType::Interest
                | CashFlowType::SellTrade
                | CashFlowType::DepositSettlement
                | CashFlowType::Subscribe
        )
    }

    pub fn sign(self) -> Decimal {
        if self.is_inflow() {
            Decimal::ONE
        } else {
            Decimal::NEGATIVE_ONE
        }
    }

    /// Types produced by fund unit accounting.
    pub fn is_fund_flow(self) -> bool {
        matches!(self, CashFlowType::Subscribe | CashFlowType::Redeem)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CashFlowType::Deposit => "DEPOSIT",
            CashFlowType::Withdrawal => "WITHDRAWAL",
            CashFlowType::Dividend => "DIVIDEND",
            CashFlowType::Interest => "INTEREST",
            CashFlowType::BuyTrade => "BUY_TRADE",
            CashFlowType::SellTrade => "SELL_TRADE",
            CashFlowType::Fee => "FEE",
            CashFlowType::Tax => "TAX",
            CashFlowType::DepositSettlement => "DEPOSIT_SETTLEMENT",
            CashFlowType::Subscribe => "SUBSCRIBE",
            CashFlowType::Redeem => "REDEEM",
        }
    }
}

impl fmt::Display for CashFlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CashFlowType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CashFlowType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidInput(format!("Unknown cash flow type '{}'", s)))
    }
}

/// Domain model for one immutable cash movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub id: String,
    pub portfolio_id: String,
    pub flow_type: CashFlowType,
    /// Non-negative magnitude; direction comes from `flow_type`.
    pub amount: Decimal,
    pub flow_date: DateTime<Utc>,
    pub description: Option<String>,
    /// Set when the flow was generated by a fund unit transaction.
    pub fund_transaction_id: Option<String>,
    pub created_at: NaiveDateTime,
}

impl CashFlow {
    pub fn signed_amount(&self) -> Decimal {
        self.flow_type.sign() * self.amount
    }

    pub fn is_fund_linked(&self) -> bool {
        self.fund_transaction_id.is_some()
    }
}

/// Input model for recording a cash movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCashFlow {
    pub portfolio_id: String,
    pub flow_type: CashFlowType,
    pub amount: Decimal,
    pub flow_date: DateTime<Utc>,
    pub description: Option<String>,
}

impl NewCashFlow {
    pub fn validate(&self) -> Result<()> {
        ValidationError::ensure_present("portfolioId", &self.portfolio_id)?;
        ValidationError::ensure_non_negative("amount", self.amount)?;
        Ok(())
    }

    /// Materializes the row, optionally linked to a fund transaction.
    pub fn into_cash_flow(self, fund_transaction_id: Option<String>) -> CashFlow {
        CashFlow {
            id: uuid::Uuid::now_v7().to_string(),
            portfolio_id: self.portfolio_id,
            flow_type: self.flow_type,
            amount: self.amount.round_dp(DECIMAL_PRECISION),
            flow_date: self.flow_date,
            description: self.description,
            fund_transaction_id,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Signed sum of a cash-flow history. Order-independent.
pub fn compute_balance(flows: &[CashFlow]) -> Decimal {
    flows.iter().map(CashFlow::signed_amount).sum()
}
