//! Database models for investor holdings and fund unit transactions.

use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{
    decimal_text, naive_timestamp_text, parse_decimal, parse_enum, parse_naive_timestamp,
    parse_timestamp, timestamp_text,
};
use navfolio_core::funds::{FundUnitTransaction, InvestorHolding};

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::investor_holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InvestorHoldingDB {
    pub id: String,
    pub portfolio_id: String,
    pub investor_id: String,
    pub investor_name: Option<String>,
    pub units_held: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<InvestorHoldingDB> for InvestorHolding {
    type Error = StorageError;

    fn try_from(db: InvestorHoldingDB) -> Result<Self, Self::Error> {
        Ok(InvestorHolding {
            units_held: parse_decimal("investor_holdings.units_held", &db.units_held)?,
            created_at: parse_naive_timestamp("investor_holdings.created_at", &db.created_at)?,
            updated_at: parse_naive_timestamp("investor_holdings.updated_at", &db.updated_at)?,
            id: db.id,
            portfolio_id: db.portfolio_id,
            investor_id: db.investor_id,
            investor_name: db.investor_name,
        })
    }
}

impl From<&InvestorHolding> for InvestorHoldingDB {
    fn from(h: &InvestorHolding) -> Self {
        InvestorHoldingDB {
            id: h.id.clone(),
            portfolio_id: h.portfolio_id.clone(),
            investor_id: h.investor_id.clone(),
            investor_name: h.investor_name.clone(),
            units_held: decimal_text(h.units_held),
            created_at: naive_timestamp_text(h.created_at),
            updated_at: naive_timestamp_text(h.updated_at),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::fund_unit_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FundUnitTransactionDB {
    pub id: String,
    pub holding_id: String,
    pub portfolio_id: String,
    pub transaction_type: String,
    pub units_delta: String,
    pub nav_per_unit_at_execution: String,
    pub cash_amount: String,
    pub cash_flow_id: String,
    pub executed_at: String,
}

impl TryFrom<FundUnitTransactionDB> for FundUnitTransaction {
    type Error = StorageError;

    fn try_from(db: FundUnitTransactionDB) -> Result<Self, Self::Error> {
        Ok(FundUnitTransaction {
            transaction_type: parse_enum(
                "fund_unit_transactions.transaction_type",
                &db.transaction_type,
            )?,
            units_delta: parse_decimal("fund_unit_transactions.units_delta", &db.units_delta)?,
            nav_per_unit_at_execution: parse_decimal(
                "fund_unit_transactions.nav_per_unit_at_execution",
                &db.nav_per_unit_at_execution,
            )?,
            cash_amount: parse_decimal("fund_unit_transactions.cash_amount", &db.cash_amount)?,
            executed_at: parse_timestamp("fund_unit_transactions.executed_at", &db.executed_at)?,
            id: db.id,
            holding_id: db.holding_id,
            portfolio_id: db.portfolio_id,
            cash_flow_id: db.cash_flow_id,
        })
    }
}

impl From<&FundUnitTransaction> for FundUnitTransactionDB {
    fn from(t: &FundUnitTransaction) -> Self {
        FundUnitTransactionDB {
            id: t.id.clone(),
            holding_id: t.holding_id.clone(),
            portfolio_id: t.portfolio_id.clone(),
            transaction_type: t.transaction_type.as_str().to_string(),
            units_delta: decimal_text(t.units_delta),
            nav_per_unit_at_execution: decimal_text(t.nav_per_unit_at_execution),
            cash_amount: decimal_text(t.cash_amount),
            cash_flow_id: t.cash_flow_id.clone(),
            executed_at: timestamp_text(t.executed_at),
        }
    }
}
