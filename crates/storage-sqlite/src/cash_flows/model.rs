//! Database model for cash flows.

use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{
    decimal_text, naive_timestamp_text, parse_decimal, parse_enum, parse_naive_timestamp,
    parse_timestamp, timestamp_text,
};
use navfolio_core::cash_flows::CashFlow;

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::cash_flows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CashFlowDB {
    pub id: String,
    pub portfolio_id: String,
    pub flow_type: String,
    pub amount: String,
    pub flow_date: String,
    pub description: Option<String>,
    pub fund_transaction_id: Option<String>,
    pub created_at: String,
}

impl TryFrom<CashFlowDB> for CashFlow {
    type Error = StorageError;

    fn try_from(db: CashFlowDB) -> Result<Self, Self::Error> {
        Ok(CashFlow {
            flow_type: parse_enum("cash_flows.flow_type", &db.flow_type)?,
            amount: parse_decimal("cash_flows.amount", &db.amount)?,
            flow_date: parse_timestamp("cash_flows.flow_date", &db.flow_date)?,
            created_at: parse_naive_timestamp("cash_flows.created_at", &db.created_at)?,
            id: db.id,
            portfolio_id: db.portfolio_id,
            description: db.description,
            fund_transaction_id: db.fund_transaction_id,
        })
    }
}

impl From<&CashFlow> for CashFlowDB {
    fn from(c: &CashFlow) -> Self {
        CashFlowDB {
            id: c.id.clone(),
            portfolio_id: c.portfolio_id.clone(),
            flow_type: c.flow_type.as_str().to_string(),
            amount: decimal_text(c.amount),
            flow_date: timestamp_text(c.flow_date),
            description: c.description.clone(),
            fund_transaction_id: c.fund_transaction_id.clone(),
            created_at: naive_timestamp_text(c.created_at),
        }
    }
}
