//! Database model for portfolios.

use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{
    date_text, decimal_text, naive_timestamp_text, parse_date, parse_decimal,
    parse_naive_timestamp,
};
use navfolio_core::portfolios::Portfolio;

#[derive(Queryable, Identifiable, Insertable, Selectable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::portfolios)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct PortfolioDB {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub is_fund: bool,
    pub total_outstanding_units: String,
    pub nav_per_unit: String,
    pub cash_balance: String,
    pub last_nav_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<PortfolioDB> for Portfolio {
    type Error = StorageError;

    fn try_from(db: PortfolioDB) -> Result<Self, Self::Error> {
        Ok(Portfolio {
            total_outstanding_units: parse_decimal(
                "portfolios.total_outstanding_units",
                &db.total_outstanding_units,
            )?,
            nav_per_unit: parse_decimal("portfolios.nav_per_unit", &db.nav_per_unit)?,
            cash_balance: parse_decimal("portfolios.cash_balance", &db.cash_balance)?,
            last_nav_date: db
                .last_nav_date
                .as_deref()
                .map(|d| parse_date("portfolios.last_nav_date", d))
                .transpose()?,
            created_at: parse_naive_timestamp("portfolios.created_at", &db.created_at)?,
            updated_at: parse_naive_timestamp("portfolios.updated_at", &db.updated_at)?,
            id: db.id,
            name: db.name,
            currency: db.currency,
            is_fund: db.is_fund,
        })
    }
}

impl From<&Portfolio> for PortfolioDB {
    fn from(p: &Portfolio) -> Self {
        PortfolioDB {
            id: p.id.clone(),
            name: p.name.clone(),
            currency: p.currency.clone(),
            is_fund: p.is_fund,
            total_outstanding_units: decimal_text(p.total_outstanding_units),
            nav_per_unit: decimal_text(p.nav_per_unit),
            cash_balance: decimal_text(p.cash_balance),
            last_nav_date: p.last_nav_date.map(date_text),
            created_at: naive_timestamp_text(p.created_at),
            updated_at: naive_timestamp_text(p.updated_at),
        }
    }
}
