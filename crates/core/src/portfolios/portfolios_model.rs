//! Portfolio domain models.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, Result};

/// Domain model representing a portfolio.
///
/// Fund fields (`is_fund`, `total_outstanding_units`, `nav_per_unit`,
/// `last_nav_date`) are only written by fund accounting; `cash_balance`
/// only by the cash-flow ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub name: String,
    pub currency: String,
    pub is_fund: bool,
    pub total_outstanding_units: Decimal,
    pub nav_per_unit: Decimal,
    pub cash_balance: Decimal,
    pub last_nav_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Portfolio {
    pub fn fund_state(&self) -> FundState {
        FundState {
            is_fund: self.is_fund,
            total_outstanding_units: self.total_outstanding_units,
            nav_per_unit: self.nav_per_unit,
            last_nav_date: self.last_nav_date,
        }
    }

    /// Market value of outstanding units at the current NAV.
    pub fn units_value(&self) -> Decimal {
        self.total_outstanding_units * self.nav_per_unit
    }
}

/// Input model for creating a new portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolio {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub currency: String,
}

impl NewPortfolio {
    /// Validates the new portfolio data.
    pub fn validate(&self) -> Result<()> {
        ValidationError::ensure_present("name", &self.name)?;
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidInput(format!(
                "Currency must be a 3-letter code, got '{}'",
                self.currency
            ))
            .into());
        }
        Ok(())
    }
}

/// The fund-accounting slice of a portfolio, written as one unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundState {
    pub is_fund: bool,
    pub total_outstanding_units: Decimal,
    pub nav_per_unit: Decimal,
    pub last_nav_date: Option<NaiveDate>,
}

impl FundState {
    /// State of a portfolio that is not (or no longer) a fund.
    pub fn not_fund() -> Self {
        Self {
            is_fund: false,
            total_outstanding_units: Decimal::ZERO,
            nav_per_unit: Decimal::ZERO,
            last_nav_date: None,
        }
    }

    /// A non-fund portfolio carries no units and no NAV.
    pub fn is_consistent(&self) -> bool {
        self.is_fund
            || (self.total_outstanding_units.is_zero() && self.nav_per_unit.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_portfolio_validation() {
        let ok = NewPortfolio {
            id: None,
            name: "Growth".to_string(),
            currency: "USD".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_currency = NewPortfolio {
            currency: "US".to_string(),
            ..ok.clone()
        };
        assert!(bad_currency.validate().is_err());

        let blank_name = NewPortfolio {
            name: "  ".to_string(),
            ..ok
        };
        assert!(blank_name.validate().is_err());
    }

    #[test]
    fn test_fund_state_consistency() {
        assert!(FundState::not_fund().is_consistent());

        let stray_units = FundState {
            total_outstanding_units: dec!(10),
            ..FundState::not_fund()
        };
        assert!(!stray_units.is_consistent());

        let fund = FundState {
            is_fund: true,
            total_outstanding_units: dec!(10),
            nav_per_unit: dec!(1.1),
            last_nav_date: None,
        };
        assert!(fund.is_consistent());
    }
}
