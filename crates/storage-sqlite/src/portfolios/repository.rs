use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::model::PortfolioDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found, IntoCore, StorageError};
use crate::schema::portfolios;
use crate::utils::{date_text, decimal_text, naive_timestamp_text};
use navfolio_core::portfolios::{FundState, NewPortfolio, Portfolio, PortfolioRepositoryTrait};
use navfolio_core::Result;

pub struct PortfolioRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PortfolioRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Loads one portfolio row on an open connection.
pub(crate) fn load_portfolio(conn: &mut SqliteConnection, portfolio_id: &str) -> Result<Portfolio> {
    let row = portfolios::table
        .find(portfolio_id)
        .select(PortfolioDB::as_select())
        .first::<PortfolioDB>(conn)
        .optional()
        .into_core()?
        .ok_or_else(|| not_found("Portfolio", portfolio_id))?;
    Ok(Portfolio::try_from(row)?)
}

/// Writes the fund slice of a portfolio on an open connection.
pub(crate) fn write_fund_state(
    conn: &mut SqliteConnection,
    portfolio_id: &str,
    state: &FundState,
) -> Result<Portfolio> {
    let updated = diesel::update(portfolios::table.find(portfolio_id))
        .set((
            portfolios::is_fund.eq(state.is_fund),
            portfolios::total_outstanding_units.eq(decimal_text(state.total_outstanding_units)),
            portfolios::nav_per_unit.eq(decimal_text(state.nav_per_unit)),
            portfolios::last_nav_date.eq(state.last_nav_date.map(date_text)),
            portfolios::updated_at.eq(naive_timestamp_text(Utc::now().naive_utc())),
        ))
        .execute(conn)
        .into_core()?;
    if updated == 0 {
        return Err(not_found("Portfolio", portfolio_id));
    }
    load_portfolio(conn, portfolio_id)
}

/// Adds `delta` to the stored cash balance on an open connection.
pub(crate) fn adjust_cash_balance(
    conn: &mut SqliteConnection,
    portfolio_id: &str,
    delta: Decimal,
) -> Result<Portfolio> {
    let current = load_portfolio(conn, portfolio_id)?;
    write_cash_balance(conn, portfolio_id, current.cash_balance + delta)
}

pub(crate) fn write_cash_balance(
    conn: &mut SqliteConnection,
    portfolio_id: &str,
    balance: Decimal,
) -> Result<Portfolio> {
    let updated = diesel::update(portfolios::table.find(portfolio_id))
        .set((
            portfolios::cash_balance.eq(decimal_text(balance)),
            portfolios::updated_at.eq(naive_timestamp_text(Utc::now().naive_utc())),
        ))
        .execute(conn)
        .into_core()?;
    if updated == 0 {
        return Err(not_found("Portfolio", portfolio_id));
    }
    load_portfolio(conn, portfolio_id)
}

#[async_trait]
impl PortfolioRepositoryTrait for PortfolioRepository {
    async fn create(&self, new_portfolio: NewPortfolio) -> Result<Portfolio> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Portfolio> {
                let now = Utc::now().naive_utc();
                let portfolio = Portfolio {
                    id: new_portfolio
                        .id
                        .unwrap_or_else(|| Uuid::now_v7().to_string()),
                    name: new_portfolio.name,
                    currency: new_portfolio.currency,
                    is_fund: false,
                    total_outstanding_units: Decimal::ZERO,
                    nav_per_unit: Decimal::ZERO,
                    cash_balance: Decimal::ZERO,
                    last_nav_date: None,
                    created_at: now,
                    updated_at: now,
                };
                let row = diesel::insert_into(portfolios::table)
                    .values(PortfolioDB::from(&portfolio))
                    .returning(PortfolioDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Portfolio::try_from(row)?)
            })
            .await
    }

    fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio> {
        let mut conn = get_connection(&self.pool)?;
        load_portfolio(&mut conn, portfolio_id)
    }

    fn list(&self, is_fund_filter: Option<bool>) -> Result<Vec<Portfolio>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = portfolios::table
            .select(PortfolioDB::as_select())
            .order(portfolios::id.asc())
            .into_boxed();
        if let Some(is_fund) = is_fund_filter {
            query = query.filter(portfolios::is_fund.eq(is_fund));
        }
        let rows = query.load::<PortfolioDB>(&mut conn).into_core()?;
        rows.into_iter()
            .map(|row| Portfolio::try_from(row).map_err(Into::into))
            .collect()
    }

    async fn update_fund_state(&self, portfolio_id: &str, state: FundState) -> Result<Portfolio> {
        let portfolio_id = portfolio_id.to_string();
        self.writer
            .exec(move |conn| write_fund_state(conn, &portfolio_id, &state))
            .await
    }

    async fn update_cash_balance(&self, portfolio_id: &str, balance: Decimal) -> Result<Portfolio> {
        let portfolio_id = portfolio_id.to_string();
        self.writer
            .exec(move |conn| write_cash_balance(conn, &portfolio_id, balance))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_db;
    use rust_decimal_macros::dec;

    fn new_portfolio(id: &str) -> NewPortfolio {
        NewPortfolio {
            id: Some(id.to_string()),
            name: format!("Portfolio {}", id),
            currency: "USD".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (pool, writer, _dir) = create_test_db();
        let repo = PortfolioRepository::new(pool, writer);

        let created = repo.create(new_portfolio("b")).await.unwrap();
        assert!(!created.is_fund);
        assert_eq!(created.cash_balance, Decimal::ZERO);
        repo.create(new_portfolio("a")).await.unwrap();

        let all = repo.list(None).unwrap();
        assert_eq!(
            all.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(repo.get_by_id("missing").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_fund_state_and_balance_updates() {
        let (pool, writer, _dir) = create_test_db();
        let repo = PortfolioRepository::new(pool, writer);
        repo.create(new_portfolio("p1")).await.unwrap();

        let state = FundState {
            is_fund: true,
            total_outstanding_units: dec!(9999000.12345678),
            nav_per_unit: dec!(1.1),
            last_nav_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        let updated = repo.update_fund_state("p1", state.clone()).await.unwrap();
        assert_eq!(updated.fund_state(), state);

        repo.update_cash_balance("p1", dec!(-12.5)).await.unwrap();
        assert_eq!(repo.get_by_id("p1").unwrap().cash_balance, dec!(-12.5));

        assert_eq!(repo.list(Some(true)).unwrap().len(), 1);
        assert!(repo.list(Some(false)).unwrap().is_empty());
        assert!(repo
            .update_cash_balance("nope", Decimal::ONE)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
