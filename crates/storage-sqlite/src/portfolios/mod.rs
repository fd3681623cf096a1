//! SQLite storage implementation for portfolios.

mod model;
mod repository;

pub use model::PortfolioDB;
pub use repository::PortfolioRepository;
pub(crate) use repository::{adjust_cash_balance, load_portfolio, write_fund_state};
