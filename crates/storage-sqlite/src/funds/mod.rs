//! SQLite storage implementation for fund unit accounting.

mod model;
mod repository;

pub use model::{FundUnitTransactionDB, InvestorHoldingDB};
pub use repository::FundRepository;
