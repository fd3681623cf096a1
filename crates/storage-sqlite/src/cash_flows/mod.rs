//! SQLite storage implementation for the cash-flow ledger.

mod model;
mod repository;

pub use model::CashFlowDB;
pub use repository::CashFlowRepository;
pub(crate) use repository::insert_cash_flow;
