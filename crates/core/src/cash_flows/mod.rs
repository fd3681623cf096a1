//! Cash-flow ledger: typed cash movements and the derived cash balance.

mod cash_flows_model;
mod cash_flows_service;
mod cash_flows_traits;

pub use cash_flows_model::{compute_balance, CashFlow, CashFlowType, NewCashFlow};
pub use cash_flows_service::CashFlowService;
pub use cash_flows_traits::{CashFlowRepositoryTrait, CashFlowServiceTrait};

#[cfg(test)]
mod cash_flows_service_tests;
