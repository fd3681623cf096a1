//! Navfolio Core - Domain entities, services, and traits.
//!
//! This crate holds the portfolio ledger, fund unit accounting and the
//! snapshot engine. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod cash_flows;
pub mod config;
pub mod constants;
pub mod errors;
pub mod executions;
pub mod funds;
pub mod locks;
pub mod market_inputs;
pub mod portfolio;
pub mod portfolios;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
