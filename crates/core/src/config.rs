//! Runtime knobs for the snapshot engine and fund accounting.

use rust_decimal::Decimal;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BOOTSTRAP_NAV, DEFAULT_LOOKUP_TIMEOUT_MS, DEFAULT_MAX_CONCURRENT_ASSETS,
    DEFAULT_MAX_CONCURRENT_PORTFOLIOS,
};

/// Configuration for snapshot runs.
#[derive(Debug, Clone)]
pub struct SnapshotRunConfig {
    /// Upper bound on portfolios processed at the same time.
    pub max_concurrent_portfolios: usize,
    /// Upper bound on asset lookups in flight within one portfolio.
    pub max_concurrent_assets: usize,
    /// Deadline applied to every external price/position lookup.
    pub lookup_timeout: Duration,
}

impl Default for SnapshotRunConfig {
    fn default() -> Self {
        Self {
            max_concurrent_portfolios: DEFAULT_MAX_CONCURRENT_PORTFOLIOS,
            max_concurrent_assets: DEFAULT_MAX_CONCURRENT_ASSETS,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
        }
    }
}

impl SnapshotRunConfig {
    pub fn with_max_concurrent_portfolios(mut self, limit: usize) -> Self {
        self.max_concurrent_portfolios = limit.max(1);
        self
    }

    pub fn with_max_concurrent_assets(mut self, limit: usize) -> Self {
        self.max_concurrent_assets = limit.max(1);
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}

/// Configuration for fund unit accounting.
#[derive(Debug, Clone)]
pub struct FundConfig {
    /// NAV applied to the first subscription when no units are outstanding.
    pub bootstrap_nav: Decimal,
}

impl Default for FundConfig {
    fn default() -> Self {
        Self {
            bootstrap_nav: DEFAULT_BOOTSTRAP_NAV,
        }
    }
}
