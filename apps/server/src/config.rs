use std::net::SocketAddr;
use std::time::Duration;

use navfolio_core::config::{FundConfig, SnapshotRunConfig};
use rust_decimal::Decimal;

/// Server settings read from `NF_*` environment variables (a `.env` file is
/// honoured when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow_origins: Vec<String>,
    pub request_timeout: Duration,
    pub snapshot_run: SnapshotRunConfig,
    pub fund: FundConfig,
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_var(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value '{}' for {}", raw, key);
            None
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let listen_addr = env_parsed("NF_LISTEN_ADDR")
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));
        let db_path = env_var("NF_DB_PATH").unwrap_or_else(|| "./db/navfolio.db".to_string());
        let cors_allow_origins = env_var("NF_CORS_ALLOW_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let request_timeout =
            Duration::from_millis(env_parsed("NF_REQUEST_TIMEOUT_MS").unwrap_or(30_000));

        let mut snapshot_run = SnapshotRunConfig::default();
        if let Some(limit) = env_parsed::<usize>("NF_SNAPSHOT_CONCURRENCY") {
            snapshot_run = snapshot_run.with_max_concurrent_portfolios(limit);
        }
        if let Some(limit) = env_parsed::<usize>("NF_ASSET_CONCURRENCY") {
            snapshot_run = snapshot_run.with_max_concurrent_assets(limit);
        }
        if let Some(ms) = env_parsed::<u64>("NF_LOOKUP_TIMEOUT_MS") {
            snapshot_run = snapshot_run.with_lookup_timeout(Duration::from_millis(ms));
        }

        let mut fund = FundConfig::default();
        if let Some(nav) = env_parsed::<Decimal>("NF_BOOTSTRAP_NAV").filter(|n| *n > Decimal::ZERO) {
            fund.bootstrap_nav = nav;
        }

        Self {
            listen_addr,
            db_path,
            cors_allow_origins,
            request_timeout,
            snapshot_run,
            fund,
        }
    }
}
