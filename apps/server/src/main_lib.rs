use std::sync::Arc;

use crate::config::Config;
use navfolio_core::{
    cash_flows::{CashFlowService, CashFlowServiceTrait},
    executions::{ExecutionTracker, ExecutionTrackerTrait},
    funds::{FundService, FundServiceTrait},
    locks::PortfolioLocks,
    market_inputs::MarketInputRepositoryTrait,
    portfolio::allocation::{AllocationService, AllocationServiceTrait},
    portfolio::performance::{PerformanceAggregator, PerformanceAggregatorTrait},
    portfolio::runner::SnapshotRunner,
    portfolios::{PortfolioService, PortfolioServiceTrait},
};
use navfolio_storage_sqlite::{
    cash_flows::CashFlowRepository,
    db::{self, write_actor},
    executions::ExecutionRepository,
    funds::FundRepository,
    market_inputs::MarketInputRepository,
    portfolio::{
        allocation::AllocationSnapshotRepository, performance::PerformanceSnapshotRepository,
    },
    portfolios::PortfolioRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub portfolio_service: Arc<dyn PortfolioServiceTrait>,
    pub cash_flow_service: Arc<dyn CashFlowServiceTrait>,
    pub fund_service: Arc<dyn FundServiceTrait>,
    pub allocation_service: Arc<dyn AllocationServiceTrait>,
    pub performance_aggregator: Arc<dyn PerformanceAggregatorTrait>,
    pub execution_tracker: Arc<dyn ExecutionTrackerTrait>,
    pub snapshot_runner: Arc<SnapshotRunner>,
    pub market_inputs: Arc<dyn MarketInputRepositoryTrait>,
}

pub fn init_tracing() {
    let log_format = std::env::var("NF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // try_init: tests build several routers in one process.
    let installed = if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let portfolio_repository = Arc::new(PortfolioRepository::new(pool.clone(), writer.clone()));
    let cash_flow_repository = Arc::new(CashFlowRepository::new(pool.clone(), writer.clone()));
    let fund_repository = Arc::new(FundRepository::new(pool.clone(), writer.clone()));
    let allocation_repository =
        Arc::new(AllocationSnapshotRepository::new(pool.clone(), writer.clone()));
    let performance_repository =
        Arc::new(PerformanceSnapshotRepository::new(pool.clone(), writer.clone()));
    let execution_repository = Arc::new(ExecutionRepository::new(pool.clone(), writer.clone()));
    let market_input_repository = Arc::new(MarketInputRepository::new(pool.clone(), writer));

    // One lock table shared by every service that mutates a portfolio.
    let locks = Arc::new(PortfolioLocks::new());

    let portfolio_service = Arc::new(PortfolioService::new(portfolio_repository.clone()));
    let cash_flow_service = Arc::new(CashFlowService::new(
        cash_flow_repository,
        portfolio_repository.clone(),
        locks.clone(),
    ));
    let fund_service = Arc::new(FundService::new(
        fund_repository,
        portfolio_repository.clone(),
        cash_flow_service.clone(),
        locks,
        config.fund.clone(),
    ));

    let allocation_service = Arc::new(AllocationService::new(allocation_repository.clone()));
    let performance_aggregator = Arc::new(PerformanceAggregator::new(
        allocation_repository,
        performance_repository,
    ));
    let execution_tracker = Arc::new(ExecutionTracker::new(execution_repository));
    let snapshot_runner = Arc::new(SnapshotRunner::new(
        portfolio_repository,
        market_input_repository.clone(),
        allocation_service.clone(),
        performance_aggregator.clone(),
        execution_tracker.clone(),
        config.snapshot_run.clone(),
    ));

    Ok(Arc::new(AppState {
        portfolio_service,
        cash_flow_service,
        fund_service,
        allocation_service,
        performance_aggregator,
        execution_tracker,
        snapshot_runner,
        market_inputs: market_input_repository,
    }))
}
