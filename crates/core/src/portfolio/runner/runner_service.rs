use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::runner_model::{PortfolioFailure, PreparedRun, RunOutcome, RunScope, RunSnapshotRequest};
use crate::config::SnapshotRunConfig;
use crate::constants::{DATE_FORMAT, DECIMAL_PRECISION, SYSTEM_USER};
use crate::errors::{Error, Result};
use crate::executions::{
    BeginExecution, ExecutionCompletion, ExecutionMetadata, ExecutionStatus,
    ExecutionTrackerTrait, ProgressDelta,
};
use crate::market_inputs::MarketInputProviderTrait;
use crate::portfolio::allocation::{AllocationInput, AllocationServiceTrait};
use crate::portfolio::performance::{AggregationRequest, PerformanceAggregatorTrait};
use crate::portfolio::returns::overflow;
use crate::portfolios::{Portfolio, PortfolioRepositoryTrait};

enum PortfolioResult {
    Succeeded(String),
    Failed(PortfolioFailure),
    Skipped(String),
    Aborted(String, Error),
}

/// Runs tracked snapshot generation across portfolios: allocation snapshots
/// per asset, then the performance roll-up, with per-portfolio failure
/// isolation.
pub struct SnapshotRunner {
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    market_inputs: Arc<dyn MarketInputProviderTrait>,
    allocation_service: Arc<dyn AllocationServiceTrait>,
    aggregator: Arc<dyn PerformanceAggregatorTrait>,
    tracker: Arc<dyn ExecutionTrackerTrait>,
    config: SnapshotRunConfig,
}

impl SnapshotRunner {
    pub fn new(
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        market_inputs: Arc<dyn MarketInputProviderTrait>,
        allocation_service: Arc<dyn AllocationServiceTrait>,
        aggregator: Arc<dyn PerformanceAggregatorTrait>,
        tracker: Arc<dyn ExecutionTrackerTrait>,
        config: SnapshotRunConfig,
    ) -> Self {
        Self {
            portfolio_repository,
            market_inputs,
            allocation_service,
            aggregator,
            tracker,
            config,
        }
    }

    /// Resolves the portfolios in scope and opens the execution record.
    pub async fn start(&self, request: RunSnapshotRequest) -> Result<PreparedRun> {
        let portfolios = match &request.scope {
            RunScope::All => self.portfolio_repository.list(None)?,
            RunScope::Portfolio { portfolio_id } => {
                vec![self.portfolio_repository.get_by_id(portfolio_id)?]
            }
        };
        let (portfolio_id, portfolio_name) = match (&request.scope, portfolios.first()) {
            (RunScope::Portfolio { .. }, Some(p)) => (Some(p.id.clone()), Some(p.name.clone())),
            _ => (None, None),
        };

        let mut metadata = ExecutionMetadata::new();
        metadata.insert(
            "asOf".to_string(),
            request.as_of.format(DATE_FORMAT).to_string().into(),
        );
        metadata.insert("granularity".to_string(), request.granularity.as_str().into());
        metadata.insert("portfolioCount".to_string(), portfolios.len().into());

        let record = self
            .tracker
            .begin(BeginExecution {
                portfolio_id,
                portfolio_name,
                execution_type: request.execution_type,
                schedule: request.schedule,
                created_by: request
                    .created_by
                    .unwrap_or_else(|| SYSTEM_USER.to_string()),
                metadata,
            })
            .await?;

        Ok(PreparedRun {
            execution_id: record.execution_id,
            portfolios,
            as_of: request.as_of,
            granularity: request.granularity,
            started: Instant::now(),
        })
    }

    /// Convenience for callers that do not need the execution id up front.
    pub async fn run(&self, request: RunSnapshotRequest) -> Result<RunOutcome> {
        let prepared = self.start(request).await?;
        self.execute(prepared).await
    }

    pub async fn execute(&self, run: PreparedRun) -> Result<RunOutcome> {
        let aborted = AtomicBool::new(false);
        let results: Vec<PortfolioResult> = stream::iter(run.portfolios.clone())
            .map(|portfolio| self.process_portfolio(&run, portfolio, &aborted))
            .buffer_unordered(self.config.max_concurrent_portfolios.max(1))
            .collect()
            .await;

        let mut outcome = RunOutcome {
            execution_id: run.execution_id.clone(),
            status: ExecutionStatus::Completed,
            succeeded: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        };
        let mut abort_cause: Option<(String, Error)> = None;
        for result in results {
            match result {
                PortfolioResult::Succeeded(id) => outcome.succeeded.push(id),
                PortfolioResult::Failed(failure) => outcome.failed.push(failure),
                PortfolioResult::Skipped(id) => outcome.skipped.push(id),
                PortfolioResult::Aborted(id, err) => {
                    outcome.skipped.push(id.clone());
                    abort_cause.get_or_insert((id, err));
                }
            }
        }
        outcome.succeeded.sort();
        outcome.skipped.sort();
        outcome
            .failed
            .sort_by(|a, b| a.portfolio_id.cmp(&b.portfolio_id));

        let elapsed_ms = i64::try_from(run.started.elapsed().as_millis()).unwrap_or(i64::MAX);

        if let Some((portfolio_id, err)) = abort_cause {
            let message = format!("Run aborted at portfolio {}: {}", portfolio_id, err);
            error!("Execution {}: {}", run.execution_id, message);
            self.tracker
                .fail(&run.execution_id, &message, elapsed_ms)
                .await?;
            outcome.status = ExecutionStatus::Failed;
            return Ok(outcome);
        }

        if self.tracker.is_cancelled(&run.execution_id)? {
            info!(
                "Execution {} was cancelled; {} portfolios skipped",
                run.execution_id,
                outcome.skipped.len()
            );
            outcome.status = ExecutionStatus::Cancelled;
            return Ok(outcome);
        }

        let mut metadata = ExecutionMetadata::new();
        if !outcome.failed.is_empty() {
            let ids: Vec<&str> = outcome
                .failed
                .iter()
                .map(|f| f.portfolio_id.as_str())
                .collect();
            metadata.insert("failedPortfolioIds".to_string(), ids.join(",").into());
        }
        let error_message = (!outcome.failed.is_empty()).then(|| {
            outcome
                .failed
                .iter()
                .map(|f| format!("{}: {}", f.portfolio_id, f.message))
                .collect::<Vec<_>>()
                .join("; ")
        });

        let completion = ExecutionCompletion {
            successful: outcome.succeeded.len() as i64,
            failed: outcome.failed.len() as i64,
            elapsed_ms,
            error_message,
            metadata,
        };
        match self.tracker.complete(&run.execution_id, completion).await {
            Ok(_) => {}
            // Cancelled after the last portfolio finished.
            Err(Error::ConstraintViolation(_)) if self.tracker.is_cancelled(&run.execution_id)? => {
                outcome.status = ExecutionStatus::Cancelled;
            }
            Err(e) => return Err(e),
        }
        Ok(outcome)
    }

    async fn process_portfolio(
        &self,
        run: &PreparedRun,
        portfolio: Portfolio,
        aborted: &AtomicBool,
    ) -> PortfolioResult {
        let portfolio_id = portfolio.id.clone();
        if aborted.load(Ordering::SeqCst) {
            return PortfolioResult::Skipped(portfolio_id);
        }
        match self.tracker.is_cancelled(&run.execution_id) {
            Ok(false) => {}
            Ok(true) => return PortfolioResult::Skipped(portfolio_id),
            Err(e) => {
                aborted.store(true, Ordering::SeqCst);
                return PortfolioResult::Aborted(portfolio_id, e);
            }
        }

        let result = match self.snapshot_portfolio(run, &portfolio).await {
            Err(e) if e.is_persistence() => {
                aborted.store(true, Ordering::SeqCst);
                return PortfolioResult::Aborted(portfolio_id, e);
            }
            other => other,
        };
        let delta = if result.is_ok() {
            ProgressDelta::success()
        } else {
            ProgressDelta::failure()
        };

        if let Err(e) = self.tracker.mark_progress(&run.execution_id, delta).await {
            if e.is_persistence() {
                aborted.store(true, Ordering::SeqCst);
                return PortfolioResult::Aborted(portfolio_id, e);
            }
            debug!(
                "Progress for portfolio {} not recorded on execution {}: {}",
                portfolio_id, run.execution_id, e
            );
        }

        match result {
            Ok(asset_count) => {
                debug!(
                    "Portfolio {} snapshotted ({} assets)",
                    portfolio_id, asset_count
                );
                PortfolioResult::Succeeded(portfolio_id)
            }
            Err(e) => {
                warn!("Snapshot of portfolio {} failed: {}", portfolio_id, e);
                PortfolioResult::Failed(PortfolioFailure {
                    portfolio_id,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Fetches every asset's inputs, then writes allocation snapshots and the
    /// performance roll-up. Nothing is written unless every asset succeeded.
    async fn snapshot_portfolio(&self, run: &PreparedRun, portfolio: &Portfolio) -> Result<usize> {
        let portfolio_id = portfolio.id.as_str();
        let asset_ids = self
            .with_timeout(
                portfolio_id,
                "asset list",
                self.market_inputs.list_portfolio_assets(portfolio_id),
            )
            .await?;

        let lookups: Vec<Result<AllocationInput>> = stream::iter(asset_ids.clone())
            .map(|asset_id| self.fetch_input(run, portfolio_id, asset_id))
            .buffer_unordered(self.config.max_concurrent_assets.max(1))
            .collect()
            .await;

        let mut inputs = Vec::with_capacity(lookups.len());
        let mut failures = Vec::new();
        for lookup in lookups {
            match lookup {
                Ok(input) => inputs.push(input),
                Err(e) if e.is_persistence() => return Err(e),
                Err(e) => failures.push(e),
            }
        }
        if !failures.is_empty() {
            let first_asset = match &failures[0] {
                Error::SnapshotComputation { asset_id, .. } => asset_id.clone(),
                _ => portfolio_id.to_string(),
            };
            let detail = failures
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::SnapshotComputation {
                asset_id: first_asset,
                message: format!(
                    "{} of {} assets failed: {}",
                    failures.len(),
                    asset_ids.len(),
                    detail
                ),
            });
        }

        let asset_groups = self
            .with_timeout(
                portfolio_id,
                "asset groups",
                self.market_inputs.get_asset_groups(portfolio_id),
            )
            .await?;

        let mut total_value = Decimal::ZERO;
        for input in &inputs {
            let value = input.current_value()?.round_dp(DECIMAL_PRECISION);
            total_value = total_value
                .checked_add(value)
                .ok_or_else(|| overflow(portfolio_id, "portfolio total value"))?;
        }
        self.allocation_service
            .generate_batch(inputs, total_value)
            .await?;

        self.aggregator
            .aggregate(AggregationRequest {
                portfolio_id: portfolio_id.to_string(),
                snapshot_date: run.as_of,
                granularity: run.granularity,
                expected_asset_ids: asset_ids.clone(),
                asset_groups,
            })
            .await?;
        Ok(asset_ids.len())
    }

    async fn fetch_input(
        &self,
        run: &PreparedRun,
        portfolio_id: &str,
        asset_id: String,
    ) -> Result<AllocationInput> {
        let position = self.with_timeout(
            &asset_id,
            "position",
            self.market_inputs.get_position(portfolio_id, &asset_id),
        );
        let price = self.with_timeout(
            &asset_id,
            "price",
            self.market_inputs.get_price(&asset_id, run.as_of),
        );
        let (position, price) =
            futures::try_join!(position, price).map_err(|e| asset_failure(&asset_id, e))?;

        Ok(AllocationInput {
            portfolio_id: portfolio_id.to_string(),
            asset_id,
            as_of: run.as_of,
            granularity: run.granularity,
            position,
            price: price.price,
        })
    }

    async fn with_timeout<T, F>(&self, subject: &str, what: &str, lookup: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.lookup_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(Error::SnapshotComputation {
                asset_id: subject.to_string(),
                message: format!(
                    "{} lookup timed out after {}ms",
                    what,
                    self.config.lookup_timeout.as_millis()
                ),
            }),
        }
    }
}

fn asset_failure(asset_id: &str, err: Error) -> Error {
    match err {
        e @ (Error::Database(_) | Error::SnapshotComputation { .. }) => e,
        other => Error::SnapshotComputation {
            asset_id: asset_id.to_string(),
            message: other.to_string(),
        },
    }
}
