use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, main_lib::AppState};
use navfolio_core::executions::{
    ExecutionFilter, ExecutionSchedule, ExecutionStats, ExecutionStatus, ExecutionType,
    SnapshotExecutionRecord,
};
use navfolio_core::portfolio::allocation::AssetAllocationSnapshot;
use navfolio_core::portfolio::performance::{
    AssetGroupPerformanceSnapshot, AssetPerformanceSnapshot, PortfolioPerformanceSnapshot,
};
use navfolio_core::portfolio::runner::{RunScope, RunSnapshotRequest};
use navfolio_core::portfolio::Granularity;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunSnapshotBody {
    portfolio_id: Option<String>,
    execution_type: Option<ExecutionType>,
    as_of: Option<NaiveDate>,
    granularity: Option<Granularity>,
    created_by: Option<String>,
    schedule: Option<ExecutionSchedule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunStarted {
    execution_id: String,
    portfolio_count: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionQuery {
    status: Option<ExecutionStatus>,
    #[serde(rename = "type")]
    execution_type: Option<ExecutionType>,
    portfolio_id: Option<String>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    limit: Option<i64>,
}

impl From<ExecutionQuery> for ExecutionFilter {
    fn from(q: ExecutionQuery) -> Self {
        ExecutionFilter {
            status: q.status,
            execution_type: q.execution_type,
            portfolio_id: q.portfolio_id,
            created_from: q.from,
            created_to: q.to,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CancelBody {
    reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateQuery {
    date: Option<NaiveDate>,
    #[serde(default)]
    granularity: Granularity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    #[serde(default)]
    granularity: Granularity,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Starts a tracked run and executes it in the background.
async fn run_snapshots(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RunSnapshotBody>>,
) -> ApiResult<(StatusCode, Json<RunStarted>)> {
    let body = body.map(|Json(inner)| inner).unwrap_or_default();
    let request = RunSnapshotRequest {
        scope: match body.portfolio_id {
            Some(portfolio_id) => RunScope::Portfolio { portfolio_id },
            None => RunScope::All,
        },
        execution_type: body.execution_type.unwrap_or(ExecutionType::Manual),
        as_of: body.as_of.unwrap_or_else(today),
        granularity: body.granularity.unwrap_or_default(),
        created_by: body.created_by,
        schedule: body.schedule,
    };

    let prepared = state.snapshot_runner.start(request).await?;
    let started = RunStarted {
        execution_id: prepared.execution_id.clone(),
        portfolio_count: prepared.portfolios.len(),
    };

    let runner = state.snapshot_runner.clone();
    tokio::spawn(async move {
        let execution_id = prepared.execution_id.clone();
        match runner.execute(prepared).await {
            Ok(outcome) => tracing::info!(
                "Snapshot run {} finished {}: {} succeeded, {} failed, {} skipped",
                execution_id,
                outcome.status,
                outcome.succeeded.len(),
                outcome.failed.len(),
                outcome.skipped.len()
            ),
            Err(e) => tracing::error!("Snapshot run {} aborted: {}", execution_id, e),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(started)))
}

async fn get_execution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SnapshotExecutionRecord>> {
    Ok(Json(state.execution_tracker.get(&id)?))
}

async fn list_executions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExecutionQuery>,
) -> ApiResult<Json<Vec<SnapshotExecutionRecord>>> {
    Ok(Json(state.execution_tracker.list(&query.into())?))
}

async fn execution_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExecutionQuery>,
) -> ApiResult<Json<ExecutionStats>> {
    Ok(Json(state.execution_tracker.summarize(&query.into())?))
}

async fn cancel_execution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> ApiResult<Json<SnapshotExecutionRecord>> {
    let reason = body
        .and_then(|Json(b)| b.reason)
        .unwrap_or_else(|| "Cancelled by request".to_string());
    Ok(Json(state.execution_tracker.cancel(&id, &reason).await?))
}

async fn get_allocation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<AssetAllocationSnapshot>>> {
    let date = query.date.unwrap_or_else(today);
    Ok(Json(state.allocation_service.get_snapshots_for_date(
        &id,
        date,
        query.granularity,
    )?))
}

async fn get_asset_allocation_history(
    State(state): State<Arc<AppState>>,
    Path((id, asset_id)): Path<(String, String)>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Vec<AssetAllocationSnapshot>>> {
    Ok(Json(state.allocation_service.get_asset_history(
        &id,
        &asset_id,
        query.granularity,
        query.from,
        query.to,
    )?))
}

async fn get_performance_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Vec<PortfolioPerformanceSnapshot>>> {
    Ok(Json(
        state
            .performance_aggregator
            .get_portfolio_performance_history(&id, query.granularity, query.from, query.to)?,
    ))
}

async fn get_group_performance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<AssetGroupPerformanceSnapshot>>> {
    let date = query.date.unwrap_or_else(today);
    Ok(Json(state.performance_aggregator.get_group_performance(
        &id,
        date,
        query.granularity,
    )?))
}

async fn get_asset_performance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<Vec<AssetPerformanceSnapshot>>> {
    let date = query.date.unwrap_or_else(today);
    Ok(Json(state.performance_aggregator.get_asset_performance(
        &id,
        date,
        query.granularity,
    )?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/snapshots/run", post(run_snapshots))
        .route("/snapshots/executions", get(list_executions))
        .route("/snapshots/executions/stats", get(execution_stats))
        .route("/snapshots/executions/{id}", get(get_execution))
        .route("/snapshots/executions/{id}/cancel", post(cancel_execution))
        .route("/portfolios/{id}/allocation", get(get_allocation))
        .route(
            "/portfolios/{id}/allocation/{asset_id}",
            get(get_asset_allocation_history),
        )
        .route("/portfolios/{id}/performance", get(get_performance_history))
        .route("/portfolios/{id}/performance/groups", get(get_group_performance))
        .route("/portfolios/{id}/performance/assets", get(get_asset_performance))
}
