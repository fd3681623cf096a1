use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, main_lib::AppState};
use navfolio_core::funds::FundResetSummary;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetBody {
    portfolio_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PurgeBody {
    before: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PurgeResult {
    deleted: usize,
}

/// Tears fund data back down; one portfolio when named, otherwise every fund.
async fn reset_fund_data(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ResetBody>>,
) -> ApiResult<Json<Vec<FundResetSummary>>> {
    let body = body.map(|Json(inner)| inner).unwrap_or_default();
    let summaries = match body.portfolio_id {
        Some(portfolio_id) => vec![state.fund_service.reset_fund(&portfolio_id).await?],
        None => state.fund_service.reset_all_funds().await?,
    };
    tracing::warn!("Reset fund data of {} portfolios", summaries.len());
    Ok(Json(summaries))
}

async fn purge_executions(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PurgeBody>,
) -> ApiResult<Json<PurgeResult>> {
    let deleted = state.execution_tracker.purge_before(body.before).await?;
    Ok(Json(PurgeResult { deleted }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/reset-fund-data", post(reset_fund_data))
        .route("/admin/executions/purge", post(purge_executions))
}
