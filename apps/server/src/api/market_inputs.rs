use std::sync::Arc;

use axum::{extract::State, routing::put, Json, Router};
use serde::Serialize;

use crate::{error::ApiResult, main_lib::AppState};
use navfolio_core::market_inputs::{AssetGroupMembership, AssetPosition, AssetPrice};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteCount {
    written: usize,
}

async fn upsert_positions(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Vec<AssetPosition>>,
) -> ApiResult<Json<WriteCount>> {
    let written = state.market_inputs.upsert_positions(body).await?;
    Ok(Json(WriteCount { written }))
}

async fn upsert_prices(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Vec<AssetPrice>>,
) -> ApiResult<Json<WriteCount>> {
    let written = state.market_inputs.upsert_prices(body).await?;
    Ok(Json(WriteCount { written }))
}

async fn replace_groups(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Vec<AssetGroupMembership>>,
) -> ApiResult<Json<WriteCount>> {
    let written = state.market_inputs.replace_group_memberships(body).await?;
    Ok(Json(WriteCount { written }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/market-inputs/positions", put(upsert_positions))
        .route("/market-inputs/prices", put(upsert_prices))
        .route("/market-inputs/groups", put(replace_groups))
}
