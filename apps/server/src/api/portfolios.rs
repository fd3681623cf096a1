use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{error::ApiResult, main_lib::AppState};
use navfolio_core::portfolios::{NewPortfolio, Portfolio};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    is_fund: Option<bool>,
}

async fn create_portfolio(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewPortfolio>,
) -> ApiResult<(StatusCode, Json<Portfolio>)> {
    let portfolio = state.portfolio_service.create_portfolio(body).await?;
    Ok((StatusCode::CREATED, Json(portfolio)))
}

async fn list_portfolios(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Portfolio>>> {
    Ok(Json(state.portfolio_service.list_portfolios(query.is_fund)?))
}

async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Portfolio>> {
    Ok(Json(state.portfolio_service.get_portfolio(&id)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolios", get(list_portfolios).post(create_portfolio))
        .route("/portfolios/{id}", get(get_portfolio))
}
