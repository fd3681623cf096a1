use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::{error::ApiResult, main_lib::AppState};
use navfolio_core::funds::{
    FundTransactionResult, HoldingDetail, InvestorHolding, RecalculateNavRequest, RedeemRequest,
    SubscribeRequest,
};
use navfolio_core::portfolios::Portfolio;

async fn convert_to_fund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Portfolio>> {
    Ok(Json(state.fund_service.convert_to_fund(&id).await?))
}

async fn subscribe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SubscribeRequest>,
) -> ApiResult<Json<FundTransactionResult>> {
    Ok(Json(state.fund_service.subscribe(&id, body).await?))
}

/// Recomputes NAV per unit from an externally supplied market value.
async fn recalculate_nav(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RecalculateNavRequest>,
) -> ApiResult<Json<Portfolio>> {
    let portfolio = state
        .fund_service
        .recalculate_nav(&id, body.market_value, body.as_of)
        .await?;
    Ok(Json(portfolio))
}

async fn list_holdings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<InvestorHolding>>> {
    Ok(Json(state.fund_service.list_holdings(&id)?))
}

async fn redeem(
    State(state): State<Arc<AppState>>,
    Path(holding_id): Path<String>,
    Json(body): Json<RedeemRequest>,
) -> ApiResult<Json<FundTransactionResult>> {
    Ok(Json(state.fund_service.redeem(&holding_id, body.units).await?))
}

async fn get_holding(
    State(state): State<Arc<AppState>>,
    Path(holding_id): Path<String>,
) -> ApiResult<Json<HoldingDetail>> {
    Ok(Json(state.fund_service.get_holding_detail(&holding_id)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolios/{id}/convert-to-fund", post(convert_to_fund))
        .route("/portfolios/{id}/subscribe", post(subscribe))
        .route("/portfolios/{id}/nav", post(recalculate_nav))
        .route("/portfolios/{id}/holdings", get(list_holdings))
        .route("/holdings/{id}", get(get_holding))
        .route("/holdings/{id}/redeem", post(redeem))
}
