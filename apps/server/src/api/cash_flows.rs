use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, main_lib::AppState};
use navfolio_core::cash_flows::{CashFlow, CashFlowType, NewCashFlow};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordCashFlowBody {
    flow_type: CashFlowType,
    amount: Decimal,
    flow_date: Option<DateTime<Utc>>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CashBalanceResponse {
    cash_balance: Decimal,
}

async fn record_cash_flow(
    State(state): State<Arc<AppState>>,
    Path(portfolio_id): Path<String>,
    Json(body): Json<RecordCashFlowBody>,
) -> ApiResult<(StatusCode, Json<CashFlow>)> {
    let flow = state
        .cash_flow_service
        .record(NewCashFlow {
            portfolio_id,
            flow_type: body.flow_type,
            amount: body.amount,
            flow_date: body.flow_date.unwrap_or_else(Utc::now),
            description: body.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(flow)))
}

async fn list_cash_flows(
    State(state): State<Arc<AppState>>,
    Path(portfolio_id): Path<String>,
) -> ApiResult<Json<Vec<CashFlow>>> {
    Ok(Json(state.cash_flow_service.list_cash_flows(&portfolio_id)?))
}

async fn delete_cash_flow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<CashBalanceResponse>> {
    let cash_balance = state.cash_flow_service.delete_cash_flow(&id).await?;
    Ok(Json(CashBalanceResponse { cash_balance }))
}

async fn recompute_balance(
    State(state): State<Arc<AppState>>,
    Path(portfolio_id): Path<String>,
) -> ApiResult<Json<CashBalanceResponse>> {
    let cash_balance = state
        .cash_flow_service
        .recompute_balance(&portfolio_id)
        .await?;
    Ok(Json(CashBalanceResponse { cash_balance }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/portfolios/{id}/cash-flows",
            get(list_cash_flows).post(record_cash_flow),
        )
        .route(
            "/portfolios/{id}/cash-balance/recompute",
            post(recompute_balance),
        )
        .route("/cash-flows/{id}", delete(delete_cash_flow))
}
