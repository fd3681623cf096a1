use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use navfolio_server::{api::app_router, build_state, config::Config};

async fn build_test_router() -> (Router, TempDir) {
    let tmp = tempdir().unwrap();
    let mut config = Config::from_env();
    config.db_path = tmp.path().join("test.db").to_string_lossy().to_string();
    let state = build_state(&config).await.unwrap();
    (app_router(state, &config), tmp)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_portfolio(app: &Router, id: &str) {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/portfolios",
        Some(json!({ "id": id, "name": format!("Portfolio {}", id), "currency": "USD" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn healthz_responds() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn fund_lifecycle_over_http() {
    let (app, _tmp) = build_test_router().await;
    create_portfolio(&app, "fund1").await;

    let (status, body) = send(&app, Method::POST, "/api/v1/portfolios/fund1/convert-to-fund", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isFund"], true);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/portfolios/fund1/subscribe",
        Some(json!({ "investorId": "alice", "cashAmount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["holding"]["unitsHeld"].as_f64(), Some(1000.0));
    let holding_id = body["holding"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/portfolios/fund1/nav",
        Some(json!({ "marketValue": 1100, "asOf": "2024-06-03" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["navPerUnit"].as_f64(), Some(1.1));

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/holdings/{}/redeem", holding_id),
        Some(json!({ "units": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cashFlow"]["amount"].as_f64(), Some(110.0));
    assert_eq!(body["portfolio"]["cashBalance"].as_f64(), Some(890.0));

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/holdings/{}/redeem", holding_id),
        Some(json!({ "units": 5000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_UNITS");

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/holdings/{}", holding_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::GET, "/api/v1/holdings/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/reset-fund-data",
        Some(json!({ "portfolioId": "fund1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["holdingsDeleted"], 1);
    assert_eq!(body[0]["cashBalance"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn cash_flow_validation_and_balance() {
    let (app, _tmp) = build_test_router().await;
    create_portfolio(&app, "p1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/portfolios/p1/cash-flows",
        Some(json!({ "flowType": "DEPOSIT", "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    for (flow_type, amount) in [("DEPOSIT", 1000), ("FEE", 25)] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/portfolios/p1/cash-flows",
            Some(json!({ "flowType": flow_type, "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::POST, "/api/v1/portfolios/p1/cash-balance/recompute", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cashBalance"].as_f64(), Some(975.0));

    let (_, flows) = send(&app, Method::GET, "/api/v1/portfolios/p1/cash-flows", None).await;
    assert_eq!(flows.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn snapshot_run_completes_in_background() {
    let (app, _tmp) = build_test_router().await;
    create_portfolio(&app, "p1").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/market-inputs/positions",
        Some(json!([
            { "portfolioId": "p1", "assetId": "AAPL", "quantity": 10, "costBasis": 1000, "avgCost": 100, "realizedPl": 0 },
            { "portfolioId": "p1", "assetId": "MSFT", "quantity": 5, "costBasis": 1500, "avgCost": 300, "realizedPl": 0 }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/market-inputs/prices",
        Some(json!([
            { "assetId": "AAPL", "priceDate": "2024-06-03", "price": 110 },
            { "assetId": "MSFT", "priceDate": "2024-06-03", "price": 320 }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["written"], 2);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/snapshots/run",
        Some(json!({ "portfolioId": "p1", "asOf": "2024-06-03", "createdBy": "test" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let execution_id = body["executionId"].as_str().unwrap().to_string();

    let mut record = Value::Null;
    for _ in 0..100 {
        let (_, current) = send(
            &app,
            Method::GET,
            &format!("/api/v1/snapshots/executions/{}", execution_id),
            None,
        )
        .await;
        if current["status"] == "COMPLETED" || current["status"] == "FAILED" {
            record = current;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(record["status"], "COMPLETED");
    assert_eq!(record["successfulSnapshots"], 1);

    let (status, rows) = send(
        &app,
        Method::GET,
        "/api/v1/portfolios/p1/allocation?date=2024-06-03&granularity=DAILY",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["assetId"], "AAPL");
    assert_eq!(rows[0]["currentValue"].as_f64(), Some(1100.0));

    let (_, history) = send(&app, Method::GET, "/api/v1/portfolios/p1/performance", None).await;
    assert_eq!(history[0]["currentValue"].as_f64(), Some(2700.0));

    let (status, stats) = send(&app, Method::GET, "/api/v1/snapshots/executions/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalExecutions"], 1);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/snapshots/executions/{}/cancel", execution_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
