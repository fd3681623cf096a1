//! Unit tests for the cash-flow ledger.

use super::*;
use crate::errors::Error;
use crate::locks::PortfolioLocks;
use crate::test_support::MemoryLedger;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn setup() -> (Arc<MemoryLedger>, CashFlowService) {
    let ledger = Arc::new(MemoryLedger::new().with_portfolio("p1").with_portfolio("p2"));
    let service = CashFlowService::new(ledger.clone(), ledger.clone(), Arc::new(PortfolioLocks::new()));
    (ledger, service)
}

fn flow(portfolio_id: &str, flow_type: CashFlowType, amount: Decimal, day: i64) -> NewCashFlow {
    NewCashFlow {
        portfolio_id: portfolio_id.to_string(),
        flow_type,
        amount,
        flow_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day),
        description: None,
    }
}

#[test]
fn test_sign_table() {
    let inflows = [
        CashFlowType::Deposit,
        CashFlowType::Dividend,
        CashFlowType::Interest,
        CashFlowType::SellTrade,
        CashFlowType::DepositSettlement,
        CashFlowType::Subscribe,
    ];
    for t in CashFlowType::ALL {
        let expected = if inflows.contains(&t) { dec!(1) } else { dec!(-1) };
        assert_eq!(t.sign(), expected, "sign of {}", t);
        assert_eq!(t.as_str().parse::<CashFlowType>().unwrap(), t);
    }
}

#[tokio::test]
async fn test_record_applies_signed_amount() {
    let (ledger, service) = setup();

    service.record(flow("p1", CashFlowType::Deposit, dec!(1000), 0)).await.unwrap();
    service.record(flow("p1", CashFlowType::BuyTrade, dec!(400), 1)).await.unwrap();
    service.record(flow("p1", CashFlowType::Dividend, dec!(25.5), 2)).await.unwrap();
    service.record(flow("p1", CashFlowType::Fee, dec!(5.5), 3)).await.unwrap();

    assert_eq!(ledger.portfolio("p1").cash_balance, dec!(620));
    assert_eq!(ledger.portfolio("p2").cash_balance, Decimal::ZERO);
    assert_eq!(service.list_cash_flows("p1").unwrap().len(), 4);
}

#[tokio::test]
async fn test_record_rejects_negative_amount() {
    let (ledger, service) = setup();
    let err = service
        .record(flow("p1", CashFlowType::Deposit, dec!(-1), 0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(ledger.cash_flow_count(), 0);
}

#[tokio::test]
async fn test_record_unknown_portfolio() {
    let (ledger, service) = setup();
    let err = service
        .record(flow("missing", CashFlowType::Deposit, dec!(10), 0))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(ledger.cash_flow_count(), 0);
}

#[tokio::test]
async fn test_delete_recomputes_balance() {
    let (ledger, service) = setup();
    service.record(flow("p1", CashFlowType::Deposit, dec!(1000), 0)).await.unwrap();
    let fee = service.record(flow("p1", CashFlowType::Fee, dec!(30), 1)).await.unwrap();
    service.record(flow("p1", CashFlowType::Interest, dec!(2), 2)).await.unwrap();

    // Drift the stored balance; delete must not adjust it incrementally.
    ledger.set_cash_balance("p1", dec!(999999));

    let balance = service.delete_cash_flow(&fee.id).await.unwrap();
    assert_eq!(balance, dec!(1002));
    assert_eq!(ledger.portfolio("p1").cash_balance, dec!(1002));
    assert!(service.get_cash_flow(&fee.id).unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_recompute_with_no_flows_is_zero() {
    let (ledger, service) = setup();
    ledger.set_cash_balance("p2", dec!(55));
    assert_eq!(service.recompute_balance("p2").await.unwrap(), Decimal::ZERO);
    assert_eq!(ledger.portfolio("p2").cash_balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_delete_then_recompute_equals_never_inserted() {
    let (_ledger, service) = setup();
    service.record(flow("p1", CashFlowType::Deposit, dec!(500), 0)).await.unwrap();
    service.record(flow("p1", CashFlowType::Tax, dec!(12.34), 1)).await.unwrap();
    let without = service.recompute_balance("p1").await.unwrap();

    let extra = service
        .record(flow("p1", CashFlowType::Withdrawal, dec!(77), 2))
        .await
        .unwrap();
    assert_eq!(service.recompute_balance("p1").await.unwrap(), without - dec!(77));

    assert_eq!(service.delete_cash_flow(&extra.id).await.unwrap(), without);
}

#[tokio::test]
async fn test_delete_fund_linked_flow_is_rejected() {
    let (ledger, service) = setup();
    let linked = flow("p1", CashFlowType::Subscribe, dec!(100), 0)
        .into_cash_flow(Some("tx-1".to_string()));
    let linked = CashFlowRepositoryTrait::insert(ledger.as_ref(), linked)
        .await
        .unwrap();

    let err = service.delete_cash_flow(&linked.id).await.unwrap_err();
    assert!(matches!(err, Error::ConstraintViolation(_)));
    assert_eq!(ledger.cash_flow_count(), 1);
    assert_eq!(ledger.portfolio("p1").cash_balance, dec!(100));
}

#[tokio::test]
async fn test_record_rounds_amount_and_uses_time_ordered_ids() {
    let (ledger, service) = setup();

    let first = service
        .record(flow("p1", CashFlowType::Deposit, dec!(10.1234567), 0))
        .await
        .unwrap();
    let second = service
        .record(flow("p1", CashFlowType::Fee, dec!(0.0000004), 1))
        .await
        .unwrap();

    assert_eq!(first.amount, dec!(10.123457));
    assert_eq!(second.amount, Decimal::ZERO);
    assert_eq!(ledger.portfolio("p1").cash_balance, dec!(10.123457));
    assert_eq!(service.recompute_balance("p1").await.unwrap(), dec!(10.123457));

    let version = uuid::Uuid::parse_str(&first.id).unwrap().get_version_num();
    assert_eq!(version, 7);
}
