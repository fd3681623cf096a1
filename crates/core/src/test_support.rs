//! In-memory repositories shared by service tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::cash_flows::{CashFlow, CashFlowRepositoryTrait};
use crate::errors::{Error, Result};
use crate::funds::{
    FundMutation, FundRepositoryTrait, FundResetCounts, FundResetPlan, FundResetStep,
    FundTransactionResult, FundUnitTransaction, HoldingChange, InvestorHolding,
};
use crate::executions::{ExecutionFilter, ExecutionRepositoryTrait, SnapshotExecutionRecord};
use crate::market_inputs::{AssetGroup, AssetPosition, AssetPrice, MarketInputProviderTrait};
use crate::portfolio::allocation::{AllocationSnapshotRepositoryTrait, AssetAllocationSnapshot};
use crate::portfolio::performance::{
    AssetGroupPerformanceSnapshot, AssetPerformanceSnapshot, PerformanceRollup,
    PerformanceSnapshotRepositoryTrait, PortfolioPerformanceSnapshot,
};
use crate::portfolio::Granularity;
use crate::portfolios::{FundState, NewPortfolio, Portfolio, PortfolioRepositoryTrait};

#[derive(Default)]
struct LedgerTables {
    portfolios: HashMap<String, Portfolio>,
    cash_flows: Vec<CashFlow>,
    holdings: Vec<InvestorHolding>,
    transactions: Vec<FundUnitTransaction>,
}

/// Portfolio, cash-flow and fund tables behind one lock, so multi-table
/// writes are atomic the same way a database transaction would be.
#[derive(Default)]
pub struct MemoryLedger {
    tables: RwLock<LedgerTables>,
    /// When set, every write fails with a database error.
    fail_writes: RwLock<bool>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_portfolio(self, id: &str) -> Self {
        let now = Utc::now().naive_utc();
        self.tables.write().unwrap().portfolios.insert(
            id.to_string(),
            Portfolio {
                id: id.to_string(),
                name: format!("Portfolio {}", id),
                currency: "USD".to_string(),
                is_fund: false,
                total_outstanding_units: Decimal::ZERO,
                nav_per_unit: Decimal::ZERO,
                cash_balance: Decimal::ZERO,
                last_nav_date: None,
                created_at: now,
                updated_at: now,
            },
        );
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write().unwrap() = fail;
    }

    pub fn set_cash_balance(&self, id: &str, balance: Decimal) {
        if let Some(p) = self.tables.write().unwrap().portfolios.get_mut(id) {
            p.cash_balance = balance;
        }
    }

    pub fn portfolio(&self, id: &str) -> Portfolio {
        self.tables.read().unwrap().portfolios[id].clone()
    }

    pub fn cash_flow_count(&self) -> usize {
        self.tables.read().unwrap().cash_flows.len()
    }

    pub fn holding_count(&self, portfolio_id: &str) -> usize {
        self.tables
            .read()
            .unwrap()
            .holdings
            .iter()
            .filter(|h| h.portfolio_id == portfolio_id)
            .count()
    }

    pub fn transaction_count(&self, portfolio_id: &str) -> usize {
        self.tables
            .read()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.portfolio_id == portfolio_id)
            .count()
    }

    fn check_writable(&self) -> Result<()> {
        if *self.fail_writes.read().unwrap() {
            return Err(Error::Database(crate::errors::DatabaseError::ConnectionFailed(
                "storage unavailable".to_string(),
            )));
        }
        Ok(())
    }
}

fn not_found(what: &str, id: &str) -> Error {
    Error::NotFound(format!("{} {} not found", what, id))
}

#[async_trait]
impl PortfolioRepositoryTrait for MemoryLedger {
    async fn create(&self, new_portfolio: NewPortfolio) -> Result<Portfolio> {
        self.check_writable()?;
        let now = Utc::now().naive_utc();
        let portfolio = Portfolio {
            id: new_portfolio
                .id
                .unwrap_or_else(|| uuid::Uuid::now_v7().to_string()),
            name: new_portfolio.name,
            currency: new_portfolio.currency,
            is_fund: false,
            total_outstanding_units: Decimal::ZERO,
            nav_per_unit: Decimal::ZERO,
            cash_balance: Decimal::ZERO,
            last_nav_date: None,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .unwrap()
            .portfolios
            .insert(portfolio.id.clone(), portfolio.clone());
        Ok(portfolio)
    }

    fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio> {
        self.tables
            .read()
            .unwrap()
            .portfolios
            .get(portfolio_id)
            .cloned()
            .ok_or_else(|| not_found("Portfolio", portfolio_id))
    }

    fn list(&self, is_fund_filter: Option<bool>) -> Result<Vec<Portfolio>> {
        let tables = self.tables.read().unwrap();
        let mut portfolios: Vec<Portfolio> = tables
            .portfolios
            .values()
            .filter(|p| is_fund_filter.map_or(true, |f| p.is_fund == f))
            .cloned()
            .collect();
        portfolios.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(portfolios)
    }

    async fn update_fund_state(&self, portfolio_id: &str, state: FundState) -> Result<Portfolio> {
        self.check_writable()?;
        let mut tables = self.tables.write().unwrap();
        let portfolio = tables
            .portfolios
            .get_mut(portfolio_id)
            .ok_or_else(|| not_found("Portfolio", portfolio_id))?;
        portfolio.is_fund = state.is_fund;
        portfolio.total_outstanding_units = state.total_outstanding_units;
        portfolio.nav_per_unit = state.nav_per_unit;
        portfolio.last_nav_date = state.last_nav_date;
        Ok(portfolio.clone())
    }

    async fn update_cash_balance(&self, portfolio_id: &str, balance: Decimal) -> Result<Portfolio> {
        self.check_writable()?;
        let mut tables = self.tables.write().unwrap();
        let portfolio = tables
            .portfolios
            .get_mut(portfolio_id)
            .ok_or_else(|| not_found("Portfolio", portfolio_id))?;
        portfolio.cash_balance = balance;
        Ok(portfolio.clone())
    }
}

#[async_trait]
impl CashFlowRepositoryTrait for MemoryLedger {
    async fn insert(&self, cash_flow: CashFlow) -> Result<CashFlow> {
        self.check_writable()?;
        let mut tables = self.tables.write().unwrap();
        let portfolio = tables
            .portfolios
            .get_mut(&cash_flow.portfolio_id)
            .ok_or_else(|| not_found("Portfolio", &cash_flow.portfolio_id))?;
        portfolio.cash_balance += cash_flow.signed_amount();
        tables.cash_flows.push(cash_flow.clone());
        Ok(cash_flow)
    }

    fn get_by_id(&self, cash_flow_id: &str) -> Result<CashFlow> {
        self.tables
            .read()
            .unwrap()
            .cash_flows
            .iter()
            .find(|c| c.id == cash_flow_id)
            .cloned()
            .ok_or_else(|| not_found("Cash flow", cash_flow_id))
    }

    fn list_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<CashFlow>> {
        let mut flows: Vec<CashFlow> = self
            .tables
            .read()
            .unwrap()
            .cash_flows
            .iter()
            .filter(|c| c.portfolio_id == portfolio_id)
            .cloned()
            .collect();
        flows.sort_by_key(|c| c.flow_date);
        Ok(flows)
    }

    async fn delete(&self, cash_flow_id: &str) -> Result<usize> {
        self.check_writable()?;
        let mut tables = self.tables.write().unwrap();
        let before = tables.cash_flows.len();
        tables.cash_flows.retain(|c| c.id != cash_flow_id);
        Ok(before - tables.cash_flows.len())
    }
}

#[async_trait]
impl FundRepositoryTrait for MemoryLedger {
    fn get_holding(&self, holding_id: &str) -> Result<InvestorHolding> {
        self.tables
            .read()
            .unwrap()
            .holdings
            .iter()
            .find(|h| h.id == holding_id)
            .cloned()
            .ok_or_else(|| not_found("Holding", holding_id))
    }

    fn find_holding(
        &self,
        portfolio_id: &str,
        investor_id: &str,
    ) -> Result<Option<InvestorHolding>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .holdings
            .iter()
            .find(|h| h.portfolio_id == portfolio_id && h.investor_id == investor_id)
            .cloned())
    }

    fn list_holdings(&self, portfolio_id: &str) -> Result<Vec<InvestorHolding>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .holdings
            .iter()
            .filter(|h| h.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }

    fn list_transactions_for_holding(&self, holding_id: &str) -> Result<Vec<FundUnitTransaction>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.holding_id == holding_id)
            .cloned()
            .collect())
    }

    fn list_transactions_for_portfolio(
        &self,
        portfolio_id: &str,
    ) -> Result<Vec<FundUnitTransaction>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }

    async fn apply_mutation(&self, mutation: FundMutation) -> Result<FundTransactionResult> {
        self.check_writable()?;
        let mut tables = self.tables.write().unwrap();
        if !tables.portfolios.contains_key(&mutation.portfolio_id) {
            return Err(not_found("Portfolio", &mutation.portfolio_id));
        }

        let holding = match mutation.holding {
            HoldingChange::Create(holding) => {
                tables.holdings.push(holding.clone());
                holding
            }
            HoldingChange::Update {
                holding_id,
                units_held,
            } => {
                let holding = tables
                    .holdings
                    .iter_mut()
                    .find(|h| h.id == holding_id)
                    .ok_or_else(|| not_found("Holding", &holding_id))?;
                holding.units_held = units_held;
                holding.updated_at = Utc::now().naive_utc();
                holding.clone()
            }
        };
        tables.transactions.push(mutation.transaction.clone());
        tables.cash_flows.push(mutation.cash_flow.clone());

        let portfolio = tables
            .portfolios
            .get_mut(&mutation.portfolio_id)
            .ok_or_else(|| not_found("Portfolio", &mutation.portfolio_id))?;
        portfolio.is_fund = mutation.fund_state.is_fund;
        portfolio.total_outstanding_units = mutation.fund_state.total_outstanding_units;
        portfolio.nav_per_unit = mutation.fund_state.nav_per_unit;
        portfolio.last_nav_date = mutation.fund_state.last_nav_date;
        portfolio.cash_balance += mutation.cash_flow.signed_amount();

        Ok(FundTransactionResult {
            holding,
            transaction: mutation.transaction,
            cash_flow: mutation.cash_flow,
            portfolio: portfolio.clone(),
        })
    }

    async fn apply_reset_plan(&self, plan: FundResetPlan) -> Result<FundResetCounts> {
        self.check_writable()?;
        let mut tables = self.tables.write().unwrap();
        let mut counts = FundResetCounts::default();
        for step in plan.steps() {
            match step {
                FundResetStep::DeleteCashFlows(ids) => {
                    let before = tables.cash_flows.len();
                    tables.cash_flows.retain(|c| !ids.contains(&c.id));
                    counts.cash_flows = before - tables.cash_flows.len();
                }
                FundResetStep::DeleteFundTransactions(ids) => {
                    // Mirrors the foreign key from cash flows to transactions.
                    if tables.cash_flows.iter().any(|c| {
                        c.fund_transaction_id
                            .as_ref()
                            .is_some_and(|t| ids.contains(t))
                    }) {
                        return Err(Error::ConstraintViolation(
                            "cash flow still references a fund transaction".to_string(),
                        ));
                    }
                    let before = tables.transactions.len();
                    tables.transactions.retain(|t| !ids.contains(&t.id));
                    counts.transactions = before - tables.transactions.len();
                }
                FundResetStep::DeleteHoldings(ids) => {
                    let before = tables.holdings.len();
                    tables.holdings.retain(|h| !ids.contains(&h.id));
                    counts.holdings = before - tables.holdings.len();
                }
                FundResetStep::ResetPortfolioFundState => {
                    let portfolio = tables
                        .portfolios
                        .get_mut(plan.portfolio_id())
                        .ok_or_else(|| not_found("Portfolio", plan.portfolio_id()))?;
                    let state = FundState::not_fund();
                    portfolio.is_fund = state.is_fund;
                    portfolio.total_outstanding_units = state.total_outstanding_units;
                    portfolio.nav_per_unit = state.nav_per_unit;
                    portfolio.last_nav_date = state.last_nav_date;
                }
            }
        }
        Ok(counts)
    }
}

// ============================================================================
// Snapshot tables
// ============================================================================

#[derive(Default)]
struct SnapshotTables {
    allocations: BTreeMap<String, AssetAllocationSnapshot>,
    asset_performance: BTreeMap<String, AssetPerformanceSnapshot>,
    group_performance: BTreeMap<String, AssetGroupPerformanceSnapshot>,
    portfolio_performance: BTreeMap<String, PortfolioPerformanceSnapshot>,
}

/// Allocation and performance snapshot tables keyed by snapshot id.
#[derive(Default)]
pub struct MemorySnapshots {
    tables: RwLock<SnapshotTables>,
    fail_writes: RwLock<bool>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write().unwrap() = fail;
    }

    pub fn allocation_count(&self) -> usize {
        self.tables.read().unwrap().allocations.len()
    }

    pub fn allocations_for(&self, portfolio_id: &str) -> Vec<AssetAllocationSnapshot> {
        self.tables
            .read()
            .unwrap()
            .allocations
            .values()
            .filter(|s| s.portfolio_id == portfolio_id)
            .cloned()
            .collect()
    }

    pub fn portfolio_performance_count(&self) -> usize {
        self.tables.read().unwrap().portfolio_performance.len()
    }

    fn check_writable(&self) -> Result<()> {
        if *self.fail_writes.read().unwrap() {
            return Err(Error::Database(crate::errors::DatabaseError::QueryFailed(
                "disk I/O error".to_string(),
            )));
        }
        Ok(())
    }
}

fn in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t)
}

#[async_trait]
impl AllocationSnapshotRepositoryTrait for MemorySnapshots {
    async fn upsert_snapshots(&self, snapshots: Vec<AssetAllocationSnapshot>) -> Result<usize> {
        self.check_writable()?;
        let mut tables = self.tables.write().unwrap();
        let count = snapshots.len();
        for snapshot in snapshots {
            tables.allocations.insert(snapshot.id.clone(), snapshot);
        }
        Ok(count)
    }

    fn get_latest_before(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<AssetAllocationSnapshot>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .allocations
            .values()
            .filter(|s| {
                s.portfolio_id == portfolio_id
                    && s.asset_id == asset_id
                    && s.granularity == granularity
                    && s.snapshot_date < before
            })
            .max_by_key(|s| s.snapshot_date)
            .cloned())
    }

    fn get_snapshots_for_date(
        &self,
        portfolio_id: &str,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetAllocationSnapshot>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .allocations
            .values()
            .filter(|s| {
                s.portfolio_id == portfolio_id
                    && s.snapshot_date == snapshot_date
                    && s.granularity == granularity
            })
            .cloned()
            .collect())
    }

    fn get_asset_history(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AssetAllocationSnapshot>> {
        let mut rows: Vec<_> = self
            .tables
            .read()
            .unwrap()
            .allocations
            .values()
            .filter(|s| {
                s.portfolio_id == portfolio_id
                    && s.asset_id == asset_id
                    && s.granularity == granularity
                    && in_range(s.snapshot_date, from, to)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.snapshot_date);
        Ok(rows)
    }
}

#[async_trait]
impl PerformanceSnapshotRepositoryTrait for MemorySnapshots {
    async fn save_rollup(&self, rollup: PerformanceRollup) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.tables.write().unwrap();
        for asset in rollup.assets {
            tables.asset_performance.insert(asset.id.clone(), asset);
        }
        for group in rollup.groups {
            tables.group_performance.insert(group.id.clone(), group);
        }
        tables
            .portfolio_performance
            .insert(rollup.portfolio.id.clone(), rollup.portfolio);
        Ok(())
    }

    fn get_latest_asset_before(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<AssetPerformanceSnapshot>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .asset_performance
            .values()
            .filter(|s| {
                s.portfolio_id == portfolio_id
                    && s.asset_id == asset_id
                    && s.granularity == granularity
                    && s.snapshot_date < before
            })
            .max_by_key(|s| s.snapshot_date)
            .cloned())
    }

    fn get_latest_group_before(
        &self,
        portfolio_id: &str,
        group_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<AssetGroupPerformanceSnapshot>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .group_performance
            .values()
            .filter(|s| {
                s.portfolio_id == portfolio_id
                    && s.group_id == group_id
                    && s.granularity == granularity
                    && s.snapshot_date < before
            })
            .max_by_key(|s| s.snapshot_date)
            .cloned())
    }

    fn get_latest_portfolio_before(
        &self,
        portfolio_id: &str,
        granularity: Granularity,
        before: NaiveDate,
    ) -> Result<Option<PortfolioPerformanceSnapshot>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .portfolio_performance
            .values()
            .filter(|s| {
                s.portfolio_id == portfolio_id
                    && s.granularity == granularity
                    && s.snapshot_date < before
            })
            .max_by_key(|s| s.snapshot_date)
            .cloned())
    }

    fn get_portfolio_history(
        &self,
        portfolio_id: &str,
        granularity: Granularity,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PortfolioPerformanceSnapshot>> {
        let mut rows: Vec<_> = self
            .tables
            .read()
            .unwrap()
            .portfolio_performance
            .values()
            .filter(|s| {
                s.portfolio_id == portfolio_id
                    && s.granularity == granularity
                    && in_range(s.snapshot_date, from, to)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.snapshot_date);
        Ok(rows)
    }

    fn get_group_snapshots(
        &self,
        portfolio_id: &str,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetGroupPerformanceSnapshot>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .group_performance
            .values()
            .filter(|s| {
                s.portfolio_id == portfolio_id
                    && s.snapshot_date == snapshot_date
                    && s.granularity == granularity
            })
            .cloned()
            .collect())
    }

    fn get_asset_snapshots(
        &self,
        portfolio_id: &str,
        snapshot_date: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<AssetPerformanceSnapshot>> {
        Ok(self
            .tables
            .read()
            .unwrap()
            .asset_performance
            .values()
            .filter(|s| {
                s.portfolio_id == portfolio_id
                    && s.snapshot_date == snapshot_date
                    && s.granularity == granularity
            })
            .cloned()
            .collect())
    }
}

// ============================================================================
// Executions
// ============================================================================

#[derive(Default)]
pub struct MemoryExecutions {
    records: RwLock<BTreeMap<String, SnapshotExecutionRecord>>,
}

impl MemoryExecutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdates a record, for retention tests.
    pub fn set_created_at(&self, execution_id: &str, created_at: DateTime<Utc>) {
        if let Some(r) = self.records.write().unwrap().get_mut(execution_id) {
            r.created_at = created_at;
        }
    }
}

#[async_trait]
impl ExecutionRepositoryTrait for MemoryExecutions {
    async fn insert(&self, record: SnapshotExecutionRecord) -> Result<SnapshotExecutionRecord> {
        self.records
            .write()
            .unwrap()
            .insert(record.execution_id.clone(), record.clone());
        Ok(record)
    }

    fn get_by_id(&self, execution_id: &str) -> Result<SnapshotExecutionRecord> {
        self.records
            .read()
            .unwrap()
            .get(execution_id)
            .cloned()
            .ok_or_else(|| not_found("Execution", execution_id))
    }

    fn list(&self, filter: &ExecutionFilter) -> Result<Vec<SnapshotExecutionRecord>> {
        let mut rows: Vec<_> = self
            .records
            .read()
            .unwrap()
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(rows)
    }

    async fn update_active(
        &self,
        record: SnapshotExecutionRecord,
    ) -> Result<SnapshotExecutionRecord> {
        let mut records = self.records.write().unwrap();
        let stored = records
            .get_mut(&record.execution_id)
            .ok_or_else(|| not_found("Execution", &record.execution_id))?;
        if stored.status.is_terminal() {
            return Err(Error::ConstraintViolation(format!(
                "Execution {} is already {}",
                record.execution_id, stored.status
            )));
        }
        *stored = record.clone();
        Ok(record)
    }

    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut records = self.records.write().unwrap();
        let before = records.len();
        records.retain(|_, r| !(r.status.is_terminal() && r.created_at < cutoff));
        Ok(before - records.len())
    }
}

// ============================================================================
// Market inputs
// ============================================================================

/// Scripted market input provider.
#[derive(Default)]
pub struct StubMarketInputs {
    positions: RwLock<HashMap<(String, String), AssetPosition>>,
    prices: RwLock<HashMap<String, Decimal>>,
    groups: RwLock<HashMap<String, Vec<AssetGroup>>>,
    slow_assets: RwLock<HashMap<String, std::time::Duration>>,
}

impl StubMarketInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(
        &self,
        portfolio_id: &str,
        asset_id: &str,
        quantity: Decimal,
        cost_basis: Decimal,
        price: Decimal,
    ) {
        self.positions.write().unwrap().insert(
            (portfolio_id.to_string(), asset_id.to_string()),
            AssetPosition {
                portfolio_id: portfolio_id.to_string(),
                asset_id: asset_id.to_string(),
                quantity,
                cost_basis,
                avg_cost: if quantity.is_zero() {
                    Decimal::ZERO
                } else {
                    cost_basis / quantity
                },
                realized_pl: Decimal::ZERO,
            },
        );
        self.prices
            .write()
            .unwrap()
            .insert(asset_id.to_string(), price);
    }

    pub fn set_price(&self, asset_id: &str, price: Decimal) {
        self.prices
            .write()
            .unwrap()
            .insert(asset_id.to_string(), price);
    }

    pub fn remove_price(&self, asset_id: &str) {
        self.prices.write().unwrap().remove(asset_id);
    }

    pub fn group(&self, portfolio_id: &str, group_id: &str, asset_ids: &[&str]) {
        self.groups
            .write()
            .unwrap()
            .entry(portfolio_id.to_string())
            .or_default()
            .push(AssetGroup {
                group_id: group_id.to_string(),
                asset_ids: asset_ids.iter().map(|a| a.to_string()).collect(),
            });
    }

    /// Price lookups for `asset_id` take `delay` before answering.
    pub fn slow_asset(&self, asset_id: &str, delay: std::time::Duration) {
        self.slow_assets
            .write()
            .unwrap()
            .insert(asset_id.to_string(), delay);
    }
}

#[async_trait]
impl MarketInputProviderTrait for StubMarketInputs {
    async fn list_portfolio_assets(&self, portfolio_id: &str) -> Result<Vec<String>> {
        let mut assets: Vec<String> = self
            .positions
            .read()
            .unwrap()
            .keys()
            .filter(|(p, _)| p == portfolio_id)
            .map(|(_, a)| a.clone())
            .collect();
        assets.sort();
        Ok(assets)
    }

    async fn get_position(&self, portfolio_id: &str, asset_id: &str) -> Result<AssetPosition> {
        self.positions
            .read()
            .unwrap()
            .get(&(portfolio_id.to_string(), asset_id.to_string()))
            .cloned()
            .ok_or_else(|| not_found("Position", asset_id))
    }

    async fn get_price(&self, asset_id: &str, as_of: NaiveDate) -> Result<AssetPrice> {
        let delay = self.slow_assets.read().unwrap().get(asset_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let price = self.prices.read().unwrap().get(asset_id).copied();
        price
            .map(|price| AssetPrice {
                asset_id: asset_id.to_string(),
                price_date: as_of,
                price,
            })
            .ok_or_else(|| not_found("Price", asset_id))
    }

    async fn get_asset_groups(&self, portfolio_id: &str) -> Result<Vec<AssetGroup>> {
        Ok(self
            .groups
            .read()
            .unwrap()
            .get(portfolio_id)
            .cloned()
            .unwrap_or_default())
    }
}
