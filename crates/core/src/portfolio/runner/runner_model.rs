//! Snapshot run request and outcome models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::executions::{ExecutionSchedule, ExecutionStatus, ExecutionType};
use crate::portfolio::Granularity;
use crate::portfolios::Portfolio;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunScope {
    All,
    #[serde(rename_all = "camelCase")]
    Portfolio { portfolio_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshotRequest {
    pub scope: RunScope,
    pub execution_type: ExecutionType,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub granularity: Granularity,
    pub created_by: Option<String>,
    pub schedule: Option<ExecutionSchedule>,
}

/// A run whose execution record exists and whose portfolios are resolved.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub execution_id: String,
    pub portfolios: Vec<Portfolio>,
    pub as_of: NaiveDate,
    pub granularity: Granularity,
    pub(crate) started: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioFailure {
    pub portfolio_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub succeeded: Vec<String>,
    pub failed: Vec<PortfolioFailure>,
    /// Portfolios never started because the run was cancelled or aborted.
    pub skipped: Vec<String>,
}
