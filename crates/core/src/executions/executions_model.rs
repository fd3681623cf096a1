//! Snapshot execution record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Started,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub const TERMINAL: [ExecutionStatus; 3] = [
        ExecutionStatus::Completed,
        ExecutionStatus::Failed,
        ExecutionStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Started => "STARTED",
            ExecutionStatus::InProgress => "IN_PROGRESS",
            ExecutionStatus::Completed => "COMPLETED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STARTED" => Ok(ExecutionStatus::Started),
            "IN_PROGRESS" => Ok(ExecutionStatus::InProgress),
            "COMPLETED" => Ok(ExecutionStatus::Completed),
            "FAILED" => Ok(ExecutionStatus::Failed),
            "CANCELLED" => Ok(ExecutionStatus::Cancelled),
            _ => Err(ValidationError::InvalidInput(format!(
                "Unknown execution status '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    Automated,
    Manual,
    Test,
}

impl ExecutionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionType::Automated => "AUTOMATED",
            ExecutionType::Manual => "MANUAL",
            ExecutionType::Test => "TEST",
        }
    }
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AUTOMATED" => Ok(ExecutionType::Automated),
            "MANUAL" => Ok(ExecutionType::Manual),
            "TEST" => Ok(ExecutionType::Test),
            _ => Err(ValidationError::InvalidInput(format!(
                "Unknown execution type '{}'",
                s
            ))),
        }
    }
}

/// Primitive metadata value. Untagged so it serializes as plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Number(value as f64)
    }
}

pub type ExecutionMetadata = BTreeMap<String, MetadataValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSchedule {
    pub cron_expression: String,
    pub timezone: String,
}

/// Audit record of one batch snapshot run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotExecutionRecord {
    pub execution_id: String,
    /// Empty when the run spans all portfolios.
    pub portfolio_id: Option<String>,
    pub portfolio_name: Option<String>,
    pub status: ExecutionStatus,
    pub execution_type: ExecutionType,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_snapshots: i64,
    pub successful_snapshots: i64,
    pub failed_snapshots: i64,
    pub execution_time_ms: Option<i64>,
    pub error_message: Option<String>,
    pub metadata: ExecutionMetadata,
    pub created_by: String,
    pub schedule: Option<ExecutionSchedule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginExecution {
    pub portfolio_id: Option<String>,
    pub portfolio_name: Option<String>,
    pub execution_type: ExecutionType,
    pub schedule: Option<ExecutionSchedule>,
    pub created_by: String,
    #[serde(default)]
    pub metadata: ExecutionMetadata,
}

impl BeginExecution {
    pub fn validate(&self) -> Result<()> {
        ValidationError::ensure_present("createdBy", &self.created_by)?;
        match (&self.execution_type, &self.schedule) {
            (ExecutionType::Automated, None) => Err(ValidationError::MissingField(
                "schedule".to_string(),
            )
            .into()),
            (_, Some(schedule)) => {
                ValidationError::ensure_present("schedule.cronExpression", &schedule.cron_expression)?;
                ValidationError::ensure_present("schedule.timezone", &schedule.timezone)
            }
            _ => Ok(()),
        }
    }
}

/// Counts reported by one unit of work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDelta {
    pub succeeded: i64,
    pub failed: i64,
}

impl ProgressDelta {
    pub fn success() -> Self {
        Self {
            succeeded: 1,
            failed: 0,
        }
    }

    pub fn failure() -> Self {
        Self {
            succeeded: 0,
            failed: 1,
        }
    }
}

/// Final report of a run that attempted every unit of work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionCompletion {
    pub successful: i64,
    pub failed: i64,
    pub elapsed_ms: i64,
    pub error_message: Option<String>,
    pub metadata: ExecutionMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFilter {
    pub status: Option<ExecutionStatus>,
    pub execution_type: Option<ExecutionType>,
    pub portfolio_id: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl ExecutionFilter {
    pub fn matches(&self, record: &SnapshotExecutionRecord) -> bool {
        self.status.map_or(true, |s| record.status == s)
            && self.execution_type.map_or(true, |t| record.execution_type == t)
            && self
                .portfolio_id
                .as_ref()
                .map_or(true, |p| record.portfolio_id.as_ref() == Some(p))
            && self.created_from.map_or(true, |from| record.created_at >= from)
            && self.created_to.map_or(true, |to| record.created_at <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub total_executions: usize,
    pub by_status: BTreeMap<String, usize>,
    pub total_snapshots: i64,
    pub successful_snapshots: i64,
    pub failed_snapshots: i64,
    pub average_execution_time_ms: Option<f64>,
}

impl ExecutionStats {
    pub fn from_records(records: &[SnapshotExecutionRecord]) -> Self {
        let mut stats = ExecutionStats {
            total_executions: records.len(),
            ..Default::default()
        };
        let mut timed = Vec::new();
        for record in records {
            *stats
                .by_status
                .entry(record.status.as_str().to_string())
                .or_default() += 1;
            stats.total_snapshots += record.total_snapshots;
            stats.successful_snapshots += record.successful_snapshots;
            stats.failed_snapshots += record.failed_snapshots;
            if let Some(ms) = record.execution_time_ms {
                timed.push(ms as f64);
            }
        }
        if !timed.is_empty() {
            stats.average_execution_time_ms = Some(timed.iter().sum::<f64>() / timed.len() as f64);
        }
        stats
    }
}
