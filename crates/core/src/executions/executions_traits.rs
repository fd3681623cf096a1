//! Execution tracker repository and service traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::executions_model::{
    BeginExecution, ExecutionCompletion, ExecutionFilter, ExecutionStats, ProgressDelta,
    SnapshotExecutionRecord,
};
use crate::errors::Result;

#[async_trait]
pub trait ExecutionRepositoryTrait: Send + Sync {
    async fn insert(&self, record: SnapshotExecutionRecord) -> Result<SnapshotExecutionRecord>;

    fn get_by_id(&self, execution_id: &str) -> Result<SnapshotExecutionRecord>;

    /// Newest first, truncated to `filter.limit`.
    fn list(&self, filter: &ExecutionFilter) -> Result<Vec<SnapshotExecutionRecord>>;

    /// Overwrites a record that is still non-terminal in storage. Fails with
    /// `ConstraintViolation` when the stored record is already terminal.
    async fn update_active(&self, record: SnapshotExecutionRecord)
        -> Result<SnapshotExecutionRecord>;

    /// Deletes terminal records created before `cutoff`.
    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// Lifecycle and audit queries of snapshot runs.
#[async_trait]
pub trait ExecutionTrackerTrait: Send + Sync {
    async fn begin(&self, request: BeginExecution) -> Result<SnapshotExecutionRecord>;

    async fn mark_progress(
        &self,
        execution_id: &str,
        delta: ProgressDelta,
    ) -> Result<SnapshotExecutionRecord>;

    /// Terminal COMPLETED, also when some units failed.
    async fn complete(
        &self,
        execution_id: &str,
        completion: ExecutionCompletion,
    ) -> Result<SnapshotExecutionRecord>;

    /// Terminal FAILED for errors that aborted the run.
    async fn fail(
        &self,
        execution_id: &str,
        error_message: &str,
        elapsed_ms: i64,
    ) -> Result<SnapshotExecutionRecord>;

    async fn cancel(&self, execution_id: &str, reason: &str) -> Result<SnapshotExecutionRecord>;

    fn get(&self, execution_id: &str) -> Result<SnapshotExecutionRecord>;

    fn list(&self, filter: &ExecutionFilter) -> Result<Vec<SnapshotExecutionRecord>>;

    fn is_cancelled(&self, execution_id: &str) -> Result<bool>;

    fn summarize(&self, filter: &ExecutionFilter) -> Result<ExecutionStats>;

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
