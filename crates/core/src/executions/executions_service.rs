use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::executions_model::{
    BeginExecution, ExecutionCompletion, ExecutionFilter, ExecutionStats, ExecutionStatus,
    ProgressDelta, SnapshotExecutionRecord,
};
use super::executions_traits::{ExecutionRepositoryTrait, ExecutionTrackerTrait};
use crate::errors::{Error, Result};

/// Records the lifecycle of snapshot runs.
pub struct ExecutionTracker {
    repository: Arc<dyn ExecutionRepositoryTrait>,
    // Serializes read-modify-write of records; progress arrives from many
    // portfolio tasks at once.
    write_lock: Mutex<()>,
}

impl ExecutionTracker {
    pub fn new(repository: Arc<dyn ExecutionRepositoryTrait>) -> Self {
        Self {
            repository,
            write_lock: Mutex::new(()),
        }
    }

    async fn mutate<F>(&self, execution_id: &str, apply: F) -> Result<SnapshotExecutionRecord>
    where
        F: FnOnce(&mut SnapshotExecutionRecord) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut record = self.repository.get_by_id(execution_id)?;
        if record.status.is_terminal() {
            return Err(Error::ConstraintViolation(format!(
                "Execution {} is already {}",
                execution_id, record.status
            )));
        }
        apply(&mut record);
        record.updated_at = Utc::now();
        self.repository.update_active(record).await
    }
}

#[async_trait]
impl ExecutionTrackerTrait for ExecutionTracker {
    async fn begin(&self, request: BeginExecution) -> Result<SnapshotExecutionRecord> {
        request.validate()?;
        let now = Utc::now();
        let record = SnapshotExecutionRecord {
            execution_id: uuid::Uuid::now_v7().to_string(),
            portfolio_id: request.portfolio_id,
            portfolio_name: request.portfolio_name,
            status: ExecutionStatus::Started,
            execution_type: request.execution_type,
            started_at: now,
            completed_at: None,
            total_snapshots: 0,
            successful_snapshots: 0,
            failed_snapshots: 0,
            execution_time_ms: None,
            error_message: None,
            metadata: request.metadata,
            created_by: request.created_by,
            schedule: request.schedule,
            created_at: now,
            updated_at: now,
        };
        let record = self.repository.insert(record).await?;
        info!(
            "Started {} snapshot execution {} ({})",
            record.execution_type,
            record.execution_id,
            record.portfolio_id.as_deref().unwrap_or("all portfolios")
        );
        Ok(record)
    }

    async fn mark_progress(
        &self,
        execution_id: &str,
        delta: ProgressDelta,
    ) -> Result<SnapshotExecutionRecord> {
        self.mutate(execution_id, |record| {
            record.successful_snapshots += delta.succeeded;
            record.failed_snapshots += delta.failed;
            record.total_snapshots = record.successful_snapshots + record.failed_snapshots;
            record.status = ExecutionStatus::InProgress;
        })
        .await
    }

    async fn complete(
        &self,
        execution_id: &str,
        completion: ExecutionCompletion,
    ) -> Result<SnapshotExecutionRecord> {
        let elapsed_ms = completion.elapsed_ms;
        let record = self
            .mutate(execution_id, move |record| {
                record.status = ExecutionStatus::Completed;
                record.successful_snapshots = completion.successful;
                record.failed_snapshots = completion.failed;
                record.total_snapshots = completion.successful + completion.failed;
                record.execution_time_ms = Some(elapsed_ms);
                record.completed_at = Some(Utc::now());
                record.error_message = completion.error_message;
                record.metadata.extend(completion.metadata);
            })
            .await?;
        if record.failed_snapshots > 0 {
            warn!(
                "Execution {} completed with {} of {} failures",
                execution_id, record.failed_snapshots, record.total_snapshots
            );
        } else {
            info!(
                "Execution {} completed: {} snapshots in {}ms",
                execution_id,
                record.total_snapshots,
                elapsed_ms
            );
        }
        Ok(record)
    }

    async fn fail(
        &self,
        execution_id: &str,
        error_message: &str,
        elapsed_ms: i64,
    ) -> Result<SnapshotExecutionRecord> {
        warn!("Execution {} failed: {}", execution_id, error_message);
        self.mutate(execution_id, |record| {
            record.status = ExecutionStatus::Failed;
            record.error_message = Some(error_message.to_string());
            record.execution_time_ms = Some(elapsed_ms);
            record.completed_at = Some(Utc::now());
        })
        .await
    }

    async fn cancel(&self, execution_id: &str, reason: &str) -> Result<SnapshotExecutionRecord> {
        info!("Cancelling execution {}: {}", execution_id, reason);
        self.mutate(execution_id, |record| {
            let now = Utc::now();
            record.status = ExecutionStatus::Cancelled;
            record.error_message = Some(reason.to_string());
            record.execution_time_ms = Some((now - record.started_at).num_milliseconds());
            record.completed_at = Some(now);
        })
        .await
    }

    fn get(&self, execution_id: &str) -> Result<SnapshotExecutionRecord> {
        self.repository.get_by_id(execution_id)
    }

    fn list(&self, filter: &ExecutionFilter) -> Result<Vec<SnapshotExecutionRecord>> {
        self.repository.list(filter)
    }

    fn is_cancelled(&self, execution_id: &str) -> Result<bool> {
        Ok(self.repository.get_by_id(execution_id)?.status == ExecutionStatus::Cancelled)
    }

    fn summarize(&self, filter: &ExecutionFilter) -> Result<ExecutionStats> {
        let unlimited = ExecutionFilter {
            limit: None,
            ..filter.clone()
        };
        Ok(ExecutionStats::from_records(&self.repository.list(&unlimited)?))
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let removed = self.repository.delete_terminal_before(cutoff).await?;
        debug!("Purged {} execution records older than {}", removed, cutoff);
        Ok(removed)
    }
}
