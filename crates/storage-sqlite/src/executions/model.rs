use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{parse_enum, parse_timestamp, timestamp_text};
use navfolio_core::executions::{ExecutionMetadata, ExecutionSchedule, SnapshotExecutionRecord};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::snapshot_executions)]
#[diesel(primary_key(execution_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SnapshotExecutionDB {
    pub execution_id: String,
    pub portfolio_id: Option<String>,
    pub portfolio_name: Option<String>,
    pub status: String,
    pub execution_type: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub total_snapshots: i64,
    pub successful_snapshots: i64,
    pub failed_snapshots: i64,
    pub execution_time_ms: Option<i64>,
    pub error_message: Option<String>,
    /// JSON object of primitive values.
    pub metadata: String,
    pub created_by: String,
    pub schedule_cron: Option<String>,
    pub schedule_timezone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SnapshotExecutionDB> for SnapshotExecutionRecord {
    type Error = StorageError;

    fn try_from(db: SnapshotExecutionDB) -> Result<Self, Self::Error> {
        let metadata: ExecutionMetadata = serde_json::from_str(&db.metadata).map_err(|e| {
            StorageError::CorruptValue(format!(
                "snapshot_executions.metadata = '{}': {}",
                db.metadata, e
            ))
        })?;
        let schedule = match (db.schedule_cron, db.schedule_timezone) {
            (Some(cron_expression), Some(timezone)) => Some(ExecutionSchedule {
                cron_expression,
                timezone,
            }),
            _ => None,
        };
        Ok(SnapshotExecutionRecord {
            status: parse_enum("snapshot_executions.status", &db.status)?,
            execution_type: parse_enum("snapshot_executions.execution_type", &db.execution_type)?,
            started_at: parse_timestamp("snapshot_executions.started_at", &db.started_at)?,
            completed_at: db
                .completed_at
                .as_deref()
                .map(|raw| parse_timestamp("snapshot_executions.completed_at", raw))
                .transpose()?,
            created_at: parse_timestamp("snapshot_executions.created_at", &db.created_at)?,
            updated_at: parse_timestamp("snapshot_executions.updated_at", &db.updated_at)?,
            execution_id: db.execution_id,
            portfolio_id: db.portfolio_id,
            portfolio_name: db.portfolio_name,
            total_snapshots: db.total_snapshots,
            successful_snapshots: db.successful_snapshots,
            failed_snapshots: db.failed_snapshots,
            execution_time_ms: db.execution_time_ms,
            error_message: db.error_message,
            metadata,
            created_by: db.created_by,
            schedule,
        })
    }
}

impl From<&SnapshotExecutionRecord> for SnapshotExecutionDB {
    fn from(r: &SnapshotExecutionRecord) -> Self {
        SnapshotExecutionDB {
            execution_id: r.execution_id.clone(),
            portfolio_id: r.portfolio_id.clone(),
            portfolio_name: r.portfolio_name.clone(),
            status: r.status.as_str().to_string(),
            execution_type: r.execution_type.as_str().to_string(),
            started_at: timestamp_text(r.started_at),
            completed_at: r.completed_at.map(timestamp_text),
            total_snapshots: r.total_snapshots,
            successful_snapshots: r.successful_snapshots,
            failed_snapshots: r.failed_snapshots,
            execution_time_ms: r.execution_time_ms,
            error_message: r.error_message.clone(),
            metadata: serde_json::to_string(&r.metadata).unwrap_or_else(|_| "{}".to_string()),
            created_by: r.created_by.clone(),
            schedule_cron: r.schedule.as_ref().map(|s| s.cron_expression.clone()),
            schedule_timezone: r.schedule.as_ref().map(|s| s.timezone.clone()),
            created_at: timestamp_text(r.created_at),
            updated_at: timestamp_text(r.updated_at),
        }
    }
}
