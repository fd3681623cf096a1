use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;

use super::model::SnapshotExecutionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found, IntoCore};
use crate::schema::snapshot_executions::dsl;
use crate::utils::{parse_enum, timestamp_text};
use navfolio_core::errors::Error;
use navfolio_core::executions::{
    ExecutionFilter, ExecutionRepositoryTrait, ExecutionStatus, SnapshotExecutionRecord,
};
use navfolio_core::Result;

pub struct ExecutionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ExecutionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn terminal_statuses() -> Vec<&'static str> {
    ExecutionStatus::TERMINAL.iter().map(|s| s.as_str()).collect()
}

#[async_trait]
impl ExecutionRepositoryTrait for ExecutionRepository {
    async fn insert(&self, record: SnapshotExecutionRecord) -> Result<SnapshotExecutionRecord> {
        self.writer
            .exec(move |conn| {
                diesel::insert_into(dsl::snapshot_executions)
                    .values(SnapshotExecutionDB::from(&record))
                    .execute(conn)
                    .into_core()?;
                Ok(record)
            })
            .await
    }

    fn get_by_id(&self, execution_id: &str) -> Result<SnapshotExecutionRecord> {
        let mut conn = get_connection(&self.pool)?;
        let row = dsl::snapshot_executions
            .find(execution_id)
            .select(SnapshotExecutionDB::as_select())
            .first::<SnapshotExecutionDB>(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| not_found("Execution", execution_id))?;
        Ok(SnapshotExecutionRecord::try_from(row)?)
    }

    fn list(&self, filter: &ExecutionFilter) -> Result<Vec<SnapshotExecutionRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = dsl::snapshot_executions
            .select(SnapshotExecutionDB::as_select())
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(dsl::status.eq(status.as_str()));
        }
        if let Some(execution_type) = filter.execution_type {
            query = query.filter(dsl::execution_type.eq(execution_type.as_str()));
        }
        if let Some(portfolio_id) = &filter.portfolio_id {
            query = query.filter(dsl::portfolio_id.eq(portfolio_id.clone()));
        }
        if let Some(from) = filter.created_from {
            query = query.filter(dsl::created_at.ge(timestamp_text(from)));
        }
        if let Some(to) = filter.created_to {
            query = query.filter(dsl::created_at.le(timestamp_text(to)));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit.max(0));
        }
        let rows = query
            .order((dsl::created_at.desc(), dsl::execution_id.desc()))
            .load::<SnapshotExecutionDB>(&mut conn)
            .into_core()?;
        rows.into_iter()
            .map(|row| SnapshotExecutionRecord::try_from(row).map_err(Into::into))
            .collect()
    }

    async fn update_active(
        &self,
        record: SnapshotExecutionRecord,
    ) -> Result<SnapshotExecutionRecord> {
        self.writer
            .exec(move |conn| {
                let stored = dsl::snapshot_executions
                    .find(&record.execution_id)
                    .select(dsl::status)
                    .first::<String>(conn)
                    .optional()
                    .into_core()?
                    .ok_or_else(|| not_found("Execution", &record.execution_id))?;
                let stored: ExecutionStatus = parse_enum("snapshot_executions.status", &stored)?;
                if stored.is_terminal() {
                    return Err(Error::ConstraintViolation(format!(
                        "Execution {} is already {}",
                        record.execution_id, stored
                    )));
                }
                diesel::update(dsl::snapshot_executions.find(&record.execution_id))
                    .set(&SnapshotExecutionDB::from(&record))
                    .execute(conn)
                    .into_core()?;
                Ok(record)
            })
            .await
    }

    async fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                diesel::delete(
                    dsl::snapshot_executions
                        .filter(dsl::status.eq_any(terminal_statuses()))
                        .filter(dsl::created_at.lt(timestamp_text(cutoff))),
                )
                .execute(conn)
                .into_core()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_db;
    use chrono::{Duration, TimeZone};
    use navfolio_core::executions::{ExecutionSchedule, ExecutionType, MetadataValue};

    fn record(id: &str, created_at: DateTime<Utc>, status: ExecutionStatus) -> SnapshotExecutionRecord {
        SnapshotExecutionRecord {
            execution_id: id.to_string(),
            portfolio_id: None,
            portfolio_name: None,
            status,
            execution_type: ExecutionType::Automated,
            started_at: created_at,
            completed_at: None,
            total_snapshots: 3,
            successful_snapshots: 0,
            failed_snapshots: 0,
            execution_time_ms: None,
            error_message: None,
            metadata: [
                ("triggeredBy".to_string(), MetadataValue::from("scheduler")),
                ("dryRun".to_string(), MetadataValue::from(false)),
                ("portfolioCount".to_string(), MetadataValue::from(3usize)),
            ]
            .into_iter()
            .collect(),
            created_by: "scheduler".to_string(),
            schedule: Some(ExecutionSchedule {
                cron_expression: "0 0 * * *".to_string(),
                timezone: "UTC".to_string(),
            }),
            created_at,
            updated_at: created_at,
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_keeps_metadata_and_schedule() {
        let (pool, writer, _dir) = create_test_db();
        let repo = ExecutionRepository::new(pool, writer);
        let original = record("e1", at(3), ExecutionStatus::Started);
        repo.insert(original.clone()).await.unwrap();

        assert_eq!(repo.get_by_id("e1").unwrap(), original);
        let err = repo.get_by_id("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_active_refuses_terminal_rows() {
        let (pool, writer, _dir) = create_test_db();
        let repo = ExecutionRepository::new(pool, writer);
        let mut rec = record("e1", at(3), ExecutionStatus::Started);
        repo.insert(rec.clone()).await.unwrap();

        rec.status = ExecutionStatus::Completed;
        rec.successful_snapshots = 3;
        rec.completed_at = Some(at(3) + Duration::seconds(5));
        rec.execution_time_ms = Some(5000);
        repo.update_active(rec.clone()).await.unwrap();
        assert_eq!(repo.get_by_id("e1").unwrap(), rec);

        rec.status = ExecutionStatus::Failed;
        let err = repo.update_active(rec).await.unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));
        assert_eq!(repo.get_by_id("e1").unwrap().status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn test_list_filters_newest_first_and_purges_terminal() {
        let (pool, writer, _dir) = create_test_db();
        let repo = ExecutionRepository::new(pool, writer);
        repo.insert(record("old-done", at(1), ExecutionStatus::Completed)).await.unwrap();
        repo.insert(record("old-running", at(2), ExecutionStatus::InProgress)).await.unwrap();
        repo.insert(record("new-done", at(10), ExecutionStatus::Failed)).await.unwrap();

        let all = repo.list(&ExecutionFilter::default()).unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.execution_id.as_str()).collect();
        assert_eq!(ids, vec!["new-done", "old-running", "old-done"]);

        let limited = repo
            .list(&ExecutionFilter {
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited[0].execution_id, "new-done");

        let ranged = repo
            .list(&ExecutionFilter {
                created_from: Some(at(2)),
                created_to: Some(at(9)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].execution_id, "old-running");

        let removed = repo.delete_terminal_before(at(5)).await.unwrap();
        assert_eq!(removed, 1);
        let left: Vec<_> = repo
            .list(&ExecutionFilter::default())
            .unwrap()
            .into_iter()
            .map(|r| r.execution_id)
            .collect();
        assert_eq!(left, vec!["new-done".to_string(), "old-running".to_string()]);
    }
}
