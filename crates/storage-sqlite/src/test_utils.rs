//! Temp-file database fixtures shared by repository tests.

use diesel::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

use crate::db::{create_pool, get_connection, run_migrations, write_actor::spawn_writer, DbPool, WriteHandle};

/// Creates a migrated database in a temp directory. Keep the `TempDir`
/// alive for the duration of the test. Must run inside a Tokio runtime.
pub fn create_test_db() -> (Arc<DbPool>, WriteHandle, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());
    (pool, writer, temp_dir)
}

/// Inserts a bare portfolio row to satisfy foreign keys.
pub fn create_test_portfolio(pool: &DbPool, portfolio_id: &str) {
    let mut conn = get_connection(pool).expect("Failed to get connection");
    diesel::sql_query(format!(
        "INSERT INTO portfolios (id, name, currency, created_at, updated_at) \
         VALUES ('{}', 'Test Portfolio', 'USD', '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
        portfolio_id
    ))
    .execute(&mut conn)
    .expect("Failed to create test portfolio");
}
