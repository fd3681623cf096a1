//! Utility functions for SQLite storage operations.
//!
//! This module provides helpers for working with SQLite, including chunking
//! utilities to avoid parameter limits and the text encodings used for
//! decimals, dates and timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;
use navfolio_core::constants::DATE_FORMAT;

/// Fixed-width timestamp layout; text ordering equals time ordering.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite has a compile-time limit on the number of parameters in a SQL statement,
/// typically around 999 (SQLITE_MAX_VARIABLE_NUMBER). To stay safely under this limit
/// and leave room for other parameters in the query, we use 500 as our chunk size.
///
/// Any query that uses `IN (...)` with a potentially large list of IDs should use
/// `chunk_for_sqlite` to split the list into manageable chunks.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into smaller slices for batch SQLite queries.
///
/// This function splits a slice into chunks of size `SQLITE_MAX_PARAMS_CHUNK` (500),
/// which can be used to safely execute multiple queries with `IN (...)` clauses
/// without exceeding SQLite's parameter limits.
///
/// # Example
///
/// ```ignore
/// let asset_ids: Vec<String> = get_many_asset_ids(); // Could be > 999 items
///
/// let mut all_results = Vec::new();
/// for chunk in chunk_for_sqlite(&asset_ids) {
///     let results = query_with_in_clause(chunk)?;
///     all_results.extend(results);
/// }
/// ```
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Decimals are stored as text to keep full precision.
pub fn decimal_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn parse_decimal(column: &str, raw: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(raw)
        .map_err(|e| StorageError::CorruptValue(format!("{} = '{}': {}", column, raw, e)))
}

pub fn date_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(column: &str, raw: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| StorageError::CorruptValue(format!("{} = '{}': {}", column, raw, e)))
}

pub fn timestamp_text(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn naive_timestamp_text(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    parse_naive_timestamp(column, raw).map(|naive| naive.and_utc())
}

pub fn parse_naive_timestamp(column: &str, raw: &str) -> Result<NaiveDateTime, StorageError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| StorageError::CorruptValue(format!("{} = '{}': {}", column, raw, e)))
}

/// Parses an enum column through its `FromStr` impl.
pub fn parse_enum<T>(column: &str, raw: &str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| StorageError::CorruptValue(format!("{} = '{}': {}", column, raw, e)))
}
