use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::DATE_FORMAT;
use crate::errors::ValidationError;

/// Time bucket of a snapshot series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Weekly => "WEEKLY",
            Granularity::Monthly => "MONTHLY",
        }
    }

    /// The date a snapshot taken on `as_of` is stored under. Re-running
    /// anywhere inside the same bucket lands on the same key.
    pub fn bucket_date(self, as_of: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => as_of,
            Granularity::Weekly => {
                as_of - Duration::days(i64::from(as_of.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => as_of.with_day(1).unwrap_or(as_of),
        }
    }

    /// Row key of a snapshot in this bucket. Free-text parts are length
    /// prefixed, so distinct part tuples never render to the same key.
    pub fn snapshot_key(self, parts: &[&str], snapshot_date: NaiveDate) -> String {
        let mut key = String::new();
        for part in parts {
            key.push_str(&format!("{}:{}|", part.len(), part));
        }
        key.push_str(&format!("{}|{}", snapshot_date.format(DATE_FORMAT), self.as_str()));
        key
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Granularity::Daily),
            "WEEKLY" => Ok(Granularity::Weekly),
            "MONTHLY" => Ok(Granularity::Monthly),
            _ => Err(ValidationError::InvalidInput(format!(
                "Unknown granularity '{}'",
                s
            ))),
        }
    }
}
