//! SQLite storage for allocation and performance snapshots.

pub mod allocation;
pub mod performance;

use crate::errors::StorageError;
use crate::utils::{decimal_text, parse_decimal};
use navfolio_core::portfolio::returns::PerformanceFigures;

/// Figure columns in table order: current_value, cost_basis, realized_pl,
/// unrealized_pl, total_pl, return_percentage, daily_return,
/// cumulative_return, previous_cumulative_return.
pub(crate) type FigureTexts = [String; 9];

pub(crate) fn figure_texts(f: &PerformanceFigures) -> FigureTexts {
    [
        decimal_text(f.current_value),
        decimal_text(f.cost_basis),
        decimal_text(f.realized_pl),
        decimal_text(f.unrealized_pl),
        decimal_text(f.total_pl),
        decimal_text(f.return_percentage),
        decimal_text(f.daily_return),
        decimal_text(f.cumulative_return),
        decimal_text(f.previous_cumulative_return),
    ]
}

pub(crate) fn parse_figures(
    table: &str,
    texts: [&str; 9],
) -> Result<PerformanceFigures, StorageError> {
    let [current_value, cost_basis, realized_pl, unrealized_pl, total_pl, return_percentage, daily_return, cumulative_return, previous_cumulative_return] =
        texts;
    let col = |name: &str, raw: &str| parse_decimal(&format!("{}.{}", table, name), raw);
    Ok(PerformanceFigures {
        current_value: col("current_value", current_value)?,
        cost_basis: col("cost_basis", cost_basis)?,
        realized_pl: col("realized_pl", realized_pl)?,
        unrealized_pl: col("unrealized_pl", unrealized_pl)?,
        total_pl: col("total_pl", total_pl)?,
        return_percentage: col("return_percentage", return_percentage)?,
        daily_return: col("daily_return", daily_return)?,
        cumulative_return: col("cumulative_return", cumulative_return)?,
        previous_cumulative_return: col("previous_cumulative_return", previous_cumulative_return)?,
    })
}

pub(crate) fn parse_count(column: &str, raw: i64) -> Result<usize, StorageError> {
    usize::try_from(raw)
        .map_err(|_| StorageError::CorruptValue(format!("{} = {} is not a count", column, raw)))
}

pub(crate) fn count_value(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
