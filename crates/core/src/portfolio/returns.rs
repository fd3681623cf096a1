//! Return and P&L formulas shared by allocation and performance snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DECIMAL_PRECISION;
use crate::errors::Error;

/// Value and cost totals of one asset or a set of assets on one date.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValuationTotals {
    pub current_value: Decimal,
    pub cost_basis: Decimal,
    pub realized_pl: Decimal,
}

impl ValuationTotals {
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(ValuationTotals {
            current_value: self.current_value.checked_add(rhs.current_value)?,
            cost_basis: self.cost_basis.checked_add(rhs.cost_basis)?,
            realized_pl: self.realized_pl.checked_add(rhs.realized_pl)?,
        })
    }

    /// Sum of `totals`, or `None` when any component leaves the decimal range.
    pub fn checked_sum<I: IntoIterator<Item = ValuationTotals>>(totals: I) -> Option<Self> {
        totals
            .into_iter()
            .try_fold(ValuationTotals::default(), ValuationTotals::checked_add)
    }
}

/// P&L decomposition and chained returns of one series point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceFigures {
    pub current_value: Decimal,
    pub cost_basis: Decimal,
    pub realized_pl: Decimal,
    pub unrealized_pl: Decimal,
    pub total_pl: Decimal,
    /// Total P&L over cost basis, in percent.
    pub return_percentage: Decimal,
    /// Change in value against the previous point of the series, in percent.
    pub daily_return: Decimal,
    /// Compounded daily returns since the series start, in percent.
    pub cumulative_return: Decimal,
    /// Cumulative return of the previous point, kept so the chain never
    /// needs a full history scan.
    pub previous_cumulative_return: Decimal,
}

impl PerformanceFigures {
    /// Figures for `totals`, chained onto the previous point of the same series.
    /// `None` when any intermediate value overflows.
    pub fn compute(totals: ValuationTotals, previous: Option<&PerformanceFigures>) -> Option<Self> {
        let unrealized_pl = totals.current_value.checked_sub(totals.cost_basis)?;
        let total_pl = totals.realized_pl.checked_add(unrealized_pl)?;
        let return_percentage = percentage_of(total_pl, totals.cost_basis)?;

        let (daily_return, previous_cumulative_return, cumulative_return) = match previous {
            Some(prev) => {
                let daily = percentage_change(prev.current_value, totals.current_value)?;
                let cumulative = chain_cumulative_return(prev.cumulative_return, daily)?;
                (daily, prev.cumulative_return, cumulative)
            }
            None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        };

        Some(PerformanceFigures {
            current_value: totals.current_value,
            cost_basis: totals.cost_basis,
            realized_pl: totals.realized_pl,
            unrealized_pl,
            total_pl,
            return_percentage,
            daily_return,
            cumulative_return,
            previous_cumulative_return,
        })
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        return Some(Decimal::ZERO);
    }
    part.checked_div(whole)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|r| r.round_dp(DECIMAL_PRECISION))
}

/// Percent change from `previous` to `current`; 0 when `previous` is 0.
pub fn percentage_change(previous: Decimal, current: Decimal) -> Option<Decimal> {
    percentage_of(current.checked_sub(previous)?, previous)
}

/// `((1 + prev/100) * (1 + daily/100) - 1) * 100`
pub fn chain_cumulative_return(previous_cumulative: Decimal, daily_return: Decimal) -> Option<Decimal> {
    let prev_growth = Decimal::ONE.checked_add(previous_cumulative / Decimal::ONE_HUNDRED)?;
    let daily_growth = Decimal::ONE.checked_add(daily_return / Decimal::ONE_HUNDRED)?;
    let growth = prev_growth.checked_mul(daily_growth)?;
    growth
        .checked_sub(Decimal::ONE)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|r| r.round_dp(DECIMAL_PRECISION))
}

/// Snapshot failure for a value that left the decimal range.
pub(crate) fn overflow(subject: &str, what: &str) -> Error {
    Error::SnapshotComputation {
        asset_id: subject.to_string(),
        message: format!("{} overflows the decimal range", what),
    }
}
