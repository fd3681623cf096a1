use rust_decimal::Decimal;

use super::allocation_model::{allocation_snapshot_id, AllocationInput, AssetAllocationSnapshot};
use crate::constants::DECIMAL_PRECISION;
use crate::errors::Result;
use crate::portfolio::returns::{overflow, percentage_of, PerformanceFigures, ValuationTotals};

/// Values one asset against the portfolio total, chaining returns onto the
/// most recent earlier snapshot of the same series.
pub fn calculate_allocation_snapshot(
    input: &AllocationInput,
    portfolio_total_value: Decimal,
    previous: Option<&AssetAllocationSnapshot>,
) -> Result<AssetAllocationSnapshot> {
    let snapshot_date = input.granularity.bucket_date(input.as_of);
    let totals = ValuationTotals {
        current_value: input.current_value()?.round_dp(DECIMAL_PRECISION),
        cost_basis: input.position.cost_basis,
        realized_pl: input.position.realized_pl,
    };
    let figures = PerformanceFigures::compute(totals, previous.map(|p| &p.figures))
        .ok_or_else(|| overflow(&input.asset_id, "performance figures"))?;
    let allocation_percentage = percentage_of(figures.current_value, portfolio_total_value)
        .ok_or_else(|| overflow(&input.asset_id, "allocation percentage"))?;

    Ok(AssetAllocationSnapshot {
        id: allocation_snapshot_id(
            &input.portfolio_id,
            &input.asset_id,
            snapshot_date,
            input.granularity,
        ),
        portfolio_id: input.portfolio_id.clone(),
        asset_id: input.asset_id.clone(),
        snapshot_date,
        granularity: input.granularity,
        quantity: input.position.quantity,
        current_price: input.price,
        avg_cost: input.position.avg_cost,
        allocation_percentage,
        portfolio_total_value,
        is_active: !input.position.quantity.is_zero(),
        figures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_inputs::AssetPosition;
    use crate::portfolio::Granularity;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn input(asset: &str, quantity: Decimal, price: Decimal, cost: Decimal) -> AllocationInput {
        AllocationInput {
            portfolio_id: "p1".to_string(),
            asset_id: asset.to_string(),
            as_of: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            granularity: Granularity::Daily,
            position: AssetPosition {
                portfolio_id: "p1".to_string(),
                asset_id: asset.to_string(),
                quantity,
                cost_basis: cost,
                avg_cost: if quantity.is_zero() { Decimal::ZERO } else { cost / quantity },
                realized_pl: dec!(10),
            },
            price,
        }
    }

    #[test]
    fn test_basic_figures() {
        let snap = calculate_allocation_snapshot(
            &input("VFF", dec!(100), dec!(3.5), dec!(300)),
            dec!(1400),
            None,
        )
        .unwrap();
        assert_eq!(snap.id, "2:p1|3:VFF|2024-06-03|DAILY");
        assert_eq!(snap.figures.current_value, dec!(350));
        assert_eq!(snap.figures.unrealized_pl, dec!(50));
        assert_eq!(snap.figures.total_pl, dec!(60));
        assert_eq!(snap.figures.return_percentage, dec!(20));
        assert_eq!(snap.allocation_percentage, dec!(25));
        assert!(snap.is_active);
    }

    #[test]
    fn test_zero_totals_do_not_divide() {
        let snap = calculate_allocation_snapshot(
            &input("X", Decimal::ZERO, dec!(12), Decimal::ZERO),
            Decimal::ZERO,
            None,
        )
        .unwrap();
        assert_eq!(snap.allocation_percentage, Decimal::ZERO);
        assert_eq!(snap.figures.return_percentage, Decimal::ZERO);
        assert!(!snap.is_active);
    }

    #[test]
    fn test_allocation_sums_to_hundred() {
        let inputs = [
            input("A", dec!(3), dec!(33.33), dec!(90)),
            input("B", dec!(7), dec!(11.11), dec!(70)),
            input("C", dec!(1), dec!(0.01), dec!(1)),
        ];
        let total: Decimal = inputs.iter().map(|i| i.current_value().unwrap()).sum();
        let sum: Decimal = inputs
            .iter()
            .map(|i| calculate_allocation_snapshot(i, total, None).unwrap().allocation_percentage)
            .sum();
        assert!((sum - dec!(100)).abs() <= dec!(0.00001), "sum was {}", sum);
    }

    #[test]
    fn test_daily_return_against_previous() {
        let first = calculate_allocation_snapshot(
            &input("VFF", dec!(10), dec!(3.5), dec!(35)),
            dec!(35),
            None,
        )
        .unwrap();
        let mut next_input = input("VFF", dec!(10), dec!(3.2), dec!(35));
        next_input.as_of = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let second = calculate_allocation_snapshot(&next_input, dec!(32), Some(&first)).unwrap();
        assert_eq!(second.figures.daily_return, dec!(-8.571429));
        assert_eq!(second.figures.cumulative_return, dec!(-8.571429));
        assert_eq!(second.figures.previous_cumulative_return, Decimal::ZERO);
    }

    #[test]
    fn test_value_overflow_is_a_computation_error() {
        let huge = input("BIG", dec!(1_000_000_000_000_000), dec!(1_000_000_000_000_000), dec!(1));
        match calculate_allocation_snapshot(&huge, dec!(1), None) {
            Err(crate::errors::Error::SnapshotComputation { asset_id, .. }) => {
                assert_eq!(asset_id, "BIG")
            }
            other => panic!("expected computation error, got {:?}", other),
        }
    }
}
