//! Lump Sum vs DCA portfolio trajectories.
//!
//! Lump Sum tracks the initial amount through the cumulative return.
//! DCA buys `contribution / price` units at every period price, in
//! chronological order, and values the running unit count at that price.

use crate::domain::error::AnalysisError;
use crate::domain::frequency::PeriodicPriceSeries;
use crate::domain::returns::ReturnMetrics;
use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

/// Calendar year length for the strategy summary CAGR. Deliberately not
/// [`crate::domain::returns::DAYS_PER_YEAR_METRICS`].
pub const DAYS_PER_YEAR_SUMMARY: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    LumpSum,
    Dca,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::LumpSum => f.write_str("Lump Sum"),
            StrategyKind::Dca => f.write_str("DCA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Units held after this point; zero for Lump Sum where units are implicit.
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioTrajectory {
    pub kind: StrategyKind,
    pub points: Vec<TrajectoryPoint>,
}

impl PortfolioTrajectory {
    pub fn final_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn simulate_lump_sum(metrics: &ReturnMetrics, initial_amount: f64) -> PortfolioTrajectory {
    let points = metrics
        .dates
        .iter()
        .zip(&metrics.cumulative_returns)
        .map(|(&date, &cumulative)| TrajectoryPoint {
            date,
            value: initial_amount * cumulative,
            units: 0.0,
        })
        .collect();

    PortfolioTrajectory {
        kind: StrategyKind::LumpSum,
        points,
    }
}

pub fn simulate_dca(
    periodic: &PeriodicPriceSeries,
    per_period_contribution: f64,
) -> Result<PortfolioTrajectory, AnalysisError> {
    let mut units_owned = 0.0_f64;
    let mut points = Vec::with_capacity(periodic.points.len());

    for period in &periodic.points {
        if period.price <= 0.0 || !period.price.is_finite() {
            return Err(AnalysisError::InvalidPrice {
                date: period.date,
                price: period.price,
            });
        }
        units_owned += per_period_contribution / period.price;
        points.push(TrajectoryPoint {
            date: period.date,
            value: units_owned * period.price,
            units: units_owned,
        });
    }

    Ok(PortfolioTrajectory {
        kind: StrategyKind::Dca,
        points,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategySummary {
    pub kind: StrategyKind,
    pub initial_amount: f64,
    pub final_value: f64,
    pub gain_or_loss: f64,
    /// `None` when final/initial has no real-valued CAGR, e.g. a zero
    /// initial amount.
    pub cagr_pct: Option<f64>,
}

/// Final value, gain against `initial_amount`, and CAGR over
/// `(end_date - start_date) / 365` years.
///
/// A final/initial ratio of zero is a total loss and yields -100%. A
/// negative or non-finite ratio leaves the CAGR undefined; the final value
/// and gain are still reported.
pub fn summarize(
    trajectory: &PortfolioTrajectory,
    initial_amount: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<StrategySummary, AnalysisError> {
    let days = (end_date - start_date).num_days();
    let duration_years = days as f64 / DAYS_PER_YEAR_SUMMARY;
    if duration_years <= 0.0 {
        return Err(AnalysisError::NonPositiveDuration { days });
    }

    let final_value = trajectory.final_value().unwrap_or(0.0);
    let ratio = final_value / initial_amount;
    let cagr_pct = if ratio.is_finite() && ratio >= 0.0 {
        Some((ratio.powf(1.0 / duration_years) - 1.0) * 100.0)
    } else {
        debug!(kind = %trajectory.kind, ratio, "strategy CAGR undefined");
        None
    };

    Ok(StrategySummary {
        kind: trajectory.kind,
        initial_amount,
        final_value,
        gain_or_loss: final_value - initial_amount,
        cagr_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frequency::Frequency;
    use crate::domain::price::PricePoint;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn periodic(prices: &[f64]) -> PeriodicPriceSeries {
        let start = d(2024, 1, 31);
        PeriodicPriceSeries {
            frequency: Frequency::Monthly,
            points: prices
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    PricePoint::new(start + chrono::Duration::days(30 * i as i64), p)
                })
                .collect(),
        }
    }

    fn metrics_with_cumulative(cumulative: &[f64]) -> ReturnMetrics {
        let start = d(2024, 1, 2);
        ReturnMetrics {
            dates: (0..cumulative.len())
                .map(|i| start + chrono::Duration::days(i as i64))
                .collect(),
            daily_returns: vec![0.1; cumulative.len()],
            cumulative_returns: cumulative.to_vec(),
            annualized_volatility: 0.0,
            annualized_return: 0.0,
            sharpe_ratio: None,
            total_return_pct: 0.0,
            cagr_pct: 0.0,
        }
    }

    #[test]
    fn lump_sum_scales_cumulative_return() {
        let trajectory = simulate_lump_sum(&metrics_with_cumulative(&[1.10, 1.21]), 10_000.0);
        let values: Vec<f64> = trajectory.values().collect();
        assert_eq!(trajectory.kind, StrategyKind::LumpSum);
        assert_relative_eq!(values[0], 11_000.0, epsilon = 1e-9);
        assert_relative_eq!(values[1], 12_100.0, epsilon = 1e-9);
    }

    #[test]
    fn dca_accumulates_units() {
        let trajectory = simulate_dca(&periodic(&[100.0, 105.0, 110.0]), 500.0).unwrap();
        let units: Vec<f64> = trajectory.points.iter().map(|p| p.units).collect();
        let values: Vec<f64> = trajectory.values().collect();

        assert_relative_eq!(units[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(units[1], 5.0 + 500.0 / 105.0, epsilon = 1e-12);
        assert_relative_eq!(units[2], 5.0 + 500.0 / 105.0 + 500.0 / 110.0, epsilon = 1e-12);
        assert_relative_eq!(values[0], 500.0, epsilon = 1e-9);
        assert_relative_eq!(values[1], 1025.0, epsilon = 1e-9);
        // (5 + 500/105 + 500/110) * 110
        assert_relative_eq!((values[2] * 100.0).round() / 100.0, 1573.81, epsilon = 1e-9);
    }

    #[test]
    fn dca_rejects_non_positive_price() {
        let err = simulate_dca(&periodic(&[100.0, 0.0, 110.0]), 500.0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPrice { price, .. } if price == 0.0));
    }

    #[test]
    fn dca_order_matters() {
        let forward = simulate_dca(&periodic(&[100.0, 50.0]), 100.0).unwrap();
        let reversed = simulate_dca(&periodic(&[50.0, 100.0]), 100.0).unwrap();
        assert_relative_eq!(forward.final_value().unwrap(), 150.0, epsilon = 1e-9);
        assert_relative_eq!(reversed.final_value().unwrap(), 300.0, epsilon = 1e-9);
    }

    #[test]
    fn summarize_uses_365_day_years() {
        let trajectory = simulate_lump_sum(&metrics_with_cumulative(&[1.5, 2.0]), 1000.0);
        let summary = summarize(&trajectory, 1000.0, d(2020, 1, 1), d(2021, 12, 31)).unwrap();

        assert_relative_eq!(summary.final_value, 2000.0, epsilon = 1e-9);
        assert_relative_eq!(summary.gain_or_loss, 1000.0, epsilon = 1e-9);
        // 2020-01-01 .. 2021-12-31 is 730 days = 2 years of 365 days
        assert_relative_eq!(
            summary.cagr_pct.unwrap(),
            (2.0_f64.sqrt() - 1.0) * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn summarize_flat_trajectory_has_zero_cagr() {
        let trajectory = simulate_lump_sum(&metrics_with_cumulative(&[1.0, 1.0]), 1000.0);
        let summary = summarize(&trajectory, 1000.0, d(2020, 1, 1), d(2023, 1, 1)).unwrap();
        assert_relative_eq!(summary.cagr_pct.unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(summary.gain_or_loss, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn summarize_total_loss_is_minus_100_pct() {
        let trajectory = simulate_lump_sum(&metrics_with_cumulative(&[0.5, 0.0]), 1000.0);
        let summary = summarize(&trajectory, 1000.0, d(2020, 1, 1), d(2021, 1, 1)).unwrap();
        assert_relative_eq!(summary.cagr_pct.unwrap(), -100.0, epsilon = 1e-12);
        assert_relative_eq!(summary.gain_or_loss, -1000.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_initial_amount_leaves_cagr_undefined() {
        let dca = simulate_dca(&periodic(&[100.0, 110.0]), 500.0).unwrap();
        let summary = summarize(&dca, 0.0, d(2020, 1, 1), d(2021, 1, 1)).unwrap();
        assert_eq!(summary.cagr_pct, None);
        assert_relative_eq!(summary.final_value, 1050.0, epsilon = 1e-9);
        assert_relative_eq!(summary.gain_or_loss, 1050.0, epsilon = 1e-9);

        // 0 / 0
        let lump_sum = simulate_lump_sum(&metrics_with_cumulative(&[1.1, 1.2]), 0.0);
        let summary = summarize(&lump_sum, 0.0, d(2020, 1, 1), d(2021, 1, 1)).unwrap();
        assert_eq!(summary.cagr_pct, None);
        assert_eq!(summary.final_value, 0.0);
    }

    #[test]
    fn negative_ratio_leaves_cagr_undefined() {
        let trajectory = PortfolioTrajectory {
            kind: StrategyKind::LumpSum,
            points: vec![TrajectoryPoint {
                date: d(2021, 1, 1),
                value: -10.0,
                units: 0.0,
            }],
        };
        let summary = summarize(&trajectory, 100.0, d(2020, 1, 1), d(2021, 1, 1)).unwrap();
        assert_eq!(summary.cagr_pct, None);
        assert_relative_eq!(summary.gain_or_loss, -110.0, epsilon = 1e-12);
    }

    #[test]
    fn summarize_rejects_non_positive_duration() {
        let trajectory = simulate_lump_sum(&metrics_with_cumulative(&[1.1]), 1000.0);
        let err = summarize(&trajectory, 1000.0, d(2021, 1, 1), d(2021, 1, 1)).unwrap_err();
        assert!(matches!(err, AnalysisError::NonPositiveDuration { days: 0 }));
        let err = summarize(&trajectory, 1000.0, d(2021, 1, 2), d(2021, 1, 1)).unwrap_err();
        assert!(matches!(err, AnalysisError::NonPositiveDuration { days: -1 }));
    }

    proptest! {
        #[test]
        fn dca_first_value_is_one_contribution_and_units_never_drop(
            prices in prop::collection::vec(0.5f64..500.0, 1..40),
            contribution in 0.0f64..5000.0,
        ) {
            let trajectory = simulate_dca(&periodic(&prices), contribution).unwrap();
            prop_assert_eq!(trajectory.len(), prices.len());
            prop_assert!((trajectory.points[0].value - contribution).abs() <= 1e-9 * contribution.max(1.0));
            prop_assert!(trajectory.points.windows(2).all(|w| w[1].units >= w[0].units));
        }
    }
}
