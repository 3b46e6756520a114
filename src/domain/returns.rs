//! Return and risk metrics derived from a daily price series.
//!
//! dailyReturn[i]      = P[i+1] / P[i] - 1
//! cumulativeReturn[i] = prod(1 + dailyReturn[k]) for k <= i
//! volatility          = stdev(dailyReturn) * sqrt(252)   (sample stdev)
//! annualized return   = mean(dailyReturn) * 252
//! sharpe              = (annualized return - rf) / volatility

use crate::domain::error::AnalysisError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calendar year length for the series-level CAGR.
pub const DAYS_PER_YEAR_METRICS: f64 = 365.25;

/// Volatility at or below this is treated as zero.
const VOLATILITY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMetrics {
    /// Dates of the return observations (the series dates minus the first).
    pub dates: Vec<NaiveDate>,
    pub daily_returns: Vec<f64>,
    pub cumulative_returns: Vec<f64>,
    pub annualized_volatility: f64,
    pub annualized_return: f64,
    /// `None` when volatility is zero.
    pub sharpe_ratio: Option<f64>,
    pub total_return_pct: f64,
    pub cagr_pct: f64,
}

impl ReturnMetrics {
    /// `risk_free_rate` is an annual fraction (2% = 0.02).
    pub fn compute(prices: &PriceSeries, risk_free_rate: f64) -> Result<Self, AnalysisError> {
        prices.require_min_points()?;
        let points = prices.points();

        let daily_returns: Vec<f64> = points
            .windows(2)
            .map(|w| w[1].price / w[0].price - 1.0)
            .collect();
        let dates: Vec<NaiveDate> = points[1..].iter().map(|p| p.date).collect();

        let cumulative_returns: Vec<f64> = daily_returns
            .iter()
            .scan(1.0_f64, |acc, r| {
                *acc *= 1.0 + r;
                Some(*acc)
            })
            .collect();

        let mean = mean(&daily_returns);
        let annualized_volatility =
            sample_stddev(&daily_returns).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR.sqrt();
        let annualized_return = mean * TRADING_DAYS_PER_YEAR;

        let sharpe_ratio = if annualized_volatility > VOLATILITY_EPSILON {
            Some((annualized_return - risk_free_rate) / annualized_volatility)
        } else {
            None
        };

        let first = points[0];
        let last = points[points.len() - 1];
        let total_return_pct = (last.price - first.price) / first.price * 100.0;
        let cagr_pct = cagr_pct(first.price, last.price, first.date, last.date)?;

        Ok(ReturnMetrics {
            dates,
            daily_returns,
            cumulative_returns,
            annualized_volatility,
            annualized_return,
            sharpe_ratio,
            total_return_pct,
            cagr_pct,
        })
    }

    /// The Sharpe ratio, or `DegenerateVolatility` when volatility is zero.
    pub fn sharpe(&self) -> Result<f64, AnalysisError> {
        self.sharpe_ratio.ok_or(AnalysisError::DegenerateVolatility)
    }

    pub fn final_cumulative_return(&self) -> f64 {
        self.cumulative_returns.last().copied().unwrap_or(1.0)
    }
}

/// Compound annual growth rate in percent using 365.25-day years.
pub fn cagr_pct(
    start_value: f64,
    end_value: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<f64, AnalysisError> {
    let days = (end_date - start_date).num_days();
    if days <= 0 {
        return Err(AnalysisError::NonPositiveDuration { days });
    }
    let years = days as f64 / DAYS_PER_YEAR_METRICS;
    Ok(((end_value / start_value).powf(1.0 / years) - 1.0) * 100.0)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n - 1) standard deviation; `None` with fewer than two values.
pub(crate) fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Box-plot statistics of a return sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnDistribution {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample stdev of the returns, unannualized. Zero for a single value.
    pub stddev: f64,
}

impl ReturnDistribution {
    pub fn from_returns(returns: &[f64]) -> Option<Self> {
        if returns.is_empty() {
            return None;
        }
        let mut sorted = returns.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Some(ReturnDistribution {
            count: sorted.len(),
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            mean: mean(&sorted),
            stddev: sample_stddev(&sorted).unwrap_or(0.0),
        })
    }

    pub fn interquartile_range(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Linear interpolation between closest ranks on a sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}
