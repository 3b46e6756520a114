//! Linear price trend with residual bands and a 180-day projection.
//!
//! Ordinary least squares of price against whole days elapsed since the
//! first observation. Non-trading days are simply absent, so x is unevenly
//! spaced. Bands are prediction +/- k * residual stdev (sample, n - 1) for
//! k in 1..=3. The forecast covers 180 consecutive calendar days after the
//! last observation and extrapolates the same line.

use crate::domain::error::AnalysisError;
use crate::domain::price::PriceSeries;
use crate::domain::returns::{mean, sample_stddev};
use chrono::NaiveDate;

pub const FORECAST_HORIZON_DAYS: usize = 180;
pub const BAND_WIDTHS: [f64; 3] = [1.0, 2.0, 3.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub day_offset: i64,
    /// Observed price; `None` in the forecast.
    pub actual: Option<f64>,
    pub predicted: f64,
    /// ±1, ±2 and ±3 residual standard deviations.
    pub bands: [Band; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendModel {
    pub slope: f64,
    pub intercept: f64,
    pub residual_stddev: f64,
    pub fitted: Vec<TrendPoint>,
    pub forecast: Vec<TrendPoint>,
}

impl TrendModel {
    pub fn fit(prices: &PriceSeries) -> Result<Self, AnalysisError> {
        prices.require_min_points()?;
        let points = prices.points();
        let origin = points[0].date;

        let xs: Vec<f64> = points
            .iter()
            .map(|p| (p.date - origin).num_days() as f64)
            .collect();
        let ys: Vec<f64> = points.iter().map(|p| p.price).collect();

        let x_mean = mean(&xs);
        let y_mean = mean(&ys);
        let (sxy, sxx) = xs
            .iter()
            .zip(&ys)
            .fold((0.0_f64, 0.0_f64), |(sxy, sxx), (x, y)| {
                let dx = x - x_mean;
                (sxy + dx * (y - y_mean), sxx + dx * dx)
            });
        // Dates are strictly increasing, so at least two distinct x values.
        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;

        let residuals: Vec<f64> = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| y - (slope * x + intercept))
            .collect();
        let residual_stddev = sample_stddev(&residuals).unwrap_or(0.0);

        let mut model = TrendModel {
            slope,
            intercept,
            residual_stddev,
            fitted: Vec::with_capacity(points.len()),
            forecast: Vec::with_capacity(FORECAST_HORIZON_DAYS),
        };

        for (point, &x) in points.iter().zip(&xs) {
            let point = model.point_at(point.date, x as i64, Some(point.price));
            model.fitted.push(point);
        }

        let last = points[points.len() - 1];
        let last_offset = (last.date - origin).num_days();
        for k in 1..=FORECAST_HORIZON_DAYS as i64 {
            let date = last.date + chrono::Duration::days(k);
            let point = model.point_at(date, last_offset + k, None);
            model.forecast.push(point);
        }

        Ok(model)
    }

    pub fn predict(&self, day_offset: i64) -> f64 {
        self.slope * day_offset as f64 + self.intercept
    }

    fn point_at(&self, date: NaiveDate, day_offset: i64, actual: Option<f64>) -> TrendPoint {
        let predicted = self.predict(day_offset);
        let bands = BAND_WIDTHS.map(|k| Band {
            lower: predicted - k * self.residual_stddev,
            upper: predicted + k * self.residual_stddev,
        });
        TrendPoint {
            date,
            day_offset,
            actual,
            predicted,
            bands,
        }
    }

    /// Fitted range followed by the forecast.
    pub fn all_points(&self) -> impl Iterator<Item = &TrendPoint> {
        self.fitted.iter().chain(self.forecast.iter())
    }
}
