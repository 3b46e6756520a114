//! Daily adjusted price series.
//!
//! A [`PriceSeries`] is strictly increasing by date with positive prices.
//! Construction enforces both, so downstream calculators can index freely.

use crate::domain::error::AnalysisError;
use chrono::NaiveDate;

/// Minimum number of observations for any return or trend computation.
pub const MIN_PRICE_POINTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validates ordering and positivity without reordering anything.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, AnalysisError> {
        for point in &points {
            if point.price <= 0.0 || !point.price.is_finite() {
                return Err(AnalysisError::InvalidPrice {
                    date: point.date,
                    price: point.price,
                });
            }
        }
        for w in points.windows(2) {
            if w[1].date <= w[0].date {
                return Err(AnalysisError::UnorderedDates { date: w[1].date });
            }
        }
        Ok(Self { points })
    }

    /// Sorts by date and keeps the last observation for duplicated dates,
    /// then validates. Loaders use this since providers may repeat bars.
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> Result<Self, AnalysisError> {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self::new(deduped)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Fails with `InsufficientData` below [`MIN_PRICE_POINTS`].
    pub fn require_min_points(&self) -> Result<(), AnalysisError> {
        if self.points.len() < MIN_PRICE_POINTS {
            return Err(AnalysisError::InsufficientData {
                points: self.points.len(),
                minimum: MIN_PRICE_POINTS,
            });
        }
        Ok(())
    }

    /// Calendar days between the first and last observation.
    pub fn span_days(&self) -> i64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        }
    }
}
