//! Contribution frequency and period-end resampling.
//!
//! Periods are anchored on the month of the first observation: period k
//! ends on the last calendar day of month `first_month + k * months`. The
//! last observation at or before each boundary (and after the previous one)
//! becomes that period's price, labelled with the boundary date. Periods
//! without any observation are skipped.

use crate::domain::error::AnalysisError;
use crate::domain::price::{PricePoint, PriceSeries};
use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Semiannual,
        Frequency::Annual,
    ];

    /// Length of one period in calendar months.
    pub fn months(self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::Semiannual => 6,
            Frequency::Annual => 12,
        }
    }

    /// Multiplier applied to the base monthly contribution.
    pub fn contribution_multiplier(self) -> f64 {
        self.months() as f64
    }

    pub fn per_period_contribution(self, base_monthly: f64) -> f64 {
        base_monthly * self.contribution_multiplier()
    }

    pub fn periods_per_year(self) -> u32 {
        12 / self.months()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
            Frequency::Semiannual => "Semiannual",
            Frequency::Annual => "Annual",
        };
        f.write_str(name)
    }
}

impl FromStr for Frequency {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "month" | "1m" | "m" => Ok(Frequency::Monthly),
            "quarterly" | "quarter" | "3m" | "q" => Ok(Frequency::Quarterly),
            "semiannual" | "semi-annual" | "semiannually" | "6m" => Ok(Frequency::Semiannual),
            "annual" | "annually" | "yearly" | "12m" | "y" => Ok(Frequency::Annual),
            _ => Err(AnalysisError::UnknownFrequency { tag: s.to_string() }),
        }
    }
}

/// A price series sampled at period ends.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicPriceSeries {
    pub frequency: Frequency,
    pub points: Vec<PricePoint>,
}

impl PeriodicPriceSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

pub fn resample(prices: &PriceSeries, frequency: Frequency) -> PeriodicPriceSeries {
    let mut points: Vec<PricePoint> = Vec::new();
    let Some(first) = prices.first() else {
        return PeriodicPriceSeries { frequency, points };
    };

    let anchor = NaiveDate::from_ymd_opt(first.date.year(), first.date.month(), 1);
    let mut period_index: u32 = 0;
    let mut boundary = anchor.and_then(|a| month_end(a.year(), a.month()));
    let mut pending: Option<f64> = None;

    for point in prices.points() {
        while let Some(b) = boundary {
            if point.date <= b {
                break;
            }
            if let Some(price) = pending.take() {
                points.push(PricePoint::new(b, price));
            }
            period_index += 1;
            boundary = anchor
                .and_then(|a| a.checked_add_months(Months::new(period_index * frequency.months())))
                .and_then(|start| month_end(start.year(), start.month()));
        }
        if boundary.is_none() {
            break;
        }
        pending = Some(point.price);
    }

    if let (Some(b), Some(price)) = (boundary, pending) {
        points.push(PricePoint::new(b, price));
    }

    PeriodicPriceSeries { frequency, points }
}

/// Accepts the frequency as a free-form tag, failing with `UnknownFrequency`.
pub fn resample_tagged(prices: &PriceSeries, tag: &str) -> Result<PeriodicPriceSeries, AnalysisError> {
    Ok(resample(prices, tag.parse()?))
}

/// Percent change between consecutive period prices; the undefined first
/// element is dropped.
pub fn periodic_returns(periodic: &PeriodicPriceSeries) -> Vec<f64> {
    periodic
        .points
        .windows(2)
        .map(|w| w[1].price / w[0].price - 1.0)
        .collect()
}
