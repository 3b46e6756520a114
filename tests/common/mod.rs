#![allow(dead_code)]

use chrono::NaiveDate;
use dcacompare::domain::analysis::AnalysisConfig;
use dcacompare::domain::error::AnalysisError;
use dcacompare::domain::frequency::Frequency;
pub use dcacompare::domain::price::PricePoint;
use dcacompare::ports::data_port::DataPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_prices(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn request_count(&self, symbol: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|s| s.as_str() == symbol)
            .count()
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AnalysisError> {
        self.requests.borrow_mut().push(symbol.to_string());
        if let Some(reason) = self.errors.get(symbol) {
            return Err(AnalysisError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One point per calendar day starting at `start`.
pub fn daily_points(start: NaiveDate, prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(start + chrono::Duration::days(i as i64), p))
        .collect()
}

/// Weekday-only series with a mild upward drift and alternating wobble.
pub fn trading_days(start: NaiveDate, days: usize, base: f64, drift: f64) -> Vec<PricePoint> {
    use chrono::Datelike;
    let mut points = Vec::with_capacity(days);
    let mut current = start;
    let mut i = 0usize;
    while points.len() < days {
        if current.weekday().number_from_monday() <= 5 {
            let wobble = if i % 2 == 0 { 0.4 } else { -0.4 };
            points.push(PricePoint::new(current, base + drift * i as f64 + wobble));
            i += 1;
        }
        current = current.succ_opt().unwrap();
    }
    points
}

pub fn sample_config() -> AnalysisConfig {
    AnalysisConfig {
        primary: "AAPL".into(),
        secondary: None,
        benchmark: None,
        start_date: date(2020, 1, 1),
        end_date: date(2024, 10, 25),
        risk_free_rate: 0.0,
        initial_amount: 10_000.0,
        base_contribution: 500.0,
        frequency: Frequency::Monthly,
        management_fee_pct: 0.5,
    }
}
