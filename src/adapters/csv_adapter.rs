//! CSV file price adapter.
//!
//! Reads `<SYMBOL>.csv` from a base directory. The header must contain a
//! `date` column (`YYYY-MM-DD`) and either `adj_close` / `Adj Close` or,
//! failing that, `close`. Other columns are ignored.

use crate::domain::error::AnalysisError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol.to_uppercase()))
    }
}

fn normalize_header(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn data_error(reason: String) -> AnalysisError {
    AnalysisError::DataSource { reason }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AnalysisError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| data_error(format!("CSV header error: {}", e)))?
            .iter()
            .map(normalize_header)
            .collect();

        let date_col = headers
            .iter()
            .position(|h| h == "date")
            .ok_or_else(|| data_error("missing date column".into()))?;
        let price_col = headers
            .iter()
            .position(|h| h == "adjclose")
            .or_else(|| headers.iter().position(|h| h == "close"))
            .ok_or_else(|| data_error("missing adj_close or close column".into()))?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(date_col)
                .ok_or_else(|| data_error("missing date value".into()))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| data_error(format!("invalid date format: {}", e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            let raw = record
                .get(price_col)
                .map(str::trim)
                .ok_or_else(|| data_error("missing price value".into()))?;
            // Providers leave holidays blank.
            if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
                continue;
            }
            let price: f64 = raw
                .parse()
                .map_err(|e| data_error(format!("invalid price value on {}: {}", date, e)))?;

            points.push(PricePoint::new(date, price));
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}
