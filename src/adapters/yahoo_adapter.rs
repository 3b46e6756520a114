//! Yahoo Finance v8 chart adapter.
//!
//! Fetches daily bars over HTTP and keeps the adjusted close, falling back
//! to the raw close when Yahoo omits the `adjclose` indicator. The end date
//! is exclusive, matching the chart endpoint's `period2`.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::domain::error::AnalysisError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) dcacompare";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new() -> Result<Self, AnalysisError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| data_error(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The symbol is a single percent-encoded path segment.
    fn chart_url(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Url, AnalysisError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| data_error(format!("invalid yahoo base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| data_error(format!("yahoo base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        url.query_pairs_mut()
            .append_pair("period1", &unix_midnight(start_date).to_string())
            .append_pair("period2", &unix_midnight(end_date).to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "div,split");
        Ok(url)
    }
}

fn data_error(reason: String) -> AnalysisError {
    AnalysisError::DataSource { reason }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

impl DataPort for YahooAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AnalysisError> {
        let url = self.chart_url(symbol, start_date, end_date)?;
        debug!(symbol, %url, "requesting yahoo chart");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| data_error(format!("yahoo request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| data_error(format!("failed to read yahoo response: {}", e)))?;

        // Yahoo reports unknown symbols as 404 with a JSON error body.
        if !status.is_success() && status.as_u16() != 404 {
            return Err(data_error(format!("yahoo returned HTTP {}", status)));
        }

        let points = parse_chart(&body)?;
        Ok(points
            .into_iter()
            .filter(|p| p.date >= start_date && p.date < end_date)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Vec<YahooAdjClose>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Parses a v8 chart body into price points in exchange-local dates.
/// Bars with a missing price are dropped.
fn parse_chart(body: &str) -> Result<Vec<PricePoint>, AnalysisError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| data_error(format!("failed to parse yahoo chart: {}", e)))?;

    if let Some(error) = response.chart.error {
        return Err(data_error(format!(
            "yahoo chart API error: {} {}",
            error.code, error.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| data_error("no chart data in response".into()))?;

    // No timestamps means no bars in the requested range.
    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };
    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);

    let prices: Vec<Option<f64>> = match result.indicators.adjclose.into_iter().next() {
        Some(adj) if !adj.adjclose.is_empty() => adj.adjclose,
        _ => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .ok_or_else(|| data_error("no quote data".into()))?,
    };

    let mut points = Vec::with_capacity(timestamps.len());
    for (ts, price) in timestamps.into_iter().zip(prices) {
        let Some(price) = price else { continue };
        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| data_error(format!("invalid timestamp: {}", ts)))?
            .date_naive();
        points.push(PricePoint::new(date, price));
    }
    Ok(points)
}
