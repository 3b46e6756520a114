//! Per-asset analysis pipeline.
//!
//! `load prices -> metrics -> resample -> simulate -> fit trend`, run once
//! per symbol. The primary asset is fatal on error; the secondary asset and
//! the benchmark degrade to warnings.

use crate::domain::error::AnalysisError;
use crate::domain::frequency::{periodic_returns, resample, Frequency, PeriodicPriceSeries};
use crate::domain::price::PriceSeries;
use crate::domain::returns::{ReturnDistribution, ReturnMetrics};
use crate::domain::simulation::{
    simulate_dca, simulate_lump_sum, summarize, PortfolioTrajectory, StrategySummary,
};
use crate::domain::trend::TrendModel;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

pub const DEFAULT_BENCHMARK: &str = "ACWI";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub primary: String,
    pub secondary: Option<String>,
    pub benchmark: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Annual fraction, e.g. 0.02.
    pub risk_free_rate: f64,
    pub initial_amount: f64,
    /// Base monthly contribution, scaled by the frequency multiplier.
    pub base_contribution: f64,
    pub frequency: Frequency,
    /// Accepted and reported, never applied to any trajectory.
    pub management_fee_pct: f64,
}

impl AnalysisConfig {
    pub fn per_period_contribution(&self) -> f64 {
        self.frequency.per_period_contribution(self.base_contribution)
    }

    /// Primary first, then the secondary if configured.
    pub fn symbols(&self) -> Vec<&str> {
        std::iter::once(self.primary.as_str())
            .chain(self.secondary.as_deref())
            .collect()
    }
}

/// Everything computed for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetView {
    pub symbol: String,
    pub prices: PriceSeries,
    pub metrics: ReturnMetrics,
    pub periodic: PeriodicPriceSeries,
    pub periodic_returns: Vec<f64>,
    pub periodic_distribution: Option<ReturnDistribution>,
    pub monthly_returns: Vec<f64>,
    pub monthly_distribution: Option<ReturnDistribution>,
    pub lump_sum: PortfolioTrajectory,
    pub dca: PortfolioTrajectory,
    pub lump_sum_summary: StrategySummary,
    pub dca_summary: StrategySummary,
    pub trend: TrendModel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkView {
    pub symbol: String,
    pub metrics: ReturnMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub config: AnalysisConfig,
    /// Primary first; at most one more.
    pub assets: Vec<AssetView>,
    pub benchmark: Option<BenchmarkView>,
    pub warnings: Vec<String>,
}

impl Analysis {
    pub fn primary(&self) -> &AssetView {
        &self.assets[0]
    }

    pub fn is_comparison(&self) -> bool {
        self.assets.len() > 1
    }
}

pub fn analyze_asset(
    symbol: &str,
    prices: PriceSeries,
    config: &AnalysisConfig,
) -> Result<AssetView, AnalysisError> {
    let metrics = ReturnMetrics::compute(&prices, config.risk_free_rate)?;

    let periodic = resample(&prices, config.frequency);
    let period_returns = periodic_returns(&periodic);
    let monthly_returns = if config.frequency == Frequency::Monthly {
        period_returns.clone()
    } else {
        periodic_returns(&resample(&prices, Frequency::Monthly))
    };

    let lump_sum = simulate_lump_sum(&metrics, config.initial_amount);
    let dca = simulate_dca(&periodic, config.per_period_contribution())?;

    // Both strategies are measured over the daily series span.
    let (start, end) = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => {
            return Err(AnalysisError::InsufficientData {
                points: prices.len(),
                minimum: crate::domain::price::MIN_PRICE_POINTS,
            });
        }
    };
    let lump_sum_summary = summarize(&lump_sum, config.initial_amount, start, end)?;
    let dca_summary = summarize(&dca, config.initial_amount, start, end)?;

    let trend = TrendModel::fit(&prices)?;

    debug!(
        symbol,
        points = prices.len(),
        periods = periodic.len(),
        "asset analyzed"
    );

    Ok(AssetView {
        symbol: symbol.to_string(),
        periodic_distribution: ReturnDistribution::from_returns(&period_returns),
        monthly_distribution: ReturnDistribution::from_returns(&monthly_returns),
        prices,
        metrics,
        periodic,
        periodic_returns: period_returns,
        monthly_returns,
        lump_sum,
        dca,
        lump_sum_summary,
        dca_summary,
        trend,
    })
}

/// Fetches a symbol and validates the series. Fetch failures and empty
/// results both become `SymbolNotFound`.
pub fn load_prices(
    data_port: &dyn DataPort,
    symbol: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<PriceSeries, AnalysisError> {
    let points = match data_port.fetch_prices(symbol, start_date, end_date) {
        Ok(points) => points,
        Err(e) => {
            warn!(symbol, error = %e, "price fetch failed");
            return Err(AnalysisError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
    };
    if points.is_empty() {
        return Err(AnalysisError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }
    info!(symbol, points = points.len(), "prices loaded");
    PriceSeries::from_unsorted(points)
}

pub fn run_analysis(
    data_port: &dyn DataPort,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    let mut warnings = Vec::new();
    let mut assets: Vec<AssetView> = Vec::new();

    for (index, &symbol) in config.symbols().iter().enumerate() {
        if let Some(done) = assets.iter().find(|a| a.symbol.eq_ignore_ascii_case(symbol)) {
            info!(symbol, "already analyzed, reusing results");
            let mut view = done.clone();
            view.symbol = symbol.to_string();
            assets.push(view);
            continue;
        }

        let result = load_prices(data_port, symbol, config.start_date, config.end_date)
            .and_then(|prices| analyze_asset(symbol, prices, config));
        match result {
            Ok(view) => assets.push(view),
            // The primary asset is required.
            Err(e) if index == 0 => return Err(e),
            Err(e) => {
                warn!(symbol, error = %e, "skipping asset");
                warnings.push(format!("secondary asset {symbol} skipped: {e}"));
            }
        }
    }

    let benchmark = match config.benchmark.as_deref() {
        Some(symbol) => {
            match load_prices(data_port, symbol, config.start_date, config.end_date)
                .and_then(|prices| ReturnMetrics::compute(&prices, config.risk_free_rate))
            {
                Ok(metrics) => Some(BenchmarkView {
                    symbol: symbol.to_string(),
                    metrics,
                }),
                Err(e) => {
                    warn!(symbol, error = %e, "skipping benchmark");
                    warnings.push(format!("benchmark {symbol} skipped: {e}"));
                    None
                }
            }
        }
        None => None,
    };

    Ok(Analysis {
        config: config.clone(),
        assets,
        benchmark,
        warnings,
    })
}
