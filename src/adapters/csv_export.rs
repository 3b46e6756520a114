//! CSV export of computed series.
//!
//! For each asset writes `<SYMBOL>_prices.csv`, `<SYMBOL>_strategies.csv` and
//! `<SYMBOL>_trend.csv` into the target directory.

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::info;

use crate::domain::analysis::{Analysis, AssetView};
use crate::domain::error::AnalysisError;
use crate::domain::simulation::PortfolioTrajectory;

fn csv_error(e: csv::Error) -> AnalysisError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => AnalysisError::Io(io),
        other => AnalysisError::DataSource {
            reason: format!("CSV write error: {:?}", other),
        },
    }
}

fn file_stem(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect::<String>()
        .to_uppercase()
}

/// Daily price, daily return and cumulative return. The first row has no
/// return.
pub fn write_prices<W: std::io::Write>(wtr: &mut Writer<W>, asset: &AssetView) -> Result<(), AnalysisError> {
    wtr.write_record(["date", "price", "daily_return", "cumulative_return"])
        .map_err(csv_error)?;
    let metrics = &asset.metrics;
    for (i, point) in asset.prices.points().iter().enumerate() {
        let (daily, cumulative) = match i.checked_sub(1) {
            Some(j) => (
                metrics.daily_returns[j].to_string(),
                metrics.cumulative_returns[j].to_string(),
            ),
            None => (String::new(), String::new()),
        };
        wtr.write_record([
            point.date.to_string(),
            point.price.to_string(),
            daily,
            cumulative,
        ])
        .map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Both trajectories in long format: one row per strategy and date.
pub fn write_strategies<W: std::io::Write>(
    wtr: &mut Writer<W>,
    trajectories: &[&PortfolioTrajectory],
) -> Result<(), AnalysisError> {
    wtr.write_record(["strategy", "date", "value", "units"])
        .map_err(csv_error)?;
    for trajectory in trajectories {
        for point in &trajectory.points {
            wtr.write_record([
                trajectory.kind.to_string(),
                point.date.to_string(),
                point.value.to_string(),
                point.units.to_string(),
            ])
            .map_err(csv_error)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Fitted trend followed by the forecast; `actual` is blank in the forecast.
pub fn write_trend<W: std::io::Write>(wtr: &mut Writer<W>, asset: &AssetView) -> Result<(), AnalysisError> {
    wtr.write_record([
        "date",
        "day_offset",
        "actual",
        "predicted",
        "lower_1",
        "upper_1",
        "lower_2",
        "upper_2",
        "lower_3",
        "upper_3",
    ])
    .map_err(csv_error)?;
    for p in asset.trend.all_points() {
        let mut record = vec![
            p.date.to_string(),
            p.day_offset.to_string(),
            p.actual.map(|a| a.to_string()).unwrap_or_default(),
            p.predicted.to_string(),
        ];
        for band in &p.bands {
            record.push(band.lower.to_string());
            record.push(band.upper.to_string());
        }
        wtr.write_record(&record).map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes every asset's series into `dir`, creating it if needed. Returns
/// the written paths.
pub fn export_analysis(analysis: &Analysis, dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for asset in &analysis.assets {
        let stem = file_stem(&asset.symbol);

        let path = dir.join(format!("{stem}_prices.csv"));
        write_prices(&mut Writer::from_path(&path).map_err(csv_error)?, asset)?;
        written.push(path);

        let path = dir.join(format!("{stem}_strategies.csv"));
        write_strategies(
            &mut Writer::from_path(&path).map_err(csv_error)?,
            &[&asset.lump_sum, &asset.dca],
        )?;
        written.push(path);

        let path = dir.join(format!("{stem}_trend.csv"));
        write_trend(&mut Writer::from_path(&path).map_err(csv_error)?, asset)?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "series exported");
    Ok(written)
}
