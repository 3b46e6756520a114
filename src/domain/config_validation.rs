//! Configuration validation.
//!
//! Validates the `[analysis]` and `[data]` sections before any data is
//! fetched.

use crate::domain::error::AnalysisError;
use crate::domain::frequency::Frequency;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const ANALYSIS_SECTION: &str = "analysis";
pub const DATA_SECTION: &str = "data";

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), AnalysisError> {
    validate_primary(config)?;
    validate_dates(config)?;
    validate_risk_free_rate(config)?;
    validate_amounts(config)?;
    validate_frequency(config)?;
    validate_management_fee(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), AnalysisError> {
    let source = config
        .get_non_empty(DATA_SECTION, "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.to_lowercase().as_str() {
        "csv" => Ok(()),
        "yahoo" => Ok(()),
        other => Err(invalid(
            DATA_SECTION,
            "source",
            format!("unknown data source '{other}', expected csv or yahoo"),
        )),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> AnalysisError {
    AnalysisError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_primary(config: &dyn ConfigPort) -> Result<(), AnalysisError> {
    match config.get_non_empty(ANALYSIS_SECTION, "primary") {
        Some(_) => Ok(()),
        None => Err(AnalysisError::ConfigMissing {
            section: ANALYSIS_SECTION.to_string(),
            key: "primary".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AnalysisError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                ANALYSIS_SECTION,
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` key, `None` when absent.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, AnalysisError> {
    match config.get_non_empty(ANALYSIS_SECTION, key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    ANALYSIS_SECTION,
                    key,
                    format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            }),
    }
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), AnalysisError> {
    if let Some(value) = config.get_double(ANALYSIS_SECTION, "risk_free_rate_pct")? {
        if !(0.0..100.0).contains(&value) {
            return Err(invalid(
                ANALYSIS_SECTION,
                "risk_free_rate_pct",
                "risk_free_rate_pct must be between 0 and 100",
            ));
        }
    }
    Ok(())
}

/// A zero initial amount is a DCA-only comparison.
fn validate_amounts(config: &dyn ConfigPort) -> Result<(), AnalysisError> {
    for key in ["initial_amount", "contribution"] {
        if let Some(value) = config.get_double(ANALYSIS_SECTION, key)? {
            if value < 0.0 {
                return Err(invalid(
                    ANALYSIS_SECTION,
                    key,
                    format!("{key} must be non-negative"),
                ));
            }
        }
    }
    Ok(())
}

fn validate_frequency(config: &dyn ConfigPort) -> Result<(), AnalysisError> {
    if let Some(tag) = config.get_non_empty(ANALYSIS_SECTION, "frequency") {
        tag.parse::<Frequency>()?;
    }
    Ok(())
}

fn validate_management_fee(config: &dyn ConfigPort) -> Result<(), AnalysisError> {
    if let Some(value) = config.get_double(ANALYSIS_SECTION, "management_fee_pct")? {
        if value < 0.0 {
            return Err(invalid(
                ANALYSIS_SECTION,
                "management_fee_pct",
                "management_fee_pct must be non-negative",
            ));
        }
    }
    Ok(())
}
