//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for dcacompare.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no price data found for symbol {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("insufficient data: have {points} points, need {minimum}")]
    InsufficientData { points: usize, minimum: usize },

    #[error("unknown contribution frequency: {tag}")]
    UnknownFrequency { tag: String },

    #[error("annualized volatility is zero, Sharpe ratio is undefined")]
    DegenerateVolatility,

    #[error("invalid price {price} on {date}: prices must be positive")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("dates must be strictly increasing, got {date} out of order")]
    UnorderedDates { date: NaiveDate },

    #[error("investment duration must be positive, got {days} days")]
    NonPositiveDuration { days: i64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AnalysisError> for std::process::ExitCode {
    fn from(err: &AnalysisError) -> Self {
        let code: u8 = match err {
            AnalysisError::Io(_) => 1,
            AnalysisError::ConfigParse { .. }
            | AnalysisError::ConfigMissing { .. }
            | AnalysisError::ConfigInvalid { .. } => 2,
            AnalysisError::DataSource { .. } | AnalysisError::SymbolNotFound { .. } => 3,
            AnalysisError::UnknownFrequency { .. } => 4,
            AnalysisError::InsufficientData { .. }
            | AnalysisError::DegenerateVolatility
            | AnalysisError::InvalidPrice { .. }
            | AnalysisError::UnorderedDates { .. }
            | AnalysisError::NonPositiveDuration { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
