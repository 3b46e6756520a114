//! Price data access port trait.

use crate::domain::error::AnalysisError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily adjusted closes for `symbol` between the two dates. CSV files
    /// include `end_date`; Yahoo treats it as exclusive.
    ///
    /// An empty vector is a valid "no data" answer; callers turn it into
    /// `SymbolNotFound`.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, AnalysisError>;
}
