//! Bar store port trait: read access to per-ticker minute-bar history.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::bar::Bar;
use crate::domain::error::TradereviewError;

/// One ticker's history: bars grouped by trading day, days in order.
pub type DayBars = BTreeMap<NaiveDate, Vec<Bar>>;

pub trait BarStorePort {
    /// Load a ticker's bar history, optionally restricted to a date range
    /// (inclusive on both ends).
    fn load_days(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DayBars, TradereviewError>;

    /// Whether any bar data exists for the ticker. Trades in tickers
    /// without data are skipped, not failed.
    fn has_ticker(&self, ticker: &str) -> bool;

    fn list_tickers(&self) -> Result<Vec<String>, TradereviewError>;
}
