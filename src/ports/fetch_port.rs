//! Data-update port trait: driving the external bar fetcher.

use chrono::NaiveDateTime;

use crate::domain::error::TradereviewError;

/// Observable state of the most recent update run.
#[derive(Debug, Clone, Default)]
pub struct UpdateStatus {
    pub running: bool,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
    /// Exit outcome of the last finished run; `None` until one completes.
    pub success: Option<bool>,
    /// Tail of the fetcher's combined output.
    pub output: Vec<String>,
}

pub trait FetchPort {
    /// Start a background update for the given tickers (all known tickers
    /// when empty). Errors if an update is already running.
    fn start_update(&self, tickers: &[String]) -> Result<(), TradereviewError>;

    /// Run an update and block until it finishes.
    fn run_update(&self, tickers: &[String]) -> Result<UpdateStatus, TradereviewError>;

    fn status(&self) -> UpdateStatus;
}
