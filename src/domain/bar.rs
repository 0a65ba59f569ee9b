//! Minute bar representation and lookup helpers.

use chrono::NaiveTime;

/// One minute of trading for one ticker-day. Indicator columns are whatever
/// the store happened to precompute; any of them may be absent.
#[derive(Debug, Clone)]
pub struct Bar {
    pub time: NaiveTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub ema10: Option<f64>,
    pub ema20: Option<f64>,
    pub vwap: Option<f64>,
    pub rsi14: Option<f64>,
}

impl Bar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Index of the first bar with `time >= t`, clamped to the last index.
///
/// Callers must ensure `bars` is non-empty; an empty day is handled one
/// level up (the trade is left unscored).
pub fn bar_at(bars: &[Bar], t: NaiveTime) -> usize {
    bars.iter()
        .position(|b| b.time >= t)
        .unwrap_or(bars.len() - 1)
}

/// Cumulative volume-weighted average price over `bars[..=idx]`.
///
/// Used where the store carries no VWAP column. Falls back to the close at
/// `idx` when cumulative volume is zero.
pub fn vwap_at(bars: &[Bar], idx: usize) -> f64 {
    let window = &bars[..=idx];
    let cum_vol: f64 = window.iter().map(|b| b.volume as f64).sum();
    if cum_vol <= 0.0 {
        return bars[idx].close;
    }
    let cum_tp_vol: f64 = window
        .iter()
        .map(|b| b.typical_price() * b.volume as f64)
        .sum();
    cum_tp_vol / cum_vol
}
