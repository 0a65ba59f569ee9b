//! Trade characteristics: per-trade context features feeding the
//! behavioural summary report (timing, excursions, trend posture).
//!
//! Unlike the scoring engine this never assigns judgement values; it only
//! measures, and the report layer buckets and tabulates.

use chrono::{Datelike, Timelike, Weekday};

use crate::domain::bar::{bar_at, vwap_at, Bar};
use crate::domain::trade::Trade;

/// Which side of the move the entry sat on: left side means entering
/// against the current day position (buying low / shorting high), right
/// side means entering with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySide {
    Left,
    Right,
}

impl EntrySide {
    pub fn label(self) -> &'static str {
        match self {
            EntrySide::Left => "left-side",
            EntrySide::Right => "right-side",
        }
    }
}

/// A trade enriched with intraday context. Percentages are in percent
/// units (1.0 == 1%), matching how the summary report prints them.
#[derive(Debug, Clone)]
pub struct TradeProfile {
    pub trade: Trade,
    pub hold_minutes: f64,
    pub cross_day: bool,
    /// Entry price position within the day's high-low range, clamped to
    /// [0, 1].
    pub day_position_pct: f64,
    pub entry_side: EntrySide,
    pub mfe_pct: f64,
    pub mae_pct: f64,
    /// Favorable continuation in the five bars after exit.
    pub post_exit_pct: f64,
    /// Realized share of (realized + post-exit continuation).
    pub capture_pct: f64,
    pub above_vwap: bool,
    pub above_ema20: bool,
    pub rel_volume: f64,
    pub entry_hour: u32,
    pub entry_weekday: Weekday,
}

const POST_EXIT_BARS: usize = 5;
const VOLUME_LOOKBACK: usize = 20;
const LEFT_SIDE_LOW: f64 = 0.4;
const LEFT_SIDE_HIGH: f64 = 0.6;

impl TradeProfile {
    /// Enrich a trade with its entry day's bars. Returns `None` when the
    /// day has no bar data at all.
    pub fn enrich(trade: &Trade, day: &[Bar]) -> Option<Self> {
        if day.is_empty() {
            return None;
        }

        let ei = bar_at(day, trade.entry_time);
        let xi_raw = bar_at(day, trade.exit_time);
        let cross_day = xi_raw < ei;
        let xi = if cross_day { day.len() - 1 } else { xi_raw };

        let sign = trade.sign();
        let eb = &day[ei];
        let trade_bars = &day[ei..=xi];
        let post_bars = &day[(xi + 1).min(day.len())..(xi + 1 + POST_EXIT_BARS).min(day.len())];

        let entry = trade.entry_price;
        let (mfe, mae) = if sign > 0.0 {
            let hi = trade_bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let lo = trade_bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            (hi, lo)
        } else {
            let lo = trade_bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            let hi = trade_bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            (lo, hi)
        };
        let mfe_pct = (sign * (mfe - entry) / entry).max(0.0);
        let mae_pct = (sign * (entry - mae) / entry).max(0.0);

        let post_pct = if post_bars.is_empty() {
            0.0
        } else {
            let ext = if sign > 0.0 {
                post_bars.iter().map(|b| b.high).fold(f64::MIN, f64::max)
            } else {
                post_bars.iter().map(|b| b.low).fold(f64::MAX, f64::min)
            };
            (sign * (ext - trade.exit_price) / entry).max(0.0)
        };

        let actual_pct = sign * (trade.exit_price - entry) / entry;
        let capture = if actual_pct + post_pct > 1e-6 {
            actual_pct / (actual_pct + post_pct)
        } else {
            1.0
        };

        let day_high = day.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let day_low = day.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let range = (day_high - day_low).max(1e-6);
        let day_position_pct = ((entry - day_low) / range).clamp(0.0, 1.0);
        let entry_side = if sign > 0.0 {
            if day_position_pct < LEFT_SIDE_LOW {
                EntrySide::Left
            } else {
                EntrySide::Right
            }
        } else if day_position_pct > LEFT_SIDE_HIGH {
            EntrySide::Left
        } else {
            EntrySide::Right
        };

        let vol_window = &day[ei.saturating_sub(VOLUME_LOOKBACK)..ei];
        let rel_volume = if vol_window.is_empty() {
            1.0
        } else {
            let avg =
                vol_window.iter().map(|b| b.volume as f64).sum::<f64>() / vol_window.len() as f64;
            if avg > 0.0 { eb.volume as f64 / avg } else { 1.0 }
        };

        let hold_minutes = {
            let mins =
                (trade.exit_time - trade.entry_time).num_seconds() as f64 / 60.0;
            if cross_day { mins + 24.0 * 60.0 } else { mins.max(0.0) }
        };

        Some(Self {
            trade: trade.clone(),
            hold_minutes,
            cross_day,
            day_position_pct,
            entry_side,
            mfe_pct: mfe_pct * 100.0,
            mae_pct: mae_pct * 100.0,
            post_exit_pct: post_pct * 100.0,
            capture_pct: capture * 100.0,
            above_vwap: entry > vwap_at(day, ei),
            above_ema20: eb.ema20.is_some_and(|e| entry > e),
            rel_volume,
            entry_hour: trade.entry_time.hour(),
            entry_weekday: trade.date.weekday(),
        })
    }
}
