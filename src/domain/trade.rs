//! Closed round-trip trades.

use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

/// A closed round-trip position, created exactly once by the pairing engine
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Trade {
    pub ticker: String,
    /// Calendar date of the entry fill.
    pub date: NaiveDate,
    pub direction: Direction,
    pub entry_time: NaiveTime,
    pub entry_price: f64,
    /// Submission time of the entry order (for fill-lag scoring).
    pub entry_order_time: NaiveTime,
    pub exit_time: NaiveTime,
    pub exit_price: f64,
    pub quantity: i64,
}

impl Trade {
    /// +1 for longs, -1 for shorts. Applied uniformly to every directional
    /// calculation in the scoring engine.
    pub fn sign(&self) -> f64 {
        match self.direction {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn pnl_pct(&self) -> f64 {
        self.sign() * (self.exit_price - self.entry_price) / self.entry_price
    }

    pub fn pnl_usd(&self) -> f64 {
        self.sign() * (self.exit_price - self.entry_price) * self.quantity as f64
    }

    pub fn is_win(&self) -> bool {
        self.pnl_usd() > 0.0
    }

    pub fn notional(&self) -> f64 {
        self.entry_price * self.quantity as f64
    }
}
