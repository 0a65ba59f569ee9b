//! Normalized broker fill legs.

use chrono::NaiveDateTime;

/// Order side after normalization.
///
/// Some brokers report short covers as plain buys; the pairing engine
/// accepts either `Buy` or `BuyToCover` against an open short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
    SellShort,
    BuyToCover,
}

/// One fully-filled order leg. Unfilled, partial, and non-equity rows are
/// filtered out by the transaction log adapter before reaching the core.
#[derive(Debug, Clone)]
pub struct Fill {
    pub ticker: String,
    pub side: Side,
    pub quantity: i64,
    pub price: f64,
    pub order_time: NaiveDateTime,
    pub fill_time: NaiveDateTime,
}
