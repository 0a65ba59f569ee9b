//! Trade pairing engine: folds a time-ordered fill stream into closed
//! round-trip trades.
//!
//! One state machine per ticker; tickers never interact. A fill that does
//! not fit the expected open/close transition (e.g. a second buy while
//! already long) is dropped — an explicit `Ignored` outcome, not an error.
//! No pyramiding, no lot tracking.

use std::collections::HashMap;

use crate::domain::fill::{Fill, Side};
use crate::domain::trade::{Direction, Trade};

/// Pairing state for a single ticker.
#[derive(Debug, Clone, Default)]
pub enum PairingState {
    #[default]
    Flat,
    OpenLong(Fill),
    OpenShort(Fill),
}

/// Outcome of feeding one fill into the state machine.
#[derive(Debug)]
pub enum Transition {
    Opened,
    Closed(Trade),
    /// The fill did not match any open/close transition and was dropped.
    Ignored,
}

/// Advance the state machine by one fill.
pub fn step(state: PairingState, fill: &Fill) -> (PairingState, Transition) {
    match (state, fill.side) {
        (PairingState::Flat, Side::Buy) => {
            (PairingState::OpenLong(fill.clone()), Transition::Opened)
        }
        (PairingState::Flat, Side::SellShort) => {
            (PairingState::OpenShort(fill.clone()), Transition::Opened)
        }
        (PairingState::OpenLong(entry), Side::Sell) => {
            let trade = close(&entry, fill, Direction::Long);
            (PairingState::Flat, Transition::Closed(trade))
        }
        (PairingState::OpenShort(entry), Side::Buy | Side::BuyToCover) => {
            let trade = close(&entry, fill, Direction::Short);
            (PairingState::Flat, Transition::Closed(trade))
        }
        (state, _) => (state, Transition::Ignored),
    }
}

fn close(entry: &Fill, exit: &Fill, direction: Direction) -> Trade {
    Trade {
        ticker: entry.ticker.clone(),
        date: entry.fill_time.date(),
        direction,
        entry_time: entry.fill_time.time(),
        entry_price: entry.price,
        entry_order_time: entry.order_time.time(),
        exit_time: exit.fill_time.time(),
        exit_price: exit.price,
        quantity: entry.quantity.min(exit.quantity),
    }
}

/// Pair the fills of a single ticker, assumed pre-sorted by fill time.
pub fn pair_ticker(fills: &[Fill]) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut state = PairingState::Flat;
    for fill in fills {
        let (next, transition) = step(state, fill);
        state = next;
        if let Transition::Closed(trade) = transition {
            trades.push(trade);
        }
    }
    trades
}

/// Pair fills across all tickers.
///
/// Fills are grouped per ticker and stably sorted by fill time (ties keep
/// input order), then the combined output is sorted by (entry date, entry
/// time) for deterministic downstream numbering.
pub fn pair_fills(fills: &[Fill]) -> Vec<Trade> {
    let mut by_ticker: HashMap<&str, Vec<Fill>> = HashMap::new();
    for fill in fills {
        by_ticker
            .entry(fill.ticker.as_str())
            .or_default()
            .push(fill.clone());
    }

    let mut trades = Vec::new();
    for ticker_fills in by_ticker.values_mut() {
        ticker_fills.sort_by_key(|f| f.fill_time);
        trades.extend(pair_ticker(ticker_fills));
    }

    trades.sort_by_key(|t| (t.date, t.entry_time, t.ticker.clone()));
    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn fill(ticker: &str, side: Side, qty: i64, price: f64, time: NaiveDateTime) -> Fill {
        Fill {
            ticker: ticker.into(),
            side,
            quantity: qty,
            price,
            order_time: time,
            fill_time: time,
        }
    }

    #[test]
    fn single_long_round_trip() {
        let fills = vec![
            fill("A", Side::Buy, 100, 10.0, dt(15, 9, 30)),
            fill("A", Side::Sell, 100, 11.0, dt(15, 9, 35)),
        ];
        let trades = pair_fills(&fills);

        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!(t.direction, Direction::Long);
        assert!((t.entry_price - 10.0).abs() < f64::EPSILON);
        assert!((t.exit_price - 11.0).abs() < f64::EPSILON);
        assert_eq!(t.quantity, 100);
        assert!(t.pnl_usd() > 0.0);
    }

    #[test]
    fn single_short_round_trip() {
        let fills = vec![
            fill("A", Side::SellShort, 50, 20.0, dt(15, 10, 0)),
            fill("A", Side::BuyToCover, 50, 18.0, dt(15, 10, 10)),
        ];
        let trades = pair_fills(&fills);

        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!(t.direction, Direction::Short);
        assert!((t.entry_price - 20.0).abs() < f64::EPSILON);
        assert!((t.exit_price - 18.0).abs() < f64::EPSILON);
        assert_eq!(t.quantity, 50);
        assert!(t.pnl_usd() > 0.0, "price fell, short wins");
    }

    #[test]
    fn plain_buy_covers_open_short() {
        let fills = vec![
            fill("A", Side::SellShort, 50, 20.0, dt(15, 10, 0)),
            fill("A", Side::Buy, 50, 19.0, dt(15, 10, 5)),
        ];
        let trades = pair_fills(&fills);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].direction, Direction::Short);
    }

    #[test]
    fn doubling_up_is_ignored() {
        let fills = vec![
            fill("A", Side::Buy, 100, 10.0, dt(15, 9, 30)),
            fill("A", Side::Buy, 100, 10.5, dt(15, 9, 32)),
            fill("A", Side::Sell, 100, 11.0, dt(15, 9, 35)),
        ];
        let trades = pair_fills(&fills);

        assert_eq!(trades.len(), 1);
        // The second buy neither averaged in nor opened a second lot.
        assert!((trades[0].entry_price - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_while_flat_is_ignored() {
        let fills = vec![
            fill("A", Side::Sell, 100, 11.0, dt(15, 9, 30)),
            fill("A", Side::Buy, 100, 10.0, dt(15, 9, 35)),
            fill("A", Side::Sell, 100, 12.0, dt(15, 9, 40)),
        ];
        let trades = pair_fills(&fills);
        assert_eq!(trades.len(), 1);
        assert!((trades[0].exit_price - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_short_while_long_is_ignored() {
        let fills = vec![
            fill("A", Side::Buy, 100, 10.0, dt(15, 9, 30)),
            fill("A", Side::SellShort, 100, 10.5, dt(15, 9, 32)),
            fill("A", Side::Sell, 100, 11.0, dt(15, 9, 35)),
        ];
        let trades = pair_fills(&fills);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].direction, Direction::Long);
    }

    #[test]
    fn partial_close_takes_smaller_quantity_and_flattens() {
        let fills = vec![
            fill("A", Side::Buy, 200, 10.0, dt(15, 9, 30)),
            fill("A", Side::Sell, 120, 11.0, dt(15, 9, 35)),
            // Residual 80 shares are not tracked; a later sell finds no
            // open position.
            fill("A", Side::Sell, 80, 11.5, dt(15, 9, 40)),
        ];
        let trades = pair_fills(&fills);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 120);
    }

    #[test]
    fn tickers_are_independent() {
        let fills = vec![
            fill("A", Side::Buy, 100, 10.0, dt(15, 9, 30)),
            fill("B", Side::SellShort, 50, 30.0, dt(15, 9, 31)),
            fill("A", Side::Sell, 100, 11.0, dt(15, 9, 40)),
            fill("B", Side::BuyToCover, 50, 29.0, dt(15, 9, 45)),
        ];
        let trades = pair_fills(&fills);

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].ticker, "A");
        assert_eq!(trades[1].ticker, "B");
    }

    #[test]
    fn fills_sorted_by_fill_time_before_pairing() {
        // Out-of-order input: the sell arrives first in file order.
        let fills = vec![
            fill("A", Side::Sell, 100, 11.0, dt(15, 9, 35)),
            fill("A", Side::Buy, 100, 10.0, dt(15, 9, 30)),
        ];
        let trades = pair_fills(&fills);
        assert_eq!(trades.len(), 1);
    }

    #[test]
    fn output_sorted_by_entry_date_then_time() {
        let fills = vec![
            fill("B", Side::Buy, 10, 5.0, dt(16, 9, 30)),
            fill("B", Side::Sell, 10, 6.0, dt(16, 9, 40)),
            fill("A", Side::Buy, 10, 5.0, dt(15, 14, 0)),
            fill("A", Side::Sell, 10, 6.0, dt(15, 14, 30)),
            fill("C", Side::Buy, 10, 5.0, dt(15, 9, 45)),
            fill("C", Side::Sell, 10, 6.0, dt(15, 10, 0)),
        ];
        let trades = pair_fills(&fills);

        let order: Vec<&str> = trades.iter().map(|t| t.ticker.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn unclosed_position_emits_nothing() {
        let fills = vec![fill("A", Side::Buy, 100, 10.0, dt(15, 9, 30))];
        assert!(pair_fills(&fills).is_empty());
    }

    #[test]
    fn pairing_is_idempotent_on_reconstructed_stream() {
        let fills = vec![
            fill("A", Side::Buy, 100, 10.0, dt(15, 9, 30)),
            fill("A", Side::Sell, 100, 11.0, dt(15, 9, 35)),
            fill("A", Side::SellShort, 40, 12.0, dt(15, 10, 0)),
            fill("A", Side::BuyToCover, 40, 11.5, dt(15, 10, 20)),
        ];
        let trades = pair_fills(&fills);

        // Rebuild a fill stream from the paired trades and pair again.
        let reconstructed: Vec<Fill> = trades
            .iter()
            .flat_map(|t| {
                let (open, close) = match t.direction {
                    Direction::Long => (Side::Buy, Side::Sell),
                    Direction::Short => (Side::SellShort, Side::BuyToCover),
                };
                let entry_dt = t.date.and_time(t.entry_time);
                let exit_dt = t.date.and_time(t.exit_time);
                vec![
                    fill(&t.ticker, open, t.quantity, t.entry_price, entry_dt),
                    fill(&t.ticker, close, t.quantity, t.exit_price, exit_dt),
                ]
            })
            .collect();
        let again = pair_fills(&reconstructed);

        assert_eq!(again.len(), trades.len());
        for (a, b) in again.iter().zip(&trades) {
            assert_eq!(a.ticker, b.ticker);
            assert_eq!(a.direction, b.direction);
            assert_eq!(a.quantity, b.quantity);
            assert!((a.entry_price - b.entry_price).abs() < f64::EPSILON);
            assert!((a.exit_price - b.exit_price).abs() < f64::EPSILON);
        }
    }
}
