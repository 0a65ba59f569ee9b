//! End-to-end tests over the real adapters: broker CSV in, paired and
//! scored trades out, markdown reports rendered from a temp data dir.

mod common;

use common::*;

use approx::assert_relative_eq;
use chrono::NaiveDate;
use proptest::prelude::*;

use tradereview::adapters::csv_fill_adapter::CsvFillAdapter;
use tradereview::adapters::markdown_report_adapter::{render_profile, render_review};
use tradereview::adapters::records_adapter::RecordsAdapter;
use tradereview::domain::fill::{Fill, Side};
use tradereview::domain::pairing::pair_fills;
use tradereview::domain::policy::ScoringPolicy;
use tradereview::domain::profile::TradeProfile;
use tradereview::domain::score::{Grade, Score};
use tradereview::domain::scoring::{previous_losses, score_trade};
use tradereview::domain::stats::SessionStats;
use tradereview::domain::trade::Direction;
use tradereview::ports::bar_store_port::BarStorePort;
use tradereview::ports::fill_port::FillPort;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fixture with one winning long in SNDK, one losing long in AMD, and a
/// benchmark ticker, all on 2026-01-15.
fn session_fixture() -> DataFixture {
    let fx = DataFixture::new();

    // SNDK drifts up from 100 to 102 over the hour.
    let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 2.0 / 59.0).collect();
    fx.add_records("SNDK", &[day_line("2026-01-15", &closes, None)]);

    // AMD drifts down from 50.
    let closes: Vec<f64> = (0..60).map(|i| 50.0 - i as f64 * 1.0 / 59.0).collect();
    fx.add_records("AMD", &[day_line("2026-01-15", &closes, None)]);

    fx.add_records("QQQ", &[flat_day_line("2026-01-15", 400.0, 60)]);

    fx.write_transactions(&[
        order_row("买入", "SNDK", 100, 100.3, "2026/01/15 09:40:10", "2026/01/15 09:39:00"),
        order_row("卖出", "SNDK", 100, 101.5, "2026/01/15 10:15:00", "2026/01/15 10:14:30"),
        order_row("买入", "AMD", 50, 49.8, "2026/01/15 09:45:00", "2026/01/15 09:44:00"),
        order_row("卖出", "AMD", 50, 49.4, "2026/01/15 10:05:00", "2026/01/15 10:04:00"),
        // Cancelled order and a non-US row, both ignored.
        "买入,美股,TSLA,已撤单,,2026/01/15 09:50:00,2026/01/15 09:50:00".to_string(),
        order_row("买入", "0700", 100, 300.0, "2026/01/15 09:50:00", "2026/01/15 09:50:00")
            .replace("美股", "港股"),
    ]);
    fx
}

fn score_session(fx: &DataFixture) -> (Vec<tradereview::domain::trade::Trade>, Vec<Score>) {
    let store = RecordsAdapter::new(fx.path());
    let fills = CsvFillAdapter::new(fx.transactions_path())
        .load_fills()
        .unwrap();
    let trades = pair_fills(&fills);

    let policy = ScoringPolicy::default();
    let bench = store.load_days("QQQ", None, None).unwrap();
    let prev = previous_losses(&trades);
    let scores: Vec<Score> = trades
        .iter()
        .zip(&prev)
        .map(|(trade, prev_loss)| {
            let days = store.load_days(&trade.ticker, None, None).unwrap();
            let day = days.get(&trade.date).map(Vec::as_slice).unwrap_or(&[]);
            let bench_day = bench.get(&trade.date).map(Vec::as_slice).unwrap_or(&[]);
            score_trade(trade, day, bench_day, prev_loss.as_ref(), &policy)
        })
        .collect();
    (trades, scores)
}

#[test]
fn csv_to_paired_trades() {
    let fx = session_fixture();
    let fills = CsvFillAdapter::new(fx.transactions_path())
        .load_fills()
        .unwrap();
    assert_eq!(fills.len(), 4, "cancelled and non-US rows filtered");

    let trades = pair_fills(&fills);
    assert_eq!(trades.len(), 2);

    let sndk = trades.iter().find(|t| t.ticker == "SNDK").unwrap();
    assert_eq!(sndk.direction, Direction::Long);
    assert_eq!(sndk.date, date(2026, 1, 15));
    assert_eq!(sndk.quantity, 100);
    assert_relative_eq!(sndk.pnl_usd(), 120.0, epsilon = 1e-9);
    assert!(sndk.is_win());

    let amd = trades.iter().find(|t| t.ticker == "AMD").unwrap();
    assert!(!amd.is_win());
    assert_relative_eq!(amd.pnl_usd(), -20.0, epsilon = 1e-9);
}

#[test]
fn full_session_scores_and_stats() {
    let fx = session_fixture();
    let (trades, scores) = score_session(&fx);

    assert_eq!(scores.len(), 2);
    for score in &scores {
        assert!(score.unscored_note.is_none());
        assert!(score.total() <= 100);
        assert_eq!(
            score.total(),
            score.structure() + score.entry() + score.exit() + score.risk() + score.sentiment()
        );
    }

    let stats = SessionStats::compute(&trades, &scores);
    assert_eq!(stats.trades, 2);
    assert_eq!(stats.scored, 2);
    assert_eq!(stats.wins, 1);
    assert_relative_eq!(stats.win_rate, 0.5, epsilon = 1e-9);
    assert_relative_eq!(stats.total_pnl_usd, 100.0, epsilon = 1e-9);
}

#[test]
fn trade_without_bar_day_is_unscored_not_an_error() {
    let fx = DataFixture::new();
    // Records exist for the ticker but not for the trade's date.
    fx.add_records("SNDK", &[flat_day_line("2026-01-14", 100.0, 30)]);
    fx.write_transactions(&[
        order_row("买入", "SNDK", 10, 100.0, "2026/01/15 09:40:00", "2026/01/15 09:40:00"),
        order_row("卖出", "SNDK", 10, 101.0, "2026/01/15 10:00:00", "2026/01/15 10:00:00"),
    ]);

    let (trades, scores) = score_session_without_benchmark(&fx);
    assert_eq!(trades.len(), 1);
    assert_eq!(scores[0].total(), 0);
    assert!(scores[0].unscored_note.as_deref().unwrap().contains("SNDK"));
}

fn score_session_without_benchmark(
    fx: &DataFixture,
) -> (Vec<tradereview::domain::trade::Trade>, Vec<Score>) {
    let store = RecordsAdapter::new(fx.path());
    let fills = CsvFillAdapter::new(fx.transactions_path())
        .load_fills()
        .unwrap();
    let trades = pair_fills(&fills);
    let policy = ScoringPolicy::default();
    let prev = previous_losses(&trades);
    let scores = trades
        .iter()
        .zip(&prev)
        .map(|(trade, prev_loss)| {
            let days = store.load_days(&trade.ticker, None, None).unwrap();
            let day = days.get(&trade.date).map(Vec::as_slice).unwrap_or(&[]);
            score_trade(trade, day, &[], prev_loss.as_ref(), &policy)
        })
        .collect();
    (trades, scores)
}

#[test]
fn quick_reentry_after_loss_is_flagged_in_the_report() {
    let fx = DataFixture::new();
    fx.add_records("SNDK", &[flat_day_line("2026-01-15", 100.0, 120)]);
    fx.write_transactions(&[
        // Losing trade exits 10:00, re-entry 10:05: inside the cool-off.
        order_row("买入", "SNDK", 100, 100.5, "2026/01/15 09:40:00", "2026/01/15 09:40:00"),
        order_row("卖出", "SNDK", 100, 100.0, "2026/01/15 10:00:00", "2026/01/15 10:00:00"),
        order_row("买入", "SNDK", 100, 100.0, "2026/01/15 10:05:00", "2026/01/15 10:05:00"),
        order_row("卖出", "SNDK", 100, 100.2, "2026/01/15 10:30:00", "2026/01/15 10:30:00"),
    ]);

    let (trades, scores) = score_session_without_benchmark(&fx);
    assert_eq!(trades.len(), 2);
    assert_eq!(scores[0].t2.value, 5, "first trade has no prior loss");
    assert_eq!(scores[1].t2.value, 0, "re-entry 5 minutes after a loss");

    let stats = SessionStats::compute(&trades, &scores);
    let report = render_review(&trades, &scores, &stats);
    assert!(report.contains("revenge"));
}

#[test]
fn review_report_renders_from_real_session() {
    let fx = session_fixture();
    let (trades, scores) = score_session(&fx);
    let stats = SessionStats::compute(&trades, &scores);
    let report = render_review(&trades, &scores, &stats);

    assert!(report.contains("# Trade Review"));
    assert!(report.contains("SNDK long 2026-01-15"));
    assert!(report.contains("AMD long 2026-01-15"));
    assert!(report.contains("| Win rate | 50.0% (1 wins / 1 losses) |"));
    for code in ["S1", "S2", "S3", "E1", "E2", "E3", "X1", "X2", "X3", "R1", "R2", "T1", "T2"] {
        assert!(report.contains(&format!("| {code} ")), "missing {code} row");
    }
}

#[test]
fn profile_report_renders_from_real_session() {
    let fx = session_fixture();
    let store = RecordsAdapter::new(fx.path());
    let fills = CsvFillAdapter::new(fx.transactions_path())
        .load_fills()
        .unwrap();
    let trades = pair_fills(&fills);

    let profiles: Vec<TradeProfile> = trades
        .iter()
        .filter_map(|t| {
            let days = store.load_days(&t.ticker, None, None).unwrap();
            let day = days.get(&t.date).map(Vec::as_slice).unwrap_or(&[]);
            TradeProfile::enrich(t, day)
        })
        .collect();
    assert_eq!(profiles.len(), 2);

    let report = render_profile(&profiles);
    assert!(report.contains("## 1. Basic Statistics"));
    assert!(report.contains("## 4. Risk and Psychology"));
    assert!(report.contains("| Trades | 2 |"));
}

#[test]
fn bar_store_date_filter_and_listing() {
    let fx = session_fixture();
    let store = RecordsAdapter::new(fx.path());

    assert_eq!(store.list_tickers().unwrap(), vec!["AMD", "QQQ", "SNDK"]);
    let days = store
        .load_days("SNDK", Some(date(2026, 1, 16)), None)
        .unwrap();
    assert!(days.is_empty(), "all data predates the start filter");
}

// ── property tests ──────────────────────────────────────────────────────

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![
        Just(Side::Buy),
        Just(Side::Sell),
        Just(Side::SellShort),
        Just(Side::BuyToCover),
    ]
}

prop_compose! {
    fn arb_fill()(
        ticker in "[A-C]",
        side in arb_side(),
        quantity in 1i64..500,
        price in 1.0f64..500.0,
        minute in 0u32..390,
    ) -> Fill {
        let time = date(2026, 1, 15)
            .and_hms_opt(9 + (30 + minute) / 60, (30 + minute) % 60, 0)
            .unwrap();
        Fill { ticker, side, quantity, price, order_time: time, fill_time: time }
    }
}

proptest! {
    #[test]
    fn pairing_never_yields_more_trades_than_fill_pairs(fills in prop::collection::vec(arb_fill(), 0..40)) {
        let trades = pair_fills(&fills);
        prop_assert!(trades.len() <= fills.len() / 2);
        for t in &trades {
            prop_assert!(t.quantity > 0);
            prop_assert!(t.entry_price > 0.0 && t.exit_price > 0.0);
        }
    }

    #[test]
    fn paired_trades_are_sorted_and_intraday_ordered(fills in prop::collection::vec(arb_fill(), 0..40)) {
        let trades = pair_fills(&fills);
        for pair in trades.windows(2) {
            prop_assert!((pair[0].date, pair[0].entry_time) <= (pair[1].date, pair[1].entry_time));
        }
    }

    #[test]
    fn scores_stay_within_dimension_bounds(
        closes in prop::collection::vec(50.0f64..150.0, 10..90),
        entry_min in 0u32..60,
        exit_min in 0u32..60,
        qty in 1i64..1000,
    ) {
        let day: Vec<tradereview::domain::bar::Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, c)| tradereview::domain::bar::Bar {
                time: chrono::NaiveTime::from_hms_opt(9 + (30 + i as u32) / 60, (30 + i as u32) % 60, 0).unwrap(),
                open: *c,
                high: c + 0.5,
                low: c - 0.5,
                close: *c,
                volume: 1000,
                ema10: None,
                ema20: None,
                vwap: None,
                rsi14: None,
            })
            .collect();

        let t = |m: u32| chrono::NaiveTime::from_hms_opt(9 + (30 + m) / 60, (30 + m) % 60, 0).unwrap();
        let trade = tradereview::domain::trade::Trade {
            ticker: "X".into(),
            date: date(2026, 1, 15),
            direction: Direction::Long,
            entry_time: t(entry_min),
            entry_price: closes[0],
            entry_order_time: t(entry_min),
            exit_time: t(exit_min),
            exit_price: closes[closes.len() - 1],
            quantity: qty,
        };

        let score = score_trade(&trade, &day, &[], None, &ScoringPolicy::default());
        prop_assert!(score.total() <= 100);
        let maxima = [10u8, 10, 10, 10, 10, 5, 10, 5, 5, 10, 5, 5, 5];
        for ((_, sub), max) in score.dimensions().iter().zip(maxima) {
            prop_assert!(sub.value <= max);
        }
    }

    #[test]
    fn grade_bands_are_monotonic(a in 0u8..=100, b in 0u8..=100) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(Grade::from_total(lo) <= Grade::from_total(hi));
    }
}
