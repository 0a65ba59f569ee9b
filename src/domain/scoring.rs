//! Scoring engine: evaluates one closed trade against minute-bar context.
//!
//! `score_trade` is a pure function of (trade, day bars, benchmark bars,
//! previous losing trade, policy). Missing or degenerate market data never
//! raises; each affected dimension degrades to a documented neutral value
//! with a note, so partial data cannot block scoring the rest of the trade.

use chrono::NaiveTime;

use crate::domain::bar::{bar_at, Bar};
use crate::domain::policy::ScoringPolicy;
use crate::domain::score::{Confidence, Score, Subscore};
use crate::domain::trade::Trade;

/// Minutes from `t1` to `t2`, negative when `t2` precedes `t1`.
fn minutes_between(t1: NaiveTime, t2: NaiveTime) -> f64 {
    (t2 - t1).num_seconds() as f64 / 60.0
}

/// Sequential pre-pass attaching the most recent prior losing trade to each
/// trade, so scoring itself stays pure and order-free.
///
/// Input must already be sorted by (entry date, entry time) — the pairing
/// engine's output order.
pub fn previous_losses(trades: &[Trade]) -> Vec<Option<Trade>> {
    let mut out = Vec::with_capacity(trades.len());
    let mut last_loss: Option<Trade> = None;
    for trade in trades {
        out.push(last_loss.clone());
        if trade.pnl_pct() < 0.0 {
            last_loss = Some(trade.clone());
        }
    }
    out
}

/// Score one trade. `day` holds the entry day's bars for the trade's
/// ticker, `benchmark_day` the same day's bars for the benchmark ticker
/// (empty slice when unavailable).
pub fn score_trade(
    trade: &Trade,
    day: &[Bar],
    benchmark_day: &[Bar],
    prev_loss: Option<&Trade>,
    policy: &ScoringPolicy,
) -> Score {
    if day.is_empty() {
        return Score::unscored(format!(
            "no intraday bars for {} on {} (possibly a pre/after-market trade)",
            trade.ticker, trade.date
        ));
    }

    let ei = bar_at(day, trade.entry_time);
    let xi_raw = bar_at(day, trade.exit_time);
    // Exit timestamp before the entry bar means the position was closed
    // outside this day's session (e.g. next-day pre-market): hold the
    // excursion window to the last bar and flag the trade.
    let cross_day = xi_raw < ei;
    let xi = if cross_day { day.len() - 1 } else { xi_raw };
    let eb = &day[ei];
    let sign = trade.sign();

    let trade_bars = &day[ei..=xi];
    let (best, worst) = excursion(trade_bars, sign, trade.entry_price, trade.exit_price);
    let potential = (best - trade.entry_price).abs();
    let actual = sign * (trade.exit_price - trade.entry_price);
    let mae = (worst - trade.entry_price).abs() / trade.entry_price;

    let mut score = Score {
        s1: score_trend_alignment(eb, sign),
        s2: score_relative_strength(trade, day, benchmark_day, ei, sign, policy),
        s3: score_volatility_compression(day, ei, policy),
        e1: score_volume_trigger(day, ei, eb, policy),
        e2: score_chase_ratio(trade, eb, sign, policy),
        e3: score_ema_bias(trade, eb, policy),
        x1: score_profit_capture(actual, potential, policy),
        x2: score_post_exit(trade, day, xi, sign, policy),
        x3: score_stagnation(trade, trade_bars, xi - ei, policy),
        r1: score_stop_discipline(mae, policy),
        r2: score_position_sizing(trade, policy),
        t1: score_fill_lag(trade, policy),
        t2: score_revenge_gap(trade, prev_loss, policy),
        cross_day_note: None,
        unscored_note: None,
    };

    if cross_day {
        score.cross_day_note = Some(format!(
            "position held across days (exited {} pre-market); exit dimensions estimated from the entry day's final bar",
            trade.exit_time.format("%H:%M")
        ));
        for sub in [
            &mut score.x1,
            &mut score.x2,
            &mut score.x3,
            &mut score.r1,
        ] {
            if sub.confidence == Confidence::Computed {
                sub.confidence = Confidence::Degraded;
            }
        }
    }

    score
}

/// Best (directionally favorable) and worst extremes over the holding
/// window. An empty window falls back to the exit/entry prices themselves.
fn excursion(trade_bars: &[Bar], sign: f64, entry: f64, exit: f64) -> (f64, f64) {
    if trade_bars.is_empty() {
        return (exit, entry);
    }
    let max_hi = trade_bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let min_lo = trade_bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    if sign > 0.0 {
        (max_hi, min_lo)
    } else {
        (min_lo, max_hi)
    }
}

/// S1: price and both EMAs aligned with the trade direction.
fn score_trend_alignment(eb: &Bar, sign: f64) -> Subscore {
    let (Some(ema10), Some(ema20)) = (eb.ema10, eb.ema20) else {
        return Subscore::neutral(5, "EMA data unavailable, neutral score assigned");
    };

    let conditions = if sign > 0.0 {
        [eb.close > ema10, ema10 > ema20]
    } else {
        [eb.close < ema10, ema10 < ema20]
    };
    let met = conditions.iter().filter(|c| **c).count();
    let value = [0, 5, 10][met];

    let labels = ["price vs EMA10", "EMA10 vs EMA20"];
    let unmet: Vec<&str> = labels
        .iter()
        .zip(conditions)
        .filter(|(_, c)| !c)
        .map(|(l, _)| *l)
        .collect();
    let note = if unmet.is_empty() {
        format!("EMA alignment {met}/2, fully aligned")
    } else {
        format!("EMA alignment {met}/2, unmet: {}", unmet.join(", "))
    };
    Subscore::computed(value, note)
}

/// S2: excess return vs the benchmark over the bars preceding entry.
fn score_relative_strength(
    trade: &Trade,
    day: &[Bar],
    benchmark_day: &[Bar],
    ei: usize,
    sign: f64,
    policy: &ScoringPolicy,
) -> Subscore {
    if benchmark_day.is_empty() {
        return Subscore::neutral(5, "no benchmark data, neutral score assigned");
    }

    let stock_pre = &day[ei.saturating_sub(policy.rs_lookback)..=ei];
    let qi = bar_at(benchmark_day, trade.entry_time);
    let bench_pre = &benchmark_day[qi.saturating_sub(policy.rs_lookback)..=qi];
    if stock_pre[0].open <= 0.0 || bench_pre[0].open <= 0.0 {
        return Subscore::neutral(5, "benchmark window degenerate, neutral score assigned");
    }

    let stock_ret =
        (stock_pre[stock_pre.len() - 1].close - stock_pre[0].open) / stock_pre[0].open;
    let bench_ret =
        (bench_pre[bench_pre.len() - 1].close - bench_pre[0].open) / bench_pre[0].open;
    let excess = sign * (stock_ret - bench_ret);

    let value = if excess > policy.rs_outperform {
        10
    } else if excess > 0.0 {
        5
    } else {
        0
    };
    Subscore::computed(
        value,
        format!(
            "pre-entry {}-bar excess return = {:+.2}% vs benchmark",
            policy.rs_lookback,
            excess * 100.0
        ),
    )
}

/// S3: pre-entry range compression (volatility convergence).
fn score_volatility_compression(day: &[Bar], ei: usize, policy: &ScoringPolicy) -> Subscore {
    let pre = &day[ei.saturating_sub(policy.conv_lookback)..ei];
    if pre.is_empty() {
        return Subscore::neutral(5, "insufficient pre-entry history, neutral score assigned");
    }

    let range = pre.iter().map(|b| b.high).fold(f64::MIN, f64::max)
        - pre.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let avg_close = pre.iter().map(|b| b.close).sum::<f64>() / pre.len() as f64;
    let ratio = if avg_close > 0.0 { range / avg_close } else { 1.0 };

    let value = if ratio < policy.vol_conv_good {
        10
    } else if ratio < policy.vol_conv_warn {
        5
    } else {
        0
    };
    let shape = if ratio < policy.vol_conv_good {
        "compressed"
    } else {
        "wide"
    };
    Subscore::computed(
        value,
        format!("pre-entry range = {:.2}% of price ({shape})", ratio * 100.0),
    )
}

/// E1: entry-bar volume vs the trailing average.
fn score_volume_trigger(day: &[Bar], ei: usize, eb: &Bar, policy: &ScoringPolicy) -> Subscore {
    let window = &day[ei.saturating_sub(policy.vol_lookback)..ei];
    if window.is_empty() {
        return Subscore::neutral(5, "insufficient volume history, neutral score assigned");
    }

    let avg_vol = window.iter().map(|b| b.volume as f64).sum::<f64>() / window.len() as f64;
    if avg_vol <= 0.0 {
        return Subscore::degraded(0, "zero trailing average volume");
    }
    let rel_vol = eb.volume as f64 / avg_vol;

    let value = if rel_vol >= policy.rel_vol_high {
        10
    } else if rel_vol >= policy.rel_vol_low {
        5
    } else {
        0
    };
    Subscore::computed(
        value,
        format!(
            "relative volume = {rel_vol:.2}x (threshold {:.1}x)",
            policy.rel_vol_high
        ),
    )
}

/// E2: entry price position within the entry bar's range, direction
/// adjusted. A long wants to buy low in the bar; a short wants to sell
/// high. Averaged fill prices occasionally land outside the bar, so the
/// raw ratio is clamped to [0, 1].
fn score_chase_ratio(trade: &Trade, eb: &Bar, sign: f64, policy: &ScoringPolicy) -> Subscore {
    let bar_range = eb.high - eb.low;
    if bar_range <= 1e-6 {
        return Subscore::neutral(5, "zero-range entry bar, neutral score assigned");
    }

    let raw = ((trade.entry_price - eb.low) / bar_range).clamp(0.0, 1.0);
    let chase = if sign > 0.0 { raw } else { 1.0 - raw };

    let value = if chase < policy.chase_max {
        10
    } else if chase < policy.chase_warn {
        5
    } else {
        0
    };
    Subscore::computed(
        value,
        format!("chase ratio = {chase:.2} (ceiling {:.2})", policy.chase_max),
    )
}

/// E3: absolute deviation of the entry price from EMA20.
fn score_ema_bias(trade: &Trade, eb: &Bar, policy: &ScoringPolicy) -> Subscore {
    let Some(ema20) = eb.ema20.filter(|v| *v > 0.0) else {
        return Subscore::neutral(2, "EMA20 unavailable, neutral score assigned");
    };

    let bias = (trade.entry_price - ema20).abs() / ema20;
    let value = if bias < policy.bias_good {
        5
    } else if bias < policy.bias_warn {
        2
    } else {
        0
    };
    Subscore::computed(
        value,
        format!(
            "EMA20 bias = {:.2}% (threshold {:.0}%)",
            bias * 100.0,
            policy.bias_good * 100.0
        ),
    )
}

/// X1: realized P&L as a fraction of the best favorable excursion.
fn score_profit_capture(actual: f64, potential: f64, policy: &ScoringPolicy) -> Subscore {
    if potential <= 1e-6 {
        // No room to capture anything: binary pass/fail on P&L sign.
        let value = if actual >= 0.0 { 5 } else { 0 };
        return Subscore::degraded(value, "no favorable excursion to capture");
    }

    let capture = actual / potential;
    let value = if capture >= policy.capture_good {
        10
    } else if capture >= policy.capture_warn {
        5
    } else {
        0
    };
    Subscore::computed(
        value,
        format!(
            "captured {:.1}% of the move (realized {actual:.2}, best excursion {potential:.2})",
            capture * 100.0
        ),
    )
}

/// X2: adverse continuation in the bars after exit, as a fraction of entry
/// price — did the move keep going without us?
fn score_post_exit(
    trade: &Trade,
    day: &[Bar],
    xi: usize,
    sign: f64,
    policy: &ScoringPolicy,
) -> Subscore {
    let start = (xi + 1).min(day.len());
    let end = (xi + 1 + policy.post_exit_bars).min(day.len());
    let post = &day[start..end];
    if post.is_empty() {
        return Subscore::computed(5, "exited at the day's final bar, nothing left on the table");
    }

    let missed = if sign > 0.0 {
        let post_high = post.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        (post_high - trade.exit_price).max(0.0)
    } else {
        let post_low = post.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        (trade.exit_price - post_low).max(0.0)
    };
    let missed_pct = missed / trade.entry_price;

    let value = if missed_pct < policy.post_miss_good {
        5
    } else if missed_pct < policy.post_miss_warn {
        2
    } else {
        0
    };
    Subscore::computed(
        value,
        format!("post-exit continuation = {:.2}%", missed_pct * 100.0),
    )
}

/// X3: holding through a flat stretch — bars stuck near entry price
/// combined with total holding length.
fn score_stagnation(
    trade: &Trade,
    trade_bars: &[Bar],
    hold_bars: usize,
    policy: &ScoringPolicy,
) -> Subscore {
    let stagnant = trade_bars
        .iter()
        .take(policy.stagnation_bars)
        .filter(|b| ((b.close - trade.entry_price) / trade.entry_price).abs() < policy.stagnation_pct)
        .count();

    if stagnant >= policy.stagnation_bars && hold_bars > policy.stagnation_bars * 2 {
        Subscore::computed(
            0,
            format!("{stagnant} stagnant bars yet held for {hold_bars} bars, passive holding"),
        )
    } else {
        Subscore::computed(
            5,
            format!("held {hold_bars} bars, no prolonged flat stretch"),
        )
    }
}

/// R1: maximum adverse excursion vs the configured stop-loss line.
fn score_stop_discipline(mae: f64, policy: &ScoringPolicy) -> Subscore {
    let value = if mae <= policy.stop_loss_pct {
        10
    } else if mae <= policy.stop_loss_pct * 1.5 {
        5
    } else {
        0
    };
    Subscore::computed(
        value,
        format!(
            "max adverse excursion = {:.2}% (stop line {:.0}%)",
            mae * 100.0,
            policy.stop_loss_pct * 100.0
        ),
    )
}

/// R2: notional position vs the target fraction of the account.
fn score_position_sizing(trade: &Trade, policy: &ScoringPolicy) -> Subscore {
    let pos_pct = trade.notional() / policy.account_total;
    let diff = (pos_pct - policy.position_pct_target).abs();

    let value = if diff < policy.position_pct_tight {
        5
    } else if diff < policy.position_pct_wide {
        2
    } else {
        0
    };
    Subscore::computed(
        value,
        format!(
            "position = {:.1}% of account vs target {:.0}%",
            pos_pct * 100.0,
            policy.position_pct_target * 100.0
        ),
    )
}

/// T1: minutes between order submission and fill.
fn score_fill_lag(trade: &Trade, policy: &ScoringPolicy) -> Subscore {
    let lag = minutes_between(trade.entry_order_time, trade.entry_time).abs();
    let value = if lag <= policy.lag_good_min {
        5
    } else if lag <= policy.lag_warn_min {
        2
    } else {
        0
    };
    Subscore::computed(value, format!("order-to-fill lag = {lag:.1} minutes"))
}

/// T2: minutes since the most recent losing exit, same calendar day only.
fn score_revenge_gap(
    trade: &Trade,
    prev_loss: Option<&Trade>,
    policy: &ScoringPolicy,
) -> Subscore {
    let Some(prev) = prev_loss else {
        return Subscore::computed(5, "no prior losing trade");
    };
    if prev.date != trade.date {
        return Subscore::computed(5, "prior loss was on a different day, no revenge risk");
    }

    let gap = minutes_between(prev.exit_time, trade.entry_time);
    if gap < policy.revenge_min {
        Subscore::computed(
            0,
            format!(
                "re-entered {gap:.0} minutes after a losing exit (< {:.0} min), possible revenge trade",
                policy.revenge_min
            ),
        )
    } else {
        Subscore::computed(
            5,
            format!("{gap:.0} minutes since the losing exit, cooled off"),
        )
    }
}
