//! Markdown report adapter.
//!
//! Renders two reports: the per-trade scoring review and the session-wide
//! trade-characteristics summary. Output path `"-"` writes to stdout.

use std::fmt::Write as _;
use std::fs;

use chrono::Weekday;

use crate::domain::error::TradereviewError;
use crate::domain::profile::{EntrySide, TradeProfile};
use crate::domain::score::{Confidence, Score, DIMENSION_MAXIMA};
use crate::domain::stats::SessionStats;
use crate::domain::trade::{Direction, Trade};
use crate::ports::report_port::ReportPort;

pub struct MarkdownReportAdapter;

impl MarkdownReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn emit(output_path: &str, content: &str) -> Result<(), TradereviewError> {
        if output_path == "-" {
            println!("{content}");
            Ok(())
        } else {
            fs::write(output_path, content)?;
            Ok(())
        }
    }
}

impl Default for MarkdownReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for MarkdownReportAdapter {
    fn write_review(
        &self,
        trades: &[Trade],
        scores: &[Score],
        stats: &SessionStats,
        output_path: &str,
    ) -> Result<(), TradereviewError> {
        Self::emit(output_path, &render_review(trades, scores, stats))
    }

    fn write_profile(
        &self,
        profiles: &[TradeProfile],
        output_path: &str,
    ) -> Result<(), TradereviewError> {
        Self::emit(output_path, &render_profile(profiles))
    }
}

fn dimension_name(code: &str) -> &'static str {
    match code {
        "S1" => "Trend alignment",
        "S2" => "Relative strength",
        "S3" => "Volatility compression",
        "E1" => "Volume trigger",
        "E2" => "Chase ratio",
        "E3" => "EMA20 bias",
        "X1" => "Profit capture",
        "X2" => "Post-exit continuation",
        "X3" => "Stagnation hold",
        "R1" => "Stop discipline",
        "R2" => "Position sizing",
        "T1" => "Fill lag",
        "T2" => "Loss spacing",
        _ => "Unknown",
    }
}

fn confidence_marker(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::Computed => "",
        Confidence::NeutralDefault => " *(neutral default)*",
        Confidence::Degraded => " *(estimated)*",
    }
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Long => "long",
        Direction::Short => "short",
    }
}

fn weekday_label(wd: Weekday) -> &'static str {
    match wd {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Unicode proportion bar for distribution tables.
fn pct_bar(count: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        (count as f64 / total as f64 * width as f64).round() as usize
    };
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn win_rate_cell(wins: usize, total: usize) -> String {
    if total == 0 {
        "N/A".to_string()
    } else {
        format!("{:.0}%", wins as f64 / total as f64 * 100.0)
    }
}

// ── scoring review ──────────────────────────────────────────────────────

pub fn render_review(trades: &[Trade], scores: &[Score], stats: &SessionStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Trade Review\n");

    if trades.is_empty() {
        let _ = writeln!(out, "No round-trip trades found.");
        return out;
    }

    render_session_summary(&mut out, trades, stats);
    for (i, (trade, score)) in trades.iter().zip(scores).enumerate() {
        render_trade_section(&mut out, i + 1, trade, score);
    }
    out
}

fn render_session_summary(out: &mut String, trades: &[Trade], stats: &SessionStats) {
    let first = trades.iter().map(|t| t.date).min();
    let last = trades.iter().map(|t| t.date).max();
    if let (Some(first), Some(last)) = (first, last) {
        let _ = writeln!(
            out,
            "> {} trades, {first} to {last}, {} scored\n",
            stats.trades, stats.scored
        );
    }

    let _ = writeln!(out, "## Session Summary\n");
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "| --- | --- |");
    let _ = writeln!(
        out,
        "| Win rate | {:.1}% ({} wins / {} losses) |",
        stats.win_rate * 100.0,
        stats.wins,
        stats.losses
    );
    let _ = writeln!(out, "| Total P&L | {:+.2} USD |", stats.total_pnl_usd);
    let _ = writeln!(out, "| Average win | {:+.2} USD |", stats.avg_win_usd);
    let _ = writeln!(out, "| Average loss | {:+.2} USD |", stats.avg_loss_usd);
    if stats.profit_factor.is_finite() {
        let _ = writeln!(out, "| Profit factor | {:.2} |", stats.profit_factor);
    } else {
        let _ = writeln!(out, "| Profit factor | ∞ (no losses) |");
    }
    let _ = writeln!(out, "| Expectancy | {:+.2} USD |", stats.expectancy_usd);
    let _ = writeln!(out, "| Average score | {:.1}/100 |", stats.avg_total);
    let _ = writeln!(
        out,
        "| Category averages | structure {:.1}/30, entry {:.1}/25, exit {:.1}/20, risk {:.1}/15, discipline {:.1}/10 |",
        stats.avg_structure, stats.avg_entry, stats.avg_exit, stats.avg_risk, stats.avg_sentiment
    );
    if let Some(best) = stats.best {
        let _ = writeln!(
            out,
            "| Best trade | #{} {} ({}) |",
            best + 1,
            trades[best].ticker,
            trades[best].date
        );
    }
    if let Some(worst) = stats.worst {
        let _ = writeln!(
            out,
            "| Worst trade | #{} {} ({}) |",
            worst + 1,
            trades[worst].ticker,
            trades[worst].date
        );
    }
    let _ = writeln!(out);
}

fn render_trade_section(out: &mut String, number: usize, trade: &Trade, score: &Score) {
    let _ = writeln!(
        out,
        "## #{number} {} {} {}\n",
        trade.ticker,
        direction_label(trade.direction),
        trade.date
    );
    let _ = writeln!(
        out,
        "{} → {} | {:.2} → {:.2} × {} | P&L {:+.2} USD ({:+.2}%)\n",
        trade.entry_time.format("%H:%M"),
        trade.exit_time.format("%H:%M"),
        trade.entry_price,
        trade.exit_price,
        trade.quantity,
        trade.pnl_usd(),
        trade.pnl_pct() * 100.0
    );

    if let Some(note) = &score.unscored_note {
        let _ = writeln!(out, "> Not scored: {note}\n");
        return;
    }

    let _ = writeln!(out, "**{}/100 — {}**\n", score.total(), score.grade());
    let _ = writeln!(
        out,
        "structure {}/30 · entry {}/25 · exit {}/20 · risk {}/15 · discipline {}/10\n",
        score.structure(),
        score.entry(),
        score.exit(),
        score.risk(),
        score.sentiment()
    );

    if let Some(note) = &score.cross_day_note {
        let _ = writeln!(out, "> {note}\n");
    }

    let _ = writeln!(out, "| Dimension | Score | Note |");
    let _ = writeln!(out, "| --- | --- | --- |");
    for ((code, sub), (_, max)) in score.dimensions().iter().zip(DIMENSION_MAXIMA) {
        let _ = writeln!(
            out,
            "| {code} {} | {}/{max} | {}{} |",
            dimension_name(code),
            sub.value,
            sub.note,
            confidence_marker(sub.confidence)
        );
    }
    let _ = writeln!(out);
}

// ── characteristics summary ─────────────────────────────────────────────

pub fn render_profile(profiles: &[TradeProfile]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Trade Characteristics\n");

    if profiles.is_empty() {
        let _ = writeln!(out, "No trades with matching bar data.");
        return out;
    }

    let tickers: std::collections::BTreeSet<&str> = profiles
        .iter()
        .map(|p| p.trade.ticker.as_str())
        .collect();
    let first = profiles.iter().map(|p| p.trade.date).min();
    let last = profiles.iter().map(|p| p.trade.date).max();
    if let (Some(first), Some(last)) = (first, last) {
        let _ = writeln!(
            out,
            "> {} trades | tickers: {} | {first} to {last}\n",
            profiles.len(),
            tickers.into_iter().collect::<Vec<_>>().join(", ")
        );
    }
    let _ = writeln!(out, "---\n");

    render_basic_stats(&mut out, profiles);
    render_timing(&mut out, profiles);
    render_price_action(&mut out, profiles);
    render_psychology(&mut out, profiles);
    out
}

fn render_basic_stats(out: &mut String, profiles: &[TradeProfile]) {
    let n = profiles.len();
    let wins: Vec<&TradeProfile> = profiles.iter().filter(|p| p.trade.is_win()).collect();
    let losses: Vec<&TradeProfile> = profiles.iter().filter(|p| !p.trade.is_win()).collect();

    let total_pnl: f64 = profiles.iter().map(|p| p.trade.pnl_usd()).sum();
    let avg_win = mean(&wins.iter().map(|p| p.trade.pnl_usd()).collect::<Vec<_>>());
    let avg_loss = mean(&losses.iter().map(|p| p.trade.pnl_usd()).collect::<Vec<_>>());
    let pf = if avg_loss == 0.0 {
        f64::INFINITY
    } else {
        (avg_win / avg_loss).abs()
    };
    let expectancy =
        wins.len() as f64 / n as f64 * avg_win + losses.len() as f64 / n as f64 * avg_loss;

    let _ = writeln!(out, "## 1. Basic Statistics\n");
    let _ = writeln!(out, "### Overall\n");
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "| --- | --- |");
    let _ = writeln!(out, "| Trades | {n} |");
    let _ = writeln!(
        out,
        "| Win rate | {:.1}% ({} wins / {} losses) |",
        wins.len() as f64 / n as f64 * 100.0,
        wins.len(),
        losses.len()
    );
    let _ = writeln!(out, "| Total P&L | {total_pnl:+.2} USD |");
    let _ = writeln!(out, "| Average win | {avg_win:+.2} USD |");
    let _ = writeln!(out, "| Average loss | {avg_loss:.2} USD |");
    if pf.is_finite() {
        let _ = writeln!(out, "| Win/loss ratio | {pf:.2} |");
    } else {
        let _ = writeln!(out, "| Win/loss ratio | ∞ (no losses) |");
    }
    let _ = writeln!(out, "| Expectancy per trade | {expectancy:+.2} USD |\n");

    let hold = |grp: &[&TradeProfile]| -> Vec<f64> {
        grp.iter()
            .filter(|p| !p.cross_day)
            .map(|p| p.hold_minutes)
            .collect()
    };
    let all_ref: Vec<&TradeProfile> = profiles.iter().collect();
    let _ = writeln!(out, "### Holding time (intraday trades)\n");
    let _ = writeln!(out, "| Group | Mean | Median | Min | Max |");
    let _ = writeln!(out, "| --- | --- | --- | --- | --- |");
    for (label, grp) in [("All", &all_ref), ("Winners", &wins), ("Losers", &losses)] {
        let mins = hold(grp);
        if mins.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "| {label} | {:.1} min | {:.1} min | {:.0} min | {:.0} min |",
            mean(&mins),
            median(&mins),
            mins.iter().cloned().fold(f64::MAX, f64::min),
            mins.iter().cloned().fold(f64::MIN, f64::max)
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "### Activity by weekday\n");
    let _ = writeln!(out, "| Day | Trades | Wins | Losses | Win rate | P&L |");
    let _ = writeln!(out, "| --- | --- | --- | --- | --- | --- |");
    for wd in [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ] {
        let grp: Vec<&TradeProfile> = profiles.iter().filter(|p| p.entry_weekday == wd).collect();
        if grp.is_empty() {
            continue;
        }
        let w = grp.iter().filter(|p| p.trade.is_win()).count();
        let pnl: f64 = grp.iter().map(|p| p.trade.pnl_usd()).sum();
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {pnl:+.2} |",
            weekday_label(wd),
            grp.len(),
            w,
            grp.len() - w,
            win_rate_cell(w, grp.len())
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "### Activity by hour (ET)\n");
    let _ = writeln!(out, "| Hour | Trades | Share | Win rate | P&L |");
    let _ = writeln!(out, "| --- | --- | --- | --- | --- |");
    let hours: std::collections::BTreeSet<u32> = profiles.iter().map(|p| p.entry_hour).collect();
    for h in hours {
        let grp: Vec<&TradeProfile> = profiles.iter().filter(|p| p.entry_hour == h).collect();
        let w = grp.iter().filter(|p| p.trade.is_win()).count();
        let pnl: f64 = grp.iter().map(|p| p.trade.pnl_usd()).sum();
        let _ = writeln!(
            out,
            "| {h:02}:xx | {} | `{}` | {} | {pnl:+.2} |",
            grp.len(),
            pct_bar(grp.len(), n, 15),
            win_rate_cell(w, grp.len())
        );
    }
    let _ = writeln!(out);
}

fn render_timing(out: &mut String, profiles: &[TradeProfile]) {
    let n = profiles.len();
    let wins: Vec<&TradeProfile> = profiles.iter().filter(|p| p.trade.is_win()).collect();
    let losses: Vec<&TradeProfile> = profiles.iter().filter(|p| !p.trade.is_win()).collect();

    let _ = writeln!(out, "## 2. Timing Quality\n");

    let _ = writeln!(out, "### Entry side\n");
    let _ = writeln!(out, "| Metric | Left-side | Right-side |");
    let _ = writeln!(out, "| --- | --- | --- |");
    let left: Vec<&TradeProfile> = profiles
        .iter()
        .filter(|p| p.entry_side == EntrySide::Left)
        .collect();
    let right: Vec<&TradeProfile> = profiles
        .iter()
        .filter(|p| p.entry_side == EntrySide::Right)
        .collect();
    let _ = writeln!(out, "| Trades | {} | {} |", left.len(), right.len());
    let _ = writeln!(
        out,
        "| Win rate | {} | {} |",
        win_rate_cell(left.iter().filter(|p| p.trade.is_win()).count(), left.len()),
        win_rate_cell(
            right.iter().filter(|p| p.trade.is_win()).count(),
            right.len()
        )
    );
    let _ = writeln!(
        out,
        "| Average P&L | {:+.2} | {:+.2} |\n",
        mean(&left.iter().map(|p| p.trade.pnl_usd()).collect::<Vec<_>>()),
        mean(&right.iter().map(|p| p.trade.pnl_usd()).collect::<Vec<_>>())
    );

    let _ = writeln!(out, "### Entry position in the day's range\n");
    let _ = writeln!(out, "| Range band | Trades | Win rate | Average P&L |");
    let _ = writeln!(out, "| --- | --- | --- | --- |");
    let bands: [(&str, Box<dyn Fn(f64) -> bool>); 3] = [
        ("Low (0-33%)", Box::new(|p| p < 0.33)),
        ("Middle (33-67%)", Box::new(|p| (0.33..0.67).contains(&p))),
        ("High (67-100%)", Box::new(|p| p >= 0.67)),
    ];
    for (label, pred) in &bands {
        let grp: Vec<&TradeProfile> = profiles
            .iter()
            .filter(|p| pred(p.day_position_pct))
            .collect();
        if grp.is_empty() {
            continue;
        }
        let w = grp.iter().filter(|p| p.trade.is_win()).count();
        let _ = writeln!(
            out,
            "| {label} | {} | {} | {:+.2} |",
            grp.len(),
            win_rate_cell(w, grp.len()),
            mean(&grp.iter().map(|p| p.trade.pnl_usd()).collect::<Vec<_>>())
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "### Excursion efficiency (MFE / MAE)\n");
    let _ = writeln!(out, "| Metric | All | Winners | Losers |");
    let _ = writeln!(out, "| --- | --- | --- | --- |");
    let all_ref: Vec<&TradeProfile> = profiles.iter().collect();
    let rows: [(&str, fn(&TradeProfile) -> f64); 3] = [
        ("Average MFE", |p| p.mfe_pct),
        ("Average MAE", |p| p.mae_pct),
        ("Average capture", |p| p.capture_pct),
    ];
    for (label, field) in rows {
        let _ = writeln!(
            out,
            "| {label} | {:.1}% | {:.1}% | {:.1}% |",
            mean(&all_ref.iter().map(|p| field(p)).collect::<Vec<_>>()),
            mean(&wins.iter().map(|p| field(p)).collect::<Vec<_>>()),
            mean(&losses.iter().map(|p| field(p)).collect::<Vec<_>>())
        );
    }
    let _ = writeln!(out);

    // Counter-signal checks: exits that kept running, entries that topped
    // out immediately.
    let mut flew: Vec<&TradeProfile> = profiles
        .iter()
        .filter(|p| p.post_exit_pct > 1.0 && p.trade.is_win())
        .collect();
    flew.sort_by(|a, b| b.post_exit_pct.total_cmp(&a.post_exit_pct));
    let mut topped: Vec<&TradeProfile> = profiles
        .iter()
        .filter(|p| p.mae_pct > 1.0 && p.trade.pnl_pct() < 0.005)
        .collect();
    topped.sort_by(|a, b| b.mae_pct.total_cmp(&a.mae_pct));

    let _ = writeln!(out, "### Counter-signal checks\n");
    let _ = writeln!(
        out,
        "**Sold too early** (price ran >1% further after a winning exit): {} of {n} ({:.0}%)\n",
        flew.len(),
        flew.len() as f64 / n as f64 * 100.0
    );
    if !flew.is_empty() {
        let _ = writeln!(out, "| Ticker | Direction | Entry | Exit | P&L | Left behind |");
        let _ = writeln!(out, "| --- | --- | --- | --- | --- | --- |");
        for p in &flew {
            let t = &p.trade;
            let _ = writeln!(
                out,
                "| {} | {} | {} {} | {} @ {:.2} | {:+.2} USD | +{:.2}% |",
                t.ticker,
                direction_label(t.direction),
                t.date,
                t.entry_time.format("%H:%M"),
                t.exit_time.format("%H:%M"),
                t.exit_price,
                t.pnl_usd(),
                p.post_exit_pct
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "**Topped at entry** (MAE >1% with final P&L <0.5%): {} of {n} ({:.0}%)\n",
        topped.len(),
        topped.len() as f64 / n as f64 * 100.0
    );
    if !topped.is_empty() {
        let _ = writeln!(out, "| Ticker | Direction | Entry | Exit | MAE | P&L |");
        let _ = writeln!(out, "| --- | --- | --- | --- | --- | --- |");
        for p in &topped {
            let t = &p.trade;
            let _ = writeln!(
                out,
                "| {} | {} | {} {} | {} @ {:.2} | -{:.2}% | {:+.2} USD |",
                t.ticker,
                direction_label(t.direction),
                t.date,
                t.entry_time.format("%H:%M"),
                t.exit_time.format("%H:%M"),
                t.exit_price,
                p.mae_pct,
                t.pnl_usd()
            );
        }
        let _ = writeln!(out);
    }
}

fn render_price_action(out: &mut String, profiles: &[TradeProfile]) {
    let n = profiles.len();
    let _ = writeln!(out, "## 3. Price Action Consistency\n");

    let _ = writeln!(out, "### Trend posture at entry\n");
    let _ = writeln!(out, "| Condition | Trades | Win rate | Average P&L |");
    let _ = writeln!(out, "| --- | --- | --- | --- |");
    let postures: [(&str, Box<dyn Fn(&TradeProfile) -> bool>); 4] = [
        ("Entry above VWAP", Box::new(|p: &TradeProfile| p.above_vwap)),
        ("Entry below VWAP", Box::new(|p: &TradeProfile| !p.above_vwap)),
        ("Entry above EMA20", Box::new(|p: &TradeProfile| p.above_ema20)),
        ("Entry below EMA20", Box::new(|p: &TradeProfile| !p.above_ema20)),
    ];
    for (label, pred) in &postures {
        let grp: Vec<&TradeProfile> = profiles.iter().filter(|p| pred(*p)).collect();
        let w = grp.iter().filter(|p| p.trade.is_win()).count();
        let pnl = if grp.is_empty() {
            "N/A".to_string()
        } else {
            format!(
                "{:+.2}",
                mean(&grp.iter().map(|p| p.trade.pnl_usd()).collect::<Vec<_>>())
            )
        };
        let _ = writeln!(
            out,
            "| {label} | {} | {} | {pnl} |",
            grp.len(),
            win_rate_cell(w, grp.len())
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "### Entry-minute relative volume\n");
    let _ = writeln!(out, "| Volume band | Trades | Win rate | Average P&L | Average MFE |");
    let _ = writeln!(out, "| --- | --- | --- | --- | --- |");
    let bands: [(&str, Box<dyn Fn(f64) -> bool>); 3] = [
        ("High (≥1.5x)", Box::new(|v| v >= 1.5)),
        ("Medium (1-1.5x)", Box::new(|v| (1.0..1.5).contains(&v))),
        ("Below average (<1x)", Box::new(|v| v < 1.0)),
    ];
    let mut high_count = 0;
    for (label, pred) in &bands {
        let grp: Vec<&TradeProfile> = profiles.iter().filter(|p| pred(p.rel_volume)).collect();
        if *label == "High (≥1.5x)" {
            high_count = grp.len();
        }
        let w = grp.iter().filter(|p| p.trade.is_win()).count();
        let pnl = if grp.is_empty() {
            "N/A".to_string()
        } else {
            format!(
                "{:+.2}",
                mean(&grp.iter().map(|p| p.trade.pnl_usd()).collect::<Vec<_>>())
            )
        };
        let _ = writeln!(
            out,
            "| {label} | {} | {} | {pnl} | {:.2}% |",
            grp.len(),
            win_rate_cell(w, grp.len()),
            mean(&grp.iter().map(|p| p.mfe_pct).collect::<Vec<_>>())
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "**Volume confirmation rate** (entry minute ≥1.5x average): {high_count}/{n} ({:.0}%)\n",
        high_count as f64 / n as f64 * 100.0
    );
}

fn render_psychology(out: &mut String, profiles: &[TradeProfile]) {
    let wins: Vec<&TradeProfile> = profiles.iter().filter(|p| p.trade.is_win()).collect();
    let losses: Vec<&TradeProfile> = profiles.iter().filter(|p| !p.trade.is_win()).collect();
    let hold = |grp: &[&TradeProfile]| -> Vec<f64> {
        grp.iter()
            .filter(|p| !p.cross_day)
            .map(|p| p.hold_minutes)
            .collect()
    };
    let hold_win = hold(&wins);
    let hold_loss = hold(&losses);
    let mw = mean(&hold_win);
    let ml = mean(&hold_loss);

    let _ = writeln!(out, "## 4. Risk and Psychology\n");

    let _ = writeln!(out, "### Loss-cutting discipline\n");
    let _ = writeln!(out, "| Metric | Winners | Losers | Verdict |");
    let _ = writeln!(out, "| --- | --- | --- | --- |");
    let verdict = if ml > mw * 1.5 {
        "losers held noticeably longer ⚠️"
    } else {
        "within normal range ✅"
    };
    let _ = writeln!(
        out,
        "| Average hold | {mw:.1} min | {ml:.1} min | {verdict} |"
    );
    let _ = writeln!(
        out,
        "| Longest hold | {:.0} min | {:.0} min | — |",
        hold_win.iter().cloned().fold(0.0, f64::max),
        hold_loss.iter().cloned().fold(0.0, f64::max)
    );
    if ml > mw * 1.5 && mw > 0.0 {
        let _ = writeln!(
            out,
            "\n> ⚠️ Losing trades are held {:.1}x longer than winners on average, a sign of reluctance to take the loss.",
            ml / mw
        );
    }
    let _ = writeln!(out);

    // Quick re-entries after a loss, across the whole sorted sequence.
    let mut sorted: Vec<&TradeProfile> = profiles.iter().collect();
    sorted.sort_by_key(|p| (p.trade.date, p.trade.entry_time));
    let mut revenge: Vec<(&TradeProfile, &TradeProfile, f64)> = Vec::new();
    for pair in sorted.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if prev.trade.is_win() {
            continue;
        }
        let prev_exit = prev.trade.date.and_time(prev.trade.exit_time);
        let curr_entry = curr.trade.date.and_time(curr.trade.entry_time);
        let gap = (curr_entry - prev_exit).num_seconds() as f64 / 60.0;
        if gap > 0.0 && gap < 15.0 {
            revenge.push((prev, curr, gap));
        }
    }

    let _ = writeln!(out, "### Revenge-trade check\n");
    if revenge.is_empty() {
        let _ = writeln!(
            out,
            "✅ No quick re-entries detected: every entry after a loss waited at least 15 minutes.\n"
        );
    } else {
        let _ = writeln!(
            out,
            "Detected **{}** potential revenge trades (re-entry <15 minutes after a loss):\n",
            revenge.len()
        );
        let _ = writeln!(out, "| # | Losing trade | P&L | Gap | Next entry | Outcome |");
        let _ = writeln!(out, "| --- | --- | --- | --- | --- | --- |");
        for (i, (prev, curr, gap)) in revenge.iter().enumerate() {
            let _ = writeln!(
                out,
                "| {} | {} {}→{} | {:+.2} | {gap:.0} min | {} {} | {:+.2} |",
                i + 1,
                prev.trade.ticker,
                prev.trade.entry_time.format("%H:%M"),
                prev.trade.exit_time.format("%H:%M"),
                prev.trade.pnl_usd(),
                curr.trade.ticker,
                curr.trade.entry_time.format("%H:%M"),
                curr.trade.pnl_usd()
            );
        }
        let _ = writeln!(out);
    }

    let positions: Vec<f64> = profiles.iter().map(|p| p.trade.notional()).collect();
    let _ = writeln!(out, "### Position sizing consistency\n");
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "| --- | --- |");
    let _ = writeln!(out, "| Average position | {:.0} USD |", mean(&positions));
    let _ = writeln!(
        out,
        "| Largest position | {:.0} USD |",
        positions.iter().cloned().fold(0.0, f64::max)
    );
    let _ = writeln!(
        out,
        "| Smallest position | {:.0} USD |",
        positions.iter().cloned().fold(f64::MAX, f64::min)
    );
    let _ = writeln!(out, "| Position stdev | {:.0} USD |\n", stdev(&positions));

    let followers: Vec<&TradeProfile> = sorted
        .windows(2)
        .filter(|pair| !pair[0].trade.is_win())
        .map(|pair| pair[1])
        .collect();
    let _ = writeln!(out, "### Next trade after a loss\n");
    if followers.is_empty() {
        let _ = writeln!(out, "No trades followed a loss in this session.\n");
    } else {
        let w = followers.iter().filter(|p| p.trade.is_win()).count();
        let rate = w as f64 / followers.len() as f64;
        let _ = writeln!(
            out,
            "{} trades followed a loss: win rate **{:.0}%**, average P&L **{:+.2} USD**\n",
            followers.len(),
            rate * 100.0,
            mean(&followers.iter().map(|p| p.trade.pnl_usd()).collect::<Vec<_>>())
        );
        if rate < 0.5 {
            let _ = writeln!(
                out,
                "> ⚠️ Win rate drops after losses; emotion may be affecting the next decision.\n"
            );
        } else {
            let _ = writeln!(out, "> ✅ Decision quality holds up after losses.\n");
        }
    }
}
