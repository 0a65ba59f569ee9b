//! Session-level aggregates over a batch of scored trades.

use crate::domain::score::Score;
use crate::domain::trade::Trade;

/// Summary statistics for one analysis run. Score averages only cover
/// trades that actually received a score; P&L figures cover everything.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_pnl_usd: f64,
    pub avg_win_usd: f64,
    pub avg_loss_usd: f64,
    /// Ratio of average win to average loss magnitude; infinite when there
    /// are no losses.
    pub profit_factor: f64,
    pub expectancy_usd: f64,
    pub scored: usize,
    pub avg_total: f64,
    pub avg_structure: f64,
    pub avg_entry: f64,
    pub avg_exit: f64,
    pub avg_risk: f64,
    pub avg_sentiment: f64,
    /// Indices into the input slice of the highest- and lowest-scoring
    /// trades, among those that were scored.
    pub best: Option<usize>,
    pub worst: Option<usize>,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

impl SessionStats {
    /// `trades` and `scores` must be parallel slices from the same run.
    pub fn compute(trades: &[Trade], scores: &[Score]) -> Self {
        debug_assert_eq!(trades.len(), scores.len());

        let wins = trades.iter().filter(|t| t.is_win()).count();
        let losses = trades.len() - wins;
        let total_pnl_usd: f64 = trades.iter().map(|t| t.pnl_usd()).sum();
        let avg_win_usd = mean(trades.iter().filter(|t| t.is_win()).map(|t| t.pnl_usd()));
        let avg_loss_usd = mean(trades.iter().filter(|t| !t.is_win()).map(|t| t.pnl_usd()));
        let profit_factor = if avg_loss_usd == 0.0 {
            f64::INFINITY
        } else {
            (avg_win_usd / avg_loss_usd).abs()
        };
        let expectancy_usd = if trades.is_empty() {
            0.0
        } else {
            let n = trades.len() as f64;
            wins as f64 / n * avg_win_usd + losses as f64 / n * avg_loss_usd
        };

        let scored_idx: Vec<usize> = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| s.unscored_note.is_none())
            .map(|(i, _)| i)
            .collect();
        let avg_of = |f: &dyn Fn(&Score) -> u8| {
            mean(scored_idx.iter().map(|&i| f(&scores[i]) as f64))
        };

        let best = scored_idx.iter().copied().max_by_key(|&i| scores[i].total());
        let worst = scored_idx.iter().copied().min_by_key(|&i| scores[i].total());

        Self {
            trades: trades.len(),
            wins,
            losses,
            win_rate: if trades.is_empty() {
                0.0
            } else {
                wins as f64 / trades.len() as f64
            },
            total_pnl_usd,
            avg_win_usd,
            avg_loss_usd,
            profit_factor,
            expectancy_usd,
            scored: scored_idx.len(),
            avg_total: avg_of(&Score::total),
            avg_structure: avg_of(&Score::structure),
            avg_entry: avg_of(&Score::entry),
            avg_exit: avg_of(&Score::exit),
            avg_risk: avg_of(&Score::risk),
            avg_sentiment: avg_of(&Score::sentiment),
            best,
            worst,
        }
    }
}
