//! Report generation port trait.

use crate::domain::error::TradereviewError;
use crate::domain::profile::TradeProfile;
use crate::domain::score::Score;
use crate::domain::stats::SessionStats;
use crate::domain::trade::Trade;

pub trait ReportPort {
    /// Render the per-trade scoring review. `trades` and `scores` are
    /// parallel slices from the same run.
    fn write_review(
        &self,
        trades: &[Trade],
        scores: &[Score],
        stats: &SessionStats,
        output_path: &str,
    ) -> Result<(), TradereviewError>;

    /// Render the trade-characteristics summary.
    fn write_profile(
        &self,
        profiles: &[TradeProfile],
        output_path: &str,
    ) -> Result<(), TradereviewError>;
}
