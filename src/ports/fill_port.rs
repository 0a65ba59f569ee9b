//! Fill source port trait: normalized access to the broker transaction log.

use crate::domain::error::TradereviewError;
use crate::domain::fill::Fill;

pub trait FillPort {
    /// Load all usable fills, already filtered to fully-executed US-market
    /// orders and normalized to domain types.
    fn load_fills(&self) -> Result<Vec<Fill>, TradereviewError>;
}
