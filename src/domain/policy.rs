//! Scoring policy: the tunable threshold surface of the rubric.
//!
//! Defaults match the reference rubric; every value can be overridden from
//! the `[scoring]` config section. Thresholds are validated on load so a
//! bad config fails the run instead of silently skewing every score.

use crate::domain::error::TradereviewError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    /// R1: hard stop-loss line as a fraction of entry price.
    pub stop_loss_pct: f64,
    /// R2: assumed account size in USD.
    pub account_total: f64,
    /// R2: target notional position as a fraction of the account.
    pub position_pct_target: f64,
    /// R2: allowed deviation bands around the target.
    pub position_pct_tight: f64,
    pub position_pct_wide: f64,
    /// E1: relative volume multiples.
    pub rel_vol_high: f64,
    pub rel_vol_low: f64,
    /// E2: chase-ratio ceilings.
    pub chase_max: f64,
    pub chase_warn: f64,
    /// E3: EMA20 bias ceilings.
    pub bias_good: f64,
    pub bias_warn: f64,
    /// S2: excess-return threshold vs the benchmark.
    pub rs_outperform: f64,
    /// S3: pre-entry range compression thresholds.
    pub vol_conv_good: f64,
    pub vol_conv_warn: f64,
    /// X1: capture-ratio thresholds.
    pub capture_good: f64,
    pub capture_warn: f64,
    /// X2: post-exit continuation thresholds (fraction of entry price).
    pub post_miss_good: f64,
    pub post_miss_warn: f64,
    /// X3: bars near entry price that count as stagnation, and the price
    /// tolerance that defines "near".
    pub stagnation_bars: usize,
    pub stagnation_pct: f64,
    /// T2: minimum minutes after a same-day losing exit.
    pub revenge_min: f64,
    /// T1: order-to-fill lag ceilings in minutes.
    pub lag_good_min: f64,
    pub lag_warn_min: f64,
    /// Lookback windows (bars).
    pub rs_lookback: usize,
    pub conv_lookback: usize,
    pub vol_lookback: usize,
    /// Bars inspected after the exit for X2.
    pub post_exit_bars: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.03,
            account_total: 100_000.0,
            position_pct_target: 0.10,
            position_pct_tight: 0.03,
            position_pct_wide: 0.06,
            rel_vol_high: 1.5,
            rel_vol_low: 1.2,
            chase_max: 0.70,
            chase_warn: 0.85,
            bias_good: 0.03,
            bias_warn: 0.05,
            rs_outperform: 0.01,
            vol_conv_good: 0.015,
            vol_conv_warn: 0.025,
            capture_good: 0.60,
            capture_warn: 0.30,
            post_miss_good: 0.005,
            post_miss_warn: 0.015,
            stagnation_bars: 5,
            stagnation_pct: 0.003,
            revenge_min: 15.0,
            lag_good_min: 3.0,
            lag_warn_min: 5.0,
            rs_lookback: 30,
            conv_lookback: 10,
            vol_lookback: 20,
            post_exit_bars: 3,
        }
    }
}

impl ScoringPolicy {
    /// Build a policy from the `[scoring]` config section, falling back to
    /// defaults for absent keys.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradereviewError> {
        let d = Self::default();
        let policy = Self {
            stop_loss_pct: config.get_double("scoring", "stop_loss_pct", d.stop_loss_pct),
            account_total: config.get_double("scoring", "account_total", d.account_total),
            position_pct_target: config.get_double(
                "scoring",
                "position_pct_target",
                d.position_pct_target,
            ),
            position_pct_tight: config.get_double(
                "scoring",
                "position_pct_tight",
                d.position_pct_tight,
            ),
            position_pct_wide: config.get_double(
                "scoring",
                "position_pct_wide",
                d.position_pct_wide,
            ),
            rel_vol_high: config.get_double("scoring", "rel_vol_high", d.rel_vol_high),
            rel_vol_low: config.get_double("scoring", "rel_vol_low", d.rel_vol_low),
            chase_max: config.get_double("scoring", "chase_max", d.chase_max),
            chase_warn: config.get_double("scoring", "chase_warn", d.chase_warn),
            bias_good: config.get_double("scoring", "bias_good", d.bias_good),
            bias_warn: config.get_double("scoring", "bias_warn", d.bias_warn),
            rs_outperform: config.get_double("scoring", "rs_outperform", d.rs_outperform),
            vol_conv_good: config.get_double("scoring", "vol_conv_good", d.vol_conv_good),
            vol_conv_warn: config.get_double("scoring", "vol_conv_warn", d.vol_conv_warn),
            capture_good: config.get_double("scoring", "capture_good", d.capture_good),
            capture_warn: config.get_double("scoring", "capture_warn", d.capture_warn),
            post_miss_good: config.get_double("scoring", "post_miss_good", d.post_miss_good),
            post_miss_warn: config.get_double("scoring", "post_miss_warn", d.post_miss_warn),
            stagnation_bars: config.get_int("scoring", "stagnation_bars", d.stagnation_bars as i64)
                as usize,
            stagnation_pct: config.get_double("scoring", "stagnation_pct", d.stagnation_pct),
            revenge_min: config.get_double("scoring", "revenge_min", d.revenge_min),
            lag_good_min: config.get_double("scoring", "lag_good_min", d.lag_good_min),
            lag_warn_min: config.get_double("scoring", "lag_warn_min", d.lag_warn_min),
            rs_lookback: config.get_int("scoring", "rs_lookback", d.rs_lookback as i64) as usize,
            conv_lookback: config.get_int("scoring", "conv_lookback", d.conv_lookback as i64)
                as usize,
            vol_lookback: config.get_int("scoring", "vol_lookback", d.vol_lookback as i64) as usize,
            post_exit_bars: config.get_int("scoring", "post_exit_bars", d.post_exit_bars as i64)
                as usize,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), TradereviewError> {
        let invalid = |key: &str, reason: &str| TradereviewError::ConfigInvalid {
            section: "scoring".into(),
            key: key.into(),
            reason: reason.into(),
        };

        let positive = [
            ("stop_loss_pct", self.stop_loss_pct),
            ("account_total", self.account_total),
            ("position_pct_target", self.position_pct_target),
            ("revenge_min", self.revenge_min),
        ];
        for (key, value) in positive {
            if value <= 0.0 {
                return Err(invalid(key, "must be positive"));
            }
        }

        // Warn thresholds must sit on the lenient side of their good
        // thresholds, otherwise the tier logic inverts.
        let ordered = [
            ("chase_warn", self.chase_max, self.chase_warn),
            ("bias_warn", self.bias_good, self.bias_warn),
            ("vol_conv_warn", self.vol_conv_good, self.vol_conv_warn),
            ("post_miss_warn", self.post_miss_good, self.post_miss_warn),
            ("lag_warn_min", self.lag_good_min, self.lag_warn_min),
            ("position_pct_wide", self.position_pct_tight, self.position_pct_wide),
        ];
        for (key, good, warn) in ordered {
            if warn < good {
                return Err(invalid(key, "must be >= its good threshold"));
            }
        }

        if self.rel_vol_low > self.rel_vol_high {
            return Err(invalid("rel_vol_low", "must be <= rel_vol_high"));
        }
        if self.capture_warn > self.capture_good {
            return Err(invalid("capture_warn", "must be <= capture_good"));
        }
        Ok(())
    }
}
