//! Broker transaction CSV adapter.
//!
//! The export uses Chinese column headers and is UTF-8 with a BOM. Only
//! fully-executed US-market orders are usable; everything else (cancelled
//! orders, other markets, rows without a fill) is filtered out. Rows that
//! pass the filter but fail to parse are skipped rather than failing the
//! whole file.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::domain::error::TradereviewError;
use crate::domain::fill::{Fill, Side};
use crate::ports::fill_port::FillPort;

const MARKET_US: &str = "美股";
const STATUS_FILLED: &str = "全部成交";

#[derive(Debug, Deserialize)]
struct RawOrder {
    #[serde(rename = "方向")]
    side: String,
    #[serde(rename = "市场")]
    market: String,
    #[serde(rename = "代码")]
    ticker: String,
    #[serde(rename = "交易状态")]
    status: String,
    #[serde(rename = "已成交@均价")]
    filled: String,
    #[serde(rename = "成交时间")]
    fill_time: String,
    #[serde(rename = "下单时间")]
    order_time: String,
}

pub struct CsvFillAdapter {
    path: PathBuf,
}

impl CsvFillAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_side(raw: &str) -> Option<Side> {
        match raw {
            "买入" => Some(Side::Buy),
            "卖出" => Some(Side::Sell),
            "卖空" => Some(Side::SellShort),
            "买入平仓" => Some(Side::BuyToCover),
            _ => None,
        }
    }

    /// Fill column is `"quantity@average_price"`, price with thousands
    /// separators (e.g. `"100@1,234.50"`).
    fn parse_filled(raw: &str) -> Option<(i64, f64)> {
        let (qty, price) = raw.split_once('@')?;
        let qty: i64 = qty.trim().parse().ok()?;
        let price: f64 = price.trim().replace(',', "").parse().ok()?;
        if qty <= 0 || price <= 0.0 {
            return None;
        }
        Some((qty, price))
    }

    /// Timestamps carry a timezone annotation suffix, e.g.
    /// `"2026/01/15 09:40:21 (美东)"`.
    fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
        let bare = raw.split(" (").next()?.trim();
        NaiveDateTime::parse_from_str(bare, "%Y/%m/%d %H:%M:%S").ok()
    }

    fn to_fill(order: &RawOrder) -> Option<Fill> {
        let side = Self::parse_side(&order.side)?;
        let (quantity, price) = Self::parse_filled(&order.filled)?;
        let fill_time = Self::parse_datetime(&order.fill_time)?;
        let order_time = Self::parse_datetime(&order.order_time).unwrap_or(fill_time);
        Some(Fill {
            ticker: order.ticker.clone(),
            side,
            quantity,
            price,
            order_time,
            fill_time,
        })
    }
}

impl FillPort for CsvFillAdapter {
    fn load_fills(&self) -> Result<Vec<Fill>, TradereviewError> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| TradereviewError::TransactionLog {
                reason: format!("failed to read {}: {e}", self.path.display()),
            })?;
        let content = content.trim_start_matches('\u{feff}');

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut fills = Vec::new();
        for result in reader.deserialize::<RawOrder>() {
            let order = result.map_err(|e| TradereviewError::TransactionLog {
                reason: format!("CSV parse error in {}: {e}", self.path.display()),
            })?;

            if order.side.is_empty()
                || order.market != MARKET_US
                || order.status != STATUS_FILLED
                || !order.filled.contains('@')
            {
                continue;
            }
            if let Some(fill) = Self::to_fill(&order) {
                fills.push(fill);
            }
        }
        Ok(fills)
    }
}
