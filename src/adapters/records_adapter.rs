//! Line-oriented records file adapter for minute-bar history.
//!
//! Each ticker lives in `<dir>/<TICKER>.records`, one trading day per
//! line: an ISO date, then `": "`, then a JSON array of bars. Indicator
//! fields are JSON `null` until the fetcher has enough history to compute
//! them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::domain::bar::Bar;
use crate::domain::error::TradereviewError;
use crate::ports::bar_store_port::{BarStorePort, DayBars};

const RECORDS_EXT: &str = "records";

#[derive(Debug, Deserialize)]
struct RawBar {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(rename = "EMA_10", default)]
    ema10: Option<f64>,
    #[serde(rename = "EMA_20", default)]
    ema20: Option<f64>,
    #[serde(rename = "VWAP", default)]
    vwap: Option<f64>,
    #[serde(rename = "RSI_14", default)]
    rsi14: Option<f64>,
}

pub struct RecordsAdapter {
    data_dir: PathBuf,
}

impl RecordsAdapter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn records_path(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("{ticker}.{RECORDS_EXT}"))
    }

    fn bar_error(path: &Path, line_no: usize, reason: impl std::fmt::Display) -> TradereviewError {
        TradereviewError::BarStore {
            reason: format!("{} line {}: {}", path.display(), line_no, reason),
        }
    }

    fn parse_line(path: &Path, line_no: usize, line: &str) -> Result<(NaiveDate, Vec<Bar>), TradereviewError> {
        let (date_str, json) = line
            .split_once(": ")
            .ok_or_else(|| Self::bar_error(path, line_no, "missing date separator"))?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| Self::bar_error(path, line_no, format!("bad date {date_str:?}: {e}")))?;

        let raw: Vec<RawBar> = serde_json::from_str(json)
            .map_err(|e| Self::bar_error(path, line_no, e))?;
        let mut bars = Vec::with_capacity(raw.len());
        for rb in raw {
            let time = NaiveTime::parse_from_str(&rb.time, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(&rb.time, "%H:%M:%S"))
                .map_err(|e| {
                    Self::bar_error(path, line_no, format!("bad bar time {:?}: {e}", rb.time))
                })?;
            bars.push(Bar {
                time,
                open: rb.open,
                high: rb.high,
                low: rb.low,
                close: rb.close,
                volume: rb.volume as i64,
                ema10: rb.ema10,
                ema20: rb.ema20,
                vwap: rb.vwap,
                rsi14: rb.rsi14,
            });
        }
        Ok((date, bars))
    }
}

impl BarStorePort for RecordsAdapter {
    fn load_days(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DayBars, TradereviewError> {
        let path = self.records_path(ticker);
        if !path.exists() {
            return Err(TradereviewError::NoData {
                ticker: ticker.to_string(),
            });
        }
        let content = fs::read_to_string(&path)?;

        let mut days: DayBars = BTreeMap::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (date, bars) = Self::parse_line(&path, i + 1, line)?;
            if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
                continue;
            }
            days.insert(date, bars);
        }
        Ok(days)
    }

    fn has_ticker(&self, ticker: &str) -> bool {
        self.records_path(ticker).exists()
    }

    fn list_tickers(&self) -> Result<Vec<String>, TradereviewError> {
        let entries = fs::read_dir(&self.data_dir).map_err(|e| TradereviewError::BarStore {
            reason: format!("failed to read {}: {e}", self.data_dir.display()),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TradereviewError::BarStore {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(&format!(".{RECORDS_EXT}")) {
                tickers.push(stem.to_string());
            }
        }
        tickers.sort();
        Ok(tickers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DAY_LINE: &str = concat!(
        "2026-01-15: [",
        r#"{"time": "09:30", "open": 100.0, "high": 101.0, "low": 99.5, "close": 100.5, "volume": 12000, "EMA_10": null, "EMA_20": null, "VWAP": 100.2, "RSI_14": null},"#,
        r#"{"time": "09:31", "open": 100.5, "high": 100.8, "low": 100.1, "close": 100.3, "volume": 8000, "EMA_10": 100.4, "EMA_20": 100.45, "VWAP": 100.3, "RSI_14": 55.2}"#,
        "]"
    );

    fn store_with(files: &[(&str, &str)]) -> (TempDir, RecordsAdapter) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let adapter = RecordsAdapter::new(dir.path());
        (dir, adapter)
    }

    #[test]
    fn parses_bars_and_optional_indicators() {
        let (_dir, adapter) = store_with(&[("SNDK.records", DAY_LINE)]);
        let days = adapter.load_days("SNDK", None, None).unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let bars = &days[&date];
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].volume, 12000);
        assert!(bars[0].ema10.is_none());
        assert_eq!(bars[1].ema20, Some(100.45));
        assert_eq!(bars[1].time, NaiveTime::from_hms_opt(9, 31, 0).unwrap());
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let content = [
            r#"2026-01-14: [{"time": "09:30", "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1}]"#,
            r#"2026-01-15: [{"time": "09:30", "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1}]"#,
            r#"2026-01-16: [{"time": "09:30", "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1}]"#,
        ]
        .join("\n");
        let (_dir, adapter) = store_with(&[("A.records", &content)]);

        let d = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
        let days = adapter.load_days("A", Some(d(15)), Some(d(16))).unwrap();
        assert_eq!(days.keys().copied().collect::<Vec<_>>(), vec![d(15), d(16)]);

        let days = adapter.load_days("A", None, Some(d(14))).unwrap();
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let content = format!("\n{DAY_LINE}\n\n");
        let (_dir, adapter) = store_with(&[("SNDK.records", &content)]);
        assert_eq!(adapter.load_days("SNDK", None, None).unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_a_no_data_error() {
        let (_dir, adapter) = store_with(&[]);
        let err = adapter.load_days("GONE", None, None).unwrap_err();
        assert!(matches!(err, TradereviewError::NoData { ticker } if ticker == "GONE"));
    }

    #[test]
    fn malformed_json_is_a_bar_store_error() {
        let (_dir, adapter) = store_with(&[("BAD.records", "2026-01-15: [{oops]")]);
        let err = adapter.load_days("BAD", None, None).unwrap_err();
        assert!(matches!(err, TradereviewError::BarStore { .. }));
    }

    #[test]
    fn list_tickers_scans_records_files_sorted() {
        let (_dir, adapter) = store_with(&[
            ("QQQ.records", DAY_LINE),
            ("AMD.records", DAY_LINE),
            ("notes.txt", "ignore me"),
        ]);
        assert_eq!(adapter.list_tickers().unwrap(), vec!["AMD", "QQQ"]);
        assert!(adapter.has_ticker("AMD"));
        assert!(!adapter.has_ticker("TSLA"));
    }
}
