//! Shared fixtures: temp data directories with records files and broker
//! transaction CSVs.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

pub const CSV_HEADER: &str = "方向,市场,代码,交易状态,已成交@均价,成交时间,下单时间\n";

/// Temp directory shaped like a production data dir.
pub struct DataFixture {
    dir: TempDir,
}

impl DataFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.dir.path().join("transaction.csv")
    }

    /// Write a `.records` file from pre-built day lines.
    pub fn add_records(&self, ticker: &str, lines: &[String]) {
        fs::write(
            self.dir.path().join(format!("{ticker}.records")),
            lines.join("\n") + "\n",
        )
        .unwrap();
    }

    /// Write the broker CSV with a BOM, the way the export tool does.
    pub fn write_transactions(&self, rows: &[String]) {
        let mut content = format!("\u{feff}{CSV_HEADER}");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(self.transactions_path(), content).unwrap();
    }
}

/// A fully-filled US-market order row.
pub fn order_row(side: &str, ticker: &str, qty: i64, price: f64, fill: &str, order: &str) -> String {
    format!(
        "{side},美股,{ticker},全部成交,{qty}@{price},{fill} (美东),{order} (美东)"
    )
}

/// One records line: `date`, then a JSON bar array.
///
/// Bars start at 09:30, one per minute, closing at `closes[i]` with a
/// ±0.5 high/low band and constant volume unless `volumes` overrides it.
pub fn day_line(date: &str, closes: &[f64], volumes: Option<&[i64]>) -> String {
    let mut json = format!("{date}: [");
    for (i, close) in closes.iter().enumerate() {
        let minute = 30 + i;
        let volume = volumes.map_or(1000, |v| v[i]);
        if i > 0 {
            json.push_str(", ");
        }
        let _ = write!(
            json,
            r#"{{"time": "{:02}:{:02}", "open": {close}, "high": {}, "low": {}, "close": {close}, "volume": {volume}, "EMA_10": null, "EMA_20": null, "VWAP": null, "RSI_14": null}}"#,
            9 + minute / 60,
            minute % 60,
            close + 0.5,
            close - 0.5,
        );
    }
    json.push(']');
    json
}

/// A quiet flat day: `n` one-minute bars all trading at `price`.
pub fn flat_day_line(date: &str, price: f64, n: usize) -> String {
    day_line(date, &vec![price; n], None)
}
