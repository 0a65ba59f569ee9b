//! CLI definition and dispatch.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::adapters::csv_fill_adapter::CsvFillAdapter;
use crate::adapters::fetch_adapter::ProcessFetchAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::markdown_report_adapter::MarkdownReportAdapter;
use crate::adapters::records_adapter::RecordsAdapter;
use crate::domain::bar::Bar;
use crate::domain::pairing::pair_fills;
use crate::domain::policy::ScoringPolicy;
use crate::domain::profile::TradeProfile;
use crate::domain::score::Score;
use crate::domain::scoring::{previous_losses, score_trade};
use crate::domain::stats::SessionStats;
use crate::domain::trade::Trade;
use crate::ports::bar_store_port::{BarStorePort, DayBars};
use crate::ports::config_port::ConfigPort;
use crate::ports::fetch_port::FetchPort;
use crate::ports::fill_port::FillPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_BENCHMARK: &str = "QQQ";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_FETCH_COMMAND: &str = "python3 fetch_data.py";

#[derive(Parser, Debug)]
#[command(name = "tradereview", about = "Intraday trade quality review")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pair fills into trades and score each one
    Analyze {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Bar data directory (overrides config)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Transaction CSV path (overrides config)
        #[arg(short, long)]
        transactions: Option<PathBuf>,
        /// Report output path, "-" for stdout
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Render the trade-characteristics summary
    Summary {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        transactions: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List tickers with bar data
    ListTickers {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Show data coverage per ticker
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data: Option<PathBuf>,
        /// Restrict to one ticker
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Run the external bar fetcher and wait for it
    Update {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Tickers to update (all known tickers when omitted)
        tickers: Vec<String>,
    },
    /// Start the data API server
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        listen: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            data,
            transactions,
            output,
        } => run_analyze(config.as_ref(), data, transactions, output),
        Command::Summary {
            config,
            data,
            transactions,
            output,
        } => run_summary(config.as_ref(), data, transactions, output),
        Command::ListTickers { config, data } => run_list_tickers(config.as_ref(), data),
        Command::Info {
            config,
            data,
            ticker,
        } => run_info(config.as_ref(), data, ticker.as_deref()),
        Command::Update { config, tickers } => run_update(config.as_ref(), &tickers),
        Command::Serve { config, listen } => run_serve(config.as_ref(), listen),
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    match path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            FileConfigAdapter::from_file(path).map_err(|e| {
                eprintln!("error: {e}");
                ExitCode::from(&e)
            })
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

fn data_dir(override_path: Option<PathBuf>, config: &dyn ConfigPort) -> PathBuf {
    override_path.unwrap_or_else(|| {
        PathBuf::from(
            config
                .get_string("data", "dir")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        )
    })
}

fn transactions_path(
    override_path: Option<PathBuf>,
    config: &dyn ConfigPort,
    data_dir: &std::path::Path,
) -> PathBuf {
    override_path
        .or_else(|| config.get_string("data", "transactions").map(PathBuf::from))
        .unwrap_or_else(|| data_dir.join("transaction.csv"))
}

/// Load fills and pair them, reporting counts along the way.
fn load_trades(transactions: &PathBuf) -> Result<Vec<Trade>, ExitCode> {
    eprintln!("Loading transactions from {}", transactions.display());
    let fills = CsvFillAdapter::new(transactions)
        .load_fills()
        .map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        })?;
    let trades = pair_fills(&fills);
    eprintln!("{} fills, {} round-trip trades", fills.len(), trades.len());
    Ok(trades)
}

/// Keep trades whose tickers have bar data; warn once per missing ticker.
fn filter_to_available(trades: Vec<Trade>, store: &RecordsAdapter) -> Vec<Trade> {
    let missing: BTreeSet<&str> = trades
        .iter()
        .filter(|t| !store.has_ticker(&t.ticker))
        .map(|t| t.ticker.as_str())
        .collect();
    for ticker in &missing {
        eprintln!("warning: no bar data for {ticker}, skipping its trades");
    }
    trades
        .into_iter()
        .filter(|t| store.has_ticker(&t.ticker))
        .collect()
}

/// One full bar history per ticker. Tickers that fail to load are warned
/// and dropped; their trades end up unscored.
fn load_bar_cache(trades: &[Trade], store: &RecordsAdapter) -> HashMap<String, DayBars> {
    let tickers: BTreeSet<&str> = trades.iter().map(|t| t.ticker.as_str()).collect();
    let mut cache = HashMap::new();
    for ticker in tickers {
        match store.load_days(ticker, None, None) {
            Ok(days) => {
                cache.insert(ticker.to_string(), days);
            }
            Err(e) => eprintln!("warning: {e}"),
        }
    }
    cache
}

fn day_of<'a>(cache: &'a HashMap<String, DayBars>, ticker: &str, date: chrono::NaiveDate) -> &'a [Bar] {
    cache
        .get(ticker)
        .and_then(|days| days.get(&date))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn run_analyze(
    config_path: Option<&PathBuf>,
    data_override: Option<PathBuf>,
    transactions_override: Option<PathBuf>,
    output_override: Option<String>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let policy = match ScoringPolicy::from_config(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_dir = data_dir(data_override, &config);
    let transactions = transactions_path(transactions_override, &config, &data_dir);
    let store = RecordsAdapter::new(&data_dir);

    let trades = match load_trades(&transactions) {
        Ok(t) => t,
        Err(code) => return code,
    };
    let trades = filter_to_available(trades, &store);

    let benchmark = config
        .get_string("data", "benchmark")
        .unwrap_or_else(|| DEFAULT_BENCHMARK.to_string());
    let benchmark_days: DayBars = match store.load_days(&benchmark, None, None) {
        Ok(days) => days,
        Err(e) => {
            eprintln!("warning: {e}; relative strength will use neutral defaults");
            DayBars::new()
        }
    };

    let cache = load_bar_cache(&trades, &store);
    let prev = previous_losses(&trades);
    let scores: Vec<Score> = trades
        .iter()
        .zip(&prev)
        .map(|(trade, prev_loss)| {
            let day = day_of(&cache, &trade.ticker, trade.date);
            let bench = benchmark_days
                .get(&trade.date)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            score_trade(trade, day, bench, prev_loss.as_ref(), &policy)
        })
        .collect();

    let stats = SessionStats::compute(&trades, &scores);
    eprintln!(
        "Scored {}/{} trades | avg {:.1}/100 | win rate {:.1}% | P&L {:+.2} USD",
        stats.scored,
        stats.trades,
        stats.avg_total,
        stats.win_rate * 100.0,
        stats.total_pnl_usd
    );

    let output = output_override
        .or_else(|| config.get_string("report", "output"))
        .unwrap_or_else(|| "-".to_string());
    match MarkdownReportAdapter::new().write_review(&trades, &scores, &stats, &output) {
        Ok(()) => {
            if output != "-" {
                eprintln!("Report written to {output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_summary(
    config_path: Option<&PathBuf>,
    data_override: Option<PathBuf>,
    transactions_override: Option<PathBuf>,
    output_override: Option<String>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_dir = data_dir(data_override, &config);
    let transactions = transactions_path(transactions_override, &config, &data_dir);
    let store = RecordsAdapter::new(&data_dir);

    let trades = match load_trades(&transactions) {
        Ok(t) => t,
        Err(code) => return code,
    };
    let trades = filter_to_available(trades, &store);
    let cache = load_bar_cache(&trades, &store);

    let profiles: Vec<TradeProfile> = trades
        .iter()
        .filter_map(|trade| {
            TradeProfile::enrich(trade, day_of(&cache, &trade.ticker, trade.date))
        })
        .collect();
    eprintln!("{} of {} trades enriched with bar data", profiles.len(), trades.len());

    let output = output_override
        .or_else(|| config.get_string("report", "summary_output"))
        .unwrap_or_else(|| "-".to_string());
    match MarkdownReportAdapter::new().write_profile(&profiles, &output) {
        Ok(()) => {
            if output != "-" {
                eprintln!("Report written to {output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_tickers(config_path: Option<&PathBuf>, data_override: Option<PathBuf>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = RecordsAdapter::new(data_dir(data_override, &config));

    match store.list_tickers() {
        Ok(tickers) => {
            for ticker in &tickers {
                println!("{ticker}");
            }
            eprintln!("{} tickers found", tickers.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_info(
    config_path: Option<&PathBuf>,
    data_override: Option<PathBuf>,
    ticker: Option<&str>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = RecordsAdapter::new(data_dir(data_override, &config));

    let tickers = match ticker {
        Some(t) => vec![t.to_string()],
        None => match store.list_tickers() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        },
    };

    for ticker in &tickers {
        match store.load_days(ticker, None, None) {
            Ok(days) => {
                let bars: usize = days.values().map(Vec::len).sum();
                match (days.keys().next(), days.keys().next_back()) {
                    (Some(first), Some(last)) => {
                        println!("{ticker}: {} days, {bars} bars, {first} to {last}", days.len());
                    }
                    _ => println!("{ticker}: empty records file"),
                }
            }
            Err(e) => eprintln!("{ticker}: {e}"),
        }
    }
    ExitCode::SUCCESS
}

fn run_update(config_path: Option<&PathBuf>, tickers: &[String]) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let command = config
        .get_string("fetch", "command")
        .unwrap_or_else(|| DEFAULT_FETCH_COMMAND.to_string());
    let fetcher = match ProcessFetchAdapter::from_command(&command) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Running: {command} {}", tickers.join(" "));
    match fetcher.run_update(tickers) {
        Ok(status) => {
            for line in &status.output {
                eprintln!("  {line}");
            }
            eprintln!("Update finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_serve(config_path: Option<&PathBuf>, listen_override: Option<String>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use std::sync::Arc;

        use crate::adapters::web::{serve, AppState};

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let store = RecordsAdapter::new(data_dir(None, &config));
        let command = config
            .get_string("fetch", "command")
            .unwrap_or_else(|| DEFAULT_FETCH_COMMAND.to_string());
        let fetcher = match ProcessFetchAdapter::from_command(&command) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let listen = listen_override
            .or_else(|| config.get_string("web", "listen"))
            .unwrap_or_else(|| "127.0.0.1:8000".to_string());

        let state = AppState {
            bar_store: Arc::new(store),
            fetcher: Arc::new(fetcher),
        };
        match serve(state, &listen) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (config_path, listen_override);
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
