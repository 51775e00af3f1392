//! CLI definition and dispatch.
//!
//! JSON results go to stdout; logs and errors go to stderr.

use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_api::{BacktestResponse, ScoreResponse};
use crate::domain::error::FaaError;
use crate::domain::pipeline::{execute_backtest, execute_score};
use crate::domain::request::{RequestError, validate_backtest_request, validate_score_request};
use crate::domain::settings::Settings;
use crate::domain::universe::parse_tickers;

const EXIT_INVALID_REQUEST: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "faatrader", about = "Flexible asset allocation scoring and backtesting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score a universe and optionally allocate an amount
    Score {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers, e.g. VTI,VEA,VWO
        #[arg(short, long)]
        tickers: String,
        /// Evaluation date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
    },
    /// Run a monthly-rebalanced backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        tickers: String,
        /// First rebalance date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Last date of price history, defaults to today
        #[arg(long)]
        end: Option<String>,
    },
    /// Validate a configuration file and print the resolved settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the JSON API server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs the stderr log subscriber. Filter comes from `RUST_LOG`,
/// defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Score {
            config,
            tickers,
            date,
            amount,
        } => run_score(&config, &tickers, date.as_deref(), amount),
        Command::Backtest {
            config,
            tickers,
            start,
            end,
        } => run_backtest(&config, &tickers, &start, end.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Serve { config } => run_serve(&config),
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, ExitCode> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
        .and_then(|adapter| Settings::from_config(&adapter))
        .map_err(|e| fail(&e))
}

fn run_score(
    config_path: &Path,
    tickers: &str,
    date: Option<&str>,
    amount: Option<f64>,
) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let today = Local::now().date_naive();
    let request = match parse_tickers(tickers)
        .map_err(RequestError::from)
        .and_then(|list| {
            validate_score_request(&list, date, amount, settings.score.universe_size, today)
        }) {
        Ok(r) => r,
        Err(e) => return invalid_request(&e),
    };

    let provider = CsvPriceAdapter::new(settings.data_dir.clone());
    match execute_score(&provider, &request, &settings) {
        Ok(outcome) => print_json(&ScoreResponse::new(&outcome, Local::now())),
        Err(e) => fail(&e),
    }
}

fn run_backtest(config_path: &Path, tickers: &str, start: &str, end: Option<&str>) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let today = Local::now().date_naive();
    let request = match parse_tickers(tickers)
        .map_err(RequestError::from)
        .and_then(|list| validate_backtest_request(&list, Some(start), end, today))
    {
        Ok(r) => r,
        Err(e) => return invalid_request(&e),
    };

    tracing::info!(
        universe = %request.tickers.join(","),
        start = %request.start_date,
        end = %request.end_date,
        "running backtest"
    );

    let provider = CsvPriceAdapter::new(settings.data_dir.clone());
    match execute_backtest(&provider, &request, &settings) {
        Ok(result) => print_json(&BacktestResponse::from(&result)),
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let settings = match load_settings(config_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let scoring = &settings.scoring;
    eprintln!("Config validated successfully");
    eprintln!("  data dir:       {}", settings.data_dir.display());
    eprintln!(
        "  strategy:       lookback {} days, select {}, weights {}/{}/{}, cash proxy {}",
        scoring.lookback_days,
        scoring.select_count,
        scoring.momentum_weight,
        scoring.volatility_weight,
        scoring.correlation_weight,
        scoring.cash_proxy
    );
    eprintln!(
        "  score:          universe size {}, history {} days",
        settings.score.universe_size, settings.score.history_days
    );
    eprintln!(
        "  backtest:       capital {:.2}, benchmark {}, buffer {} days",
        settings.backtest.initial_capital,
        settings.backtest.benchmark,
        settings.backtest.history_buffer_days
    );
    eprintln!("  web listen:     {}", settings.listen);
    ExitCode::SUCCESS
}

fn run_serve(config_path: &Path) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, serve};
        use std::sync::Arc;

        let settings = match load_settings(config_path) {
            Ok(s) => s,
            Err(code) => return code,
        };

        let listen = settings.listen.clone();
        let state = AppState {
            provider: Arc::new(CsvPriceAdapter::new(settings.data_dir.clone())),
            settings: Arc::new(settings),
        };

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => return fail(&FaaError::from(e)),
        };

        match runtime.block_on(serve(state, &listen)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&e),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize result: {e}");
            ExitCode::from(1)
        }
    }
}

fn fail(err: &FaaError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

fn invalid_request(err: &RequestError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(EXIT_INVALID_REQUEST)
}
