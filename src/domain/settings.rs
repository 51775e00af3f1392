//! Typed settings built from configuration.
//!
//! `validate_config` checks every recognised key before use;
//! `Settings::from_config` then reads them with defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::backtest::{DEFAULT_BENCHMARK, DEFAULT_INITIAL_CAPITAL};
use crate::domain::error::FaaError;
use crate::domain::scoring::{
    DEFAULT_CASH_PROXY, DEFAULT_LOOKBACK_DAYS, DEFAULT_SELECT_COUNT, ScoringParams,
};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_UNIVERSE_SIZE: usize = 7;
pub const DEFAULT_SCORE_HISTORY_DAYS: i64 = 150;
pub const DEFAULT_HISTORY_BUFFER_DAYS: i64 = 180;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
/// Upper bound for the history windows, in calendar days.
pub const MAX_HISTORY_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSettings {
    /// Exact number of tickers a score request must carry; 0 accepts any.
    pub universe_size: usize,
    /// Calendar days of history fetched before the evaluation date.
    pub history_days: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSettings {
    pub initial_capital: f64,
    pub benchmark: String,
    /// Calendar days of history fetched before the start date.
    pub history_buffer_days: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub scoring: ScoringParams,
    pub score: ScoreSettings,
    pub backtest: BacktestSettings,
    pub listen: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            scoring: ScoringParams::default(),
            score: ScoreSettings {
                universe_size: DEFAULT_UNIVERSE_SIZE,
                history_days: DEFAULT_SCORE_HISTORY_DAYS,
            },
            backtest: BacktestSettings {
                initial_capital: DEFAULT_INITIAL_CAPITAL,
                benchmark: DEFAULT_BENCHMARK.to_string(),
                history_buffer_days: DEFAULT_HISTORY_BUFFER_DAYS,
            },
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FaaError> {
        validate_config(config)?;
        let defaults = Settings::default();

        let data_dir = non_empty(config, "data", "dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let scoring = ScoringParams {
            lookback_days: read_count(config, "strategy", "lookback_days", DEFAULT_LOOKBACK_DAYS)?,
            select_count: read_count(config, "strategy", "select_count", DEFAULT_SELECT_COUNT)?,
            momentum_weight: config.get_double(
                "strategy",
                "momentum_weight",
                defaults.scoring.momentum_weight,
            ),
            volatility_weight: config.get_double(
                "strategy",
                "volatility_weight",
                defaults.scoring.volatility_weight,
            ),
            correlation_weight: config.get_double(
                "strategy",
                "correlation_weight",
                defaults.scoring.correlation_weight,
            ),
            cash_proxy: non_empty(config, "strategy", "cash_proxy")
                .map(|s| s.to_uppercase())
                .unwrap_or_else(|| DEFAULT_CASH_PROXY.to_string()),
        };

        let score = ScoreSettings {
            universe_size: read_count(config, "score", "universe_size", DEFAULT_UNIVERSE_SIZE)?,
            history_days: config.get_int("score", "history_days", DEFAULT_SCORE_HISTORY_DAYS),
        };

        let backtest = BacktestSettings {
            initial_capital: config.get_double(
                "backtest",
                "initial_capital",
                DEFAULT_INITIAL_CAPITAL,
            ),
            benchmark: non_empty(config, "backtest", "benchmark")
                .map(|s| s.to_uppercase())
                .unwrap_or(defaults.backtest.benchmark),
            history_buffer_days: config.get_int(
                "backtest",
                "history_buffer_days",
                DEFAULT_HISTORY_BUFFER_DAYS,
            ),
        };

        let listen = non_empty(config, "web", "listen").unwrap_or(defaults.listen);

        Ok(Settings {
            data_dir,
            scoring,
            score,
            backtest,
            listen,
        })
    }
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), FaaError> {
    validate_strategy(config)?;
    validate_score(config)?;
    validate_backtest(config)?;
    validate_web(config)?;
    Ok(())
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), FaaError> {
    let lookback = config.get_int("strategy", "lookback_days", DEFAULT_LOOKBACK_DAYS as i64);
    if lookback < 3 {
        return Err(invalid(
            "strategy",
            "lookback_days",
            "lookback_days must be at least 3",
        ));
    }

    let select = config.get_int("strategy", "select_count", DEFAULT_SELECT_COUNT as i64);
    if select < 1 {
        return Err(invalid(
            "strategy",
            "select_count",
            "select_count must be at least 1",
        ));
    }

    for key in ["momentum_weight", "volatility_weight", "correlation_weight"] {
        let weight = config.get_double("strategy", key, 0.0);
        if !weight.is_finite() || weight < 0.0 {
            return Err(invalid("strategy", key, &format!("{key} must be non-negative")));
        }
    }

    if config
        .get_string("strategy", "cash_proxy")
        .is_some_and(|proxy| proxy.trim().is_empty())
    {
        return Err(invalid("strategy", "cash_proxy", "cash_proxy must not be empty"));
    }
    Ok(())
}

fn validate_score(config: &dyn ConfigPort) -> Result<(), FaaError> {
    let universe_size = config.get_int("score", "universe_size", DEFAULT_UNIVERSE_SIZE as i64);
    if universe_size < 0 {
        return Err(invalid(
            "score",
            "universe_size",
            "universe_size must be non-negative",
        ));
    }

    let history = config.get_int("score", "history_days", DEFAULT_SCORE_HISTORY_DAYS);
    if !(1..=MAX_HISTORY_DAYS).contains(&history) {
        return Err(invalid(
            "score",
            "history_days",
            &format!("history_days must be between 1 and {MAX_HISTORY_DAYS}"),
        ));
    }
    Ok(())
}

fn validate_backtest(config: &dyn ConfigPort) -> Result<(), FaaError> {
    let capital = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if !capital.is_finite() || capital <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    if config
        .get_string("backtest", "benchmark")
        .is_some_and(|benchmark| benchmark.trim().is_empty())
    {
        return Err(invalid("backtest", "benchmark", "benchmark must not be empty"));
    }

    let buffer = config.get_int("backtest", "history_buffer_days", DEFAULT_HISTORY_BUFFER_DAYS);
    if !(0..=MAX_HISTORY_DAYS).contains(&buffer) {
        return Err(invalid(
            "backtest",
            "history_buffer_days",
            &format!("history_buffer_days must be between 0 and {MAX_HISTORY_DAYS}"),
        ));
    }
    Ok(())
}

fn validate_web(config: &dyn ConfigPort) -> Result<(), FaaError> {
    match non_empty(config, "web", "listen") {
        Some(addr) if addr.parse::<SocketAddr>().is_err() => Err(invalid(
            "web",
            "listen",
            &format!("invalid listen address '{addr}', expected host:port"),
        )),
        _ => Ok(()),
    }
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn read_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, FaaError> {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| invalid(section, key, &format!("{key} must be non-negative")))
}

fn invalid(section: &str, key: &str, reason: &str) -> FaaError {
    FaaError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
