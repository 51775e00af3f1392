//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for faatrader.
///
/// The calculation variants are raised by the scoring, allocation and backtest
/// core and are client-correctable. `Data` and `Io` are failures of the
/// collaborators around the core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FaaError {
    #[error("universe too small: have {size} symbols, need at least {minimum}")]
    InsufficientUniverse { size: usize, minimum: usize },

    #[error("no price data for {symbol}")]
    MissingSymbolData { symbol: String },

    #[error("insufficient history for {symbol} as of {as_of}: have {observations} observations, need {required}")]
    InsufficientHistory {
        symbol: String,
        as_of: NaiveDate,
        observations: usize,
        required: usize,
    },

    #[error("investment amount must be positive, got {amount}")]
    InvalidAmount { amount: f64 },

    #[error("scoring result has no selected symbols")]
    NoSelection,

    #[error("insufficient data for backtest: {reason}")]
    InsufficientData { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price data error: {reason}")]
    Data { reason: String },

    #[error("io error: {reason}")]
    Io { reason: String },
}

impl FaaError {
    /// True for the errors the core raises about its inputs, as opposed to
    /// configuration or collaborator failures.
    pub fn is_calculation(&self) -> bool {
        matches!(
            self,
            FaaError::InsufficientUniverse { .. }
                | FaaError::MissingSymbolData { .. }
                | FaaError::InsufficientHistory { .. }
                | FaaError::InvalidAmount { .. }
                | FaaError::NoSelection
                | FaaError::InsufficientData { .. }
        )
    }
}

impl From<std::io::Error> for FaaError {
    fn from(err: std::io::Error) -> Self {
        FaaError::Io {
            reason: err.to_string(),
        }
    }
}

impl From<&FaaError> for std::process::ExitCode {
    fn from(err: &FaaError) -> Self {
        let code: u8 = match err {
            FaaError::Io { .. } | FaaError::Data { .. } => 1,
            FaaError::ConfigParse { .. } | FaaError::ConfigInvalid { .. } => 2,
            FaaError::InsufficientUniverse { .. }
            | FaaError::MissingSymbolData { .. }
            | FaaError::InsufficientHistory { .. }
            | FaaError::InvalidAmount { .. }
            | FaaError::NoSelection
            | FaaError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
