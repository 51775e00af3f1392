//! Ticker universe parsing.
//!
//! Tickers are trimmed and upper-cased. Empty entries and duplicates are
//! rejected; input order is preserved since it breaks ranking ties.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UniverseError {
    #[error("ticker list is empty")]
    Empty,

    #[error("empty ticker in list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Parses a comma-separated ticker list, e.g. `"vti, vea,VWO"`.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::Empty);
    }
    normalize_tickers(input.split(','))
}

/// Normalizes an already-split ticker list.
pub fn normalize_tickers<I, S>(tickers: I) -> Result<Vec<String>, UniverseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut universe = Vec::new();
    let mut seen = HashSet::new();

    for token in tickers {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        universe.push(ticker);
    }

    if universe.is_empty() {
        return Err(UniverseError::Empty);
    }
    Ok(universe)
}
