use thiserror::Error;

use crate::currency::CurrencyCode;

/// Recoverable conditions raised by the rate math.
///
/// Neither variant is fatal: callers render a placeholder (`--`) or clear the
/// result field and keep going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    /// The code is absent from the fetched table, or it has not loaded yet.
    #[error("No rate available for {0}")]
    DataUnavailable(CurrencyCode),

    /// The user-entered amount is not numeric after separator normalization.
    #[error("Can't parse amount: {0:?}")]
    ParseError(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream answered with status {0}")]
    Status(u16),

    #[error("Response contains no rates")]
    MissingRates,

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Invalid currency code: {0:?}")]
    Invalid(String),
}

/// A dashboard command that can't be parsed or applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Unknown command {0:?}, expected one of: {1}")]
    Unknown(String, &'static str),

    #[error("Invalid row number: {0:?}")]
    InvalidRow(String),

    #[error("No converter row {0}")]
    NoSuchRow(usize),

    #[error(transparent)]
    Currency(#[from] CurrencyError),

    #[error(transparent)]
    Rate(#[from] RateError),
}
