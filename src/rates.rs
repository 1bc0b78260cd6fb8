use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::currency::CurrencyCode;
use crate::error::{FetchError, RateError};

/// Body of `latest.json` and `historical/{date}.json`.
#[derive(Debug, Deserialize, PartialEq)]
pub struct RatesResponse {
    #[serde(default)]
    pub rates: Option<HashMap<String, f64>>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Rates keyed by currency code, all relative to the upstream anchor currency:
/// `rate(X)` is how many units of X one unit of the anchor buys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRateTable {
    rates: HashMap<CurrencyCode, f64>,
    timestamp: Option<i64>,
}

impl RawRateTable {
    /// Builds a table, dropping entries that can't take part in a division.
    pub fn new(rates: impl IntoIterator<Item = (CurrencyCode, f64)>, timestamp: Option<i64>) -> Self {
        let mut map = HashMap::new();

        for (code, rate) in rates {
            if rate.is_finite() && rate > 0.0 {
                map.insert(code, rate);
            } else {
                log::warn!("Dropping unusable rate {} for {}", rate, code);
            }
        }

        RawRateTable {
            rates: map,
            timestamp,
        }
    }

    pub fn from_response(response: RatesResponse) -> Result<Self, FetchError> {
        let rates = response.rates.ok_or(FetchError::MissingRates)?;

        let parsed = rates
            .into_iter()
            .filter_map(|(code, rate)| match CurrencyCode::try_from(code.as_str()) {
                Ok(code) => Some((code, rate)),
                Err(_) => {
                    log::debug!("Skipping non-ISO code {:?}", code);
                    None
                }
            });

        Ok(RawRateTable::new(parsed, response.timestamp))
    }

    pub fn get(&self, code: &CurrencyCode) -> Result<f64, RateError> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| RateError::DataUnavailable(code.clone()))
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.rates.contains_key(code)
    }

    /// Upstream Unix timestamp of the last update, in seconds.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<(CurrencyCode, f64)> for RawRateTable {
    fn from_iter<T: IntoIterator<Item = (CurrencyCode, f64)>>(iter: T) -> Self {
        RawRateTable::new(iter, None)
    }
}
