use std::collections::BTreeMap;

use crate::currency::CurrencyCode;
use crate::error::RateError;
use crate::rates::RawRateTable;

/// Rates re-expressed against a display base.
///
/// `get(C)` is how many units of the base one unit of `C` is worth, so with a
/// TRY base the USD entry reads "1 USD = 30 TRY". Tables are never patched in
/// place; a new one is built whenever the raw table or the base changes.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRateTable {
    base: CurrencyCode,
    rates: BTreeMap<CurrencyCode, f64>,
    timestamp: Option<i64>,
    /// Set when the raw table had no rate for `base` itself.
    base_missing: bool,
}

impl NormalizedRateTable {
    /// A table with no rates yet, as shown before the first fetch completes.
    pub fn empty(base: CurrencyCode) -> Self {
        NormalizedRateTable {
            base,
            rates: BTreeMap::new(),
            timestamp: None,
            base_missing: false,
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Rate of `code` against the base. Every lookup reports the base as
    /// unavailable when the base itself had no rate.
    pub fn get(&self, code: &CurrencyCode) -> Result<f64, RateError> {
        if self.base_missing {
            return Err(RateError::DataUnavailable(self.base.clone()));
        }
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| RateError::DataUnavailable(code.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.rates.iter().map(|(code, rate)| (code, *rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Rate of a single code against `base`: `raw[base] / raw[code]`.
///
/// Both entries are "units per anchor", so the anchor cancels out.
pub fn normalize_code(
    raw: &RawRateTable,
    base: &CurrencyCode,
    code: &CurrencyCode,
) -> Result<f64, RateError> {
    let base_rate = raw.get(base)?;
    let code_rate = raw.get(code)?;
    Ok(base_rate / code_rate)
}

/// Normalizes every code in `codes` against `base`.
///
/// Codes missing from `raw` are left out of the result and logged; they read
/// back as [`RateError::DataUnavailable`] without affecting the others.
pub fn normalize(
    raw: &RawRateTable,
    base: &CurrencyCode,
    codes: &[CurrencyCode],
) -> NormalizedRateTable {
    let mut rates = BTreeMap::new();
    let base_missing = !raw.contains(base);
    if base_missing {
        log::warn!("No rate for display base {}", base);
    }

    for code in codes {
        match normalize_code(raw, base, code) {
            Ok(rate) => {
                rates.insert(code.clone(), rate);
            }
            Err(err) => log::debug!("{} against {}: {}", code, base, err),
        }
    }

    NormalizedRateTable {
        base: base.clone(),
        rates,
        timestamp: raw.timestamp(),
        base_missing,
    }
}
