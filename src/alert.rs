use std::collections::BTreeMap;

use crate::convert::parse_amount;
use crate::currency::CurrencyCode;
use crate::error::RateError;
use crate::normalize::NormalizedRateTable;

#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredAlert {
    pub code: CurrencyCode,
    pub threshold: f64,
    pub rate: f64,
}

/// One-shot rate alerts: fire when a displayed rate reaches its threshold.
#[derive(Debug, Default, Clone)]
pub struct AlertBook {
    thresholds: BTreeMap<CurrencyCode, f64>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `input` like a converter amount and arms the alert for `code`,
    /// replacing any existing one.
    pub fn set(&mut self, code: CurrencyCode, input: &str) -> Result<f64, RateError> {
        let threshold = parse_amount(input)?;
        self.thresholds.insert(code, threshold);
        Ok(threshold)
    }

    pub fn remove(&mut self, code: &CurrencyCode) -> Option<f64> {
        self.thresholds.remove(code)
    }

    pub fn threshold(&self, code: &CurrencyCode) -> Option<f64> {
        self.thresholds.get(code).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.thresholds.iter().map(|(code, threshold)| (code, *threshold))
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Returns the alerts reached by `table` and disarms them.
    pub fn check(&mut self, table: &NormalizedRateTable) -> Vec<TriggeredAlert> {
        let mut triggered = Vec::new();

        self.thresholds.retain(|code, threshold| match table.get(code) {
            Ok(rate) if rate >= *threshold => {
                triggered.push(TriggeredAlert {
                    code: code.clone(),
                    threshold: *threshold,
                    rate,
                });
                false
            }
            _ => true,
        });

        triggered
    }
}
