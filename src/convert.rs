use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::currency::CurrencyCode;
use crate::error::RateError;
use crate::format::format_amount;
use crate::normalize::NormalizedRateTable;
use crate::rates::RawRateTable;

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionResult {
    Amount(f64),
    Unavailable(RateError),
}

impl ConversionResult {
    pub fn amount(&self) -> Option<f64> {
        match self {
            ConversionResult::Amount(value) => Some(*value),
            ConversionResult::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ConversionResult::Amount(_))
    }
}

impl From<Result<f64, RateError>> for ConversionResult {
    fn from(result: Result<f64, RateError>) -> Self {
        match result {
            Ok(value) => ConversionResult::Amount(value),
            Err(err) => ConversionResult::Unavailable(err),
        }
    }
}

fn normalize_decimal_string(s: &str) -> String {
    s.trim().replace(',', ".")
}

/// Parses a user-entered amount, accepting either "," or "." as the decimal
/// separator.
///
/// Amounts that don't fit a `Decimal` (too large, or more than 28 decimal
/// places) are read as `f64` instead of being rounded or rejected.
pub fn parse_amount(input: &str) -> Result<f64, RateError> {
    let normalized = normalize_decimal_string(input);
    if normalized.contains('_') {
        return Err(RateError::ParseError(input.to_string()));
    }

    let value = match Decimal::from_str_exact(&normalized) {
        Ok(value) => value.to_f64(),
        Err(_) => f64::from_str(&normalized).ok(),
    };
    value
        .filter(|value| value.is_finite())
        .ok_or_else(|| RateError::ParseError(input.to_string()))
}

/// Converts `amount` units of `from` into `to` using a normalized table.
///
/// `table[C]` is base units per unit of `C`, so the amount goes through the
/// base: `amount * table[from] / table[to]`. Equal codes short-circuit and
/// never look at the table.
pub fn convert_amount(
    table: &NormalizedRateTable,
    from: &CurrencyCode,
    to: &CurrencyCode,
    amount: f64,
) -> Result<f64, RateError> {
    if from == to {
        return Ok(amount);
    }
    let from_rate = table.get(from)?;
    let to_rate = table.get(to)?;
    Ok(amount * (from_rate / to_rate))
}

/// Same conversion straight from anchor-relative rates: `amount * raw[to] / raw[from]`.
pub fn convert_raw(
    raw: &RawRateTable,
    from: &CurrencyCode,
    to: &CurrencyCode,
    amount: f64,
) -> Result<f64, RateError> {
    if from == to {
        return Ok(amount);
    }
    let from_rate = raw.get(from)?;
    let to_rate = raw.get(to)?;
    Ok(amount * (to_rate / from_rate))
}

pub fn convert(
    table: &NormalizedRateTable,
    from: &CurrencyCode,
    to: &CurrencyCode,
    amount: &str,
) -> ConversionResult {
    parse_amount(amount)
        .and_then(|value| convert_amount(table, from, to, value))
        .into()
}

/// One calculator row: the user types into `input`, `output` is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct Converter {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub input: String,
    output: ConversionResult,
}

impl Converter {
    pub fn new(from: CurrencyCode, to: CurrencyCode, input: impl Into<String>) -> Self {
        let input = input.into();
        Converter {
            output: ConversionResult::Unavailable(RateError::DataUnavailable(from.clone())),
            from,
            to,
            input,
        }
    }

    pub fn output(&self) -> &ConversionResult {
        &self.output
    }

    /// Text for the result field; empty when the result is unavailable.
    pub fn output_text(&self) -> String {
        self.output.amount().map(format_amount).unwrap_or_default()
    }

    pub fn set_input(&mut self, input: impl Into<String>, table: &NormalizedRateTable) {
        self.input = input.into();
        self.recompute(table);
    }

    pub fn recompute(&mut self, table: &NormalizedRateTable) {
        self.output = convert(table, &self.from, &self.to, &self.input);
    }

    /// Exchanges the two sides. The last result becomes the new input, or "1"
    /// if there was none.
    pub fn swap(&mut self, table: &NormalizedRateTable) {
        let next_input = match self.output.amount() {
            Some(_) => self.output_text(),
            None => "1".to_string(),
        };
        std::mem::swap(&mut self.from, &mut self.to);
        self.input = next_input;
        self.recompute(table);
    }
}

/// The two calculator rows the dashboard starts with.
pub fn default_converters() -> Vec<Converter> {
    let code = |s: &str| CurrencyCode::try_from(s).ok();
    let pairs = [("EUR", "TRY"), ("USD", "EUR")];

    pairs
        .into_iter()
        .filter_map(|(from, to)| Some(Converter::new(code(from)?, code(to)?, "1")))
        .collect()
}
