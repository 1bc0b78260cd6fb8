use chrono::{DateTime, Local, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::currency::CurrencyCode;
use crate::error::RateError;

/// Shown wherever a rate or result is not available.
pub const PLACEHOLDER: &str = "--";

const AMOUNT_DECIMALS: u32 = 4;

fn fixed(value: f64, decimals: u32) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }

    match Decimal::from_f64(value) {
        Some(decimal) => {
            let mut rounded =
                decimal.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(decimals);
            rounded.to_string()
        }
        // Outside Decimal's range.
        None => format!("{:.*}", decimals as usize, value),
    }
}

/// Rates of 10 and above get three decimals, smaller ones four.
pub fn format_rate(rate: f64) -> String {
    let decimals = if rate >= 10.0 { 3 } else { 4 };
    fixed(rate, decimals)
}

pub fn format_rate_result(rate: &Result<f64, RateError>) -> String {
    match rate {
        Ok(rate) => format_rate(*rate),
        Err(_) => PLACEHOLDER.to_string(),
    }
}

pub fn format_amount(amount: f64) -> String {
    fixed(amount, AMOUNT_DECIMALS)
}

/// "1 USD = 30.000 TRY"
pub fn quote_line(code: &CurrencyCode, rate: f64, base: &CurrencyCode) -> String {
    format!("1 {} = {} {}", code, format_rate(rate), base)
}

pub fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map(|dt| dt.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
