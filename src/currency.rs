use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CurrencyError;

/// An ISO 4217 currency code, always three upper-case ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim();
        if value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(CurrencyCode(value.to_ascii_uppercase()))
        } else {
            Err(CurrencyError::Invalid(value.to_string()))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::try_from(value.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::try_from(s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
}

impl Currency {
    pub fn code(&self) -> CurrencyCode {
        CurrencyCode(self.code.to_string())
    }
}

/// Currencies shown on the dashboard, in display order.
pub const CURRENCIES: [Currency; 6] = [
    Currency { code: "USD", name: "US Dollar" },
    Currency { code: "EUR", name: "Euro" },
    Currency { code: "GBP", name: "British Pound" },
    Currency { code: "CHF", name: "Swiss Franc" },
    Currency { code: "JPY", name: "Japanese Yen" },
    Currency { code: "TRY", name: "Turkish Lira" },
];

/// Codes the user can pick as the display base.
pub const DISPLAY_BASES: [&str; 3] = ["TRY", "EUR", "USD"];

pub fn displayed_codes() -> Vec<CurrencyCode> {
    CURRENCIES.iter().map(Currency::code).collect()
}

pub fn currency_name(code: &CurrencyCode) -> Option<&'static str> {
    CURRENCIES
        .iter()
        .find(|c| c.code == code.as_str())
        .map(|c| c.name)
}

pub fn is_display_base(code: &CurrencyCode) -> bool {
    DISPLAY_BASES.contains(&code.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_code() {
        assert_eq!(CurrencyCode::try_from("usd").unwrap().as_str(), "USD");
        assert_eq!(" try ".parse::<CurrencyCode>().unwrap().as_str(), "TRY");
        assert!(CurrencyCode::try_from("US").is_err());
        assert!(CurrencyCode::try_from("US1").is_err());
        assert!(CurrencyCode::try_from("EURO").is_err());
    }

    #[test]
    fn test_displayed_codes() {
        let codes = displayed_codes();
        assert_eq!(codes.len(), 6);
        assert_eq!(codes[0].as_str(), "USD");
        assert_eq!(codes[5].as_str(), "TRY");
    }

    #[test]
    fn test_display_bases() {
        assert!(is_display_base(&"EUR".parse().unwrap()));
        assert!(!is_display_base(&"GBP".parse().unwrap()));
        assert_eq!(currency_name(&"CHF".parse().unwrap()), Some("Swiss Franc"));
        assert_eq!(currency_name(&"XAU".parse().unwrap()), None);
    }

    #[test]
    fn test_serde_roundtrip_rejects_invalid() {
        let code: CurrencyCode = serde_json::from_str("\"jpy\"").unwrap();
        assert_eq!(code.as_str(), "JPY");
        assert!(serde_json::from_str::<CurrencyCode>("\"12\"").is_err());
    }
}
