pub mod action;
pub mod alert;
pub mod client;
pub mod config;
pub mod convert;
pub mod currency;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod highlight;
pub mod normalize;
pub mod poller;
pub mod rates;
pub mod trend;

pub use convert::{ConversionResult, convert, convert_amount, convert_raw, parse_amount};
pub use currency::CurrencyCode;
pub use error::{ActionError, CurrencyError, FetchError, RateError};
pub use normalize::{NormalizedRateTable, normalize, normalize_code};
pub use rates::RawRateTable;
pub use trend::{Direction, classify};
