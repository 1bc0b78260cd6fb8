use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;

use crate::error::FetchError;
use crate::rates::{RatesResponse, RawRateTable};

/// Which table to ask the upstream for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateRequest {
    Latest,
    Historical(NaiveDate),
}

impl RateRequest {
    /// Today's date maps to the latest rates, any other date to its historical table.
    pub fn for_date(date: Option<NaiveDate>) -> Self {
        match date {
            Some(date) if date != Utc::now().date_naive() => RateRequest::Historical(date),
            _ => RateRequest::Latest,
        }
    }

    pub fn parse_date(input: &str) -> Result<Self, FetchError> {
        let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
            .map_err(|_| FetchError::InvalidDate(input.to_string()))?;
        Ok(Self::for_date(Some(date)))
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self, request: RateRequest) -> Result<RawRateTable, FetchError>;
}

/// Client for the openexchangerates.org JSON API.
#[derive(Debug, Clone)]
pub struct OpenExchangeRates {
    client: Client,
    base_url: String,
    app_id: String,
}

impl OpenExchangeRates {
    pub fn new(base_url: &str, app_id: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(OpenExchangeRates {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
        })
    }

    pub fn url(&self, request: RateRequest) -> String {
        match request {
            RateRequest::Latest => {
                format!("{}/latest.json?app_id={}", self.base_url, self.app_id)
            }
            RateRequest::Historical(date) => format!(
                "{}/historical/{}.json?app_id={}",
                self.base_url,
                date.format("%Y-%m-%d"),
                self.app_id
            ),
        }
    }
}

#[async_trait]
impl RateSource for OpenExchangeRates {
    async fn fetch(&self, request: RateRequest) -> Result<RawRateTable, FetchError> {
        let url = self.url(request);
        log::debug!("Fetching {:?}", request);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let body: RatesResponse = resp.json().await?;
        RawRateTable::from_response(body)
    }
}
