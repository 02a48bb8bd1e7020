//! HTTP clients for the two upstream data sources
//!
//! Both clients return typed errors instead of silently substituting
//! empty data; the refresh pipeline decides whether a failure degrades
//! or aborts (see `UpstreamPolicy`).

use crate::error::{CacheError, Result};
use crate::types::{CountryRecord, ExchangeRates};
use reqwest::Client as ReqwestClient;

const COUNTRIES_URL: &str =
    "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies";
const RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Client for the country-metadata API
pub struct CountryApi {
    http: ReqwestClient,
    url: String,
}

impl CountryApi {
    pub fn new() -> Self {
        Self {
            http: ReqwestClient::new(),
            url: COUNTRIES_URL.to_string(),
        }
    }

    /// Override the endpoint URL (configuration and tests)
    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    /// Fetch all countries, in the order the source returns them.
    pub async fn fetch_countries(&self) -> Result<Vec<CountryRecord>> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CacheError::CountryUpstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::CountryUpstream(format!(
                "unexpected status {status}"
            )));
        }

        let countries = response
            .json::<Vec<CountryRecord>>()
            .await
            .map_err(|e| CacheError::CountryUpstream(format!("invalid payload: {e}")))?;

        tracing::debug!("Fetched {} countries", countries.len());
        Ok(countries)
    }
}

impl Default for CountryApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the exchange-rate API (base currency fixed to USD)
pub struct RatesApi {
    http: ReqwestClient,
    url: String,
}

impl RatesApi {
    pub fn new() -> Self {
        Self {
            http: ReqwestClient::new(),
            url: RATES_URL.to_string(),
        }
    }

    /// Override the endpoint URL (configuration and tests)
    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    /// Fetch the USD rate table.
    pub async fn fetch_rates(&self) -> Result<ExchangeRates> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CacheError::RatesUpstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::RatesUpstream(format!(
                "unexpected status {status}"
            )));
        }

        let rates = response
            .json::<ExchangeRates>()
            .await
            .map_err(|e| CacheError::RatesUpstream(format!("invalid payload: {e}")))?;

        tracing::debug!("Fetched {} exchange rates (base {})", rates.rates.len(), rates.base);
        Ok(rates)
    }
}

impl Default for RatesApi {
    fn default() -> Self {
        Self::new()
    }
}
