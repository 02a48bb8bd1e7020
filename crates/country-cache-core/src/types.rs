//! Core type definitions for country-cache

use crate::error::CacheError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One country as returned by the metadata API (restcountries v2,
/// `?fields=name,capital,region,population,flag,currencies`).
#[derive(Debug, Clone, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub currencies: Vec<Currency>,
    /// Flag image URL
    #[serde(default)]
    pub flag: Option<String>,
}

impl CountryRecord {
    /// First listed currency code, if any
    pub fn currency_code(&self) -> Option<&str> {
        self.currencies.first().and_then(|c| c.code.as_deref())
    }
}

/// A currency entry attached to a country
#[derive(Debug, Clone, Deserialize)]
pub struct Currency {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Exchange-rate table from the rates API, units of foreign currency per 1 USD
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRates {
    pub base: String,
    pub rates: HashMap<String, f64>,
}

impl ExchangeRates {
    pub fn rate_for(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }
}

/// A country record after merging in exchange-rate data and the GDP estimate
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedCountry {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<u64>,
    pub currency_code: Option<String>,
    /// None when the rate table was absent or the code was unmapped
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: f64,
    pub flag_url: Option<String>,
}

/// A country row as persisted in the store
#[derive(Debug, Clone, Serialize)]
pub struct StoredCountry {
    pub id: i64,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: Option<i64>,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: f64,
    pub last_refreshed_at: DateTime<Utc>,
    pub flag_url: Option<String>,
}

/// Equality filters for the list operation, AND-combined
#[derive(Debug, Clone, Default)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency_code: Option<String>,
}

/// Columns exposed for descending sort on the list operation.
///
/// Caller-supplied sort keys are parsed into this allow-list; the raw
/// string is never interpolated into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Population,
    ExchangeRate,
    EstimatedGdp,
    LastRefreshedAt,
}

impl SortKey {
    /// The column this key maps to in the `countries` table
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Population => "population",
            SortKey::ExchangeRate => "exchange_rate",
            SortKey::EstimatedGdp => "estimated_gdp",
            SortKey::LastRefreshedAt => "last_refreshed_at",
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "population" => Ok(SortKey::Population),
            "exchange_rate" => Ok(SortKey::ExchangeRate),
            "estimated_gdp" => Ok(SortKey::EstimatedGdp),
            "last_refreshed_at" => Ok(SortKey::LastRefreshedAt),
            other => Err(CacheError::Validation(format!(
                "unsupported sort key: {other}"
            ))),
        }
    }
}

/// What the refresh pipeline does when an upstream fetch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpstreamPolicy {
    /// Continue with an empty country list / absent rate table
    #[default]
    Degrade,
    /// Abort the refresh with an upstream error
    Fail,
}

impl std::str::FromStr for UpstreamPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "degrade" => Ok(UpstreamPolicy::Degrade),
            "fail" => Ok(UpstreamPolicy::Fail),
            other => Err(CacheError::Validation(format!(
                "unknown upstream policy: {other} (expected 'degrade' or 'fail')"
            ))),
        }
    }
}
