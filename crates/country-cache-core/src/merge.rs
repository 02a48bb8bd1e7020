//! Merge/estimate engine: country metadata + exchange rates -> enriched records

use crate::types::{CountryRecord, EnrichedCountry, ExchangeRates};
use rand::Rng;

/// Upper bound of the uniform multiplier in the GDP estimate.
///
/// `estimated_gdp = population * uniform(0, GDP_MULTIPLIER_MAX) / effective_rate`,
/// where the effective rate falls back to 1.0 when no usable rate exists.
/// A single constant applies whether or not the rate table was available,
/// so estimate magnitude never depends on upstream health.
pub const GDP_MULTIPLIER_MAX: f64 = 1600.0;

/// Merge fetched countries with the exchange-rate table.
///
/// Produces exactly one [`EnrichedCountry`] per input, in input order.
/// Individual records with missing optional fields still yield a
/// well-formed output; the estimate is always finite and non-negative.
/// Estimates use a fresh random multiplier per call, so they fluctuate
/// across refreshes.
pub fn merge(countries: &[CountryRecord], rates: Option<&ExchangeRates>) -> Vec<EnrichedCountry> {
    let mut rng = rand::thread_rng();
    countries
        .iter()
        .map(|country| enrich(country, rates, &mut rng))
        .collect()
}

fn enrich(
    country: &CountryRecord,
    rates: Option<&ExchangeRates>,
    rng: &mut impl Rng,
) -> EnrichedCountry {
    let currency_code = country.currency_code().map(str::to_string);

    let exchange_rate = match (rates, currency_code.as_deref()) {
        (Some(table), Some(code)) => table.rate_for(code),
        _ => None,
    };

    // Unmapped or non-positive rates fall back to 1.0 so the estimate
    // stays finite; null population counts as zero.
    let effective_rate = exchange_rate.filter(|r| *r > 0.0).unwrap_or(1.0);
    let population = country.population.unwrap_or(0) as f64;
    let multiplier: f64 = rng.gen_range(0.0..GDP_MULTIPLIER_MAX);

    EnrichedCountry {
        name: country.name.clone(),
        capital: country.capital.clone(),
        region: country.region.clone(),
        population: country.population,
        currency_code,
        exchange_rate,
        estimated_gdp: population * multiplier / effective_rate,
        flag_url: country.flag.clone(),
    }
}
