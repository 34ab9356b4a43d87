//! Free-text location resolution with country alias normalization and a
//! single narrowing retry.

use tracing::debug;

use crate::{
    dispatch::Dispatcher, error::WeatherError, model::GeocodingResult,
    provider::openweather::wire::OwGeocodingEntry,
};

pub const GEOCODING_PATH: &str = "/geo/1.0/direct";

/// Maximum candidates requested per geocoding call.
pub const CANDIDATE_LIMIT: u32 = 5;

/// Common spellings of country names mapped to the ISO code the provider expects.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("UK", "GB"),
    ("USA", "US"),
    ("United States", "US"),
    ("United Kingdom", "GB"),
];

/// Rewrite the trailing comma-separated token when it is a known alias.
///
/// Only a whole trailing token is replaced, so "Ukiah, CA" or
/// "Springfield, USAF Base" are left alone. Whitespace after the comma is kept.
pub fn normalize_query(query: &str) -> String {
    let Some(comma) = query.rfind(',') else {
        return query.to_string();
    };

    let (head, tail) = query.split_at(comma + 1);
    let token = tail.trim();
    let leading_ws = &tail[..tail.len() - tail.trim_start().len()];

    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(token))
        .map(|(_, iso)| format!("{head}{leading_ws}{iso}"))
        .unwrap_or_else(|| query.to_string())
}

/// The bare city part of a "city, region, country" query.
fn city_only(query: &str) -> Option<&str> {
    query
        .split_once(',')
        .map(|(city, _)| city.trim())
        .filter(|city| !city.is_empty())
}

/// Resolves location text into ranked candidates via the provider.
#[derive(Debug, Clone, Copy)]
pub struct GeocodingResolver<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> GeocodingResolver<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Never returns an empty list; no candidates means `LocationNotFound`.
    /// HTTP failures propagate without retry.
    pub async fn resolve(&self, query: &str) -> Result<Vec<GeocodingResult>, WeatherError> {
        let normalized = normalize_query(query);
        let mut candidates = self.lookup(&normalized).await?;

        if candidates.is_empty() {
            if let Some(city) = city_only(query) {
                debug!(query, city, "no geocoding candidates, retrying with city only");
                candidates = self.lookup(city).await?;
            }
        }

        if candidates.is_empty() {
            return Err(WeatherError::LocationNotFound(query.to_string()));
        }

        Ok(candidates)
    }

    async fn lookup(&self, q: &str) -> Result<Vec<GeocodingResult>, WeatherError> {
        let entries: Vec<OwGeocodingEntry> = self
            .dispatcher
            .call(
                GEOCODING_PATH,
                &[("q", q.to_string()), ("limit", CANDIDATE_LIMIT.to_string())],
            )
            .await?;

        Ok(entries.into_iter().map(GeocodingResult::from).collect())
    }
}
