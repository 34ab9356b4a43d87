use async_trait::async_trait;
use chrono::{Duration, FixedOffset, Local, Utc};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::{
    aggregate::synthesize_forecast,
    cache::{Clock, SystemClock, TtlCache},
    config::{Config, DayBoundary},
    dispatch::Dispatcher,
    error::WeatherError,
    geocode::GeocodingResolver,
    model::{
        Coordinates, CurrentWeather, DailyForecast, DailySource, ForecastCity, GeocodingResult,
        HourlyForecast,
    },
};

use super::WeatherProvider;

pub(crate) mod wire;

use wire::{OwCurrentResponse, OwDailyResponse, OwForecastResponse};

pub const CURRENT_PATH: &str = "/data/2.5/weather";
pub const FORECAST_PATH: &str = "/data/2.5/forecast";
pub const DAILY_PATH: &str = "/data/2.5/forecast/daily";

/// Default TTL for geocoding candidates: names map to coordinates stably.
pub const GEOCODE_TTL_SECS: i64 = 86_400;

/// Everything the client memoizes, under one key space.
#[derive(Debug, Clone)]
pub enum CachedPayload {
    Current(CurrentWeather),
    Hourly(HourlyForecast),
    Daily(DailyForecast),
    Geocode(Vec<GeocodingResult>),
}

/// Orchestrates dispatch, caching, geocoding and daily synthesis.
#[derive(Debug)]
pub struct OpenWeatherClient {
    dispatcher: Dispatcher,
    cache: Arc<TtlCache<CachedPayload>>,
    geocode_ttl: Duration,
    day_boundary: DayBoundary,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Ok(Self::with_cache(
            Dispatcher::new(api_key)?,
            Arc::new(TtlCache::default()),
        ))
    }

    /// Build from an explicit dispatcher and an injected cache.
    pub fn with_cache(dispatcher: Dispatcher, cache: Arc<TtlCache<CachedPayload>>) -> Self {
        Self {
            dispatcher,
            cache,
            geocode_ttl: Duration::seconds(GEOCODE_TTL_SECS),
            day_boundary: DayBoundary::Local,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    pub fn from_config_with_clock(
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WeatherError> {
        let key = config.api_key.clone().unwrap_or_default();
        let dispatcher = Dispatcher::with_base_url(key, &config.base_url, config.timeout())?;
        let cache = Arc::new(TtlCache::with_clock(config.cache_ttl(), clock));

        Ok(Self::with_cache(dispatcher, cache)
            .geocode_ttl(config.geocode_ttl())
            .day_boundary(config.day_boundary))
    }

    pub fn geocode_ttl(mut self, ttl: Duration) -> Self {
        self.geocode_ttl = ttl;
        self
    }

    pub fn day_boundary(mut self, boundary: DayBoundary) -> Self {
        self.day_boundary = boundary;
        self
    }

    pub fn cache(&self) -> &Arc<TtlCache<CachedPayload>> {
        &self.cache
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[instrument(skip(self))]
    pub async fn current_weather(
        &self,
        coords: Coordinates,
        use_cache: bool,
    ) -> Result<CurrentWeather, WeatherError> {
        let key = format!("current:{}", coords.cache_fragment());

        if use_cache && let Some(CachedPayload::Current(hit)) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            return Ok(hit);
        }

        let raw: OwCurrentResponse = self
            .dispatcher
            .call(CURRENT_PATH, &coord_params(coords))
            .await?;
        let weather = raw.into_model(coords);

        self.cache.set(key, CachedPayload::Current(weather.clone()), None);
        Ok(weather)
    }

    #[instrument(skip(self))]
    pub async fn hourly_forecast(
        &self,
        coords: Coordinates,
        use_cache: bool,
    ) -> Result<HourlyForecast, WeatherError> {
        let key = format!("hourly:{}", coords.cache_fragment());

        if use_cache && let Some(CachedPayload::Hourly(hit)) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            return Ok(hit);
        }

        let raw: OwForecastResponse = self
            .dispatcher
            .call(FORECAST_PATH, &coord_params(coords))
            .await?;
        let (city, samples) = raw.into_parts();
        let forecast = HourlyForecast { city, samples };

        self.cache.set(key, CachedPayload::Hourly(forecast.clone()), None);
        Ok(forecast)
    }

    /// Native daily forecast, or one synthesized from 3-hour samples when the
    /// native endpoint fails for any reason.
    #[instrument(skip(self))]
    pub async fn daily_forecast(
        &self,
        coords: Coordinates,
        days: usize,
        use_cache: bool,
    ) -> Result<DailyForecast, WeatherError> {
        let key = format!("daily:{}:{}", coords.cache_fragment(), days);

        if use_cache && let Some(CachedPayload::Daily(hit)) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            return Ok(hit);
        }

        if days == 0 {
            return Ok(DailyForecast {
                city: None,
                source: DailySource::Synthesized,
                days: Vec::new(),
            });
        }

        let forecast = match self.native_daily(coords, days).await {
            Ok(native) => native,
            Err(err) => {
                warn!(error = %err, "native daily forecast unavailable, aggregating 3-hour data");
                let hourly = self.hourly_forecast(coords, use_cache).await?;
                self.synthesize(hourly, days)
            }
        };

        self.cache.set(key, CachedPayload::Daily(forecast.clone()), None);
        Ok(forecast)
    }

    /// Candidates for `query`, cached by the original lowercased text.
    #[instrument(skip(self))]
    pub async fn resolve_location(
        &self,
        query: &str,
    ) -> Result<Vec<GeocodingResult>, WeatherError> {
        let key = format!("geocode:{}", query.to_lowercase());

        if let Some(CachedPayload::Geocode(hit)) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            return Ok(hit);
        }

        let candidates = GeocodingResolver::new(&self.dispatcher).resolve(query).await?;

        self.cache.set(
            key,
            CachedPayload::Geocode(candidates.clone()),
            Some(self.geocode_ttl),
        );
        Ok(candidates)
    }

    /// Resolve `query` and fetch current weather for the best candidate.
    #[instrument(skip(self))]
    pub async fn weather_for_location(
        &self,
        query: &str,
    ) -> Result<(CurrentWeather, Vec<GeocodingResult>), WeatherError> {
        let candidates = self.resolve_location(query).await?;
        let best = candidates
            .first()
            .ok_or_else(|| WeatherError::LocationNotFound(query.to_string()))?;

        let weather = self.current_weather(best.coordinates(), true).await?;
        Ok((weather, candidates))
    }

    async fn native_daily(
        &self,
        coords: Coordinates,
        days: usize,
    ) -> Result<DailyForecast, WeatherError> {
        let mut params = coord_params(coords);
        params.push(("cnt", days.to_string()));

        let raw: OwDailyResponse = self.dispatcher.call(DAILY_PATH, &params).await?;

        let offset = raw.timezone_offset().and_then(FixedOffset::east_opt);
        let (city, mut summaries) = match (self.day_boundary, offset) {
            (DayBoundary::Local, _) => raw.into_parts(&Local),
            (DayBoundary::Location, Some(tz)) => raw.into_parts(&tz),
            (DayBoundary::Location, None) => raw.into_parts(&Utc),
        };
        summaries.truncate(days);

        Ok(DailyForecast {
            city,
            source: DailySource::Native,
            days: summaries,
        })
    }

    fn synthesize(&self, hourly: HourlyForecast, days: usize) -> DailyForecast {
        let HourlyForecast { city, samples } = hourly;
        let offset = location_offset(city.as_ref());

        match (self.day_boundary, offset) {
            (DayBoundary::Local, _) => synthesize_forecast(city, &samples, days, &Local),
            (DayBoundary::Location, Some(tz)) => synthesize_forecast(city, &samples, days, &tz),
            (DayBoundary::Location, None) => synthesize_forecast(city, &samples, days, &Utc),
        }
    }
}

fn location_offset(city: Option<&ForecastCity>) -> Option<FixedOffset> {
    city.and_then(|c| c.timezone_offset_secs)
        .and_then(FixedOffset::east_opt)
}

fn coord_params(coords: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("lat", coords.lat.to_string()),
        ("lon", coords.lon.to_string()),
        ("units", "metric".to_string()),
    ]
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_weather(
        &self,
        coords: Coordinates,
        use_cache: bool,
    ) -> Result<CurrentWeather, WeatherError> {
        OpenWeatherClient::current_weather(self, coords, use_cache).await
    }

    async fn hourly_forecast(
        &self,
        coords: Coordinates,
        use_cache: bool,
    ) -> Result<HourlyForecast, WeatherError> {
        OpenWeatherClient::hourly_forecast(self, coords, use_cache).await
    }

    async fn daily_forecast(
        &self,
        coords: Coordinates,
        days: usize,
        use_cache: bool,
    ) -> Result<DailyForecast, WeatherError> {
        OpenWeatherClient::daily_forecast(self, coords, days, use_cache).await
    }

    async fn resolve_location(&self, query: &str) -> Result<Vec<GeocodingResult>, WeatherError> {
        OpenWeatherClient::resolve_location(self, query).await
    }

    async fn weather_for_location(
        &self,
        query: &str,
    ) -> Result<(CurrentWeather, Vec<GeocodingResult>), WeatherError> {
        OpenWeatherClient::weather_for_location(self, query).await
    }
}

#[cfg(test)]
mod tests;
