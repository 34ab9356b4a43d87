use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, CurrentWeather, DailyForecast, GeocodingResult, HourlyForecast},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// The data-acquisition surface consumed by presentation layers.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(
        &self,
        coords: Coordinates,
        use_cache: bool,
    ) -> Result<CurrentWeather, WeatherError>;

    async fn hourly_forecast(
        &self,
        coords: Coordinates,
        use_cache: bool,
    ) -> Result<HourlyForecast, WeatherError>;

    async fn daily_forecast(
        &self,
        coords: Coordinates,
        days: usize,
        use_cache: bool,
    ) -> Result<DailyForecast, WeatherError>;

    async fn resolve_location(&self, query: &str) -> Result<Vec<GeocodingResult>, WeatherError>;

    async fn weather_for_location(
        &self,
        query: &str,
    ) -> Result<(CurrentWeather, Vec<GeocodingResult>), WeatherError>;
}

/// Construct a provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    config.api_key()?;

    let client = OpenWeatherClient::from_config(config)?;
    Ok(Box::new(client))
}
