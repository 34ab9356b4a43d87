//! Core library for the `skycast` weather tools.
//!
//! This crate defines:
//! - A TTL cache with lazy expiration and an injectable clock
//! - Request dispatch with a closed error taxonomy
//! - Location resolution with alias normalization and a narrowing retry
//! - Daily summaries synthesized from 3-hour forecast samples
//! - The orchestrating client and the `WeatherProvider` abstraction
//!
//! It is used by `skycast-cli`, but presentation layers are free to consume it directly.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod geocode;
pub mod model;
pub mod provider;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use config::{Config, DayBoundary};
pub use dispatch::Dispatcher;
pub use error::WeatherError;
pub use model::{
    Coordinates, CurrentWeather, DailyForecast, DailySource, DailySummary, ForecastCity,
    GeocodingResult, HourlyForecast, HourlySample, WeatherCondition,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherClient, provider_from_config};
