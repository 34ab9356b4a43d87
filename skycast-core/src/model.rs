use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// WGS84 coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Rounded form used in cache keys (~11 m resolution).
    pub fn cache_fragment(&self) -> String {
        format!("{:.4},{:.4}", self.lat, self.lon)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// Primary condition reported by the provider for a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub code: u32,
    pub group: String,
    pub description: String,
    pub icon: String,
}

impl WeatherCondition {
    /// Placeholder used when the provider sends no condition entries.
    pub fn unknown() -> Self {
        Self {
            code: 0,
            group: "Unknown".to_string(),
            description: "Unknown".to_string(),
            icon: "01d".to_string(),
        }
    }
}

impl Default for WeatherCondition {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One geocoding candidate; lists are ordered by provider relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl GeocodingResult {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    pub fn display_name(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// Point-in-time reading from the current-conditions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: u32,
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_deg: u16,
    pub wind_gust: Option<f64>,
    pub cloud_cover: u8,
    pub visibility: Option<u32>,
    pub rain_1h: Option<f64>,
    pub snow_1h: Option<f64>,
    pub condition: WeatherCondition,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
    pub timezone_offset_secs: i32,
    pub location_name: String,
    pub country_code: Option<String>,
}

impl CurrentWeather {
    pub fn condition_code(&self) -> u32 {
        self.condition.code
    }

    pub fn condition_icon(&self) -> &str {
        &self.condition.icon
    }
}

/// Location metadata attached to forecast responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    pub name: String,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub timezone_offset_secs: Option<i32>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

/// One 3-hour forecast point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub pressure: u32,
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_deg: u16,
    pub wind_gust: Option<f64>,
    pub cloud_cover: u8,
    pub visibility: Option<u32>,
    /// Probability of precipitation in `[0, 1]`.
    pub precipitation_probability: f64,
    pub rain_3h: Option<f64>,
    pub snow_3h: Option<f64>,
    pub condition: WeatherCondition,
}

/// Chronological 3-hour samples, nominally 40 points over 5 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub city: Option<ForecastCity>,
    pub samples: Vec<HourlySample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyTemperatures {
    pub day: f64,
    pub min: f64,
    pub max: f64,
    pub night: f64,
    pub eve: f64,
    pub morn: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyFeelsLike {
    pub day: f64,
    pub night: f64,
    pub eve: f64,
    pub morn: f64,
}

/// Per-day summary, either native or synthesized from 3-hour samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub temp: DailyTemperatures,
    pub feels_like: DailyFeelsLike,
    pub pressure: u32,
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_deg: u16,
    pub cloud_cover: u8,
    pub precipitation_probability: f64,
    pub condition: WeatherCondition,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

/// Where a daily forecast came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DailySource {
    Native,
    Synthesized,
}

/// Ordered daily summaries; never longer than the requested day count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub city: Option<ForecastCity>,
    pub source: DailySource,
    pub days: Vec<DailySummary>,
}

impl DailyForecast {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
