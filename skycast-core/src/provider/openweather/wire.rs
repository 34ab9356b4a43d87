//! JSON shapes returned by the provider and their conversion into domain models.
//!
//! Optional blocks (rain/snow volumes, sea/ground-level pressure, sunrise and
//! sunset, gusts) are tolerated when absent.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::model::{
    Coordinates, CurrentWeather, DailyFeelsLike, DailySummary, DailyTemperatures, ForecastCity,
    GeocodingResult, HourlySample, WeatherCondition,
};

#[derive(Debug, Deserialize)]
pub(crate) struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCondition {
    id: u32,
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwMain {
    temp: f64,
    feels_like: f64,
    #[serde(default)]
    temp_min: Option<f64>,
    #[serde(default)]
    temp_max: Option<f64>,
    #[serde(default)]
    pressure: u32,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OwWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: u16,
    gust: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OwClouds {
    #[serde(default)]
    all: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OwVolume {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCurrentResponse {
    coord: Option<OwCoord>,
    #[serde(default)]
    weather: Vec<OwCondition>,
    main: OwMain,
    visibility: Option<u32>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    rain: Option<OwVolume>,
    snow: Option<OwVolume>,
    dt: i64,
    #[serde(default)]
    sys: OwSys,
    #[serde(default)]
    timezone: i32,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwCity {
    #[serde(default)]
    name: String,
    country: Option<String>,
    coord: Option<OwCoord>,
    timezone: Option<i32>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwCondition>,
    #[serde(default)]
    clouds: OwClouds,
    #[serde(default)]
    wind: OwWind,
    visibility: Option<u32>,
    #[serde(default)]
    pop: f64,
    rain: Option<OwVolume>,
    snow: Option<OwVolume>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwForecastResponse {
    city: Option<OwCity>,
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwDailyTemp {
    day: f64,
    min: f64,
    max: f64,
    night: f64,
    eve: f64,
    morn: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwDailyFeelsLike {
    day: f64,
    night: f64,
    eve: f64,
    morn: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwDailyEntry {
    dt: i64,
    sunrise: Option<i64>,
    sunset: Option<i64>,
    temp: OwDailyTemp,
    feels_like: OwDailyFeelsLike,
    #[serde(default)]
    pressure: u32,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    weather: Vec<OwCondition>,
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: u16,
    #[serde(default)]
    clouds: u8,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwDailyResponse {
    city: Option<OwCity>,
    #[serde(default)]
    list: Vec<OwDailyEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwGeocodingEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    state: Option<String>,
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn primary_condition(list: Vec<OwCondition>) -> WeatherCondition {
    list.into_iter()
        .next()
        .map(|c| WeatherCondition {
            code: c.id,
            group: c.main,
            description: c.description,
            icon: c.icon,
        })
        .unwrap_or_default()
}

impl From<OwCoord> for Coordinates {
    fn from(c: OwCoord) -> Self {
        Coordinates::new(c.lat, c.lon)
    }
}

impl From<OwCity> for ForecastCity {
    fn from(c: OwCity) -> Self {
        ForecastCity {
            name: c.name,
            country: c.country,
            coordinates: c.coord.map(Coordinates::from),
            timezone_offset_secs: c.timezone,
            sunrise: c.sunrise.and_then(unix_to_utc),
            sunset: c.sunset.and_then(unix_to_utc),
        }
    }
}

impl From<OwGeocodingEntry> for GeocodingResult {
    fn from(g: OwGeocodingEntry) -> Self {
        GeocodingResult {
            name: g.name,
            country: g.country,
            state: g.state,
            lat: g.lat,
            lon: g.lon,
        }
    }
}

impl OwCurrentResponse {
    /// `requested` fills in coordinates when the provider omits `coord`.
    pub(crate) fn into_model(self, requested: Coordinates) -> CurrentWeather {
        CurrentWeather {
            coordinates: self.coord.map(Coordinates::from).unwrap_or(requested),
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            temp_min: self.main.temp_min.unwrap_or(self.main.temp),
            temp_max: self.main.temp_max.unwrap_or(self.main.temp),
            pressure: self.main.pressure,
            humidity: self.main.humidity,
            wind_speed: self.wind.speed,
            wind_deg: self.wind.deg,
            wind_gust: self.wind.gust,
            cloud_cover: self.clouds.all,
            visibility: self.visibility,
            rain_1h: self.rain.and_then(|r| r.one_hour),
            snow_1h: self.snow.and_then(|s| s.one_hour),
            condition: primary_condition(self.weather),
            sunrise: self.sys.sunrise.and_then(unix_to_utc),
            sunset: self.sys.sunset.and_then(unix_to_utc),
            observed_at: unix_to_utc(self.dt).unwrap_or_else(Utc::now),
            timezone_offset_secs: self.timezone,
            location_name: self.name,
            country_code: self.sys.country,
        }
    }
}

impl OwForecastResponse {
    pub(crate) fn into_parts(self) -> (Option<ForecastCity>, Vec<HourlySample>) {
        let samples = self
            .list
            .into_iter()
            .filter_map(|e| {
                Some(HourlySample {
                    timestamp: unix_to_utc(e.dt)?,
                    temperature: e.main.temp,
                    feels_like: e.main.feels_like,
                    pressure: e.main.pressure,
                    humidity: e.main.humidity,
                    wind_speed: e.wind.speed,
                    wind_deg: e.wind.deg,
                    wind_gust: e.wind.gust,
                    cloud_cover: e.clouds.all,
                    visibility: e.visibility,
                    precipitation_probability: e.pop.clamp(0.0, 1.0),
                    rain_3h: e.rain.and_then(|r| r.three_hours),
                    snow_3h: e.snow.and_then(|s| s.three_hours),
                    condition: primary_condition(e.weather),
                })
            })
            .collect();

        (self.city.map(ForecastCity::from), samples)
    }
}

impl OwDailyResponse {
    pub(crate) fn timezone_offset(&self) -> Option<i32> {
        self.city.as_ref().and_then(|c| c.timezone)
    }

    pub(crate) fn into_parts<Tz: TimeZone>(
        self,
        tz: &Tz,
    ) -> (Option<ForecastCity>, Vec<DailySummary>) {
        let days = self
            .list
            .into_iter()
            .filter_map(|e| {
                let date = unix_to_utc(e.dt)?.with_timezone(tz).date_naive();
                Some(DailySummary {
                    date,
                    temp: DailyTemperatures {
                        day: e.temp.day,
                        min: e.temp.min,
                        max: e.temp.max,
                        night: e.temp.night,
                        eve: e.temp.eve,
                        morn: e.temp.morn,
                    },
                    feels_like: DailyFeelsLike {
                        day: e.feels_like.day,
                        night: e.feels_like.night,
                        eve: e.feels_like.eve,
                        morn: e.feels_like.morn,
                    },
                    pressure: e.pressure,
                    humidity: e.humidity,
                    wind_speed: e.speed,
                    wind_deg: e.deg,
                    cloud_cover: e.clouds,
                    precipitation_probability: e.pop.clamp(0.0, 1.0),
                    condition: primary_condition(e.weather),
                    sunrise: e.sunrise.and_then(unix_to_utc),
                    sunset: e.sunset.and_then(unix_to_utc),
                })
            })
            .collect();

        (self.city.map(ForecastCity::from), days)
    }
}
