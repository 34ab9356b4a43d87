//! Daily summaries synthesized from 3-hour forecast samples.
//!
//! Used when the native daily endpoint is unavailable. Per-field rules:
//! temperatures are mean/min/max over the day, night/morning/evening come
//! from the last/first/second-to-last sample, state fields (pressure,
//! humidity, wind, clouds, condition) come from the first sample, and
//! precipitation probability is the day's maximum.

use chrono::{NaiveDate, TimeZone};
use std::collections::BTreeMap;

use crate::model::{
    DailyFeelsLike, DailyForecast, DailySource, DailySummary, DailyTemperatures, ForecastCity,
    HourlySample,
};

/// Samples per day at a 3-hour cadence.
pub const SAMPLES_PER_DAY: usize = 8;

/// Collapse `samples` into at most `days` per-date summaries.
///
/// Only the first `days * SAMPLES_PER_DAY` samples are considered. Dates are
/// taken in `tz`. Cadence and ordering are trusted, not validated.
pub fn aggregate_daily<Tz: TimeZone>(
    samples: &[HourlySample],
    days: usize,
    tz: &Tz,
) -> Vec<DailySummary> {
    let window = days.saturating_mul(SAMPLES_PER_DAY);

    let mut buckets: BTreeMap<NaiveDate, Vec<&HourlySample>> = BTreeMap::new();
    for sample in samples.iter().take(window) {
        let date = sample.timestamp.with_timezone(tz).date_naive();
        buckets.entry(date).or_default().push(sample);
    }

    buckets
        .into_iter()
        .take(days)
        .filter_map(|(date, day)| summarize_day(date, &day))
        .collect()
}

/// Wrap [`aggregate_daily`] output as a synthesized [`DailyForecast`].
pub fn synthesize_forecast<Tz: TimeZone>(
    city: Option<ForecastCity>,
    samples: &[HourlySample],
    days: usize,
    tz: &Tz,
) -> DailyForecast {
    DailyForecast {
        city,
        source: DailySource::Synthesized,
        days: aggregate_daily(samples, days, tz),
    }
}

fn summarize_day(date: NaiveDate, day: &[&HourlySample]) -> Option<DailySummary> {
    let first = *day.first()?;

    let temps: Vec<f64> = day.iter().map(|s| s.temperature).collect();
    let feels: Vec<f64> = day.iter().map(|s| s.feels_like).collect();

    let (t_day, t_night, t_eve, t_morn) = day_night_eve_morn(&temps);
    let (f_day, f_night, f_eve, f_morn) = day_night_eve_morn(&feels);

    let precipitation_probability = day
        .iter()
        .map(|s| s.precipitation_probability)
        .fold(0.0_f64, f64::max);

    Some(DailySummary {
        date,
        temp: DailyTemperatures {
            day: t_day,
            min: temps.iter().copied().fold(f64::INFINITY, f64::min),
            max: temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            night: t_night,
            eve: t_eve,
            morn: t_morn,
        },
        feels_like: DailyFeelsLike {
            day: f_day,
            night: f_night,
            eve: f_eve,
            morn: f_morn,
        },
        pressure: first.pressure,
        humidity: first.humidity,
        wind_speed: first.wind_speed,
        wind_deg: first.wind_deg,
        cloud_cover: first.cloud_cover,
        precipitation_probability,
        condition: first.condition.clone(),
        sunrise: None,
        sunset: None,
    })
}

/// (mean, last, second-to-last or 0, first) over a non-empty series.
fn day_night_eve_morn(values: &[f64]) -> (f64, f64, f64, f64) {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let night = values[n - 1];
    let eve = if n > 1 { values[n - 2] } else { 0.0 };
    let morn = values[0];
    (mean, night, eve, morn)
}
