use super::*;
use crate::cache::ManualClock;
use chrono::{NaiveDate, TimeZone};
use serde_json::{Value, json};
use std::time::Duration as StdDuration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "0123456789abcdef0123456789abcdef";

// 2024-06-01T00:00:00Z
const JUNE_FIRST: i64 = 1_717_200_000;

fn sf() -> Coordinates {
    Coordinates::new(37.7749, -122.4194)
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    ))
}

fn client(server: &MockServer, clock: Arc<ManualClock>) -> OpenWeatherClient {
    let config = Config {
        api_key: Some(KEY.to_string()),
        base_url: server.uri(),
        day_boundary: DayBoundary::Location,
        ..Config::default()
    };
    OpenWeatherClient::from_config_with_clock(&config, clock).unwrap()
}

fn current_body(name: &str, temp: f64) -> Value {
    json!({
        "coord": { "lon": -122.4194, "lat": 37.7749 },
        "weather": [{ "id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d" }],
        "base": "stations",
        "main": {
            "temp": temp, "feels_like": temp - 0.7, "temp_min": temp - 2.0, "temp_max": temp + 1.5,
            "pressure": 1015, "humidity": 72
        },
        "visibility": 10000,
        "wind": { "speed": 4.6, "deg": 270 },
        "clouds": { "all": 20 },
        "dt": JUNE_FIRST + 3600,
        "sys": {
            "type": 2, "id": 2007646, "country": "US",
            "sunrise": JUNE_FIRST - 9000, "sunset": JUNE_FIRST + 43000
        },
        "timezone": -25200,
        "id": 5391959,
        "name": name,
        "cod": 200
    })
}

fn forecast_body(count: usize, tz_offset: i32) -> Value {
    let list: Vec<Value> = (0..count)
        .map(|i| {
            let pop = if i == 2 { 0.6 } else { 0.1 };
            let pressure = 1010 + i as u32;
            json!({
                "dt": JUNE_FIRST + 10_800 * i as i64,
                "main": {
                    "temp": 10.0 + i as f64, "feels_like": 9.0 + i as f64,
                    "temp_min": 9.0, "temp_max": 20.0, "pressure": pressure, "humidity": 60
                },
                "weather": [
                    { "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }
                ],
                "clouds": { "all": 5 },
                "wind": { "speed": 3.2, "deg": 200, "gust": 5.0 },
                "visibility": 10000,
                "pop": pop,
                "sys": { "pod": "d" },
                "dt_txt": "2024-06-01 00:00:00"
            })
        })
        .collect();

    json!({
        "cod": "200",
        "message": 0,
        "cnt": count,
        "list": list,
        "city": {
            "id": 2643743, "name": "Testville", "coord": { "lat": 37.7749, "lon": -122.4194 },
            "country": "US", "population": 1000, "timezone": tz_offset,
            "sunrise": JUNE_FIRST - 9000, "sunset": JUNE_FIRST + 43000
        }
    })
}

fn daily_body(count: usize) -> Value {
    let list: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "dt": JUNE_FIRST + 86_400 * i as i64 + 43_200,
                "sunrise": JUNE_FIRST + 86_400 * i as i64 + 20_000,
                "sunset": JUNE_FIRST + 86_400 * i as i64 + 70_000,
                "temp": {
                    "day": 20.0, "min": 12.0, "max": 23.0,
                    "night": 14.0, "eve": 18.0, "morn": 13.0
                },
                "feels_like": { "day": 19.0, "night": 13.0, "eve": 17.0, "morn": 12.0 },
                "pressure": 1012, "humidity": 55,
                "weather": [
                    { "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }
                ],
                "speed": 5.5, "deg": 250, "gust": 9.0, "clouds": 40, "pop": 0.35, "rain": 1.2
            })
        })
        .collect();

    json!({
        "city": { "id": 1, "name": "Testville", "country": "US", "timezone": 0 },
        "cod": "200",
        "message": 0.05,
        "cnt": count,
        "list": list
    })
}

fn geocode_body() -> Value {
    json!([
        { "name": "London", "lat": 51.5073, "lon": -0.1276, "country": "GB", "state": "England" },
        { "name": "London", "lat": 42.9834, "lon": -81.233, "country": "CA", "state": "Ontario" }
    ])
}

#[tokio::test]
async fn current_weather_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CURRENT_PATH))
        .and(query_param("lat", "37.7749"))
        .and(query_param("lon", "-122.4194"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("San Francisco", 18.5)))
        .expect(1)
        .mount(&server)
        .await;

    let weather = client(&server, clock())
        .current_weather(sf(), true)
        .await
        .unwrap();

    assert_eq!(weather.location_name, "San Francisco");
    assert_eq!(weather.temperature, 18.5);
    assert_eq!(weather.country_code.as_deref(), Some("US"));
    assert_eq!(weather.condition_code(), 801);
    assert_eq!(weather.timezone_offset_secs, -25200);
}

#[tokio::test]
async fn current_weather_served_from_cache_until_expiry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CURRENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("San Francisco", 18.5)))
        .expect(2)
        .mount(&server)
        .await;

    let clock = clock();
    let client = client(&server, clock.clone());

    client.current_weather(sf(), true).await.unwrap();
    client.current_weather(sf(), true).await.unwrap();

    clock.advance(Duration::seconds(600));
    client.current_weather(sf(), true).await.unwrap();
}

#[tokio::test]
async fn bypassing_cache_refetches_but_still_stores() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CURRENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("San Francisco", 18.5)))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server, clock());

    client.current_weather(sf(), false).await.unwrap();
    client.current_weather(sf(), false).await.unwrap();
    client.current_weather(sf(), true).await.unwrap();

    assert!(client.cache().get("current:37.7749,-122.4194").is_some());
}

#[tokio::test]
async fn failures_propagate_and_are_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CURRENT_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, clock());
    let err = client.current_weather(sf(), true).await.unwrap_err();

    assert_eq!(err, WeatherError::RateLimited);
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn hourly_forecast_parses_samples_and_city() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(40, 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, clock());
    let forecast = client.hourly_forecast(sf(), true).await.unwrap();
    let again = client.hourly_forecast(sf(), true).await.unwrap();

    assert_eq!(forecast.samples.len(), 40);
    assert_eq!(forecast, again);
    assert_eq!(forecast.samples[2].precipitation_probability, 0.6);
    assert!(forecast.samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

    let city = forecast.city.unwrap();
    assert_eq!(city.name, "Testville");
    assert_eq!(city.timezone_offset_secs, Some(3600));
}

#[tokio::test]
async fn daily_forecast_prefers_native_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DAILY_PATH))
        .and(query_param("cnt", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily_body(5)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(40, 0)))
        .expect(0)
        .mount(&server)
        .await;

    let daily = client(&server, clock())
        .daily_forecast(sf(), 3, true)
        .await
        .unwrap();

    assert_eq!(daily.source, DailySource::Native);
    assert_eq!(daily.len(), 3);
    assert_eq!(daily.days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    assert_eq!(daily.days[0].temp.max, 23.0);
    assert!(daily.days[0].sunrise.is_some());
}

#[tokio::test]
async fn daily_forecast_falls_back_to_aggregation_on_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DAILY_PATH))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"cod": 500, "message": "nope"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(24, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let daily = client(&server, clock())
        .daily_forecast(sf(), 3, true)
        .await
        .unwrap();

    assert_eq!(daily.source, DailySource::Synthesized);
    assert_eq!(daily.len(), 3);

    let dates: Vec<_> = daily.days.iter().map(|d| d.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        ]
    );

    let first = &daily.days[0];
    assert_eq!(first.temp.min, 10.0);
    assert_eq!(first.temp.max, 17.0);
    assert_eq!(first.temp.night, 17.0);
    assert_eq!(first.pressure, 1010);
    assert_eq!(first.precipitation_probability, 0.6);
    assert_eq!(daily.city.unwrap().name, "Testville");
}

#[tokio::test]
async fn daily_forecast_falls_back_when_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DAILY_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(16, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let daily = client(&server, clock())
        .daily_forecast(sf(), 2, true)
        .await
        .unwrap();

    assert_eq!(daily.source, DailySource::Synthesized);
    assert_eq!(daily.len(), 2);
}

#[tokio::test]
async fn daily_forecast_falls_back_when_native_call_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DAILY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(StdDuration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(8, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        api_key: Some(KEY.to_string()),
        base_url: server.uri(),
        timeout_secs: 1,
        day_boundary: DayBoundary::Location,
        ..Config::default()
    };
    let client = OpenWeatherClient::from_config_with_clock(&config, clock()).unwrap();
    assert_eq!(client.dispatcher().base_url(), server.uri());

    let daily = client.daily_forecast(sf(), 1, true).await.unwrap();

    assert_eq!(daily.source, DailySource::Synthesized);
    assert_eq!(daily.len(), 1);
}

#[tokio::test]
async fn daily_forecast_falls_back_on_invalid_credential_for_tier() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DAILY_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(40, 0)))
        .mount(&server)
        .await;

    let daily = client(&server, clock())
        .daily_forecast(sf(), 5, true)
        .await
        .unwrap();

    assert_eq!(daily.source, DailySource::Synthesized);
    assert_eq!(daily.len(), 5);
}

#[tokio::test]
async fn daily_fallback_failure_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DAILY_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client(&server, clock());
    let err = client.daily_forecast(sf(), 5, true).await.unwrap_err();

    assert_eq!(err, WeatherError::InvalidCredential);
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn daily_cache_key_includes_day_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DAILY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily_body(7)))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server, clock());

    let three = client.daily_forecast(sf(), 3, true).await.unwrap();
    let two = client.daily_forecast(sf(), 2, true).await.unwrap();
    let three_again = client.daily_forecast(sf(), 3, true).await.unwrap();

    assert_eq!(three.len(), 3);
    assert_eq!(two.len(), 2);
    assert_eq!(three, three_again);
}

#[tokio::test]
async fn zero_days_is_empty_without_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let daily = client(&server, clock())
        .daily_forecast(sf(), 0, true)
        .await
        .unwrap();

    assert!(daily.is_empty());
}

#[tokio::test]
async fn resolve_location_caches_by_original_lowercased_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "London, GB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, clock());

    let first = client.resolve_location("London, UK").await.unwrap();
    let second = client.resolve_location("london, uk").await.unwrap();

    assert_eq!(first, second);
    assert!(client.cache().get("geocode:london, uk").is_some());
}

#[tokio::test]
async fn geocoding_entries_outlive_default_ttl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body()))
        .expect(2)
        .mount(&server)
        .await;

    let clock = clock();
    let client = client(&server, clock.clone());

    client.resolve_location("London").await.unwrap();

    clock.advance(Duration::hours(23));
    client.resolve_location("London").await.unwrap();

    clock.advance(Duration::hours(1));
    client.resolve_location("London").await.unwrap();
}

#[tokio::test]
async fn weather_for_location_uses_best_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(geocode_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CURRENT_PATH))
        .and(query_param("lat", "51.5073"))
        .and(query_param("lon", "-0.1276"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("London", 12.0)))
        .expect(1)
        .mount(&server)
        .await;

    let (weather, candidates) = client(&server, clock())
        .weather_for_location("London")
        .await
        .unwrap();

    assert_eq!(weather.location_name, "London");
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].country, "GB");
}

#[tokio::test]
async fn weather_for_unknown_location_fails_without_weather_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(CURRENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Nowhere", 0.0)))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server, clock())
        .weather_for_location("Atlantis, Ocean")
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::LocationNotFound(_)));
}

#[tokio::test]
async fn cancelled_call_leaves_cache_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CURRENT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body("San Francisco", 18.5))
                .set_delay(StdDuration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client(&server, clock());
    let pending = client.current_weather(sf(), true);
    let outcome = tokio::time::timeout(StdDuration::from_millis(50), pending).await;

    assert!(outcome.is_err());
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn concurrent_same_key_calls_are_independent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CURRENT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body("San Francisco", 18.5))
                .set_delay(StdDuration::from_millis(50)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = Arc::new(client(&server, clock()));

    let (a, b) = tokio::join!(
        client.current_weather(sf(), true),
        client.current_weather(sf(), true)
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn usable_through_trait_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CURRENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("San Francisco", 18.5)))
        .mount(&server)
        .await;

    let provider: Box<dyn WeatherProvider> = Box::new(client(&server, clock()));
    let weather = provider.current_weather(sf(), true).await.unwrap();

    assert_eq!(weather.temperature, 18.5);
}
