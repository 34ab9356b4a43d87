use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use skycast_core::{
    Config, Coordinates, OpenWeatherClient,
    dispatch::{credential_preview, looks_like_api_key},
};

/// San Francisco, used as the current-weather probe in `diagnose`.
const PROBE_COORDS: Coordinates = Coordinates {
    lat: 37.7749,
    lon: -122.4194,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather data CLI (JSON output)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current conditions for a location.
    Current {
        /// Location name, e.g. "London, UK".
        location: String,
    },

    /// 3-hour forecast samples for a location.
    Hourly {
        location: String,
    },

    /// Daily forecast (native, or synthesized from 3-hour samples).
    Daily {
        location: String,

        /// Number of days to return.
        #[arg(long, default_value_t = 5)]
        days: usize,
    },

    /// Geocoding candidates for a query.
    Geocode {
        query: String,
    },

    /// Check the configured API key against the weather and geocoding endpoints.
    Diagnose {
        /// Location used for the geocoding probe.
        #[arg(long, default_value = "London")]
        location: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        let output = match self.command {
            Command::Diagnose { location } => diagnose(&config, &location).await?,
            Command::Current { location } => {
                let client = client(&config)?;
                let (weather, candidates) = client.weather_for_location(&location).await?;
                json!({
                    "location": candidates.first().map(|c| c.display_name()),
                    "current": weather,
                })
            }
            Command::Hourly { location } => {
                let client = client(&config)?;
                let coords = best_match(&client, &location).await?;
                serde_json::to_value(client.hourly_forecast(coords, true).await?)?
            }
            Command::Daily { location, days } => {
                let client = client(&config)?;
                let coords = best_match(&client, &location).await?;
                serde_json::to_value(client.daily_forecast(coords, days, true).await?)?
            }
            Command::Geocode { query } => {
                let client = client(&config)?;
                serde_json::to_value(client.resolve_location(&query).await?)?
            }
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

fn client(config: &Config) -> Result<OpenWeatherClient> {
    config.api_key()?;
    Ok(OpenWeatherClient::from_config(config)?)
}

async fn best_match(client: &OpenWeatherClient, location: &str) -> Result<Coordinates> {
    let candidates = client.resolve_location(location).await?;
    let best = candidates
        .first()
        .with_context(|| format!("No candidates for '{location}'"))?;
    tracing::info!(location = %best.display_name(), "resolved location");
    Ok(best.coordinates())
}

async fn diagnose(config: &Config, location: &str) -> Result<serde_json::Value> {
    let key = config.api_key()?;

    let mut report = json!({
        "key_preview": credential_preview(key),
        "key_length": key.chars().count(),
        "key_shape_ok": looks_like_api_key(key),
    });

    let client = client(config)?;

    report["current_weather"] = match client.current_weather(PROBE_COORDS, false).await {
        Ok(weather) => json!({ "ok": true, "location": weather.location_name }),
        Err(err) => json!({ "ok": false, "error": err.to_string(), "status": err.status() }),
    };

    report["geocoding"] = match client.resolve_location(location).await {
        Ok(candidates) => json!({
            "ok": true,
            "candidates": candidates.iter().take(3).map(|c| c.display_name()).collect::<Vec<_>>(),
        }),
        Err(err) => json!({ "ok": false, "error": err.to_string(), "status": err.status() }),
    };

    Ok(report)
}
