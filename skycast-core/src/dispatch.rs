//! HTTP dispatch against the provider: credential injection and status mapping.
//!
//! The dispatcher never retries. Retry and fallback policy lives in the
//! resolver and the client.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::WeatherError;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Issues authenticated GET calls and maps outcomes onto [`WeatherError`].
#[derive(Clone)]
pub struct Dispatcher {
    http: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.base_url)
            .field("api_key", &credential_preview(&self.api_key))
            .finish()
    }
}

impl Dispatcher {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Self::with_base_url(
            api_key,
            DEFAULT_BASE_URL,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(WeatherError::InvalidCredential);
        }

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Diagnostic-safe rendering of the configured key.
    pub fn credential_preview(&self) -> String {
        credential_preview(&self.api_key)
    }

    /// GET `path` with `params` (plus `appid`) and decode the JSON body into `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        debug!(path, key = %self.credential_preview(), "dispatching provider request");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if let Some(err) = error_for_status(status, &body) {
            debug!(path, status = status.as_u16(), error = %err, "provider request failed");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::Provider {
            status: status.as_u16(),
            message: format!("Malformed response body: {e}"),
        })
    }
}

/// Map a non-success status to the taxonomy; `None` for 2xx.
pub fn error_for_status(status: StatusCode, body: &str) -> Option<WeatherError> {
    if status.is_success() {
        return None;
    }

    let err = match status.as_u16() {
        401 => WeatherError::InvalidCredential,
        404 => WeatherError::LocationNotFound(provider_message(body)),
        429 => WeatherError::RateLimited,
        code => WeatherError::Provider {
            status: code,
            message: provider_message(body),
        },
    };

    Some(err)
}

/// First 8 and last 4 characters of a key, or `***` for short keys.
pub fn credential_preview(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }

    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Provider keys are 32 hexadecimal characters.
pub fn looks_like_api_key(key: &str) -> bool {
    key.len() == 32 && key.chars().all(|c| c.is_ascii_hexdigit())
}

fn provider_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let head: String = body.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}
