use thiserror::Error;

/// Closed failure taxonomy for every provider-facing operation.
///
/// The dispatcher maps transport and HTTP outcomes onto these variants; the
/// client and resolver only ever propagate them (or, for the native daily
/// endpoint, recover from them).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeatherError {
    #[error("Invalid or missing API key")]
    InvalidCredential,

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("API rate limit exceeded")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error (HTTP {status}): {message}")]
    Provider { status: u16, message: String },
}

impl WeatherError {
    /// HTTP status associated with the failure, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            WeatherError::InvalidCredential => Some(401),
            WeatherError::LocationNotFound(_) => Some(404),
            WeatherError::RateLimited => Some(429),
            WeatherError::Network(_) => None,
            WeatherError::Provider { status, .. } => Some(*status),
        }
    }

    /// Whether repeating the same call later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WeatherError::RateLimited | WeatherError::Network(_))
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries `appid`; never let it leak into a message.
        WeatherError::Network(err.without_url().to_string())
    }
}
