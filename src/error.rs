//! Error types shared by the resolver, the fetcher and the consent store.

/// Text shown in place of the weather panel whenever a fetch fails.
pub const FETCH_ERROR_MESSAGE: &str = "Could not load weather data.";

/// Failures while fetching or decoding weather data.
///
/// The UI never distinguishes between these; it shows
/// [`FETCH_ERROR_MESSAGE`] and the variant only ends up in the log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        FETCH_ERROR_MESSAGE
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::MalformedResponse(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Geolocation failures. None of these are fatal: they route the consent
/// flow to the denied state and the user falls back to manual search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("geolocation is not supported on this device")]
    Unavailable,
    #[error("geolocation denied: {0}")]
    Denied(String),
    #[error("geolocation request timed out")]
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("location query is empty")]
    EmptyInput,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
