//! Location queries and device position lookup.
//!
//! A [`LocationQuery`] is whatever drives the weather fetch: either the text
//! the user typed or a `"lat,lon"` pair from [`IpGeolocator`]. The geolocator
//! stands in for a device GPS and asks ip-api.com where the caller is.

use crate::config::LocationConfig;
use crate::error::{GeolocationError, QueryError};
use reqwest::Client;
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct LocationQuery {
    pub value: String,
    pub is_coordinates: bool,
}

impl LocationQuery {
    /// Builds a query from user input. Surrounding whitespace is dropped;
    /// input that is empty after trimming is rejected.
    pub fn manual(text: &str) -> Result<Self, QueryError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QueryError::EmptyInput);
        }
        Ok(Self {
            value: trimmed.to_string(),
            is_coordinates: false,
        })
    }

    pub fn coordinates(position: Position) -> Self {
        Self {
            value: format!("{},{}", position.latitude, position.longitude),
            is_coordinates: true,
        }
    }

    /// The form of the query that goes into the request path. Place names are
    /// percent-encoded, coordinate pairs are already path-safe.
    pub fn path_segment(&self) -> Cow<'_, str> {
        if self.is_coordinates {
            Cow::Borrowed(self.value.as_str())
        } else {
            urlencoding::encode(&self.value)
        }
    }
}

/// Latitude and longitude in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: Client,
    url: String,
}

// Subset of the ip-api.com JSON reply. A failed lookup carries `status: "fail"`
// and a `message` instead of coordinates.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpGeolocator {
    /// Returns `None` when geolocation is switched off, which the resolver
    /// treats as a device without geolocation support. A client that cannot
    /// be built counts the same way.
    pub fn from_config(config: &LocationConfig) -> Option<Self> {
        if !config.geolocation {
            return None;
        }
        let client = match Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Could not build geolocation client: {}", e);
                return None;
            }
        };

        let base = config.service_url.trim_end_matches('/');
        let url = match config.lookup_ip.trim() {
            "" => base.to_string(),
            ip => format!("{}/{}", base, ip),
        };
        Some(Self { client, url })
    }

    /// Resolves the current position.
    ///
    /// An empty `lookup_ip` asks the service about the caller's own public
    /// address. Connection failures, HTTP errors, `fail` replies and missing
    /// coordinates come back as [`GeolocationError::Denied`]; expiry of the
    /// configured timeout is [`GeolocationError::TimedOut`]. There is no
    /// fallback position.
    pub async fn current_position(&self) -> Result<Position, GeolocationError> {
        let result = self.lookup().await;
        match &result {
            Ok(position) => info!(
                "Geolocation successful - ({}, {})",
                position.latitude, position.longitude
            ),
            Err(e) => warn!("Error using geolocation service: {}", e),
        }
        result
    }

    async fn lookup(&self) -> Result<Position, GeolocationError> {
        let res = self
            .client
            .get(&self.url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(request_error)?;

        let status = res.status();
        if !status.is_success() {
            return Err(GeolocationError::Denied(format!(
                "service returned HTTP {}",
                status.as_u16()
            )));
        }

        let reply: IpApiResponse = res.json().await.map_err(request_error)?;
        reply.into_position()
    }
}

impl IpApiResponse {
    fn into_position(self) -> Result<Position, GeolocationError> {
        if self.status != "success" {
            let reason = self.message.unwrap_or_else(|| self.status.clone());
            return Err(GeolocationError::Denied(format!("lookup failed: {}", reason)));
        }
        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Ok(Position { latitude, longitude }),
            _ => Err(GeolocationError::Denied(
                "reply has no coordinates".to_string(),
            )),
        }
    }
}

fn request_error(e: reqwest::Error) -> GeolocationError {
    if e.is_timeout() {
        GeolocationError::TimedOut
    } else {
        GeolocationError::Denied(e.to_string())
    }
}
