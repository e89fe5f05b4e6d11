use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::location::LocationQuery;
use crate::models::WeatherSnapshot;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherProvider {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn request_url(&self, query: &LocationQuery) -> String {
        format!(
            "{}/{}?unitGroup=metric&key={}&include=hours,current",
            self.base_url,
            query.path_segment(),
            urlencoding::encode(&self.api_key)
        )
    }

    /// Fetches current conditions and the next hours of forecast for `query`.
    pub async fn fetch_weather(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        debug!("Fetching weather for {:?}", query);

        let result = self.fetch_inner(query).await;
        if let Err(ref e) = result {
            error!("Weather fetch for '{}' failed: {}", query.value, e);
        }
        result
    }

    async fn fetch_inner(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        let res = self.client.get(self.request_url(query)).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = res.text().await?;
        WeatherSnapshot::from_json(&body)
    }
}
