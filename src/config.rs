use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Environment variable that overrides `api.api_key` from config.toml.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// ip-api.com JSON endpoint; the lookup address is appended as a path segment.
pub const DEFAULT_GEOLOCATION_URL: &str = "http://ip-api.com/json";

pub const DEFAULT_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub location: LocationConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LocationConfig {
    pub geolocation: bool,  // false behaves like a device without geolocation
    pub lookup_ip: String,  // empty means "my own public address"
    pub service_url: String,
    pub timeout_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String, // SQLite file holding the consent flags
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_seconds: 10,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            geolocation: true,
            lookup_ip: String::new(),
            service_url: DEFAULT_GEOLOCATION_URL.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "weather_now.db".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 150 }
    }
}

impl Config {
    /// Loads config.toml from the working directory, creating a default one
    /// if it doesn't exist, then applies the API key from the environment.
    pub fn load() -> Self {
        let mut config = Self::load_from("config.toml");
        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());

        if config.api.api_key.is_empty() {
            warn!(
                "No API key configured. Set {} or api.api_key in config.toml.",
                API_KEY_ENV
            );
        }
        config
    }

    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if let Ok(content) = fs::read_to_string(path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    return Self::default();
                }
            }
        }

        let default_config = Self::default();

        // Save default config to disk for the user to edit later
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(path, toml_string).is_err() {
                    warn!("Could not write default {} to disk.", path.display());
                }
            }
            Err(e) => warn!("Could not serialize default config: {}", e),
        }

        info!("Loaded default configuration.");
        default_config
    }

    /// A non-blank value from the environment wins over the file.
    pub fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.api_key = key.trim().to_string();
        }
    }
}
