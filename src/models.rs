use crate::error::FetchError;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Number of hourly entries kept from the provider's first forecast day.
pub const FORECAST_HOURS: usize = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub resolved_address: String,
    pub current: CurrentConditions,
    pub hours: Vec<HourlyForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64, // °C
    pub conditions: String,
    pub wind_speed: Option<f64>, // km/h
    pub humidity: Option<f64>,   // %
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub datetime: String,
    pub temp: f64,
    pub conditions: String,
    pub humidity: Option<f64>,
}

impl HourlyForecast {
    /// "HH:MM" label for the forecast strip.
    pub fn label(&self) -> String {
        match NaiveTime::parse_from_str(&self.datetime, "%H:%M:%S") {
            Ok(t) => t.format("%H:%M").to_string(),
            Err(_) => self.datetime.chars().take(5).collect(),
        }
    }
}

// Raw Visual Crossing timeline payload. Everything is optional here so that
// missing fields surface as MalformedResponse instead of a serde error deep
// in the body.
#[derive(Debug, Deserialize)]
pub struct TimelineResponse {
    #[serde(rename = "resolvedAddress")]
    pub resolved_address: Option<String>,
    #[serde(rename = "currentConditions")]
    pub current_conditions: Option<RawConditions>,
    #[serde(default)]
    pub days: Vec<RawDay>,
}

#[derive(Debug, Deserialize)]
pub struct RawConditions {
    pub temp: Option<f64>,
    pub conditions: Option<String>,
    pub windspeed: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RawDay {
    pub hours: Option<Vec<RawHour>>,
}

#[derive(Debug, Deserialize)]
pub struct RawHour {
    pub datetime: Option<String>,
    pub temp: Option<f64>,
    pub conditions: Option<String>,
    pub humidity: Option<f64>,
}

impl TryFrom<TimelineResponse> for WeatherSnapshot {
    type Error = FetchError;

    fn try_from(raw: TimelineResponse) -> Result<Self, Self::Error> {
        let resolved_address = raw.resolved_address.ok_or_else(|| missing("resolvedAddress"))?;

        let cc = raw
            .current_conditions
            .ok_or_else(|| missing("currentConditions"))?;
        let current = CurrentConditions {
            temp: cc.temp.ok_or_else(|| missing("currentConditions.temp"))?,
            conditions: cc
                .conditions
                .ok_or_else(|| missing("currentConditions.conditions"))?,
            wind_speed: cc.windspeed,
            humidity: cc.humidity,
        };

        // No days or no hours is a short forecast, not a broken response.
        let hours = raw
            .days
            .into_iter()
            .next()
            .and_then(|day| day.hours)
            .unwrap_or_default()
            .into_iter()
            .take(FORECAST_HOURS)
            .enumerate()
            .map(|(i, h)| -> Result<HourlyForecast, FetchError> {
                Ok(HourlyForecast {
                    datetime: h
                        .datetime
                        .ok_or_else(|| missing(&format!("days[0].hours[{i}].datetime")))?,
                    temp: h
                        .temp
                        .ok_or_else(|| missing(&format!("days[0].hours[{i}].temp")))?,
                    conditions: h.conditions.unwrap_or_default(),
                    humidity: h.humidity,
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        Ok(WeatherSnapshot {
            resolved_address,
            current,
            hours,
        })
    }
}

impl WeatherSnapshot {
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let raw: TimelineResponse = serde_json::from_str(body)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
        Self::try_from(raw)
    }
}

fn missing(field: &str) -> FetchError {
    FetchError::MalformedResponse(format!("missing field `{field}`"))
}
