//! Weather enrichment.
//!
//! Weather is advisory context for the prompt, never a hard dependency: every
//! failure path ends in a `WeatherSummary` with `source_unavailable` set.
//! The provider sits behind `WeatherProvider`; `OpenWeatherMapClient` is the
//! production implementation.

use crate::config::Config;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// User-Agent string sent to the weather provider
const USER_AGENT: &str = concat!("itinera/", env!("CARGO_PKG_VERSION"));

/// Default timeout for HTTP requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Dates this close to today get current conditions instead of a forecast
const CURRENT_WINDOW_DAYS: i64 = 1;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid weather URL: {0}")]
    InvalidUrl(String),
    #[error("malformed weather payload: {0}")]
    Malformed(String),
    #[error("no forecast available for {0}")]
    NoForecast(NaiveDate),
}

/// Why a summary carries no weather
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    NoDestination,
    MissingCredential,
    HorizonExceeded,
    ProviderFailure,
}

/// Normalised weather context for one destination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSummary {
    /// The place that was asked about
    pub destination: String,
    /// Provider's description, e.g. "light rain"
    pub condition_text: String,
    pub temperature_c: Option<f64>,
    /// True when this is a forecast for `observed_for` rather than current conditions
    pub forecast_available: bool,
    pub source_unavailable: bool,
    /// Provider's own label for the place, e.g. "Paris, FR"
    pub reported_location: Option<String>,
    pub observed_for: Option<NaiveDate>,
    pub unavailable_reason: Option<UnavailableReason>,
}

impl WeatherSummary {
    /// The "omit weather context" sentinel
    pub fn unavailable(destination: &str, reason: UnavailableReason) -> Self {
        Self {
            destination: destination.to_string(),
            condition_text: String::new(),
            temperature_c: None,
            forecast_available: false,
            source_unavailable: true,
            reported_location: None,
            observed_for: None,
            unavailable_reason: Some(reason),
        }
    }

    fn observed(destination: &str, observation: Observation, day: Option<NaiveDate>) -> Self {
        Self {
            destination: destination.to_string(),
            condition_text: observation.condition,
            temperature_c: Some(observation.temperature_c),
            forecast_available: day.is_some(),
            source_unavailable: false,
            reported_location: Some(observation.location),
            observed_for: day,
            unavailable_reason: None,
        }
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> Option<String> {
        self.temperature_c.map(|t| format!("{t:.1}°C"))
    }

    /// Best available name for the place
    pub fn location(&self) -> &str {
        self.reported_location.as_deref().unwrap_or(&self.destination)
    }
}

/// A single reading from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub location: String,
    pub condition: String,
    pub temperature_c: f64,
}

/// Source of current conditions and short-range forecasts
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, place: &str) -> Result<Observation, WeatherError>;
    async fn forecast(&self, place: &str, date: NaiveDate) -> Result<Observation, WeatherError>;
}

/// Which lookup a requested date calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherWindow {
    Current,
    Forecast(NaiveDate),
    OutOfRange,
}

/// Decide between current conditions, a forecast, or nothing.
///
/// Dates within a day of `today` count as current; dates up to the horizon get
/// a forecast; past dates and dates beyond the horizon are out of range.
pub fn classify_window(
    date: Option<NaiveDate>,
    today: NaiveDate,
    horizon_days: u32,
) -> WeatherWindow {
    let Some(date) = date else {
        return WeatherWindow::Current;
    };

    let offset = (date - today).num_days();
    if offset.abs() <= CURRENT_WINDOW_DAYS {
        WeatherWindow::Current
    } else if offset > 0 && offset <= i64::from(horizon_days) {
        WeatherWindow::Forecast(date)
    } else {
        WeatherWindow::OutOfRange
    }
}

/// Turns a destination and optional date into a `WeatherSummary`.
pub struct WeatherEnricher {
    provider: Option<Box<dyn WeatherProvider>>,
    horizon_days: u32,
}

impl WeatherEnricher {
    pub fn new(provider: Option<Box<dyn WeatherProvider>>, horizon_days: u32) -> Self {
        Self {
            provider,
            horizon_days,
        }
    }

    /// OpenWeatherMap when a weather key is configured, otherwise disabled
    pub fn from_config(config: &Config) -> Self {
        let provider: Option<Box<dyn WeatherProvider>> = match config.weather_key() {
            Some(key) => match OpenWeatherMapClient::new(&config.weather.base_url, key) {
                Ok(client) => Some(Box::new(client)),
                Err(e) => {
                    warn!(error = %e, "weather client unavailable, continuing without weather");
                    None
                }
            },
            None => {
                debug!("no weather key configured, weather enrichment disabled");
                None
            }
        };

        Self::new(provider, config.weather.forecast_horizon_days)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Fetch weather for a destination, relative to today's UTC date
    pub async fn fetch_weather(
        &self,
        destination: &str,
        date: Option<NaiveDate>,
    ) -> WeatherSummary {
        self.fetch_weather_on(destination, date, Utc::now().date_naive())
            .await
    }

    /// Fetch weather for a destination as of `today`. Never fails.
    pub async fn fetch_weather_on(
        &self,
        destination: &str,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> WeatherSummary {
        let destination = destination.trim();
        if destination.is_empty() {
            return WeatherSummary::unavailable(destination, UnavailableReason::NoDestination);
        }

        let Some(provider) = &self.provider else {
            return WeatherSummary::unavailable(destination, UnavailableReason::MissingCredential);
        };

        let result = match classify_window(date, today, self.horizon_days) {
            WeatherWindow::Current => provider
                .current(destination)
                .await
                .map(|obs| WeatherSummary::observed(destination, obs, None)),
            WeatherWindow::Forecast(day) => provider
                .forecast(destination, day)
                .await
                .map(|obs| WeatherSummary::observed(destination, obs, Some(day))),
            WeatherWindow::OutOfRange => {
                debug!(
                    destination,
                    ?date,
                    horizon_days = self.horizon_days,
                    "date outside forecast horizon"
                );
                return WeatherSummary::unavailable(destination, UnavailableReason::HorizonExceeded);
            }
        };

        match result {
            Ok(summary) => {
                debug!(
                    destination,
                    condition = %summary.condition_text,
                    forecast = summary.forecast_available,
                    "weather enrichment succeeded"
                );
                summary
            }
            Err(e) => {
                warn!(destination, error = %e, "weather lookup failed, omitting weather");
                WeatherSummary::unavailable(destination, UnavailableReason::ProviderFailure)
            }
        }
    }
}

/// OpenWeatherMap 2.5 API client (current weather + 5 day / 3 hour forecast)
pub struct OpenWeatherMapClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherMapClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str, place: &str) -> Result<Url, WeatherError> {
        let url = format!("{}/{}", self.base_url, path);
        Url::parse_with_params(
            &url,
            &[
                ("q", place),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ],
        )
        .map_err(|e| WeatherError::InvalidUrl(e.to_string()))
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, WeatherError> {
        // The key travels in the query string, keep it out of error messages
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WeatherError::Request(e.without_url()))?;
        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Request(e.without_url()))?;

        serde_json::from_str(&body).map_err(|e| WeatherError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapClient {
    async fn current(&self, place: &str) -> Result<Observation, WeatherError> {
        let url = self.endpoint("weather", place)?;
        let data: owm::CurrentResponse = self.fetch(url).await?;

        Ok(Observation {
            location: owm::location_label(&data.name, data.sys.and_then(|s| s.country)),
            condition: owm::description(&data.weather)?,
            temperature_c: data.main.temp,
        })
    }

    async fn forecast(&self, place: &str, date: NaiveDate) -> Result<Observation, WeatherError> {
        let url = self.endpoint("forecast", place)?;
        let data: owm::ForecastResponse = self.fetch(url).await?;

        let slot = owm::pick_slot(&data.list, date).ok_or(WeatherError::NoForecast(date))?;

        Ok(Observation {
            location: owm::location_label(&data.city.name, data.city.country.clone()),
            condition: owm::description(&slot.weather)?,
            temperature_c: slot.main.temp,
        })
    }
}

/// OpenWeatherMap response structures
mod owm {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub name: String,
        pub sys: Option<Sys>,
        pub main: Main,
        #[serde(default)]
        pub weather: Vec<Condition>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Sys {
        pub country: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Main {
        pub temp: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub description: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub city: City,
        #[serde(default)]
        pub list: Vec<ForecastSlot>,
    }

    #[derive(Debug, Deserialize)]
    pub struct City {
        pub name: String,
        pub country: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastSlot {
        /// "2025-06-12 12:00:00", UTC
        pub dt_txt: String,
        pub main: Main,
        #[serde(default)]
        pub weather: Vec<Condition>,
    }

    pub fn location_label(name: &str, country: Option<String>) -> String {
        match country {
            Some(country) if !country.is_empty() => format!("{name}, {country}"),
            _ => name.to_string(),
        }
    }

    pub fn description(conditions: &[Condition]) -> Result<String, WeatherError> {
        conditions
            .first()
            .map(|c| c.description.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| WeatherError::Malformed("missing weather description".to_string()))
    }

    /// The slot on `date` closest to midday
    pub fn pick_slot(list: &[ForecastSlot], date: NaiveDate) -> Option<&ForecastSlot> {
        list.iter()
            .filter_map(|slot| {
                NaiveDateTime::parse_from_str(&slot.dt_txt, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .filter(|at| at.date() == date)
                    .map(|at| (slot, at.hour().abs_diff(12)))
            })
            .min_by_key(|(_, distance)| *distance)
            .map(|(slot, _)| slot)
    }
}
