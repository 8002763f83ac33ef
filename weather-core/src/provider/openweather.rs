use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::{Config, Timeouts},
    error::WeatherError,
    model::{Coordinates, ForecastEntry, HistoricalSample, Metrics, WeatherSnapshot, icon_url},
    units::title_case,
};

use super::WeatherProvider;

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const TIMEMACHINE_PATH: &str = "/data/2.5/onecall/timemachine";

const GENERIC_API_ERROR: &str = "API error";
const UNRESOLVED_CITY: &str = "Could not determine coordinates for city.";

/// OpenWeather client covering current conditions, the 5-day/3-hour
/// forecast and the One Call time machine.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    icon_base_url: String,
    timeouts: Timeouts,
    http: Client,
}

/// Outcome of one GET that reached the provider.
enum Reply {
    Success(String),
    Failure(StatusCode, String),
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::from_config(&Config {
            api_key: Some(api_key),
            ..Config::default()
        })
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.api_key_or_empty().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            icon_base_url: config.icon_base_url.clone(),
            timeouts: config.timeouts.clone(),
            http: Client::new(),
        }
    }

    fn icon_url(&self, icon: &str) -> String {
        icon_url(&self.icon_base_url, icon)
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout_secs: u64,
    ) -> Result<Reply, reqwest::Error> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Calling OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if status.is_success() {
            Ok(Reply::Success(body))
        } else {
            debug!(%status, body = %truncate_body(&body), "OpenWeather returned an error");
            Ok(Reply::Failure(status, body))
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let query = [("q", city.to_string()), ("units", "metric".to_string())];

        let body = match self.get(CURRENT_PATH, &query, self.timeouts.current_secs).await {
            Err(e) => return Err(WeatherError::Network(e.to_string())),
            Ok(Reply::Failure(_, body)) => {
                return Err(WeatherError::Api(
                    provider_message(&body).unwrap_or_else(|| GENERIC_API_ERROR.to_string()),
                ));
            }
            Ok(Reply::Success(body)) => body,
        };

        let parsed: OwCurrentResponse = parse(&body)?;
        let weather = parsed.weather.into_iter().next().unwrap_or_default();

        Ok(WeatherSnapshot {
            temperature: parsed.main.temp,
            humidity: parsed.main.humidity.map(|h| h.round() as i64),
            feels_like: parsed.main.feels_like,
            description: title_case(&weather.description),
            icon_url: self.icon_url(&weather.icon),
            metrics: Metrics {
                clouds: parsed.clouds.and_then(|c| c.all),
                wind_speed: parsed.wind.and_then(|w| w.speed),
                precipitation_1h: precipitation(parsed.rain.as_ref(), parsed.snow.as_ref()),
            },
        })
    }

    #[instrument(skip(self))]
    async fn fetch_coordinates(&self, city: &str) -> Result<Coordinates, WeatherError> {
        let query = [("q", city.to_string())];

        let body = match self.get(CURRENT_PATH, &query, self.timeouts.coordinates_secs).await {
            Err(e) => return Err(WeatherError::Network(e.to_string())),
            Ok(Reply::Failure(status, body)) => {
                return Err(WeatherError::Api(match provider_message_or_invalid(&body) {
                    Ok(Some(msg)) => msg,
                    Ok(None) => format!("API error {}", status.as_u16()),
                    Err(()) => format!("API error: status {}", status.as_u16()),
                }));
            }
            Ok(Reply::Success(body)) => body,
        };

        let parsed: OwCoordResponse = parse(&body)?;

        match parsed.coord {
            Some(OwCoord {
                lat: Some(latitude),
                lon: Some(longitude),
            }) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(WeatherError::Resolution(UNRESOLVED_CITY.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_forecast_series(&self, city: &str) -> Result<Vec<ForecastEntry>, WeatherError> {
        let query = [("q", city.to_string()), ("units", "metric".to_string())];

        let body = match self.get(FORECAST_PATH, &query, self.timeouts.forecast_secs).await {
            Err(e) => return Err(WeatherError::Network(e.to_string())),
            Ok(Reply::Failure(status, body)) => {
                return Err(WeatherError::Api(match provider_message_or_invalid(&body) {
                    Ok(msg) => msg.unwrap_or_else(|| GENERIC_API_ERROR.to_string()),
                    Err(()) => format!("API error: status {}", status.as_u16()),
                }));
            }
            Ok(Reply::Success(body)) => body,
        };

        let parsed: OwForecastResponse = parse(&body)?;

        Ok(parsed
            .list
            .into_iter()
            .map(|entry| {
                let main = entry.main.unwrap_or_default();
                let weather = entry.weather.into_iter().next().unwrap_or_default();
                ForecastEntry {
                    dt_txt: entry.dt_txt,
                    temp: main.temp,
                    humidity: main.humidity,
                    description: weather.description,
                    icon: weather.icon,
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn fetch_historical(
        &self,
        coords: Coordinates,
        at: i64,
    ) -> Result<HistoricalSample, WeatherError> {
        let query = [
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
            ("dt", at.to_string()),
            ("units", "metric".to_string()),
        ];

        let body = match self.get(TIMEMACHINE_PATH, &query, self.timeouts.historical_secs).await {
            Err(e) => return Err(WeatherError::historical_network(e)),
            Ok(Reply::Failure(status, body)) => {
                let msg = provider_message(&body)
                    .unwrap_or_else(|| format!("status {}", status.as_u16()));
                return Err(WeatherError::historical_api(msg));
            }
            Ok(Reply::Success(body)) => body,
        };

        let parsed: OwTimemachineResponse = parse(&body)?;

        Ok(HistoricalSample {
            hourly_temps: parsed
                .hourly
                .unwrap_or_default()
                .iter()
                .filter_map(|h| h.get("temp").and_then(serde_json::Value::as_f64))
                .collect(),
            current_temp: parsed
                .current
                .as_ref()
                .and_then(|c| c.get("temp"))
                .and_then(serde_json::Value::as_f64),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwPrecipitation {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    clouds: Option<OwClouds>,
    wind: Option<OwWind>,
    rain: Option<OwPrecipitation>,
    snow: Option<OwPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCoordResponse {
    coord: Option<OwCoord>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    #[serde(default)]
    dt_txt: String,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwTimemachineResponse {
    hourly: Option<Vec<serde_json::Value>>,
    current: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

/// Rain before snow, 1-hour window before 3-hour window.
fn precipitation(rain: Option<&OwPrecipitation>, snow: Option<&OwPrecipitation>) -> Option<f64> {
    let rain_reading = rain.and_then(|r| r.one_hour.or(r.three_hours));
    rain_reading.or_else(|| snow.and_then(|s| s.one_hour.or(s.three_hours)))
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, WeatherError> {
    serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))
}

/// `message` field of an error body; `None` when absent or unparseable.
fn provider_message(body: &str) -> Option<String> {
    provider_message_or_invalid(body).ok().flatten()
}

/// Like [`provider_message`] but tells "not JSON" (`Err`) apart from
/// "JSON without a message" (`Ok(None)`).
fn provider_message_or_invalid(body: &str) -> Result<Option<String>, ()> {
    serde_json::from_str::<OwErrorBody>(body)
        .map(|b| b.message)
        .map_err(|_| ())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
