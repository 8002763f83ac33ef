//! Builds the page and JSON payloads out of the provider data, the forecast
//! aggregation, the history sampler and the prediction model.

use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::{
    config::Config,
    error::WeatherError,
    forecast::daily_forecast,
    history::{DEFAULT_HISTORY_DAYS, past_days},
    model::{DailyForecast, HistoricalDay, Metrics, WeatherSnapshot},
    predict::{LinearModel, predict_chain},
    provider::WeatherProvider,
    units::{fahrenheit, round2, title_case},
};

pub const PAGE_EMPTY_CITY: &str = "Please enter a city name.";
pub const API_EMPTY_CITY: &str = "Please provide a city name.";

/// Current conditions plus a single "tomorrow" estimate, °C and °F.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub city: String,
    pub temp: Option<f64>,
    pub temp_f: Option<f64>,
    pub humidity: Option<i64>,
    pub description: String,
    pub predicted_temp: Option<f64>,
    pub predicted_temp_f: Option<f64>,
    pub feels_like: Option<f64>,
    pub feels_like_f: Option<f64>,
    pub icon_url: String,
    pub metrics: Metrics,
}

/// One forecast day with its chained prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPrediction {
    #[serde(flatten)]
    pub forecast: DailyForecast,
    pub avg_temp_f: Option<f64>,
    pub predicted_temp: Option<f64>,
    pub predicted_temp_f: Option<f64>,
}

/// Everything the JSON endpoint returns under `weather_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    #[serde(flatten)]
    pub current: PageReport,
    pub daily: Vec<DailyPrediction>,
    pub past_week: Vec<HistoricalDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub past_error: Option<String>,
}

impl PageReport {
    pub fn new(city: &str, snapshot: WeatherSnapshot, prediction: Option<f64>) -> Self {
        let temp = snapshot.temperature.map(round2);
        let feels_like = snapshot.feels_like.map(round2);
        let predicted_temp = prediction.map(round2);

        Self {
            city: title_case(city),
            temp,
            temp_f: fahrenheit(temp),
            humidity: snapshot.humidity,
            description: snapshot.description,
            predicted_temp,
            predicted_temp_f: fahrenheit(predicted_temp),
            feels_like,
            feels_like_f: fahrenheit(feels_like),
            icon_url: snapshot.icon_url,
            metrics: snapshot.metrics,
        }
    }
}

impl DailyPrediction {
    pub fn new(forecast: DailyForecast, predicted_temp: Option<f64>) -> Self {
        Self {
            avg_temp_f: fahrenheit(forecast.avg_temp),
            predicted_temp,
            predicted_temp_f: fahrenheit(predicted_temp),
            forecast,
        }
    }

    /// Stand-in row used when the forecast is unavailable but a
    /// tomorrow estimate exists.
    pub fn tomorrow(predicted_temp: f64) -> Self {
        Self::new(
            DailyForecast {
                date: "tomorrow".to_string(),
                avg_temp: None,
                avg_humidity: None,
                description: String::new(),
                icon_url: String::new(),
            },
            Some(round2(predicted_temp)),
        )
    }
}

/// Attach the prediction chain to the forecast days.
///
/// With no forecast days, falls back to a single "tomorrow" row when
/// `tomorrow` is known.
pub fn attach_predictions(
    model: &LinearModel,
    snapshot: &WeatherSnapshot,
    daily: Vec<DailyForecast>,
    tomorrow: Option<f64>,
) -> Vec<DailyPrediction> {
    if daily.is_empty() {
        return tomorrow.map(DailyPrediction::tomorrow).into_iter().collect();
    }

    let chain: Vec<Option<f64>> = match today_inputs(snapshot) {
        Some((temp, humidity)) => predict_chain(model, temp, humidity, &daily)
            .into_iter()
            .map(Some)
            .collect(),
        None => vec![None; daily.len()],
    };

    daily
        .into_iter()
        .zip(chain)
        .map(|(day, prediction)| DailyPrediction::new(day, prediction))
        .collect()
}

/// Today's `(temp, humidity)` if the provider reported both.
fn today_inputs(snapshot: &WeatherSnapshot) -> Option<(f64, f64)> {
    Some((snapshot.temperature?, snapshot.humidity? as f64))
}

/// Turns a city name into the page or JSON payload.
///
/// Current conditions are mandatory; the forecast and the history each
/// degrade to an empty list when their upstream calls fail.
#[derive(Debug, Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    model: LinearModel,
    icon_base_url: String,
    history_days: usize,
    history_pause: Duration,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>, model: LinearModel) -> Self {
        Self::from_config(provider, model, &Config::default())
    }

    pub fn from_config(
        provider: Arc<dyn WeatherProvider>,
        model: LinearModel,
        config: &Config,
    ) -> Self {
        Self {
            provider,
            model,
            icon_base_url: config.icon_base_url.clone(),
            history_days: DEFAULT_HISTORY_DAYS,
            history_pause: config.history_pause(),
        }
    }

    pub fn with_history(mut self, days: usize, pause: Duration) -> Self {
        self.history_days = days;
        self.history_pause = pause;
        self
    }

    /// Page payload for a form submission: the JSON payload, validated with
    /// the page's own empty-city message.
    pub async fn page(&self, city: &str, days: usize) -> Result<ForecastReport, WeatherError> {
        self.assemble(city, days, PAGE_EMPTY_CITY).await
    }

    /// JSON payload: current conditions, `days` forecast days with chained
    /// predictions, and the past week.
    pub async fn forecast(&self, city: &str, days: usize) -> Result<ForecastReport, WeatherError> {
        self.assemble(city, days, API_EMPTY_CITY).await
    }

    async fn assemble(
        &self,
        city: &str,
        days: usize,
        empty_message: &str,
    ) -> Result<ForecastReport, WeatherError> {
        let city = validate_city(city, empty_message)?;
        let snapshot = self.provider.fetch_current(city).await?;

        let daily = daily_forecast(self.provider.as_ref(), city, days, &self.icon_base_url)
            .await
            .unwrap_or_else(|e| {
                warn!(city, error = %e, "Forecast unavailable, continuing without it");
                Vec::new()
            });

        let tomorrow = self.tomorrow(&snapshot);
        let daily = attach_predictions(&self.model, &snapshot, daily, tomorrow);

        let (past_week, past_error) =
            match past_days(self.provider.as_ref(), city, self.history_days, self.history_pause)
                .await
            {
                Ok(past) => (past, None),
                Err(e) => {
                    warn!(city, error = %e, "History unavailable, continuing without it");
                    (Vec::new(), Some(e.to_string()))
                }
            };

        info!(city, days = daily.len(), past = past_week.len(), "Forecast assembled");

        Ok(ForecastReport {
            current: PageReport::new(city, snapshot, tomorrow),
            daily,
            past_week,
            past_error,
        })
    }

    fn tomorrow(&self, snapshot: &WeatherSnapshot) -> Option<f64> {
        today_inputs(snapshot).map(|(temp, humidity)| self.model.predict(temp, humidity))
    }
}

/// Trimmed city, or a validation error carrying `empty_message`.
pub fn validate_city<'a>(city: &'a str, empty_message: &str) -> Result<&'a str, WeatherError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(WeatherError::Validation(empty_message.to_string()));
    }
    Ok(city)
}
