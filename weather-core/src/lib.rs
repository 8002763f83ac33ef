//! Core library for the weather forecast service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherProvider` seam
//! - Forecast aggregation, historical sampling and the next-day model
//! - Assembly of the page and JSON payloads
//!
//! It is used by `weather-web`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod forecast;
pub mod history;
pub mod model;
pub mod predict;
pub mod provider;
pub mod report;
pub mod units;

pub use config::Config;
pub use error::WeatherError;
pub use forecast::DEFAULT_FORECAST_DAYS;
pub use history::DEFAULT_HISTORY_DAYS;
pub use model::{Coordinates, DailyForecast, ForecastEntry, HistoricalDay, HistoricalSample, Metrics, WeatherSnapshot};
pub use predict::LinearModel;
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use report::{DailyPrediction, ForecastReport, PageReport, WeatherService};
