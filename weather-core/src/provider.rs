use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::WeatherError,
    model::{Coordinates, ForecastEntry, HistoricalSample, WeatherSnapshot},
};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Access to an upstream weather service.
///
/// Each method is a single outbound call: no retries, and a failure is final
/// for that call.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for `city`.
    async fn fetch_current(&self, city: &str) -> Result<WeatherSnapshot, WeatherError>;

    /// Latitude/longitude of `city`.
    async fn fetch_coordinates(&self, city: &str) -> Result<Coordinates, WeatherError>;

    /// Raw 5-day / 3-hour series for `city`, in provider order.
    async fn fetch_forecast_series(&self, city: &str) -> Result<Vec<ForecastEntry>, WeatherError>;

    /// Point-in-time historical query at unix timestamp `at`.
    async fn fetch_historical(
        &self,
        coords: Coordinates,
        at: i64,
    ) -> Result<HistoricalSample, WeatherError>;
}
