use serde::{Deserialize, Serialize};

/// Auxiliary current-conditions readings. Each one is optional upstream and
/// stays `None` when the provider leaves it out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub clouds: Option<f64>,
    pub wind_speed: Option<f64>,
    pub precipitation_1h: Option<f64>,
}

/// Current conditions for one city at request time (°C, %).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: Option<f64>,
    pub humidity: Option<i64>,
    pub feels_like: Option<f64>,
    pub description: String,
    pub icon_url: String,
    pub metrics: Metrics,
}

/// One 3-hourly sample of the provider's forecast series.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    /// `YYYY-MM-DD HH:MM:SS`
    pub dt_txt: String,
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
    pub description: String,
    pub icon: String,
}

/// One calendar day aggregated from the 3-hourly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub avg_temp: Option<f64>,
    pub avg_humidity: Option<i64>,
    pub description: String,
    pub icon_url: String,
}

/// Raw answer of one historical point query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalSample {
    /// Numeric `hourly[].temp` readings; non-numeric ones are dropped.
    pub hourly_temps: Vec<f64>,
    pub current_temp: Option<f64>,
}

/// Averaged temperature of one past day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDay {
    pub date: String,
    pub avg_temp: Option<f64>,
    pub avg_temp_f: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// `<base><code>@2x.png`, or empty when there is no icon code.
pub fn icon_url(base: &str, code: &str) -> String {
    if code.is_empty() {
        String::new()
    } else {
        format!("{base}{code}@2x.png")
    }
}
