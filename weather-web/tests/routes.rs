//! Integration tests for HTTP handlers
#![allow(clippy::expect_used)]

use std::{
    fs,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{body::Bytes, http::StatusCode};
use axum_test::TestServer;
use serde_json::{Value, json};
use weather_core::{
    Coordinates, ForecastEntry, HistoricalSample, LinearModel, Metrics, WeatherError,
    WeatherProvider, WeatherService, WeatherSnapshot,
};
use weather_web::{AppState, create_router};

/// Canned provider that counts every outbound call.
#[derive(Debug)]
struct StubProvider {
    current: Result<WeatherSnapshot, WeatherError>,
    forecast: Result<Vec<ForecastEntry>, WeatherError>,
    /// 1-based historical call that fails, if any.
    history_fails_at: Option<usize>,
    calls: AtomicUsize,
    historical_calls: AtomicUsize,
}

impl StubProvider {
    fn london() -> Self {
        Self {
            current: Ok(WeatherSnapshot {
                temperature: Some(20.0),
                humidity: Some(65),
                feels_like: Some(19.5),
                description: "Light Rain".into(),
                icon_url: "https://openweathermap.org/img/wn/10d@2x.png".into(),
                metrics: Metrics {
                    clouds: Some(75.0),
                    wind_speed: Some(4.1),
                    precipitation_1h: None,
                },
            }),
            forecast: Ok(vec![
                entry("2024-05-10 12:00:00", 16.0, 60.0, "light rain", "10d"),
                entry("2024-05-10 15:00:00", 18.0, 50.0, "light rain", "10d"),
                entry("2024-05-11 00:00:00", 10.0, 80.0, "clear sky", "01n"),
                entry("2024-05-12 00:00:00", 11.0, 70.0, "mist", "50n"),
            ]),
            history_fails_at: None,
            calls: AtomicUsize::new(0),
            historical_calls: AtomicUsize::new(0),
        }
    }

    fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn entry(dt_txt: &str, temp: f64, humidity: f64, description: &str, icon: &str) -> ForecastEntry {
    ForecastEntry {
        dt_txt: dt_txt.into(),
        temp: Some(temp),
        humidity: Some(humidity),
        description: description.into(),
        icon: icon.into(),
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn fetch_current(&self, _city: &str) -> Result<WeatherSnapshot, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.current.clone()
    }

    async fn fetch_coordinates(&self, _city: &str) -> Result<Coordinates, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Coordinates {
            latitude: 51.5085,
            longitude: -0.1257,
        })
    }

    async fn fetch_forecast_series(&self, _city: &str) -> Result<Vec<ForecastEntry>, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.forecast.clone()
    }

    async fn fetch_historical(
        &self,
        _coords: Coordinates,
        _at: i64,
    ) -> Result<HistoricalSample, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let n = self.historical_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.history_fails_at == Some(n) {
            return Err(WeatherError::historical_api("Invalid API key"));
        }
        Ok(HistoricalSample {
            hourly_temps: vec![12.0, 14.0],
            current_temp: None,
        })
    }
}

fn create_test_server(provider: Arc<StubProvider>, bgimg_dir: &std::path::Path) -> TestServer {
    let model = LinearModel::trained().expect("model fits");
    let service = WeatherService::new(provider, model).with_history(3, Duration::ZERO);
    let state = AppState::new(service, bgimg_dir).expect("templates load");
    TestServer::new(create_router(state)).expect("Failed to create test server")
}

fn server_for(provider: Arc<StubProvider>) -> TestServer {
    create_test_server(provider, std::path::Path::new("does-not-exist"))
}

// ============================================================================
// JSON API
// ============================================================================

#[tokio::test]
async fn london_end_to_end() {
    let provider = Arc::new(StubProvider::london());
    let server = server_for(Arc::clone(&provider));

    let response = server
        .post("/api/forecast")
        .json(&json!({ "city": "london" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let data = &body["weather_data"];
    assert_eq!(data["city"], "London");
    assert_eq!(data["temp"], 20.0);
    assert_eq!(data["temp_f"], 68.0);
    assert_eq!(data["humidity"], 65);
    assert_eq!(data["predicted_temp"], 21.0);
    assert_eq!(data["predicted_temp_f"], 69.8);
    assert_eq!(data["feels_like_f"], 67.1);
    assert_eq!(data["metrics"]["clouds"], 75.0);
    assert_eq!(data["metrics"]["precipitation_1h"], Value::Null);

    let daily = data["daily"].as_array().expect("daily list");
    assert_eq!(daily.len(), 3);
    assert_eq!(daily[0]["date"], "2024-05-10");
    assert_eq!(daily[0]["avg_temp"], 17.0);
    assert_eq!(daily[0]["avg_temp_f"], 62.6);
    assert_eq!(daily[0]["description"], "Light Rain");
    assert_eq!(daily[0]["predicted_temp"], 21.0);
    assert_eq!(daily[1]["predicted_temp"], 22.0);
    assert_eq!(daily[2]["predicted_temp"], 23.0);
    assert_eq!(daily[2]["predicted_temp_f"], 73.4);

    let past = data["past_week"].as_array().expect("past list");
    assert_eq!(past.len(), 3);
    assert_eq!(past[0]["avg_temp"], 13.0);
    assert_eq!(past[0]["avg_temp_f"], 55.4);
    assert!(data.get("past_error").is_none());
}

#[tokio::test]
async fn days_query_caps_the_forecast() {
    let server = server_for(Arc::new(StubProvider::london()));

    let response = server
        .post("/api/forecast")
        .add_query_param("days", 1)
        .json(&json!({ "city": "London" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["weather_data"]["daily"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn empty_city_is_rejected_without_calling_the_provider() {
    let provider = Arc::new(StubProvider::london());
    let server = server_for(Arc::clone(&provider));

    let response = server
        .post("/api/forecast")
        .json(&json!({ "city": "   " }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body, json!({ "success": false, "error": "Please provide a city name." }));
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn current_failure_is_fatal() {
    let provider = Arc::new(StubProvider {
        current: Err(WeatherError::Api("city not found".into())),
        ..StubProvider::london()
    });
    let server = server_for(Arc::clone(&provider));

    let response = server
        .post("/api/forecast")
        .json(&json!({ "city": "Atlantis" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body, json!({ "success": false, "error": "city not found" }));
    assert_eq!(provider.total_calls(), 1);
}

#[tokio::test]
async fn forecast_failure_degrades_to_tomorrow_only() {
    let server = server_for(Arc::new(StubProvider {
        forecast: Err(WeatherError::NoData),
        ..StubProvider::london()
    }));

    let response = server
        .post("/api/forecast")
        .json(&json!({ "city": "London" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let daily = body["weather_data"]["daily"].as_array().expect("daily list");
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0]["date"], "tomorrow");
    assert_eq!(daily[0]["avg_temp"], Value::Null);
    assert_eq!(daily[0]["predicted_temp"], 21.0);
    assert_eq!(daily[0]["predicted_temp_f"], 69.8);
}

#[tokio::test]
async fn history_failure_degrades_with_advisory() {
    let provider = Arc::new(StubProvider {
        history_fails_at: Some(2),
        ..StubProvider::london()
    });
    let server = server_for(Arc::clone(&provider));

    let response = server
        .post("/api/forecast")
        .json(&json!({ "city": "London" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["weather_data"];
    assert_eq!(data["past_week"], json!([]));
    assert_eq!(data["past_error"], "Historical API error: Invalid API key");
    assert_eq!(data["daily"].as_array().map(Vec::len), Some(3));
    // Sampling stopped at the failing day.
    assert_eq!(provider.historical_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn form_encoded_body_is_accepted() {
    let server = server_for(Arc::new(StubProvider::london()));

    let response = server
        .post("/api/forecast")
        .form(&[("city", "London")])
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["weather_data"]["city"], "London");
}

// ============================================================================
// HTML page
// ============================================================================

#[tokio::test]
async fn page_shows_form() {
    let server = server_for(Arc::new(StubProvider::london()));

    let response = server.get("/").await;

    response.assert_status_ok();
    assert!(response.text().contains("name=\"city\""));
}

#[tokio::test]
async fn page_renders_current_conditions_and_prediction() {
    let server = server_for(Arc::new(StubProvider::london()));

    let response = server.post("/").form(&[("city", "london")]).await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("London"));
    assert!(html.contains("68"));
    assert!(html.contains("69.8"));
    assert!(html.contains("Light Rain"));
}

#[tokio::test]
async fn page_lists_forecast_days_and_past_week() {
    let server = server_for(Arc::new(StubProvider::london()));

    let response = server.post("/").form(&[("city", "London")]).await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Next 3 day(s)"));
    assert!(html.contains("2024-05-12"));
    assert!(html.contains("Clear Sky"));
    assert!(html.contains("forecast-chart"));
    assert!(html.contains("Past week (observed averages)"));
    assert!(html.contains("55.4"));
}

#[tokio::test]
async fn page_shows_history_advisory() {
    let server = server_for(Arc::new(StubProvider {
        history_fails_at: Some(1),
        ..StubProvider::london()
    }));

    let response = server.post("/").form(&[("city", "London")]).await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Past week unavailable: Historical API error: Invalid API key"));
    assert!(html.contains("Next 3 day(s)"));
}

#[tokio::test]
async fn page_without_form_content_type_still_validates() {
    let provider = Arc::new(StubProvider::london());
    let server = server_for(Arc::clone(&provider));

    let response = server.post("/").bytes(Bytes::from_static(b"city=")).await;

    response.assert_status_ok();
    assert!(response.text().contains("Please enter a city name."));
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn page_with_empty_city_shows_message_without_calls() {
    let provider = Arc::new(StubProvider::london());
    let server = server_for(Arc::clone(&provider));

    let response = server.post("/").form(&[("city", "")]).await;

    response.assert_status_ok();
    assert!(response.text().contains("Please enter a city name."));
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn page_shows_provider_error() {
    let server = server_for(Arc::new(StubProvider {
        current: Err(WeatherError::Network("connection refused".into())),
        ..StubProvider::london()
    }));

    let response = server.post("/").form(&[("city", "London")]).await;

    response.assert_status_ok();
    assert!(response.text().contains("Network error: connection refused"));
}

// ============================================================================
// Static files & health
// ============================================================================

#[tokio::test]
async fn background_images_are_served_from_their_directory_only() {
    let root = tempfile::tempdir().expect("tempdir");
    let bg = root.path().join("Bgimg");
    fs::create_dir(&bg).expect("mkdir");
    fs::write(bg.join("sky.txt"), "blue sky").expect("write");
    fs::write(root.path().join("secret.txt"), "top secret").expect("write");

    let server = create_test_server(Arc::new(StubProvider::london()), &bg);

    let response = server.get("/bgimg/sky.txt").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "blue sky");

    let response = server.get("/bgimg/..%2Fsecret.txt").await;
    response.assert_status_not_ok();
    assert!(!response.text().contains("top secret"));
}

#[tokio::test]
async fn health_reports_ok() {
    let server = server_for(Arc::new(StubProvider::london()));

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}
