//! Request handlers

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};
use weather_core::{DEFAULT_FORECAST_DAYS, ForecastReport};

use crate::{error::ApiFailure, state::AppState};

/// Forecast days shown on the page.
pub const PAGE_FORECAST_DAYS: usize = 7;

/// Successful `/api/forecast` body.
#[derive(Debug, Serialize)]
pub struct ForecastEnvelope {
    pub success: bool,
    pub weather_data: ForecastReport,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /`: the empty search page.
pub async fn index(State(state): State<AppState>) -> Response {
    render(&state, None, None)
}

/// `POST /`: look up the submitted city and render the result or the error.
///
/// The body is read as form-encoded whatever its content type, so a bare
/// or empty submission still gets the page with the validation message.
pub async fn submit(State(state): State<AppState>, body: Bytes) -> Response {
    let city = form_city(&body).unwrap_or_default();

    match state.service.page(&city, PAGE_FORECAST_DAYS).await {
        Ok(report) => render(&state, Some(&report), None),
        Err(e) => {
            warn!(city = %city, error = %e, "Page lookup failed");
            render(&state, None, Some(&e.to_string()))
        }
    }
}

/// `POST /api/forecast`: JSON (or form-encoded) `city`, optional `?days=N`.
pub async fn api_forecast(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<ForecastEnvelope>, ApiFailure> {
    let city = city_from_body(&body);
    let days = forecast_days(&params);

    let weather_data = state.service.forecast(&city, days).await.map_err(|e| {
        warn!(city = %city, error = %e, "Forecast request failed");
        ApiFailure::from(e)
    })?;

    Ok(Json(ForecastEnvelope {
        success: true,
        weather_data,
    }))
}

/// Liveness check - is the server running?
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn render(state: &AppState, report: Option<&ForecastReport>, error_message: Option<&str>) -> Response {
    match state.pages.index(report, error_message) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

/// `city` from a JSON object body, else from a form-encoded body.
fn city_from_body(body: &[u8]) -> String {
    [json_city(body), form_city(body)]
        .into_iter()
        .flatten()
        .next()
        .unwrap_or_default()
}

fn json_city(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<Value>(body).ok()? {
        Value::Object(map) => Some(
            map.get("city")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        _ => None,
    }
}

fn form_city(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "city")
        .map(|(_, value)| value.into_owned())
}

/// `?days=N`, falling back to the default when absent or not a number.
fn forecast_days(params: &HashMap<String, String>) -> usize {
    params
        .get("days")
        .and_then(|d| d.trim().parse().ok())
        .unwrap_or(DEFAULT_FORECAST_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_prefers_json() {
        assert_eq!(city_from_body(br#"{"city":"Paris"}"#), "Paris");
        assert_eq!(city_from_body(br#"{"town":"Paris"}"#), "");
        assert_eq!(city_from_body(br#"{"city":42}"#), "");
    }

    #[test]
    fn city_falls_back_to_form() {
        assert_eq!(city_from_body(b"city=New+York&x=1"), "New York");
        assert_eq!(city_from_body(b"city=S%C3%A3o%20Paulo"), "São Paulo");
        assert_eq!(city_from_body(b""), "");
    }

    #[test]
    fn days_default_when_missing_or_garbage() {
        let mut params = HashMap::new();
        assert_eq!(forecast_days(&params), DEFAULT_FORECAST_DAYS);

        params.insert("days".to_string(), "seven".to_string());
        assert_eq!(forecast_days(&params), DEFAULT_FORECAST_DAYS);

        params.insert("days".to_string(), "7".to_string());
        assert_eq!(forecast_days(&params), 7);
    }
}
