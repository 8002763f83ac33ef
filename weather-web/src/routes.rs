//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{handlers, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let backgrounds = ServeDir::new(&state.bgimg_dir);

    Router::new()
        // HTML page
        .route("/", get(handlers::index).post(handlers::submit))
        // JSON API
        .route("/api/forecast", post(handlers::api_forecast))
        // Liveness
        .route("/health", get(handlers::health))
        // Background images; ServeDir refuses paths that escape the directory
        .nest_service("/bgimg", backgrounds)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
