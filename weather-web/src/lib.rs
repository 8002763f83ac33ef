//! HTTP front-end for the weather forecast service.
//!
//! This crate focuses on:
//! - Routing (`/`, `/api/forecast`, `/bgimg/*`, `/health`)
//! - Rendering the HTML page
//! - Mapping core errors onto JSON error bodies and status codes

pub mod error;
pub mod handlers;
pub mod page;
pub mod routes;
pub mod state;

pub use error::ApiFailure;
pub use routes::create_router;
pub use state::AppState;
