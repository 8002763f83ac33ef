//! Shared application state

use std::{path::PathBuf, sync::Arc};

use weather_core::WeatherService;

use crate::page::PageRenderer;

/// State handed to every handler. Read-only after start-up.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<WeatherService>,
    pub pages: Arc<PageRenderer>,
    /// Directory served under `/bgimg/`.
    pub bgimg_dir: PathBuf,
}

impl AppState {
    pub fn new(service: WeatherService, bgimg_dir: impl Into<PathBuf>) -> Result<Self, tera::Error> {
        Ok(Self {
            service: Arc::new(service),
            pages: Arc::new(PageRenderer::new()?),
            bgimg_dir: bgimg_dir.into(),
        })
    }
}
