use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use tokio::{net::TcpListener, signal};
use tracing::info;
use weather_core::{Config, DEFAULT_FORECAST_DAYS, LinearModel, OpenWeatherProvider, WeatherService};
use weather_web::{AppState, create_router};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-web", version, about = "Weather forecast web service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the web server.
    Serve {
        /// Address to bind; overrides the config file.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind; overrides the config file.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the JSON forecast for a city and exit.
    Show {
        /// City name.
        city: String,

        /// Number of forecast days.
        #[arg(long, default_value_t = DEFAULT_FORECAST_DAYS)]
        days: usize,
    },

    /// Store the OpenWeather API key in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { host, port } => {
                let mut config = Config::load()?;
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                serve(config).await
            }
            Command::Show { city, days } => {
                let config = Config::load()?;
                let report = build_service(&config)?
                    .forecast(&city, days)
                    .await?;
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize forecast")?;
                println!("{json}");
                Ok(())
            }
            Command::Configure => configure(),
        }
    }
}

fn build_service(config: &Config) -> anyhow::Result<WeatherService> {
    if config.api_key.is_none() {
        tracing::warn!("No OpenWeather API key configured; provider calls will be rejected");
    }

    let model = LinearModel::trained()
        .ok_or_else(|| anyhow!("Training table does not determine a unique model"))?;
    info!(
        intercept = model.intercept,
        coef_temp = model.coef_temp,
        coef_humidity = model.coef_humidity,
        "Prediction model fitted"
    );

    let provider = Arc::new(OpenWeatherProvider::from_config(config));
    Ok(WeatherService::from_config(provider, model, config))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let service = build_service(&config)?;
    let state = AppState::new(service, config.bgimg_dir.clone())
        .context("Failed to load page templates")?;
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

fn configure() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key.trim().to_string());
    config.save_to(&path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}
