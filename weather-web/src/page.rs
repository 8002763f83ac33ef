//! HTML page rendering

use tera::{Context, Tera};
use weather_core::ForecastReport;

const INDEX: &str = "index.html";

/// Compiled page templates. Autoescaping is on for `.html` templates.
#[derive(Debug)]
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(INDEX, include_str!("../templates/index.html"))?;
        Ok(Self { tera })
    }

    /// The search page, optionally with results or an error message.
    ///
    /// Results carry the current conditions, the daily forecast with its
    /// chart, and the past week (or the reason it is missing).
    pub fn index(
        &self,
        weather_data: Option<&ForecastReport>,
        error_message: Option<&str>,
    ) -> Result<String, tera::Error> {
        let mut ctx = Context::new();
        ctx.insert("weather_data", &weather_data);
        ctx.insert("error_message", &error_message);
        self.tera.render(INDEX, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::{DailyForecast, DailyPrediction, HistoricalDay, Metrics, PageReport};

    fn current() -> PageReport {
        PageReport {
            city: "London".into(),
            temp: Some(20.0),
            temp_f: Some(68.0),
            humidity: Some(65),
            description: "Light Rain".into(),
            predicted_temp: Some(21.0),
            predicted_temp_f: Some(69.8),
            feels_like: Some(19.6),
            feels_like_f: Some(67.28),
            icon_url: "https://openweathermap.org/img/wn/10d@2x.png".into(),
            metrics: Metrics {
                clouds: Some(75.0),
                wind_speed: None,
                precipitation_1h: None,
            },
        }
    }

    fn report() -> ForecastReport {
        ForecastReport {
            current: current(),
            daily: vec![
                DailyPrediction::new(
                    DailyForecast {
                        date: "2024-05-10".into(),
                        avg_temp: Some(17.0),
                        avg_humidity: Some(55),
                        description: "Scattered Clouds".into(),
                        icon_url: String::new(),
                    },
                    Some(21.0),
                ),
                DailyPrediction::new(
                    DailyForecast {
                        date: "2024-05-11".into(),
                        avg_temp: None,
                        avg_humidity: None,
                        description: String::new(),
                        icon_url: String::new(),
                    },
                    None,
                ),
            ],
            past_week: vec![HistoricalDay {
                date: "2024-05-09".into(),
                avg_temp: Some(13.0),
                avg_temp_f: Some(55.4),
            }],
            past_error: None,
        }
    }

    fn render(report: Option<&ForecastReport>, error: Option<&str>) -> String {
        PageRenderer::new()
            .expect("templates")
            .index(report, error)
            .expect("renders")
    }

    #[test]
    fn empty_page_has_form_only() {
        let html = render(None, None);
        assert!(html.contains("name=\"city\""));
        assert!(!html.contains("class=\"error\""));
        assert!(!html.contains("card result"));
        assert!(!html.contains("forecast-chart"));
    }

    #[test]
    fn report_is_rendered() {
        let html = render(Some(&report()), None);
        assert!(html.contains("London"));
        assert!(html.contains("20"));
        assert!(html.contains("69.8"));
        assert!(html.contains("Light Rain"));
    }

    #[test]
    fn daily_forecast_and_past_week_are_listed() {
        let html = render(Some(&report()), None);
        assert!(html.contains("Next 2 day(s)"));
        assert!(html.contains("2024-05-10"));
        assert!(html.contains("Scattered Clouds"));
        assert!(html.contains("N/A"));
        assert!(html.contains("forecast-chart"));
        assert!(html.contains("Past week"));
        assert!(html.contains("2024-05-09"));
        assert!(html.contains("55.4"));
    }

    #[test]
    fn history_error_replaces_past_week() {
        let report = ForecastReport {
            past_week: vec![],
            past_error: Some("Historical API error: Invalid API key".into()),
            ..report()
        };
        let html = render(Some(&report), None);
        assert!(html.contains("Past week unavailable: Historical API error: Invalid API key"));
        assert!(!html.contains("past-table"));
    }

    #[test]
    fn error_message_is_escaped() {
        let html = render(None, Some("<b>city not found</b>"));
        assert!(html.contains("&lt;b&gt;city not found&lt;&#x2F;b&gt;"));
    }
}
