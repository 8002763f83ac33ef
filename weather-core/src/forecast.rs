//! Collapses the provider's 3-hourly forecast series into one record per
//! calendar day.

use std::collections::BTreeMap;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{DailyForecast, ForecastEntry, icon_url},
    provider::WeatherProvider,
    units::{mean, round2, title_case},
};

/// Forecast horizon used when the caller does not ask for one.
pub const DEFAULT_FORECAST_DAYS: usize = 4;

/// Time-of-day whose sample supplies the day's icon.
const NOON: &str = "12:00:00";

/// Fetch the series for `city` and aggregate the first `days` dates.
pub async fn daily_forecast(
    provider: &dyn WeatherProvider,
    city: &str,
    days: usize,
    icon_base_url: &str,
) -> Result<Vec<DailyForecast>, WeatherError> {
    let entries = provider.fetch_forecast_series(city).await?;
    debug!(city, samples = entries.len(), "Aggregating forecast series");
    aggregate_daily(&entries, days, icon_base_url)
}

/// Group `entries` by date and summarise each of the first `days` dates.
///
/// Dates come out ascending and unique. Averages skip samples that lack the
/// reading and are `None` when no sample in the day has it.
pub fn aggregate_daily(
    entries: &[ForecastEntry],
    days: usize,
    icon_base_url: &str,
) -> Result<Vec<DailyForecast>, WeatherError> {
    if entries.is_empty() {
        return Err(WeatherError::NoData);
    }

    let mut groups: BTreeMap<&str, Vec<&ForecastEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(date) = date_part(&entry.dt_txt) {
            groups.entry(date).or_default().push(entry);
        }
    }

    Ok(groups
        .into_iter()
        .take(days)
        .map(|(date, group)| summarise_day(date, &group, icon_base_url))
        .collect())
}

fn summarise_day(date: &str, group: &[&ForecastEntry], icon_base_url: &str) -> DailyForecast {
    let temps: Vec<f64> = group.iter().filter_map(|e| e.temp).collect();
    let hums: Vec<f64> = group.iter().filter_map(|e| e.humidity).collect();

    let icon = representative(group).map(|e| e.icon.as_str()).unwrap_or_default();

    DailyForecast {
        date: date.to_string(),
        avg_temp: mean(&temps).map(round2),
        avg_humidity: mean(&hums).map(|h| h.round() as i64),
        description: title_case(most_common(group.iter().map(|e| e.description.as_str()))),
        icon_url: icon_url(icon_base_url, icon),
    }
}

/// Date portion of a `YYYY-MM-DD HH:MM:SS` stamp.
fn date_part(dt_txt: &str) -> Option<&str> {
    dt_txt.split(' ').next().filter(|d| !d.is_empty())
}

/// The noon sample if there is one, else the first sample of the day.
fn representative<'a>(group: &[&'a ForecastEntry]) -> Option<&'a ForecastEntry> {
    group
        .iter()
        .find(|e| e.dt_txt.ends_with(NOON))
        .or_else(|| group.first())
        .copied()
}

/// Most frequent value; ties go to whichever was seen first.
fn most_common<'a>(values: impl Iterator<Item = &'a str>) -> &'a str {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((value, n));
        }
    }
    best.map(|(value, _)| value).unwrap_or_default()
}
