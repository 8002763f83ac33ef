//! Average temperatures for the days leading up to today.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    error::WeatherError,
    model::{HistoricalDay, HistoricalSample},
    provider::WeatherProvider,
    units::{fahrenheit, mean, round2},
};

/// How many past days are sampled when the caller does not say.
pub const DEFAULT_HISTORY_DAYS: usize = 7;

/// Sample the last `days` days for `city`, most recent first.
///
/// Fail-fast: the first failing day voids the whole history.
pub async fn past_days(
    provider: &dyn WeatherProvider,
    city: &str,
    days: usize,
    pause: Duration,
) -> Result<Vec<HistoricalDay>, WeatherError> {
    past_days_at(provider, city, days, pause, Utc::now()).await
}

/// [`past_days`] relative to an explicit `now`.
pub async fn past_days_at(
    provider: &dyn WeatherProvider,
    city: &str,
    days: usize,
    pause: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<HistoricalDay>, WeatherError> {
    let coords = provider.fetch_coordinates(city).await?;
    debug!(city, lat = coords.latitude, lon = coords.longitude, "Resolved coordinates");

    let mut past = Vec::with_capacity(days);

    for offset in 1..=days {
        if offset > 1 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        let at = noon_days_ago(now, offset);
        let sample = provider.fetch_historical(coords, at.timestamp()).await.inspect_err(|e| {
            warn!(city, offset, error = %e, "Historical sampling aborted");
        })?;

        let avg_temp = daily_mean(&sample);
        past.push(HistoricalDay {
            date: at.format("%Y-%m-%d").to_string(),
            avg_temp,
            avg_temp_f: fahrenheit(avg_temp),
        });
    }

    Ok(past)
}

/// 12:00:00 UTC on the day `offset` days before `now`.
fn noon_days_ago(now: DateTime<Utc>, offset: usize) -> DateTime<Utc> {
    let day = (now - TimeDelta::days(offset as i64)).date_naive();
    day.and_time(NaiveTime::MIN + TimeDelta::hours(12)).and_utc()
}

/// Mean of the hourly readings, else the single current reading.
fn daily_mean(sample: &HistoricalSample) -> Option<f64> {
    mean(&sample.hourly_temps).map(round2).or(sample.current_temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn noon_is_normalised_in_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 30, 15).single().expect("valid");
        let at = noon_days_ago(now, 1);
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).single().expect("valid"));

        let at = noon_days_ago(now, 7);
        assert_eq!(at.format("%Y-%m-%d").to_string(), "2024-02-23");
    }

    #[test]
    fn hourly_mean_is_rounded() {
        let sample = HistoricalSample {
            hourly_temps: vec![10.0, 11.0, 12.5],
            current_temp: Some(99.0),
        };
        assert_eq!(daily_mean(&sample), Some(11.17));
    }

    #[test]
    fn current_reading_is_the_fallback() {
        let sample = HistoricalSample {
            hourly_temps: vec![],
            current_temp: Some(4.2),
        };
        assert_eq!(daily_mean(&sample), Some(4.2));
        assert_eq!(daily_mean(&HistoricalSample::default()), None);
    }
}
