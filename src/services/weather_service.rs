use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AmbientConfig, SiteConfig};
use crate::models::power::{HourlyWeather, HourlyWeatherResponse};
use crate::models::series::{TimeIndex, TimeSeries};
use crate::services::temperature_model::{AmbientConditions, Profile};

const OPEN_METEO_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const OPEN_METEO_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
/// How far back the forecast endpoint still serves hourly data
const FORECAST_PAST_DAYS: i64 = 90;
const OPEN_METEO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather service answered {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed weather data: {0}")]
    Malformed(String),
    #[error("no weather data for hour {0}")]
    MissingHour(NaiveDateTime),
}

/// Ambient conditions for every timestamp of `index`.
///
/// Asks Open-Meteo for hourly air temperature and wind speed: the historical
/// archive for days older than the forecast's look-back, the forecast
/// otherwise. The forecast only reaches about 16 days ahead and the archive
/// lags a few days behind today; windows outside both, like any other
/// failure, fall back to the offline diurnal profile.
pub async fn get_ambient(
    site: &SiteConfig,
    profile: &AmbientConfig,
    index: &TimeIndex,
    offline_mode: bool,
) -> AmbientConditions {
    if offline_mode {
        return offline_ambient(profile, index);
    }
    match fetch_ambient(site, index).await {
        Ok(ambient) => ambient,
        Err(e) => {
            warn!(error = %e, "weather data unavailable, using offline ambient profile");
            offline_ambient(profile, index)
        }
    }
}

async fn fetch_ambient(site: &SiteConfig, index: &TimeIndex) -> Result<AmbientConditions, WeatherError> {
    let (Some(first), Some(last)) = (index.first(), index.timestamps().last().copied()) else {
        return Err(WeatherError::Malformed("empty time window".into()));
    };
    let start = first.with_timezone(&Utc).date_naive();
    let end = last.with_timezone(&Utc).date_naive();
    let url = endpoint_for(start, Utc::now().date_naive());

    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let response = client
        .get(url)
        .query(&[
            ("latitude", site.latitude.to_string()),
            ("longitude", site.longitude.to_string()),
            ("hourly", "temperature_2m,wind_speed_10m".to_string()),
            ("wind_speed_unit", "ms".to_string()),
            ("timezone", "GMT".to_string()),
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(WeatherError::Status(status));
    }
    let body = response.json::<HourlyWeatherResponse>().await?;
    debug!(url, hours = body.hourly.time.len(), "weather data received");
    hold_hourly(&body.hourly, index)
}

fn endpoint_for(start: NaiveDate, today: NaiveDate) -> &'static str {
    if start < today - TimeDelta::days(FORECAST_PAST_DAYS) {
        OPEN_METEO_ARCHIVE_URL
    } else {
        OPEN_METEO_FORECAST_URL
    }
}

/// Spread hourly readings over the index: each sample takes the reading of
/// the UTC hour it falls in.
fn hold_hourly(hourly: &HourlyWeather, index: &TimeIndex) -> Result<AmbientConditions, WeatherError> {
    if hourly.temperature_2m.len() != hourly.time.len() || hourly.wind_speed_10m.len() != hourly.time.len() {
        return Err(WeatherError::Malformed("hourly columns differ in length".into()));
    }

    let mut by_hour = HashMap::with_capacity(hourly.time.len());
    for (i, time) in hourly.time.iter().enumerate() {
        let hour = NaiveDateTime::parse_from_str(time, OPEN_METEO_TIME_FORMAT)
            .map_err(|e| WeatherError::Malformed(format!("{time:?}: {e}")))?;
        if let (Some(temp), Some(wind)) = (hourly.temperature_2m[i], hourly.wind_speed_10m[i]) {
            by_hour.insert(hour, (temp, wind));
        }
    }

    let mut air = Vec::with_capacity(index.len());
    let mut wind = Vec::with_capacity(index.len());
    for ts in index.timestamps() {
        let hour = utc_hour(ts);
        let (t, w) = by_hour.get(&hour).ok_or(WeatherError::MissingHour(hour))?;
        air.push(*t);
        wind.push(w.max(0.0));
    }

    let series = |values| {
        TimeSeries::new(index.clone(), values).map_err(|e| WeatherError::Malformed(e.to_string()))
    };
    Ok(AmbientConditions {
        air_temperature: Profile::PerTimestamp(series(air)?),
        wind_speed: Profile::PerTimestamp(series(wind)?),
    })
}

fn utc_hour(ts: &DateTime<FixedOffset>) -> NaiveDateTime {
    let utc = ts.with_timezone(&Utc).naive_utc();
    utc.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(utc)
}

/// Deterministic diurnal profile: `T = T_mean + A·sin(π·h/12)` on local
/// clock hours, constant wind.
pub fn offline_ambient(profile: &AmbientConfig, index: &TimeIndex) -> AmbientConditions {
    let air = TimeSeries::tabulate(index, |ts| {
        let h = ts.hour() as f64 + ts.minute() as f64 / 60.0;
        profile.mean_air_temperature + profile.diurnal_amplitude * (PI * h / 12.0).sin()
    });
    AmbientConditions {
        air_temperature: Profile::PerTimestamp(air),
        wind_speed: Profile::Constant(profile.wind_speed),
    }
}
