use chrono::NaiveDate;
use tracing::info;

use crate::config::Config;
use crate::errors::RunError;
use crate::models::power::ProductionResult;
use crate::services::bifacial::IsotropicBifacialModel;
use crate::services::pipeline::ProductionPipeline;
use crate::services::solar_algorithm::ClearSkyModel;
use crate::services::weather_service;

/// Runs the configured site and array for one day through the clear-sky and
/// bifacial reference models.
pub async fn simulate_configured_day(
    config: &Config,
    date: Option<NaiveDate>,
    offline_mode: bool,
) -> Result<ProductionResult, RunError> {
    let run = config.run_config(date)?;
    let index = run.window.index()?;
    info!(date = %run.window.date, offline_mode, "simulating configured day");

    let ambient = weather_service::get_ambient(&config.site, &config.ambient, &index, offline_mode).await;
    let result = ProductionPipeline::from(run.thermal).simulate_day(
        &run,
        &config.site,
        &config.array,
        &ClearSkyModel::default(),
        &IsotropicBifacialModel,
        &ambient,
    )?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;

    #[tokio::test]
    async fn offline_day_has_a_sample_per_minute() {
        let result = simulate_configured_day(&sample_config(), None, true).await.unwrap();
        assert_eq!(result.power.len(), 1440);
        assert!(result.daily_summary.energy_kwh > 0.0);
    }

    #[tokio::test]
    async fn winter_day_yields_less_than_summer() {
        let config = sample_config();
        let summer = simulate_configured_day(&config, None, true).await.unwrap();
        let winter = simulate_configured_day(&config, NaiveDate::from_ymd_opt(2025, 12, 21), true)
            .await
            .unwrap();
        assert!(winter.daily_summary.energy_kwh < summer.daily_summary.energy_kwh);
    }
}
