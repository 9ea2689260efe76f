use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::errors::PipelineError;
use crate::models::power::{DailySummary, HourlyEnergy, IrradianceSample, ModuleSpec, ProductionResult};
use crate::models::series::{TimeIndex, TimeSeries};
use crate::services::temperature_model::{AmbientConditions, Mounting, Profile};

// ─── Requests ────────────────────────────────────────────────────────────────

/// Front/rear irradiance series from an external decomposition engine.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SimulationRequest {
    /// Overrides the configured module
    pub module: Option<ModuleSpec>,
    /// Overrides the configured mounting
    pub thermal: Option<Mounting>,
    pub irradiance: Vec<IrradiancePoint>,
    pub ambient: AmbientInput,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IrradiancePoint {
    pub timestamp: DateTime<FixedOffset>,
    /// W/m²
    pub front: f64,
    /// W/m²
    pub rear: f64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AmbientInput {
    /// °C
    pub air_temperature: AmbientValue,
    /// m/s
    pub wind_speed: AmbientValue,
}

/// A single value for the whole run or one value per irradiance point.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AmbientValue {
    Constant(f64),
    Series(Vec<f64>),
}

impl AmbientValue {
    fn profile(&self, index: &TimeIndex) -> Result<Profile, PipelineError> {
        Ok(match self {
            AmbientValue::Constant(v) => Profile::Constant(*v),
            AmbientValue::Series(values) => {
                Profile::PerTimestamp(TimeSeries::new(index.clone(), values.clone())?)
            }
        })
    }
}

impl SimulationRequest {
    /// Irradiance and ambient conditions on one shared time index.
    pub fn series(&self) -> Result<(TimeSeries<IrradianceSample>, AmbientConditions), PipelineError> {
        let irradiance = TimeSeries::from_pairs(
            self.irradiance
                .iter()
                .map(|p| (p.timestamp, IrradianceSample::new(p.front, p.rear))),
        )?;
        let index = irradiance.index();
        let ambient = AmbientConditions {
            air_temperature: self.ambient.air_temperature.profile(index)?,
            wind_speed: self.ambient.wind_speed.profile(index)?,
        };
        Ok((irradiance, ambient))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DayQuery {
    /// Day to simulate (YYYY-MM-DD); the configured date when omitted
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfflineModeSetting {
    pub offline_mode: bool,
}

// ─── Responses ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PowerPoint {
    pub timestamp: DateTime<FixedOffset>,
    /// W/m²
    pub effective_irradiance: f64,
    /// °C
    pub cell_temperature: f64,
    /// DC power (W)
    pub power_w: f64,
    pub front_w: f64,
    pub rear_w: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SimulationResponse {
    pub points: Vec<PowerPoint>,
    pub hourly_energy: Vec<HourlyEnergy>,
    pub daily_summary: DailySummary,
}

impl From<&ProductionResult> for SimulationResponse {
    fn from(result: &ProductionResult) -> Self {
        let points = result
            .power
            .iter()
            .zip(result.effective_irradiance.values())
            .zip(result.cell_temperature.values())
            .zip(result.breakdown.values())
            .map(|((((timestamp, power_w), effective_irradiance), cell_temperature), parts)| PowerPoint {
                timestamp,
                effective_irradiance: *effective_irradiance,
                cell_temperature: *cell_temperature,
                power_w: *power_w,
                front_w: parts.front_w,
                rear_w: parts.rear_w,
            })
            .collect();
        Self {
            points,
            hourly_energy: result.hourly_energy.clone(),
            daily_summary: result.daily_summary.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
