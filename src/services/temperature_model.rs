/// ============================================================
///  Cell temperature – Sandia (SAPM) heat-balance model
///
///   T_module = T_air + E · exp(a + b · WS)
///   T_cell   = T_module + E / 1000 · ΔT
///
///  a, b and ΔT depend on how the module is mounted and are
///  fixed for a run.
/// ============================================================

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{PipelineError, ensure_finite};
use crate::models::series::TimeSeries;

const E_REF: f64 = 1000.0; // W/m²

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MountingPreset {
    OpenRackGlassGlass,
    CloseMountGlassGlass,
    OpenRackGlassPolymer,
    InsulatedBackGlassPolymer,
}

/// Either a named mounting preset or explicit SAPM coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Mounting {
    Preset(MountingPreset),
    Custom { a: f64, b: f64, delta_t: f64 },
}

impl Default for Mounting {
    fn default() -> Self {
        Mounting::Preset(MountingPreset::OpenRackGlassGlass)
    }
}

/// Per-run ambient inputs: a single value or one per timestamp.
#[derive(Debug, Clone)]
pub enum Profile {
    Constant(f64),
    PerTimestamp(TimeSeries<f64>),
}

impl Profile {
    fn value(&self, i: usize) -> f64 {
        match self {
            Profile::Constant(v) => *v,
            Profile::PerTimestamp(series) => series.values()[i],
        }
    }

    fn check<T>(&self, against: &TimeSeries<T>, what: &str) -> Result<(), PipelineError> {
        match self {
            Profile::Constant(v) => ensure_finite(what, [v]),
            Profile::PerTimestamp(series) => {
                against.ensure_aligned(series, what)?;
                ensure_finite(what, series.values())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AmbientConditions {
    /// °C
    pub air_temperature: Profile,
    /// m/s, at 10 m
    pub wind_speed: Profile,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureModel {
    a: f64,
    b: f64,
    delta_t: f64,
}

impl From<Mounting> for TemperatureModel {
    fn from(mounting: Mounting) -> Self {
        let (a, b, delta_t) = match mounting {
            Mounting::Preset(MountingPreset::OpenRackGlassGlass) => (-3.47, -0.0594, 3.0),
            Mounting::Preset(MountingPreset::CloseMountGlassGlass) => (-2.98, -0.0471, 1.0),
            Mounting::Preset(MountingPreset::OpenRackGlassPolymer) => (-3.56, -0.0750, 3.0),
            Mounting::Preset(MountingPreset::InsulatedBackGlassPolymer) => (-2.81, -0.0455, 0.0),
            Mounting::Custom { a, b, delta_t } => (a, b, delta_t),
        };
        Self { a, b, delta_t }
    }
}

impl TemperatureModel {
    /// Cell temperature (°C) for one sample.
    pub fn cell_temperature_at(&self, irradiance: f64, air_temp: f64, wind_speed: f64) -> f64 {
        let e = irradiance.max(0.0);
        air_temp + e * (self.a + self.b * wind_speed).exp() + e / E_REF * self.delta_t
    }

    /// Cell temperature series on the irradiance series' timestamps.
    pub fn cell_temperature(
        &self,
        irradiance: &TimeSeries<f64>,
        ambient: &AmbientConditions,
    ) -> Result<TimeSeries<f64>, PipelineError> {
        ensure_finite("irradiance", irradiance.values())?;
        ambient.air_temperature.check(irradiance, "air temperature")?;
        ambient.wind_speed.check(irradiance, "wind speed")?;

        let mut cell = Vec::with_capacity(irradiance.len());
        for (i, e) in irradiance.values().iter().enumerate() {
            let wind_speed = ambient.wind_speed.value(i);
            if wind_speed < 0.0 {
                return Err(PipelineError::invalid(format!(
                    "wind speed must not be negative, got {wind_speed} at sample {i}"
                )));
            }
            cell.push(self.cell_temperature_at(*e, ambient.air_temperature.value(i), wind_speed));
        }
        TimeSeries::new(irradiance.index().clone(), cell)
    }
}
