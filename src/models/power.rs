use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::PipelineError;
use crate::models::series::TimeSeries;

// ─── Module configuration ────────────────────────────────────────────────────

/// Electrical rating of the bifacial module. Fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModuleSpec {
    /// DC power at STC: 1000 W/m², 25 °C cell (W)
    pub rated_power_stc: f64,
    /// Power temperature coefficient (%/°C), usually negative
    pub temperature_coefficient: f64,
    /// Rear-to-front efficiency ratio [0..1]
    pub bifaciality: f64,
}

impl ModuleSpec {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.rated_power_stc.is_finite() && self.rated_power_stc > 0.0) {
            return Err(PipelineError::invalid(format!(
                "rated_power_stc must be positive, got {}",
                self.rated_power_stc
            )));
        }
        if !self.temperature_coefficient.is_finite() {
            return Err(PipelineError::invalid(
                "temperature_coefficient must be finite",
            ));
        }
        if !(0.0..=1.0).contains(&self.bifaciality) {
            return Err(PipelineError::invalid(format!(
                "bifaciality must lie in [0, 1], got {}",
                self.bifaciality
            )));
        }
        Ok(())
    }
}

// ─── Irradiance inputs ───────────────────────────────────────────────────────

/// Clear-sky irradiance and sun position at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkyConditions {
    /// Global horizontal irradiance (W/m²)
    pub ghi: f64,
    /// Direct normal irradiance (W/m²)
    pub dni: f64,
    /// Diffuse horizontal irradiance (W/m²)
    pub dhi: f64,
    /// Solar zenith angle (deg)
    pub solar_zenith_deg: f64,
    /// Solar azimuth, clockwise from North (deg)
    pub solar_azimuth_deg: f64,
}

/// Plane-of-array irradiance reaching each face of the module (W/m²).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct IrradianceSample {
    pub front: f64,
    pub rear: f64,
}

impl IrradianceSample {
    pub fn new(front: f64, rear: f64) -> Self {
        Self { front, rear }
    }

    /// Front irradiance plus the rear irradiance weighted by bifaciality.
    pub fn effective(&self, bifaciality: f64) -> f64 {
        self.front + self.rear * bifaciality
    }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// DC power split by the face that produced it (W).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerBreakdown {
    pub front_w: f64,
    pub rear_w: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HourlyEnergy {
    /// Start of the calendar hour, in the samples' own offset
    pub hour_start: DateTime<FixedOffset>,
    /// Energy produced during the hour (Wh)
    pub energy_wh: f64,
    /// Number of samples that fell in the hour
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailySummary {
    /// Total energy over the window (kWh)
    pub energy_kwh: f64,
    /// Total energy over the window (Wh)
    pub energy_wh: f64,
    /// Highest instantaneous DC power (W)
    pub peak_power_w: f64,
    pub peak_at: Option<DateTime<FixedOffset>>,
    /// Energy per installed kWp (kWh/kWp)
    pub specific_yield_kwh_kwp: f64,
}

/// Everything one production run computes.
#[derive(Debug, Clone)]
pub struct ProductionResult {
    pub effective_irradiance: TimeSeries<f64>,
    pub cell_temperature: TimeSeries<f64>,
    pub power: TimeSeries<f64>,
    pub breakdown: TimeSeries<PowerBreakdown>,
    pub hourly_energy: Vec<HourlyEnergy>,
    pub daily_summary: DailySummary,
}

// ─── Open-Meteo wire types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HourlyWeatherResponse {
    pub hourly: HourlyWeather,
}

/// Parallel hourly columns; `time` is "YYYY-MM-DDTHH:MM" in UTC.
#[derive(Debug, Deserialize)]
pub struct HourlyWeather {
    pub time: Vec<String>,
    pub temperature_2m: Vec<Option<f64>>,
    pub wind_speed_10m: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[fixture]
    fn module() -> ModuleSpec {
        ModuleSpec {
            rated_power_stc: 500.0,
            temperature_coefficient: -3.8,
            bifaciality: 0.7,
        }
    }

    #[rstest]
    fn valid_module_passes(module: ModuleSpec) {
        assert!(module.validate().is_ok());
    }

    #[rstest]
    #[case(0.0)]
    #[case(-500.0)]
    #[case(f64::NAN)]
    fn non_positive_rated_power_is_rejected(module: ModuleSpec, #[case] rated_power_stc: f64) {
        let module = ModuleSpec {
            rated_power_stc,
            ..module
        };
        assert!(matches!(
            module.validate(),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.2)]
    fn bifaciality_outside_unit_interval_is_rejected(module: ModuleSpec, #[case] bifaciality: f64) {
        let module = ModuleSpec {
            bifaciality,
            ..module
        };
        assert!(module.validate().is_err());
    }

    #[test]
    fn effective_irradiance_weights_rear_by_bifaciality() {
        let sample = IrradianceSample::new(800.0, 120.0);
        assert_eq!(sample.effective(0.7), 800.0 + 120.0 * 0.7);
        assert_eq!(sample.effective(0.0), 800.0);
    }
}
