/// ============================================================
///  DC power – PVWatts-style conversion
///
///   P = P_stc × (E / 1000) × [1 + γ/100 × (T_cell − 25)]
///
///  E is the bifacial effective irradiance, γ the temperature
///  coefficient in %/°C. Output is floored at 0 W.
/// ============================================================

use crate::errors::{PipelineError, ensure_finite};
use crate::models::power::{IrradianceSample, ModuleSpec, PowerBreakdown};
use crate::models::series::TimeSeries;

// STC reference conditions
const E_STC: f64 = 1000.0; // W/m²
const T_STC: f64 = 25.0; // °C

#[derive(Debug, Clone, Copy)]
pub struct PowerConversionModel {
    module: ModuleSpec,
}

impl PowerConversionModel {
    pub fn new(module: ModuleSpec) -> Result<Self, PipelineError> {
        module.validate()?;
        Ok(Self { module })
    }

    /// DC power (W) at one instant. Negative irradiance counts as darkness.
    pub fn dc_power_at(&self, irradiance: f64, cell_temp: f64) -> f64 {
        let e = irradiance.max(0.0);
        let temp_factor =
            1.0 + self.module.temperature_coefficient / 100.0 * (cell_temp - T_STC);
        let power = e / E_STC * self.module.rated_power_stc * temp_factor;
        // also maps -0.0 to 0.0
        if power > 0.0 { power } else { 0.0 }
    }

    /// DC power series from effective irradiance and cell temperature.
    pub fn dc_power(
        &self,
        effective_irradiance: &TimeSeries<f64>,
        cell_temperature: &TimeSeries<f64>,
    ) -> Result<TimeSeries<f64>, PipelineError> {
        effective_irradiance.ensure_aligned(cell_temperature, "cell temperature")?;
        ensure_finite("effective irradiance", effective_irradiance.values())?;
        ensure_finite("cell temperature", cell_temperature.values())?;

        let power = effective_irradiance
            .values()
            .iter()
            .zip(cell_temperature.values())
            .map(|(e, t)| self.dc_power_at(*e, *t))
            .collect();
        TimeSeries::new(effective_irradiance.index().clone(), power)
    }

    /// Front- and rear-face contributions, each converted on its own.
    ///
    /// The two add up to [`Self::dc_power`] of the effective irradiance as long
    /// as neither face reports negative irradiance.
    pub fn breakdown(
        &self,
        irradiance: &TimeSeries<IrradianceSample>,
        cell_temperature: &TimeSeries<f64>,
    ) -> Result<TimeSeries<PowerBreakdown>, PipelineError> {
        irradiance.ensure_aligned(cell_temperature, "cell temperature")?;

        let breakdown = irradiance
            .values()
            .iter()
            .zip(cell_temperature.values())
            .map(|(sample, t)| PowerBreakdown {
                front_w: self.dc_power_at(sample.front, *t),
                rear_w: self.dc_power_at(sample.rear * self.module.bifaciality, *t),
            })
            .collect();
        TimeSeries::new(irradiance.index().clone(), breakdown)
    }
}
