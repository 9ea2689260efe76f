//! One production run: irradiance → cell temperature → DC power → energy.
//!
//! Every stage checks its own inputs and the first `InvalidInput` ends the
//! run; nothing computed before the failure is handed back.

use tracing::{debug, info, info_span};

use crate::config::{ArrayGeometry, RunConfig, SiteConfig};
use crate::errors::PipelineError;
use crate::models::power::{IrradianceSample, ModuleSpec, ProductionResult};
use crate::models::series::TimeSeries;
use crate::services::aggregator;
use crate::services::bifacial::BifacialDecomposition;
use crate::services::power_model::PowerConversionModel;
use crate::services::solar_algorithm::ClearSkySource;
use crate::services::temperature_model::{AmbientConditions, Mounting, TemperatureModel};

#[derive(Debug, Clone, Copy)]
pub struct ProductionPipeline {
    temperature: TemperatureModel,
}

impl From<Mounting> for ProductionPipeline {
    fn from(mounting: Mounting) -> Self {
        Self {
            temperature: TemperatureModel::from(mounting),
        }
    }
}

impl ProductionPipeline {
    pub fn run(
        &self,
        irradiance: &TimeSeries<IrradianceSample>,
        ambient: &AmbientConditions,
        module: &ModuleSpec,
    ) -> Result<ProductionResult, PipelineError> {
        let _span = info_span!("production_run", samples = irradiance.len()).entered();

        let power_model = PowerConversionModel::new(*module)?;

        let effective_irradiance = irradiance.map(|s| s.effective(module.bifaciality));
        let cell_temperature = self.temperature.cell_temperature(&effective_irradiance, ambient)?;
        debug!("cell temperature computed");

        let power = power_model.dc_power(&effective_irradiance, &cell_temperature)?;
        let breakdown = power_model.breakdown(irradiance, &cell_temperature)?;
        debug!("dc power computed");

        let hourly_energy = aggregator::hourly_energy(&power)?;
        let daily_summary = aggregator::daily_summary(&hourly_energy, &power, module);
        info!(
            energy_kwh = daily_summary.energy_kwh,
            peak_w = daily_summary.peak_power_w,
            hours = hourly_energy.len(),
            "production run finished"
        );

        Ok(ProductionResult {
            effective_irradiance,
            cell_temperature,
            power,
            breakdown,
            hourly_energy,
            daily_summary,
        })
    }

    /// Full day for a site: clear sky → front/rear irradiance → [`Self::run`].
    pub fn simulate_day(
        &self,
        run: &RunConfig,
        site: &SiteConfig,
        geometry: &ArrayGeometry,
        sky_source: &dyn ClearSkySource,
        decomposition: &dyn BifacialDecomposition,
        ambient: &AmbientConditions,
    ) -> Result<ProductionResult, PipelineError> {
        let index = run.window.index()?;
        debug!(date = %run.window.date, samples = index.len(), "simulating day");
        let sky = sky_source.sky(site, &index);
        let irradiance = decomposition.decompose(geometry, &sky)?;
        self.run(&irradiance, ambient, &run.module)
    }
}
