use std::path::Path;

use chrono::{FixedOffset, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{ConfigError, PipelineError};
use crate::models::power::ModuleSpec;
use crate::models::series::TimeIndex;
use crate::services::temperature_model::Mounting;

const MINUTES_PER_DAY: u32 = 24 * 60;

fn default_offline_mode() -> bool { false }
fn default_step_minutes() -> u32 { 1 }

#[derive(Debug, Deserialize, Serialize, Clone, ToSchema)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default = "default_offline_mode")]
    pub offline_mode: bool,
    pub site: SiteConfig,
    pub array: ArrayGeometry,
    pub module: ModuleSpec,
    #[serde(default)]
    pub thermal: Mounting,
    pub window: WindowConfig,
    #[serde(default)]
    pub ambient: AmbientConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, ToSchema)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, ToSchema)]
pub struct SiteConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Fixed UTC offset the window is expressed in, e.g. "-01:00"
    pub timezone: String,
}

impl SiteConfig {
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.timezone.parse::<FixedOffset>().map_err(|e| {
            ConfigError::Invalid(format!("timezone {:?} is not a UTC offset: {e}", self.timezone))
        })
    }
}

/// Fixed-tilt row geometry handed to the bifacial decomposition.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, ToSchema)]
pub struct ArrayGeometry {
    /// Height of the row centre above ground (m)
    pub pvrow_height: f64,
    /// Slant width of the row (m)
    pub pvrow_width: f64,
    /// Tilt from horizontal (deg)
    pub surface_tilt: f64,
    /// Direction the front face looks, clockwise from North (deg); 180 = south
    pub surface_azimuth: f64,
    /// Ground coverage ratio: row width / row pitch
    pub gcr: f64,
    pub albedo: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, ToSchema)]
pub struct WindowConfig {
    pub date: NaiveDate,
    #[serde(default = "default_step_minutes")]
    pub step_minutes: u32,
}

/// Offline diurnal ambient profile, also the fallback when the weather API is unreachable.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, ToSchema)]
pub struct AmbientConfig {
    pub mean_air_temperature: f64,
    pub diurnal_amplitude: f64,
    pub wind_speed: f64,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            mean_air_temperature: 25.0,
            diurnal_amplitude: 5.0,
            wind_speed: 1.0,
        }
    }
}

/// Everything one production run needs, fixed before it starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub module: ModuleSpec,
    pub thermal: Mounting,
    pub window: RunWindow,
}

/// One calendar day in a fixed offset, sampled every `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunWindow {
    pub date: NaiveDate,
    pub offset: FixedOffset,
    pub step: TimeDelta,
}

impl RunWindow {
    /// Timestamps covering `[date 00:00, date+1 00:00)`.
    pub fn index(&self) -> Result<TimeIndex, PipelineError> {
        let start = self
            .date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(self.offset).single())
            .ok_or_else(|| PipelineError::invalid(format!("no midnight on {}", self.date)))?;
        let step_minutes = self.step.num_minutes();
        if step_minutes <= 0 {
            return Err(PipelineError::invalid(format!(
                "sampling step must be at least one minute, got {}",
                self.step
            )));
        }
        let count = MINUTES_PER_DAY as i64 / step_minutes;
        TimeIndex::regular(start, self.step, count as usize)
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.site.offset()?;
        if !(-90.0..=90.0).contains(&self.site.latitude) {
            return Err(ConfigError::Invalid(format!(
                "latitude must lie in [-90, 90], got {}",
                self.site.latitude
            )));
        }
        let step = self.window.step_minutes;
        if step == 0 || MINUTES_PER_DAY % step != 0 {
            return Err(ConfigError::Invalid(format!(
                "step_minutes must divide a day evenly, got {step}"
            )));
        }
        let array = &self.array;
        if !(0.0..=90.0).contains(&array.surface_tilt) {
            return Err(ConfigError::Invalid(format!(
                "surface_tilt must lie in [0, 90], got {}",
                array.surface_tilt
            )));
        }
        if !(array.gcr > 0.0 && array.gcr <= 1.0) {
            return Err(ConfigError::Invalid(format!("gcr must lie in (0, 1], got {}", array.gcr)));
        }
        if !(0.0..=1.0).contains(&array.albedo) {
            return Err(ConfigError::Invalid(format!("albedo must lie in [0, 1], got {}", array.albedo)));
        }
        if array.pvrow_height <= 0.0 || array.pvrow_width <= 0.0 {
            return Err(ConfigError::Invalid("row height and width must be positive".into()));
        }
        self.module
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// The immutable run parameters, optionally for another date.
    pub fn run_config(&self, date: Option<NaiveDate>) -> Result<RunConfig, ConfigError> {
        Ok(RunConfig {
            module: self.module,
            thermal: self.thermal,
            window: RunWindow {
                date: date.unwrap_or(self.window.date),
                offset: self.site.offset()?,
                step: TimeDelta::minutes(self.window.step_minutes as i64),
            },
        })
    }
}
