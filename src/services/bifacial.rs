/// ============================================================
///  Front / rear plane-of-array irradiance for a fixed-tilt row
///
///  Front face – isotropic transposition:
///     beam × (1 − row shading) + sky diffuse + ground reflected
///  Rear face  – same isotropic terms seen from the back normal,
///     with the ground-reflected part reduced by the strip of
///     ground shaded by the rows themselves.
/// ============================================================

use std::f64::consts::PI;

use crate::config::ArrayGeometry;
use crate::errors::PipelineError;
use crate::models::power::{IrradianceSample, SkyConditions};
use crate::models::series::TimeSeries;

const DEG: f64 = PI / 180.0;

/// Splits sky conditions into front and rear plane-of-array irradiance.
pub trait BifacialDecomposition {
    fn decompose(
        &self,
        geometry: &ArrayGeometry,
        sky: &TimeSeries<SkyConditions>,
    ) -> Result<TimeSeries<IrradianceSample>, PipelineError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IsotropicBifacialModel;

impl IsotropicBifacialModel {
    pub fn sample(&self, geometry: &ArrayGeometry, sky: &SkyConditions) -> IrradianceSample {
        let tilt = geometry.surface_tilt * DEG;
        let zenith = sky.solar_zenith_deg * DEG;
        let az_diff = (sky.solar_azimuth_deg - geometry.surface_azimuth) * DEG;

        // Angle of incidence on the front normal; the back normal is its opposite
        let cos_aoi = zenith.cos() * tilt.cos() + zenith.sin() * tilt.sin() * az_diff.cos();
        let sun_up = sky.solar_zenith_deg < 90.0;

        let beam_front = if sun_up {
            sky.dni * cos_aoi.max(0.0) * (1.0 - front_shaded_fraction(geometry, sky))
        } else {
            0.0
        };
        let beam_rear = if sun_up { sky.dni * (-cos_aoi).max(0.0) } else { 0.0 };

        let sky_front = sky.dhi * (1.0 + tilt.cos()) / 2.0;
        let sky_rear = sky.dhi * (1.0 - tilt.cos()) / 2.0;

        let reflected = sky.ghi * geometry.albedo;
        let ground_front = reflected * (1.0 - tilt.cos()) / 2.0;
        let ground_rear = reflected * (1.0 + tilt.cos()) / 2.0 * lit_ground_fraction(geometry);

        IrradianceSample {
            front: (beam_front + sky_front + ground_front).max(0.0),
            rear: (beam_rear + sky_rear + ground_rear).max(0.0),
        }
    }
}

/// Share of the front face shaded by the row in front of it.
///
/// Uses the sun's profile angle in the plane perpendicular to the rows:
/// `fs = 1 − sin(αp) / (gcr · sin(αp + β))`.
fn front_shaded_fraction(geometry: &ArrayGeometry, sky: &SkyConditions) -> f64 {
    let az_diff = (sky.solar_azimuth_deg - geometry.surface_azimuth) * DEG;
    let elevation = (90.0 - sky.solar_zenith_deg) * DEG;
    if elevation <= 0.0 || az_diff.cos() <= 0.0 {
        return 0.0;
    }
    let tilt = geometry.surface_tilt * DEG;
    let profile = (elevation.tan() / az_diff.cos()).atan();
    (1.0 - profile.sin() / (geometry.gcr * (profile + tilt).sin())).clamp(0.0, 1.0)
}

/// Share of the ground seen from the rear face that is not under a row.
///
/// Rows shade `gcr` of the ground; the higher the row sits relative to its
/// footprint, the more of the unshaded ground between rows the back sees.
fn lit_ground_fraction(geometry: &ArrayGeometry) -> f64 {
    let footprint = geometry.pvrow_width * (geometry.surface_tilt * DEG).cos();
    let shade_view = footprint / (footprint + 2.0 * geometry.pvrow_height);
    (1.0 - geometry.gcr * shade_view).clamp(0.0, 1.0)
}

impl BifacialDecomposition for IsotropicBifacialModel {
    fn decompose(
        &self,
        geometry: &ArrayGeometry,
        sky: &TimeSeries<SkyConditions>,
    ) -> Result<TimeSeries<IrradianceSample>, PipelineError> {
        if !(geometry.gcr > 0.0 && geometry.gcr <= 1.0) {
            return Err(PipelineError::invalid(format!(
                "ground coverage ratio must lie in (0, 1], got {}",
                geometry.gcr
            )));
        }
        Ok(sky.map(|conditions| self.sample(geometry, conditions)))
    }
}
