/// ============================================================
///  Clear-sky irradiance & solar position
///
///  Algorithm pipeline:
///   1. Solar geometry  – declination, equation of time, hour angle,
///                        elevation angle, azimuth angle
///   2. Extraterrestrial irradiance – eccentricity-corrected solar constant
///   3. Clear-sky model  – Bird & Hulstrom simplified:
///                         DNI, DHI, GHI on horizontal plane
///
///  Feeds the bifacial decomposition; no cloud attenuation, this is
///  the cloudless upper bound.
/// ============================================================

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use std::f64::consts::PI;

use crate::config::SiteConfig;
use crate::models::power::SkyConditions;
use crate::models::series::{TimeIndex, TimeSeries};

// ─── Physical constants ──────────────────────────────────────
const SC: f64 = 1361.0; // Solar constant W/m²
const DEG: f64 = PI / 180.0;
const MIN_ELEVATION_DEG: f64 = 0.1;

/// Source of clear-sky irradiance and sun position for a site.
pub trait ClearSkySource {
    fn sky(&self, site: &SiteConfig, index: &TimeIndex) -> TimeSeries<SkyConditions>;
}

/// Sun position at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    pub elevation_deg: f64,
    /// Clockwise from North
    pub azimuth_deg: f64,
    /// Day-of-year angle (rad), shared with the extraterrestrial term
    day_angle: f64,
}

impl SolarPosition {
    pub fn zenith_deg(&self) -> f64 {
        90.0 - self.elevation_deg
    }
}

/// Solar geometry after Spencer (1971).
pub fn solar_position(lat_deg: f64, lon_deg: f64, at: DateTime<FixedOffset>) -> SolarPosition {
    let utc = at.with_timezone(&Utc);

    // ── 1. Time decomposition ──────────────────────────────────
    let doy = utc.ordinal() as f64;
    let ut_h = utc.hour() as f64 + utc.minute() as f64 / 60.0 + utc.second() as f64 / 3600.0;

    // ── 2. Solar geometry ──────────────────────────────────────
    // a) Declination (degrees)
    let b = 2.0 * PI * (doy - 1.0) / 365.0;
    let decl_deg = (180.0 / PI)
        * (0.006918 - 0.399912 * b.cos() + 0.070257 * b.sin() - 0.006758 * (2.0 * b).cos()
            + 0.000907 * (2.0 * b).sin()
            - 0.002697 * (3.0 * b).cos()
            + 0.00148 * (3.0 * b).sin());
    let decl = decl_deg * DEG;

    // b) Equation of Time (minutes)
    let eot_min = 229.18
        * (0.000075 + 0.001868 * b.cos()
            - 0.032077 * b.sin()
            - 0.014615 * (2.0 * b).cos()
            - 0.04089 * (2.0 * b).sin());

    // c) True solar time (hours), straight from UTC and longitude
    let lst_h = ut_h + lon_deg / 15.0 + eot_min / 60.0;

    // d) Hour angle (degrees; negative in morning, positive afternoon)
    let omega = 15.0 * (lst_h - 12.0) * DEG;

    // e) Solar elevation angle
    let lat = lat_deg * DEG;
    let sin_alpha = lat.sin() * decl.sin() + lat.cos() * decl.cos() * omega.cos();
    let alpha_rad = sin_alpha.clamp(-1.0, 1.0).asin();

    // f) Solar azimuth (degrees from North, clockwise)
    let cos_az = if (alpha_rad.cos() * lat.cos()).abs() > 1e-9 {
        (decl.sin() - sin_alpha * lat.sin()) / (alpha_rad.cos() * lat.cos())
    } else {
        0.0
    };
    let az_abs = cos_az.clamp(-1.0, 1.0).acos() / DEG;
    let azimuth_deg = if omega.sin() > 0.0 { 360.0 - az_abs } else { az_abs };

    SolarPosition {
        elevation_deg: alpha_rad / DEG,
        azimuth_deg,
        day_angle: b,
    }
}

/// Simplified Bird & Hulstrom clear-sky model.
#[derive(Debug, Clone, Copy)]
pub struct ClearSkyModel {
    /// Linke turbidity
    pub turbidity: f64,
}

impl Default for ClearSkyModel {
    fn default() -> Self {
        // typical continental aerosol load
        Self { turbidity: 3.0 }
    }
}

impl ClearSkyModel {
    pub fn conditions(&self, position: &SolarPosition) -> SkyConditions {
        let alpha_deg = position.elevation_deg;
        let b = position.day_angle;

        // ── 3. Extraterrestrial irradiance (eccentricity correction) ─
        let e0 = SC
            * (1.00011
                + 0.034221 * b.cos()
                + 0.00128 * b.sin()
                + 0.000719 * (2.0 * b).cos()
                + 0.000077 * (2.0 * b).sin());

        let (ghi, dni, dhi) = if alpha_deg > MIN_ELEVATION_DEG {
            let sin_alpha = (alpha_deg * DEG).sin();
            // Air mass – Kasten & Young (1989)
            let am = 1.0 / (sin_alpha + 0.50572 * (alpha_deg + 6.07995_f64).powf(-1.6364));
            let am = am.max(1.0);

            // Rayleigh
            let tr = (-0.0903 * am.powf(0.84) * (1.0 + am - am.powf(1.01))).exp();
            // Ozone (standard column 0.3 atm-cm)
            let to = 1.0 - 0.0013 * am;
            // Aerosol
            let ta = (-0.09 * self.turbidity.powf(0.978) * am.powf(0.9455)).exp();
            // Water vapour (moderate precipitable water 1.5 cm)
            let tw = 1.0 - 0.0075 * am.powf(0.65);

            let total_t = tr * to * ta * tw;
            let dni = 0.9762 * e0 * total_t;
            // Diffuse (sky scatter + back-scatter)
            let dhi = (0.79 * e0 * sin_alpha * (1.0 - total_t) * (0.5 * (1.0 - tr) + ba_scatter_coeff(ta))
                / (1.0 - am + am.powf(1.02)))
            .max(0.0);
            let ghi = (dni * sin_alpha + dhi).max(0.0);
            (ghi, dni, dhi)
        } else {
            (0.0, 0.0, 0.0)
        };

        SkyConditions {
            ghi,
            dni,
            dhi,
            solar_zenith_deg: position.zenith_deg(),
            solar_azimuth_deg: position.azimuth_deg,
        }
    }
}

impl ClearSkySource for ClearSkyModel {
    fn sky(&self, site: &SiteConfig, index: &TimeIndex) -> TimeSeries<SkyConditions> {
        TimeSeries::tabulate(index, |ts| {
            self.conditions(&solar_position(site.latitude, site.longitude, *ts))
        })
    }
}

// ─── Helper: back-scatter term for Bird diffuse ──────────────
#[inline]
fn ba_scatter_coeff(ta: f64) -> f64 {
    // Approximated from Bird (1981) Table 2
    0.5 * (0.92 - ta.ln().abs() / 10.0).clamp(0.2, 0.5)
}
