//! Sub-hourly power → hourly energy → daily total.
//!
//! Each sample stands for the interval that starts at its timestamp (left
//! Riemann sum), so a sample contributes `P × Δt` to the calendar hour its
//! timestamp falls in. Hours at the edges of the window only count the samples
//! actually present.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, TimeZone, Timelike};

use crate::errors::{PipelineError, ensure_finite};
use crate::models::power::{DailySummary, HourlyEnergy, ModuleSpec};
use crate::models::series::TimeSeries;

const SECONDS_PER_HOUR: f64 = 3600.0;
const WH_PER_KWH: f64 = 1000.0;

/// Start of the calendar hour containing `ts`, in `ts`'s own offset.
fn hour_bucket(ts: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let offset = *ts.offset();
    let local = ts.naive_local();
    let floored = local
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local);
    // a fixed offset maps every local time to exactly one instant
    offset.from_local_datetime(&floored).single().unwrap_or(ts)
}

/// Energy per calendar hour (Wh), ordered by hour.
pub fn hourly_energy(power: &TimeSeries<f64>) -> Result<Vec<HourlyEnergy>, PipelineError> {
    let step = power.index().sampling_interval()?;
    ensure_finite("power", power.values())?;
    let step_seconds = step.num_seconds() as f64 + step.subsec_nanos() as f64 / 1e9;
    let step_hours = step_seconds / SECONDS_PER_HOUR;

    let mut buckets: BTreeMap<DateTime<FixedOffset>, (f64, usize)> = BTreeMap::new();
    for (ts, p) in power.iter() {
        let bucket = buckets.entry(hour_bucket(ts)).or_default();
        bucket.0 += p * step_hours;
        bucket.1 += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|(hour_start, (energy_wh, samples))| HourlyEnergy {
            hour_start,
            energy_wh,
            samples,
        })
        .collect())
}

/// Daily totals from the hourly buckets and the instantaneous power.
pub fn daily_summary(
    hourly: &[HourlyEnergy],
    power: &TimeSeries<f64>,
    module: &ModuleSpec,
) -> DailySummary {
    let energy_wh: f64 = hourly.iter().map(|h| h.energy_wh).sum();
    let energy_kwh = energy_wh / WH_PER_KWH;

    let peak = power
        .iter()
        .filter(|(_, p)| **p > 0.0)
        .max_by(|a, b| a.1.total_cmp(b.1));

    DailySummary {
        energy_kwh,
        energy_wh,
        peak_power_w: peak.map(|(_, p)| *p).unwrap_or(0.0),
        peak_at: peak.map(|(ts, _)| ts),
        specific_yield_kwh_kwp: energy_kwh / (module.rated_power_stc / WH_PER_KWH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::series::TimeIndex;
    use approx::assert_relative_eq;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn tz() -> FixedOffset {
        FixedOffset::west_opt(3600).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2025, 6, 21, hour, minute, 0).unwrap()
    }

    fn minutes_from(start: DateTime<FixedOffset>, values: Vec<f64>) -> TimeSeries<f64> {
        let index = TimeIndex::regular(start, TimeDelta::minutes(1), values.len()).unwrap();
        TimeSeries::new(index, values).unwrap()
    }

    #[fixture]
    fn module() -> ModuleSpec {
        ModuleSpec {
            rated_power_stc: 500.0,
            temperature_coefficient: -0.38,
            bifaciality: 0.7,
        }
    }

    #[test]
    fn constant_power_over_a_full_hour() {
        let power = minutes_from(at(12, 0), vec![600.0; 60]);
        let hourly = hourly_energy(&power).unwrap();
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly[0].hour_start, at(12, 0));
        assert_eq!(hourly[0].samples, 60);
        assert_relative_eq!(hourly[0].energy_wh, 600.0, max_relative = 1e-12);
    }

    #[test]
    fn partial_hours_use_only_present_samples() {
        // 10:30 .. 12:14
        let power = minutes_from(at(10, 30), vec![120.0; 105]);
        let hourly = hourly_energy(&power).unwrap();
        let starts: Vec<_> = hourly.iter().map(|h| h.hour_start).collect();
        assert_eq!(starts, vec![at(10, 0), at(11, 0), at(12, 0)]);
        let samples: Vec<_> = hourly.iter().map(|h| h.samples).collect();
        assert_eq!(samples, vec![30, 60, 15]);
        assert_relative_eq!(hourly[0].energy_wh, 60.0, max_relative = 1e-12);
        assert_relative_eq!(hourly[1].energy_wh, 120.0, max_relative = 1e-12);
        assert_relative_eq!(hourly[2].energy_wh, 30.0, max_relative = 1e-12);
    }

    #[test]
    fn buckets_follow_the_timestamps_own_offset() {
        // 05:30 in +05:30 is midnight UTC, but the bucket is the local 05:00 hour
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let start = ist.with_ymd_and_hms(2025, 6, 21, 5, 30, 0).unwrap();
        let hourly = hourly_energy(&minutes_from(start, vec![60.0; 10])).unwrap();
        assert_eq!(hourly[0].hour_start, ist.with_ymd_and_hms(2025, 6, 21, 5, 0, 0).unwrap());
    }

    #[test]
    fn fifteen_minute_sampling() {
        let index = TimeIndex::regular(at(8, 0), TimeDelta::minutes(15), 8).unwrap();
        let power = TimeSeries::new(index, vec![100.0, 200.0, 300.0, 400.0, 0.0, 0.0, 0.0, 400.0]).unwrap();
        let hourly = hourly_energy(&power).unwrap();
        assert_relative_eq!(hourly[0].energy_wh, 250.0, max_relative = 1e-12);
        assert_relative_eq!(hourly[1].energy_wh, 100.0, max_relative = 1e-12);
    }

    #[test]
    fn fractional_millisecond_step_is_not_truncated() {
        // 1.5 ms apart
        let index = TimeIndex::regular(at(12, 0), TimeDelta::microseconds(1500), 3).unwrap();
        let power = TimeSeries::new(index, vec![1000.0; 3]).unwrap();
        let hourly = hourly_energy(&power).unwrap();
        let riemann_wh = 3.0 * 1000.0 * 0.0015 / 3600.0;
        assert_relative_eq!(hourly[0].energy_wh, riemann_wh, max_relative = 1e-12);
    }

    #[test]
    fn single_sample_has_no_interval() {
        let power = minutes_from(at(12, 0), vec![100.0]);
        assert!(matches!(hourly_energy(&power), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn non_uniform_spacing_is_rejected() {
        let power =
            TimeSeries::from_pairs([(at(12, 0), 1.0), (at(12, 1), 1.0), (at(12, 5), 1.0)]).unwrap();
        assert!(hourly_energy(&power).is_err());
    }

    #[rstest]
    fn hourly_total_matches_riemann_sum(module: ModuleSpec) {
        let values: Vec<f64> = (0..1440)
            .map(|m| (std::f64::consts::PI * m as f64 / 1440.0).sin().max(0.0) * 450.0)
            .collect();
        let riemann_wh: f64 = values.iter().sum::<f64>() / 60.0;
        let power = minutes_from(at(0, 0), values);

        let hourly = hourly_energy(&power).unwrap();
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly.iter().map(|h| h.samples).sum::<usize>(), 1440);

        let summary = daily_summary(&hourly, &power, &module);
        assert_relative_eq!(summary.energy_wh, riemann_wh, max_relative = 1e-9);
        assert_relative_eq!(summary.energy_kwh, summary.energy_wh / 1000.0, max_relative = 1e-9);
        assert_relative_eq!(summary.specific_yield_kwh_kwp, summary.energy_kwh / 0.5);
        assert_eq!(summary.peak_at, Some(at(12, 0)));
    }

    #[rstest]
    fn night_only_day_is_zero(module: ModuleSpec) {
        let power = minutes_from(at(0, 0), vec![0.0; 1440]);
        let hourly = hourly_energy(&power).unwrap();
        let summary = daily_summary(&hourly, &power, &module);
        assert_eq!(summary.energy_kwh, 0.0);
        assert_eq!(summary.peak_power_w, 0.0);
        assert_eq!(summary.peak_at, None);
    }
}
