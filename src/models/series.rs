//! Time axis shared by every series that flows through a production run.
//!
//! Series built from the same [`TimeIndex`] share one reference-counted list
//! of timestamps, so checking that two series line up is a pointer comparison
//! in the common case and a slice comparison otherwise.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::errors::PipelineError;

#[derive(Debug, Clone)]
pub struct TimeIndex {
    timestamps: Arc<[DateTime<FixedOffset>]>,
}

impl TimeIndex {
    /// Build an index from explicit timestamps, which must be strictly increasing.
    pub fn new(timestamps: Vec<DateTime<FixedOffset>>) -> Result<Self, PipelineError> {
        if let Some(i) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            let reason = if timestamps[i + 1] == timestamps[i] {
                "duplicate"
            } else {
                "out-of-order"
            };
            return Err(PipelineError::invalid(format!(
                "{reason} timestamp {} at sample {}",
                timestamps[i + 1].to_rfc3339(),
                i + 1
            )));
        }
        Ok(Self {
            timestamps: timestamps.into(),
        })
    }

    /// `count` timestamps starting at `start`, `step` apart.
    pub fn regular(
        start: DateTime<FixedOffset>,
        step: TimeDelta,
        count: usize,
    ) -> Result<Self, PipelineError> {
        if step <= TimeDelta::zero() {
            return Err(PipelineError::invalid(format!(
                "sampling step must be positive, got {step}"
            )));
        }
        let timestamps = (0..count)
            .map(|i| start + step * i as i32)
            .collect::<Vec<_>>();
        Ok(Self {
            timestamps: timestamps.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn timestamps(&self) -> &[DateTime<FixedOffset>] {
        &self.timestamps
    }

    pub fn first(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamps.first().copied()
    }

    /// Same instants in the same order.
    pub fn is_aligned_with(&self, other: &TimeIndex) -> bool {
        Arc::ptr_eq(&self.timestamps, &other.timestamps) || self.timestamps == other.timestamps
    }

    /// The fixed spacing between consecutive samples.
    ///
    /// Needs at least two samples, all the same distance apart.
    pub fn sampling_interval(&self) -> Result<TimeDelta, PipelineError> {
        if self.timestamps.len() < 2 {
            return Err(PipelineError::invalid(format!(
                "sampling interval needs at least 2 samples, got {}",
                self.timestamps.len()
            )));
        }
        let step = self.timestamps[1] - self.timestamps[0];
        match self
            .timestamps
            .windows(2)
            .position(|w| w[1] - w[0] != step)
        {
            Some(i) => Err(PipelineError::invalid(format!(
                "non-uniform sampling: expected {step} between samples, found {} after sample {i}",
                self.timestamps[i + 1] - self.timestamps[i]
            ))),
            None => Ok(step),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeSeries<T> {
    index: TimeIndex,
    values: Vec<T>,
}

impl<T> TimeSeries<T> {
    pub fn new(index: TimeIndex, values: Vec<T>) -> Result<Self, PipelineError> {
        if index.len() != values.len() {
            return Err(PipelineError::invalid(format!(
                "{} values supplied for {} timestamps",
                values.len(),
                index.len()
            )));
        }
        Ok(Self { index, values })
    }

    /// Build a series from `(timestamp, value)` pairs in time order.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (DateTime<FixedOffset>, T)>,
    ) -> Result<Self, PipelineError> {
        let (timestamps, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self::new(TimeIndex::new(timestamps)?, values)
    }

    /// Evaluate `f` at every timestamp of `index`.
    pub fn tabulate(index: &TimeIndex, f: impl FnMut(&DateTime<FixedOffset>) -> T) -> Self {
        Self {
            index: index.clone(),
            values: index.timestamps().iter().map(f).collect(),
        }
    }

    /// Every sample set to the same value.
    #[cfg(test)]
    pub fn constant(index: &TimeIndex, value: T) -> Self
    where
        T: Clone,
    {
        Self {
            index: index.clone(),
            values: vec![value; index.len()],
        }
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<FixedOffset>, &T)> {
        self.index.timestamps().iter().copied().zip(self.values.iter())
    }

    /// A new series on the same index.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> TimeSeries<U> {
        TimeSeries {
            index: self.index.clone(),
            values: self.values.iter().map(f).collect(),
        }
    }

    /// Fails with `InvalidInput` unless `other` sits on the same timestamps.
    pub fn ensure_aligned<U>(&self, other: &TimeSeries<U>, what: &str) -> Result<(), PipelineError> {
        if self.index.is_aligned_with(&other.index) {
            return Ok(());
        }
        if self.len() != other.len() {
            return Err(PipelineError::invalid(format!(
                "{what} has {} samples, expected {}",
                other.len(),
                self.len()
            )));
        }
        let i = self
            .index
            .timestamps()
            .iter()
            .zip(other.index.timestamps())
            .position(|(a, b)| a != b)
            .unwrap_or_default();
        Err(PipelineError::invalid(format!(
            "{what} timestamp {} does not match {} at sample {i}",
            other.index.timestamps()[i].to_rfc3339(),
            self.index.timestamps()[i].to_rfc3339()
        )))
    }
}
