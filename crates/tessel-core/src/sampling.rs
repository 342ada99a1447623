// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded time-sample arrays for points, transforms and instance transforms.

use crate::math::Blend;
use std::fmt;

/// The maximum number of time samples kept per quantity.
pub const MAX_MOTION_SAMPLES: usize = 3;

/// An error raised while filling a [`TimeSampleArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// The array is already at capacity.
    CapacityExceeded {
        /// The fixed capacity.
        capacity: usize,
    },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::CapacityExceeded { capacity } => {
                write!(f, "Time sample array is full ({capacity} samples)")
            }
        }
    }
}

impl std::error::Error for SampleError {}

/// Parallel arrays of sample times and sampled values.
///
/// Times are stored as supplied and are not required to be sorted. A count of
/// zero means "no data" and a count of one means "static".
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSampleArray<T, const CAP: usize = MAX_MOTION_SAMPLES> {
    times: Vec<f32>,
    values: Vec<T>,
}

impl<T, const CAP: usize> Default for TimeSampleArray<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAP: usize> TimeSampleArray<T, CAP> {
    /// Creates an empty array.
    pub fn new() -> Self {
        Self {
            times: Vec::with_capacity(CAP),
            values: Vec::with_capacity(CAP),
        }
    }

    /// Creates an array holding one sample at time zero.
    pub fn from_static(value: T) -> Self {
        let mut samples = Self::new();
        samples.times.push(0.0);
        samples.values.push(value);
        samples
    }

    /// The fixed capacity.
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Appends a sample.
    pub fn push(&mut self, time: f32, value: T) -> Result<(), SampleError> {
        if self.times.len() >= CAP {
            return Err(SampleError::CapacityExceeded { capacity: CAP });
        }
        self.times.push(time);
        self.values.push(value);
        Ok(())
    }

    /// Number of samples.
    #[inline]
    pub fn count(&self) -> usize {
        self.times.len()
    }

    /// Returns `true` when there is no sample.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns `true` when there are fewer than two samples.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.count() <= 1
    }

    /// The sample times, in insertion order.
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    /// The sampled values, in insertion order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterates `(time, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (f32, &T)> {
        self.times.iter().copied().zip(self.values.iter())
    }

    /// Index of the sample taken exactly at `time`, if any.
    pub fn index_of_time(&self, time: f32) -> Option<usize> {
        self.times.iter().position(|&t| t == time)
    }

    /// Index of the primary sample: the one at time zero, else the first.
    pub fn primary_index(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.index_of_time(0.0).unwrap_or(0))
        }
    }

    /// The primary sample: the one at time zero, else the first.
    pub fn primary(&self) -> Option<&T> {
        self.primary_index().map(|i| &self.values[i])
    }

    /// Sample indices ordered by ascending time.
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.count()).collect();
        order.sort_by(|&a, &b| self.times[a].total_cmp(&self.times[b]));
        order
    }

    /// Maps every value, keeping times.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> TimeSampleArray<U, CAP> {
        TimeSampleArray {
            times: self.times.clone(),
            values: self.values.iter().map(f).collect(),
        }
    }
}

impl<T: Blend, const CAP: usize> TimeSampleArray<T, CAP> {
    /// Evaluates the samples at `time`.
    ///
    /// Times outside the sampled range clamp to the nearest end sample; times in
    /// between blend linearly between the bracketing samples. Returns `None` when
    /// the array is empty.
    pub fn resample(&self, time: f32) -> Option<T> {
        let order = self.sorted_indices();
        let (&first, &last) = (order.first()?, order.last()?);

        if time <= self.times[first] {
            return Some(self.values[first]);
        }
        if time >= self.times[last] {
            return Some(self.values[last]);
        }

        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (ta, tb) = (self.times[a], self.times[b]);
            if time >= ta && time <= tb {
                let span = tb - ta;
                if span <= 0.0 {
                    return Some(self.values[a]);
                }
                return Some(T::blend(self.values[a], self.values[b], (time - ta) / span));
            }
        }
        Some(self.values[last])
    }
}
