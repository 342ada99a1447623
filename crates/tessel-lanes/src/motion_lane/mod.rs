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

//! Motion keys and instance transform compositing.

use tessel_core::lane::{Lane, LaneKind};
use tessel_core::math::{Mat4, Vec3};
use tessel_core::primvar::PrimvarValue;
use tessel_core::sampling::TimeSampleArray;

/// Shutter times of velocity-derived motion keys.
pub const VELOCITY_KEY_TIMES: [f32; 2] = [-0.5, 0.5];

/// A primary value and the motion keys around it.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionKeys<T> {
    /// The value at the centre of the shutter.
    pub primary: T,
    /// The other samples, in ascending time order.
    pub keys: Vec<T>,
    /// Times of `keys`.
    pub key_times: Vec<f32>,
}

impl<T> MotionKeys<T> {
    /// Number of motion steps, the primary included.
    pub fn steps(&self) -> usize {
        self.keys.len() + 1
    }

    /// Returns `true` if there are no motion keys.
    pub fn is_static(&self) -> bool {
        self.keys.is_empty()
    }
}

/// The placement of an object over the shutter interval.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformMotion {
    /// Transform at the centre of the shutter.
    pub tfm: Mat4,
    /// One transform per motion step in ascending time; empty when static.
    pub motion: Vec<Mat4>,
}

impl Default for TransformMotion {
    fn default() -> Self {
        Self {
            tfm: Mat4::IDENTITY,
            motion: Vec::new(),
        }
    }
}

/// A lane building motion keys and compositing instance transforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct MotionResampleLane;

impl MotionResampleLane {
    /// Creates a new `MotionResampleLane`.
    pub fn new() -> Self {
        Self
    }

    /// Splits samples into a primary value and motion keys.
    ///
    /// The sample at time 0 is the primary and the others become keys. Without
    /// a sample at time 0 the first sample is the primary and every sample is
    /// kept as a key. Returns `None` when there is no sample.
    pub fn motion_keys<T: Clone, const CAP: usize>(
        &self,
        samples: &TimeSampleArray<T, CAP>,
    ) -> Option<MotionKeys<T>> {
        let primary_index = samples.primary_index()?;
        let primary = samples.values()[primary_index].clone();
        if samples.is_static() {
            return Some(MotionKeys {
                primary,
                keys: Vec::new(),
                key_times: Vec::new(),
            });
        }

        let centre = samples.index_of_time(0.0);
        let (mut keys, mut key_times) = (Vec::new(), Vec::new());
        for index in samples.sorted_indices() {
            if Some(index) == centre {
                continue;
            }
            keys.push(samples.values()[index].clone());
            key_times.push(samples.times()[index]);
        }
        Some(MotionKeys {
            primary,
            keys,
            key_times,
        })
    }

    /// Builds point motion keys from sampled `points` values.
    ///
    /// Samples that are not three-component arrays of the primary's length are
    /// dropped.
    pub fn point_motion(
        &self,
        samples: &TimeSampleArray<PrimvarValue>,
    ) -> Option<MotionKeys<Vec<Vec3>>> {
        let converted = samples.map(|value| {
            value
                .to_attribute_data()
                .and_then(|data| data.as_float3().map(<[Vec3]>::to_vec))
        });
        let mut keys = self.motion_keys(&converted)?;
        let primary = keys.primary.take()?;
        let count = primary.len();

        let mut motion = MotionKeys {
            primary,
            keys: Vec::with_capacity(keys.keys.len()),
            key_times: Vec::with_capacity(keys.keys.len()),
        };
        for (key, time) in keys.keys.into_iter().zip(keys.key_times) {
            match key {
                Some(points) if points.len() == count => {
                    motion.keys.push(points);
                    motion.key_times.push(time);
                }
                _ => log::warn!("Dropping point sample at time {time}: size or type mismatch"),
            }
        }
        Some(motion)
    }

    /// Synthesizes motion keys `p + v * scale * t` at [`VELOCITY_KEY_TIMES`].
    pub fn velocity_motion(
        &self,
        points: &[Vec3],
        velocities: &[Vec3],
        scale: f32,
    ) -> Option<MotionKeys<Vec<Vec3>>> {
        if points.len() != velocities.len() {
            log::warn!(
                "Ignoring {} velocities for {} points",
                velocities.len(),
                points.len()
            );
            return None;
        }
        let keys = VELOCITY_KEY_TIMES
            .iter()
            .map(|&t| {
                points
                    .iter()
                    .zip(velocities)
                    .map(|(&p, &v)| p + v * (scale * t))
                    .collect()
            })
            .collect();
        Some(MotionKeys {
            primary: points.to_vec(),
            keys,
            key_times: VELOCITY_KEY_TIMES.to_vec(),
        })
    }

    /// Builds the transform motion of an object whose mesh has `mesh_steps`
    /// motion steps.
    ///
    /// A deforming mesh needs exactly one transform per step: matching samples
    /// are used as-is, anything else replays the primary transform. A static
    /// mesh keeps every transform sample.
    pub fn transform_motion<const CAP: usize>(
        &self,
        samples: &TimeSampleArray<Mat4, CAP>,
        mesh_steps: usize,
    ) -> TransformMotion {
        let Some(&tfm) = samples.primary() else {
            return TransformMotion::default();
        };
        let sorted = || -> Vec<Mat4> {
            samples
                .sorted_indices()
                .into_iter()
                .map(|i| samples.values()[i])
                .collect()
        };

        let motion = if mesh_steps > 1 {
            if samples.count() == mesh_steps {
                sorted()
            } else {
                log::debug!(
                    "Replaying primary transform over {mesh_steps} steps ({} samples)",
                    samples.count()
                );
                vec![tfm; mesh_steps]
            }
        } else if samples.count() > 1 {
            sorted()
        } else {
            Vec::new()
        };
        TransformMotion { tfm, motion }
    }

    /// Combines per-instance transforms with the prototype's own transform.
    ///
    /// Returns one sample array per instance, sampled at the instancer's times.
    /// Each sample is `resample(prototype, t) * instance(t)`; a missing or
    /// single identity prototype transform copies instance transforms as-is.
    pub fn composite_instances(
        &self,
        prototype: &TimeSampleArray<Mat4>,
        instances: &TimeSampleArray<Vec<Mat4>>,
    ) -> Vec<TimeSampleArray<Mat4>> {
        let count = instances.values().first().map_or(0, Vec::len);
        let passthrough = prototype.is_empty()
            || (prototype.count() == 1 && prototype.values()[0] == Mat4::IDENTITY);

        (0..count)
            .map(|instance| {
                let mut combined = TimeSampleArray::new();
                for (time, transforms) in instances.iter() {
                    let Some(&placement) = transforms.get(instance) else {
                        continue;
                    };
                    let tfm = if passthrough {
                        placement
                    } else {
                        prototype.resample(time).unwrap_or(Mat4::IDENTITY) * placement
                    };
                    if let Err(e) = combined.push(time, tfm) {
                        log::warn!("Instance {instance}: {e}");
                        break;
                    }
                }
                combined
            })
            .collect()
    }
}

impl Lane for MotionResampleLane {
    fn strategy_name(&self) -> &'static str {
        "LinearResample"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn samples<T>(pairs: Vec<(f32, T)>) -> TimeSampleArray<T> {
        let mut array = TimeSampleArray::new();
        for (t, v) in pairs {
            array.push(t, v).unwrap();
        }
        array
    }

    fn translation(x: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_centre_sample_is_primary() {
        let lane = MotionResampleLane::new();
        let keys = lane
            .motion_keys(&samples(vec![(0.5, 3.0f32), (0.0, 2.0), (-0.5, 1.0)]))
            .unwrap();
        assert_eq!(keys.primary, 2.0);
        assert_eq!(keys.keys, vec![1.0, 3.0]);
        assert_eq!(keys.key_times, vec![-0.5, 0.5]);
        assert_eq!(keys.steps(), 3);
    }

    #[test]
    fn test_missing_centre_keeps_all_samples() {
        let lane = MotionResampleLane::new();
        let keys = lane
            .motion_keys(&samples(vec![(-0.5, 1.0f32), (0.5, 3.0)]))
            .unwrap();
        assert_eq!(keys.primary, 1.0);
        assert_eq!(keys.keys.len(), 2);
        assert_eq!(keys.steps(), 3);
    }

    #[test]
    fn test_static_and_empty_samples() {
        let lane = MotionResampleLane::new();
        assert!(lane.motion_keys(&TimeSampleArray::<f32>::new()).is_none());
        let keys = lane.motion_keys(&samples(vec![(0.25, 1.0f32)])).unwrap();
        assert!(keys.is_static());
        assert_eq!(keys.steps(), 1);
    }

    #[test]
    fn test_point_motion_drops_mismatched_keys() {
        let lane = MotionResampleLane::new();
        let points = samples(vec![
            (0.0, PrimvarValue::Float3(vec![[0.0, 0.0, 0.0]; 2])),
            (-0.5, PrimvarValue::Float3(vec![[1.0, 0.0, 0.0]; 3])),
            (0.5, PrimvarValue::Double3(vec![[2.0, 0.0, 0.0]; 2])),
        ]);
        let motion = lane.point_motion(&points).unwrap();
        assert_eq!(motion.primary.len(), 2);
        assert_eq!(motion.keys, vec![vec![Vec3::new(2.0, 0.0, 0.0); 2]]);
        assert_eq!(motion.key_times, vec![0.5]);
    }

    #[test]
    fn test_velocity_motion() {
        let lane = MotionResampleLane::new();
        let motion = lane
            .velocity_motion(&[Vec3::ZERO], &[Vec3::new(2.0, 0.0, 0.0)], 0.5)
            .unwrap();
        assert_eq!(motion.steps(), 3);
        assert_relative_eq!(motion.keys[0][0].x, -0.5);
        assert_relative_eq!(motion.keys[1][0].x, 0.5);
        assert!(lane.velocity_motion(&[Vec3::ZERO], &[], 1.0).is_none());
    }

    #[test]
    fn test_transform_motion_widening() {
        let lane = MotionResampleLane::new();
        let xf = samples(vec![(0.0, translation(1.0)), (0.5, translation(2.0))]);

        // Step counts disagree: the primary is replayed.
        let motion = lane.transform_motion(&xf, 3);
        assert_eq!(motion.tfm, translation(1.0));
        assert_eq!(motion.motion, vec![translation(1.0); 3]);

        // Step counts agree: samples are used in time order.
        let motion = lane.transform_motion(&xf, 2);
        assert_eq!(motion.motion, vec![translation(1.0), translation(2.0)]);

        // Static mesh: every transform sample is kept.
        let motion = lane.transform_motion(&xf, 1);
        assert_eq!(motion.motion.len(), 2);

        let empty = lane.transform_motion(&TimeSampleArray::<Mat4>::new(), 3);
        assert_eq!(empty, TransformMotion::default());
    }

    #[test]
    fn test_identity_prototype_passes_instances_through() {
        let lane = MotionResampleLane::new();
        let instances = samples(vec![(0.0, vec![translation(1.0), translation(2.0)])]);
        let prototype = samples(vec![(0.0, Mat4::IDENTITY)]);

        let combined = lane.composite_instances(&prototype, &instances);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[1].values(), &[translation(2.0)]);

        let combined = lane.composite_instances(&TimeSampleArray::new(), &instances);
        assert_eq!(combined[0].values(), &[translation(1.0)]);
    }

    #[test]
    fn test_animated_prototype_is_resampled() {
        let lane = MotionResampleLane::new();
        let prototype = samples(vec![(-1.0, translation(0.0)), (1.0, translation(4.0))]);
        let instances = samples(vec![
            (-0.5, vec![translation(10.0)]),
            (0.5, vec![translation(20.0)]),
        ]);

        let combined = lane.composite_instances(&prototype, &instances);
        assert_eq!(combined.len(), 1);
        let values = combined[0].values();
        assert_relative_eq!(values[0].translation().x, 11.0);
        assert_relative_eq!(values[1].translation().x, 23.0);
        assert_eq!(combined[0].times(), &[-0.5, 0.5]);
    }
}
