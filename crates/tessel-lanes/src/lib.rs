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

//! Hot-path mesh processing lanes of the Tessel sync engine.
//!
//! - [`attribute_lane`]: maps primvars onto attribute buffers.
//! - [`topology_lane`]: refines and triangulates control topology.
//! - [`tangent_lane`]: computes MikkTSpace tangents and normals.
//! - [`motion_lane`]: builds motion keys and instance transforms.
//!
//! Lanes never block and hold no locks.

#![warn(missing_docs)]

pub mod attribute_lane;
pub mod motion_lane;
pub mod tangent_lane;
pub mod topology_lane;

pub use attribute_lane::{AttributeMappingLane, MapperError, MappingTarget};
pub use motion_lane::{MotionKeys, MotionResampleLane, TransformMotion};
pub use tangent_lane::{NormalInputs, TangentInputs, TangentOutput, TangentSpaceLane};
pub use topology_lane::{MeshRefiner, RefinedTopology, RefinerError};
