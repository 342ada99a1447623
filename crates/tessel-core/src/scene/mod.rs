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

//! The contracts between the sync engine and the scene-graph host.
//!
//! The host owns change tracking and answers value queries; the engine never
//! holds on to host data past one sync pass.

use crate::math::Mat4;
use crate::primvar::{tokens, Interpolation, PrimvarDescriptor, PrimvarValue};
use crate::sampling::TimeSampleArray;
use crate::topology::MeshTopology;
use std::fmt;

mod dirty;
mod visibility;

pub use dirty::DirtyBits;
pub use visibility::VisibilityFlags;

/// A path-like identifier of a prim in the host scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimId(String);

impl PrimId {
    /// Creates a prim id.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrimId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Identifies a material in the host scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(String);

impl MaterialId {
    /// Creates a material id.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MaterialId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Viewport display settings of a prim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayStyle {
    /// Requested subdivision refine level; 0 renders the control cage.
    pub refine_level: u32,
}

/// The read side of the scene host.
///
/// Every query is keyed by prim id. Implementations return empty values for
/// prims or primvars they do not know about.
pub trait SceneDelegate {
    /// The control topology of a mesh prim.
    fn mesh_topology(&self, id: &PrimId) -> Option<MeshTopology>;

    /// The display settings of a prim.
    fn display_style(&self, id: &PrimId) -> DisplayStyle;

    /// Primvars of one interpolation class.
    fn primvar_descriptors(&self, id: &PrimId, interpolation: Interpolation)
        -> Vec<PrimvarDescriptor>;

    /// The value of a primvar at the current time.
    fn primvar(&self, id: &PrimId, name: &str) -> Option<PrimvarValue>;

    /// Time samples of a primvar over the shutter interval.
    fn sample_primvar(&self, id: &PrimId, name: &str) -> TimeSampleArray<PrimvarValue>;

    /// Time samples of the prim transform over the shutter interval.
    fn sample_transform(&self, id: &PrimId) -> TimeSampleArray<Mat4>;

    /// The bound material, if any.
    fn material_id(&self, id: &PrimId) -> Option<MaterialId>;

    /// Whether the prim is visible.
    fn visible(&self, id: &PrimId) -> bool;

    /// Whether both faces of the surface render.
    fn double_sided(&self, id: &PrimId) -> bool;

    /// The numeric id of the prim, used to derive the pass id.
    fn prim_index(&self, id: &PrimId) -> u32;

    /// The instancer driving this prim, if it is a prototype.
    fn instancer(&self, id: &PrimId) -> Option<&dyn Instancer>;

    /// The vertex positions at the current time.
    fn points(&self, id: &PrimId) -> Option<PrimvarValue> {
        self.primvar(id, tokens::POINTS)
    }
}

/// A point instancer placing copies of a prototype prim.
pub trait Instancer {
    /// Per-time arrays of instance transforms for `prototype`.
    ///
    /// Every sample holds one transform per instance.
    fn sample_instance_transforms(&self, prototype: &PrimId) -> TimeSampleArray<Vec<Mat4>>;
}
