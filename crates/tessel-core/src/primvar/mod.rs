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

//! Primvars: named per-element data fields on a mesh.
//!
//! A primvar is described by a [`PrimvarDescriptor`] (name, interpolation class,
//! semantic role) and carries a [`PrimvarValue`] payload. The numeric payload is
//! converted into internal [`AttributeData`] by the conversion layer in
//! [`convert`] before any mapping or refinement happens.

use std::fmt;

pub mod convert;
pub mod value;

pub use convert::{AttributeData, ElementShape, ToInternal};
pub use value::{PrimvarValue, PrimvarVisitor};

/// Well-known primvar names.
pub mod tokens {
    /// Vertex positions.
    pub const POINTS: &str = "points";
    /// Shading normals.
    pub const NORMALS: &str = "normals";
    /// Per-vertex velocities.
    pub const VELOCITIES: &str = "velocities";
    /// The viewport display color.
    pub const DISPLAY_COLOR: &str = "displayColor";
}

/// How a primvar's elements are distributed over the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// One value for the whole mesh.
    Constant,
    /// One value per face.
    Uniform,
    /// One value per vertex, interpolated linearly.
    Varying,
    /// One value per vertex.
    Vertex,
    /// One value per face corner.
    FaceVarying,
    /// One value per instance.
    Instance,
}

impl Interpolation {
    /// The classes a host is queried for, in the order they are synced.
    pub const SYNCED: [Interpolation; 5] = [
        Interpolation::FaceVarying,
        Interpolation::Vertex,
        Interpolation::Varying,
        Interpolation::Constant,
        Interpolation::Uniform,
    ];
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interpolation::Constant => "constant",
            Interpolation::Uniform => "uniform",
            Interpolation::Varying => "varying",
            Interpolation::Vertex => "vertex",
            Interpolation::FaceVarying => "faceVarying",
            Interpolation::Instance => "instance",
        };
        f.write_str(name)
    }
}

/// The semantic role of a primvar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimvarRole {
    /// No particular meaning.
    #[default]
    None,
    /// Positions.
    Point,
    /// Normals.
    Normal,
    /// Directions.
    Vector,
    /// Colors.
    Color,
    /// Texture coordinates.
    TextureCoordinate,
}

/// Describes one primvar exposed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimvarDescriptor {
    /// The primvar name.
    pub name: String,
    /// The interpolation class.
    pub interpolation: Interpolation,
    /// The semantic role.
    pub role: PrimvarRole,
}

impl PrimvarDescriptor {
    /// Creates a new descriptor.
    pub fn new(name: impl Into<String>, interpolation: Interpolation, role: PrimvarRole) -> Self {
        Self {
            name: name.into(),
            interpolation,
            role,
        }
    }
}

/// A primvar snapshot taken for one sync pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimvarRecord {
    /// What the primvar is.
    pub descriptor: PrimvarDescriptor,
    /// The host's value at sync time.
    pub value: PrimvarValue,
    /// Whether the host reported the primvar as changed.
    pub dirty: bool,
}
