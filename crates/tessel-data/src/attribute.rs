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

//! Renderer-native attribute buffers.
//!
//! Every buffer is a flat `f32` array tagged with the mesh element it varies
//! over and the shape of each element. Typed access goes through `bytemuck`.

use std::fmt;
use tessel_core::math::{Vec2, Vec3, Vec4};
use tessel_core::primvar::{AttributeData, ElementShape};

/// The mesh element an attribute varies over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeElement {
    /// One value for the whole mesh.
    Mesh,
    /// One value per triangle.
    Face,
    /// One value per vertex.
    Vertex,
    /// One value per vertex for every non-centre motion step.
    VertexMotion,
    /// One value per triangle corner.
    Corner,
}

/// The numeric shape of an attribute element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Scalar.
    Float,
    /// Two components.
    Float2,
    /// Three components (points, vectors, normals).
    Float3,
    /// Four components.
    Float4,
    /// An RGB color.
    Color,
}

impl AttributeType {
    /// Number of `f32` components per element.
    pub const fn components(self) -> usize {
        match self {
            AttributeType::Float => 1,
            AttributeType::Float2 => 2,
            AttributeType::Float3 | AttributeType::Color => 3,
            AttributeType::Float4 => 4,
        }
    }

    /// The type matching a converted element shape.
    pub const fn from_shape(shape: ElementShape) -> Self {
        match shape {
            ElementShape::Scalar => AttributeType::Float,
            ElementShape::Vec2 => AttributeType::Float2,
            ElementShape::Vec3 => AttributeType::Float3,
            ElementShape::Vec4 => AttributeType::Float4,
        }
    }
}

/// Attributes the renderer knows by meaning rather than by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeStandard {
    /// A user attribute.
    #[default]
    None,
    /// Smooth shading normals.
    VertexNormal,
    /// Flat per-triangle normals.
    FaceNormal,
    /// Texture coordinates.
    Uv,
    /// Tangents of a UV set.
    UvTangent,
    /// Bitangent signs of a UV set.
    UvTangentSign,
    /// Vertex colors.
    VertexColor,
    /// Vertex positions of the motion keys.
    MotionVertexPosition,
    /// Generated texture-space coordinates.
    Generated,
}

/// A named, typed attribute buffer owned by a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBuffer {
    /// Attribute name.
    pub name: String,
    /// Standard meaning, if any.
    pub standard: AttributeStandard,
    /// Element class.
    pub element: AttributeElement,
    /// Element shape.
    pub ty: AttributeType,
    data: Vec<f32>,
}

impl AttributeBuffer {
    /// Wraps flat data. `data.len()` must be a multiple of the type's component count.
    pub fn new(
        name: impl Into<String>,
        standard: AttributeStandard,
        element: AttributeElement,
        ty: AttributeType,
        data: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(data.len() % ty.components(), 0);
        Self {
            name: name.into(),
            standard,
            element,
            ty,
            data,
        }
    }

    /// Builds a buffer from converted data, inferring the type from its shape.
    pub fn from_data(
        name: impl Into<String>,
        element: AttributeElement,
        data: &AttributeData,
    ) -> Self {
        Self::new(
            name,
            AttributeStandard::None,
            element,
            AttributeType::from_shape(data.shape()),
            data.as_flat().to_vec(),
        )
    }

    /// Builds a three-component buffer.
    pub fn from_vec3(
        name: impl Into<String>,
        standard: AttributeStandard,
        element: AttributeElement,
        values: &[Vec3],
    ) -> Self {
        Self::new(
            name,
            standard,
            element,
            AttributeType::Float3,
            bytemuck::cast_slice(values).to_vec(),
        )
    }

    /// Sets the standard tag.
    pub fn with_standard(mut self, standard: AttributeStandard) -> Self {
        self.standard = standard;
        self
    }

    /// Overrides the element type, keeping the component count.
    pub fn with_type(mut self, ty: AttributeType) -> Self {
        debug_assert_eq!(ty.components(), self.ty.components());
        self.ty = ty;
        self
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.data.len() / self.ty.components()
    }

    /// The raw components.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The raw components as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Typed view of a two-component buffer.
    pub fn as_float2(&self) -> Option<&[Vec2]> {
        (self.ty == AttributeType::Float2).then(|| bytemuck::cast_slice(&self.data))
    }

    /// Typed view of a three-component buffer (including colors).
    pub fn as_float3(&self) -> Option<&[Vec3]> {
        (self.ty.components() == 3).then(|| bytemuck::cast_slice(&self.data))
    }

    /// Typed view of a four-component buffer.
    pub fn as_float4(&self) -> Option<&[Vec4]> {
        (self.ty == AttributeType::Float4).then(|| bytemuck::cast_slice(&self.data))
    }
}

/// A buffer whose element count disagrees with its mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSizeError {
    /// The attribute name.
    pub name: String,
    /// Elements required by the mesh.
    pub expected: usize,
    /// Elements supplied.
    pub actual: usize,
}

impl fmt::Display for AttributeSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attribute '{}' holds {} elements but the mesh needs {}",
            self.name, self.actual, self.expected
        )
    }
}

impl std::error::Error for AttributeSizeError {}

/// The attribute buffers of one mesh, unique by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    buffers: Vec<AttributeBuffer>,
}

impl AttributeSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `buffer`, replacing any buffer of the same name.
    pub fn insert(&mut self, buffer: AttributeBuffer) {
        match self.buffers.iter_mut().find(|b| b.name == buffer.name) {
            Some(existing) => *existing = buffer,
            None => self.buffers.push(buffer),
        }
    }

    /// Finds a buffer by name.
    pub fn find(&self, name: &str) -> Option<&AttributeBuffer> {
        self.buffers.iter().find(|b| b.name == name)
    }

    /// Finds the first buffer with a standard tag.
    pub fn find_standard(&self, standard: AttributeStandard) -> Option<&AttributeBuffer> {
        self.buffers.iter().find(|b| b.standard == standard)
    }

    /// Removes a buffer by name.
    pub fn remove(&mut self, name: &str) -> Option<AttributeBuffer> {
        let index = self.buffers.iter().position(|b| b.name == name)?;
        Some(self.buffers.remove(index))
    }

    /// Removes every buffer with a standard tag.
    pub fn remove_standard(&mut self, standard: AttributeStandard) {
        self.buffers.retain(|b| b.standard != standard);
    }

    /// Drops every buffer.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    /// Number of buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Iterates the buffers in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeBuffer> {
        self.buffers.iter()
    }
}
