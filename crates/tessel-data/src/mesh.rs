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

//! The renderer-side mesh record.

use crate::attribute::{AttributeBuffer, AttributeElement, AttributeSet, AttributeSizeError};
use crate::shader::ShaderHandle;
use tessel_core::math::{Aabb, Vec3};
use tessel_core::topology::PolygonView;

/// Polygonal faces kept alongside the triangles of a subdivided mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubdFaces {
    /// Corner count of every face.
    pub counts: Vec<u32>,
    /// Vertex indices, concatenated per face.
    pub indices: Vec<u32>,
    /// The control face each face descends from.
    pub parents: Vec<u32>,
}

impl SubdFaces {
    /// Number of faces.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if there are no faces.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Addresses the faces as N-gons.
    pub fn view(&self) -> PolygonView<'_> {
        PolygonView::new(&self.counts, &self.indices)
    }
}

/// Dicing settings of a subdivided mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubdParams {
    /// Target micropolygon size.
    pub dicing_rate: f32,
    /// Upper bound on the refine level.
    pub max_level: u32,
}

impl Default for SubdParams {
    fn default() -> Self {
        Self {
            dicing_rate: 1.0,
            max_level: 12,
        }
    }
}

/// A triangulated mesh as the renderer traces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshRecord {
    /// Name used in logs.
    pub name: String,
    /// Vertex positions at the centre of the shutter.
    pub verts: Vec<Vec3>,
    /// Triangle vertex indices.
    pub triangles: Vec<[u32; 3]>,
    /// Shader slot of every triangle, indexing `used_shaders`.
    pub shader: Vec<u32>,
    /// Smooth shading flag of every triangle.
    pub smooth: Vec<bool>,
    /// Refined polygons, present when the mesh is subdivided.
    pub subd_faces: Option<SubdFaces>,
    /// Dicing settings.
    pub subd_params: SubdParams,
    /// Attribute buffers.
    pub attributes: AttributeSet,
    /// Number of motion steps, centre included; 1 when static.
    pub motion_steps: u32,
    /// Whether deformation blur is enabled.
    pub use_motion_blur: bool,
    /// Shaders referenced by the triangle slots.
    pub used_shaders: Vec<ShaderHandle>,
    /// Bounds of `verts`, updated by [`MeshRecord::compute_bounds`].
    pub bounds: Aabb,
}

impl MeshRecord {
    /// Creates an empty mesh.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            motion_steps: 1,
            ..Default::default()
        }
    }

    /// Drops triangles, faces and attributes. Vertices are kept.
    pub fn clear_topology(&mut self) {
        self.triangles.clear();
        self.shader.clear();
        self.smooth.clear();
        self.subd_faces = None;
        self.attributes.clear();
    }

    /// Replaces the triangle list; every triangle starts in slot 0 and smooth.
    pub fn set_triangles(&mut self, triangles: Vec<[u32; 3]>) {
        self.shader = vec![0; triangles.len()];
        self.smooth = vec![true; triangles.len()];
        self.triangles = triangles;
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    /// Returns `true` if motion keys are stored.
    pub fn has_motion_keys(&self) -> bool {
        self.use_motion_blur && self.motion_steps > 1
    }

    /// Number of elements an attribute of class `element` must hold.
    pub fn element_count(&self, element: AttributeElement) -> usize {
        match element {
            AttributeElement::Mesh => 1,
            AttributeElement::Face => self.triangles.len(),
            AttributeElement::Vertex => self.verts.len(),
            AttributeElement::VertexMotion => {
                self.verts.len() * (self.motion_steps.saturating_sub(1) as usize)
            }
            AttributeElement::Corner => self.triangles.len() * 3,
        }
    }

    /// Stores `buffer` if its size matches the mesh; the previous buffer of
    /// the same name is replaced only on success.
    pub fn set_attribute(&mut self, buffer: AttributeBuffer) -> Result<(), AttributeSizeError> {
        let expected = self.element_count(buffer.element);
        let actual = buffer.element_count();
        if actual != expected {
            return Err(AttributeSizeError {
                name: buffer.name,
                expected,
                actual,
            });
        }
        log::trace!(
            "Mesh '{}': attribute '{}' set with {} elements",
            self.name,
            buffer.name,
            expected
        );
        self.attributes.insert(buffer);
        Ok(())
    }

    /// Recomputes `bounds` from the vertices and motion keys.
    pub fn compute_bounds(&mut self) {
        let mut bounds = self.verts.iter().fold(Aabb::INVALID, |b, &p| b.merged_with_point(p));
        if let Some(keys) = self
            .attributes
            .iter()
            .find(|b| b.element == AttributeElement::VertexMotion)
            .and_then(|b| b.as_float3())
        {
            bounds = keys.iter().fold(bounds, |b, &p| b.merged_with_point(p));
        }
        self.bounds = bounds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeStandard, AttributeType};

    fn quad() -> MeshRecord {
        let mut mesh = MeshRecord::new("quad");
        mesh.verts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        mesh.set_triangles(vec![[0, 1, 2], [0, 2, 3]]);
        mesh
    }

    #[test]
    fn test_element_counts() {
        let mut mesh = quad();
        assert_eq!(mesh.element_count(AttributeElement::Mesh), 1);
        assert_eq!(mesh.element_count(AttributeElement::Face), 2);
        assert_eq!(mesh.element_count(AttributeElement::Vertex), 4);
        assert_eq!(mesh.element_count(AttributeElement::Corner), 6);
        assert_eq!(mesh.element_count(AttributeElement::VertexMotion), 0);
        mesh.motion_steps = 3;
        assert_eq!(mesh.element_count(AttributeElement::VertexMotion), 8);
    }

    #[test]
    fn test_set_attribute_rejects_wrong_size() {
        let mut mesh = quad();
        let wrong = AttributeBuffer::new(
            "st",
            AttributeStandard::Uv,
            AttributeElement::Corner,
            AttributeType::Float2,
            vec![0.0; 8],
        );
        let err = mesh.set_attribute(wrong).unwrap_err();
        assert_eq!(err.expected, 6);
        assert_eq!(err.actual, 4);
        assert!(mesh.attributes.is_empty());
    }

    #[test]
    fn test_bounds_and_clear() {
        let mut mesh = quad();
        mesh.compute_bounds();
        assert_eq!(mesh.bounds.max, Vec3::new(1.0, 1.0, 0.0));
        mesh.clear_topology();
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.vertex_count(), 4);
    }
}
