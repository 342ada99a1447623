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

//! Scatters primvar arrays into renderer attribute buffers.
//!
//! The mapper is driven by the interpolation class of a primvar and the face
//! view of the polygons being rendered. Triangles are produced by fanning each
//! polygon around its first corner (see [`for_each_fan_triangle`]), so the
//! per-triangle and per-corner outputs line up with the triangle list the
//! topology lane builds from the same view.

use tessel_core::lane::{Lane, LaneKind};
use tessel_core::primvar::{AttributeData, Interpolation, PrimvarValue};
use tessel_core::topology::{for_each_fan_triangle, FaceTopologyView, Orientation};
use tessel_data::{AttributeBuffer, AttributeElement, AttributeStandard, AttributeType};
use thiserror::Error;

/// Reasons a primvar cannot be mapped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MapperError {
    /// The primvar has no elements.
    #[error("Primvar '{name}' is empty")]
    EmptyInput {
        /// Primvar name.
        name: String,
    },
    /// A constant primvar does not hold exactly one element.
    #[error("Constant primvar '{name}' holds {count} elements, expected 1")]
    ConstantCount {
        /// Primvar name.
        name: String,
        /// Elements supplied.
        count: usize,
    },
    /// A uniform primvar holds more values than there are faces.
    #[error("Uniform primvar '{name}' holds {count} values for {faces} faces")]
    Oversized {
        /// Primvar name.
        name: String,
        /// Elements supplied.
        count: usize,
        /// Faces in the mesh.
        faces: usize,
    },
    /// A vertex primvar does not match the vertex count.
    #[error("Vertex primvar '{name}' holds {actual} values for {expected} vertices")]
    VertexCountMismatch {
        /// Primvar name.
        name: String,
        /// Vertices in the mesh.
        expected: usize,
        /// Elements supplied.
        actual: usize,
    },
    /// A face-varying primvar does not match the corner count.
    #[error("Face-varying primvar '{name}' holds {actual} values for {expected} corners")]
    CornerCountMismatch {
        /// Primvar name.
        name: String,
        /// Corners in the mesh.
        expected: usize,
        /// Elements supplied.
        actual: usize,
    },
    /// The interpolation class is not handled by the mapper.
    #[error("Primvar '{name}' uses unsupported interpolation '{interpolation}'")]
    UnsupportedInterpolation {
        /// Primvar name.
        name: String,
        /// The rejected class.
        interpolation: Interpolation,
    },
    /// The element type has no internal counterpart.
    #[error("Primvar '{name}' has unsupported type '{type_name}'")]
    UnsupportedType {
        /// Primvar name.
        name: String,
        /// Host type name.
        type_name: &'static str,
    },
}

/// The mesh a primvar is mapped onto.
pub struct MappingTarget<'a, V: FaceTopologyView + ?Sized> {
    /// The polygons whose fan triangulation is rendered.
    pub faces: &'a V,
    /// Number of mesh vertices.
    pub vertex_count: usize,
    /// Winding order of the polygons.
    pub orientation: Orientation,
}

impl<'a, V: FaceTopologyView + ?Sized> MappingTarget<'a, V> {
    /// Creates a target.
    pub fn new(faces: &'a V, vertex_count: usize, orientation: Orientation) -> Self {
        Self {
            faces,
            vertex_count,
            orientation,
        }
    }

    fn left_handed(&self) -> bool {
        self.orientation == Orientation::LeftHanded
    }
}

/// A lane that maps primvars onto attribute buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeMappingLane;

impl AttributeMappingLane {
    /// Creates a new `AttributeMappingLane`.
    pub fn new() -> Self {
        Self
    }

    /// Converts a host value and maps it.
    pub fn populate_value<V: FaceTopologyView + ?Sized>(
        &self,
        name: &str,
        interpolation: Interpolation,
        value: &PrimvarValue,
        target: &MappingTarget<'_, V>,
    ) -> Result<AttributeBuffer, MapperError> {
        let data = value
            .to_attribute_data()
            .ok_or_else(|| MapperError::UnsupportedType {
                name: name.to_owned(),
                type_name: value.type_name(),
            })?;
        self.populate(name, interpolation, &data, target)
    }

    /// Maps converted data according to its interpolation class.
    ///
    /// The returned buffer is complete; nothing is written on failure.
    pub fn populate<V: FaceTopologyView + ?Sized>(
        &self,
        name: &str,
        interpolation: Interpolation,
        data: &AttributeData,
        target: &MappingTarget<'_, V>,
    ) -> Result<AttributeBuffer, MapperError> {
        if data.is_empty() {
            return Err(MapperError::EmptyInput {
                name: name.to_owned(),
            });
        }

        let width = data.shape().components();
        let source = data.as_flat();

        let (element, values) = match interpolation {
            Interpolation::Constant => {
                if data.len() != 1 {
                    return Err(MapperError::ConstantCount {
                        name: name.to_owned(),
                        count: data.len(),
                    });
                }
                (AttributeElement::Mesh, source.to_vec())
            }
            Interpolation::Uniform => {
                let faces = target.faces.face_count();
                if data.len() > faces {
                    return Err(MapperError::Oversized {
                        name: name.to_owned(),
                        count: data.len(),
                        faces,
                    });
                }
                (
                    AttributeElement::Face,
                    scatter_uniform(target.faces, source, width),
                )
            }
            Interpolation::Vertex | Interpolation::Varying => {
                if data.len() != target.vertex_count {
                    return Err(MapperError::VertexCountMismatch {
                        name: name.to_owned(),
                        expected: target.vertex_count,
                        actual: data.len(),
                    });
                }
                (AttributeElement::Vertex, source.to_vec())
            }
            Interpolation::FaceVarying => {
                let corners = target.faces.total_corners();
                if data.len() != corners {
                    return Err(MapperError::CornerCountMismatch {
                        name: name.to_owned(),
                        expected: corners,
                        actual: data.len(),
                    });
                }
                (
                    AttributeElement::Corner,
                    scatter_face_varying(target.faces, target.left_handed(), source, width),
                )
            }
            Interpolation::Instance => {
                return Err(MapperError::UnsupportedInterpolation {
                    name: name.to_owned(),
                    interpolation,
                })
            }
        };

        log::trace!(
            "Mapped {interpolation} primvar '{name}' to {} values",
            values.len() / width
        );

        Ok(AttributeBuffer::new(
            name,
            AttributeStandard::None,
            element,
            AttributeType::from_shape(data.shape()),
            values,
        ))
    }
}

impl Lane for AttributeMappingLane {
    fn strategy_name(&self) -> &'static str {
        "InterpolationClassMapper"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Attribute
    }
}

/// Replicates each face value onto every triangle of its fan. Faces past the
/// end of `source` receive zeros.
fn scatter_uniform<V: FaceTopologyView + ?Sized>(view: &V, source: &[f32], width: usize) -> Vec<f32> {
    let available = source.len() / width;
    let mut out = Vec::new();
    for_each_fan_triangle(view, false, |face, _| {
        if face < available {
            out.extend_from_slice(&source[face * width..(face + 1) * width]);
        } else {
            out.extend(std::iter::repeat(0.0).take(width));
        }
    });
    out
}

/// Copies the three corner values of every fan triangle.
pub fn scatter_face_varying<V: FaceTopologyView + ?Sized>(
    view: &V,
    left_handed: bool,
    source: &[f32],
    width: usize,
) -> Vec<f32> {
    let mut out = Vec::new();
    for_each_fan_triangle(view, left_handed, |_, corners| {
        for corner in corners {
            out.extend_from_slice(&source[corner * width..(corner + 1) * width]);
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_core::math::{Vec2, Vec3};
    use tessel_core::topology::{PolygonView, TriangleView};

    const QUAD_COUNTS: [u32; 1] = [4];
    const QUAD_INDICES: [u32; 4] = [0, 1, 2, 3];

    fn quad_view() -> PolygonView<'static> {
        PolygonView::new(&QUAD_COUNTS, &QUAD_INDICES)
    }

    #[test]
    fn test_vertex_copies_index_for_index() {
        let view = quad_view();
        let target = MappingTarget::new(&view, 4, Orientation::RightHanded);
        let value = PrimvarValue::Double(vec![0.5, 1.5, 2.5, 3.5]);
        let buffer = AttributeMappingLane::new()
            .populate_value("w", Interpolation::Vertex, &value, &target)
            .unwrap();
        assert_eq!(buffer.element, AttributeElement::Vertex);
        assert_eq!(buffer.data(), &[0.5, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_vertex_count_mismatch() {
        let view = quad_view();
        let target = MappingTarget::new(&view, 4, Orientation::RightHanded);
        let data = AttributeData::Float(vec![1.0; 3]);
        let err = AttributeMappingLane::new()
            .populate("w", Interpolation::Varying, &data, &target)
            .unwrap_err();
        assert!(matches!(
            err,
            MapperError::VertexCountMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_constant_requires_one_value() {
        let view = quad_view();
        let target = MappingTarget::new(&view, 4, Orientation::RightHanded);
        let lane = AttributeMappingLane::new();
        let one = AttributeData::Float3(vec![Vec3::X]);
        let buffer = lane
            .populate("c", Interpolation::Constant, &one, &target)
            .unwrap();
        assert_eq!(buffer.element, AttributeElement::Mesh);
        assert_eq!(buffer.ty, AttributeType::Float3);

        let two = AttributeData::Float3(vec![Vec3::X, Vec3::Y]);
        assert_eq!(
            lane.populate("c", Interpolation::Constant, &two, &target),
            Err(MapperError::ConstantCount {
                name: "c".into(),
                count: 2
            })
        );
    }

    #[test]
    fn test_uniform_replicates_per_triangle() {
        let counts = [4, 3];
        let indices = [0, 1, 2, 3, 0, 3, 4];
        let view = PolygonView::new(&counts, &indices);
        let target = MappingTarget::new(&view, 5, Orientation::RightHanded);
        let data = AttributeData::Float(vec![7.0, 9.0]);
        let buffer = AttributeMappingLane::new()
            .populate("id", Interpolation::Uniform, &data, &target)
            .unwrap();
        assert_eq!(buffer.element, AttributeElement::Face);
        assert_eq!(buffer.data(), &[7.0, 7.0, 9.0]);
    }

    #[test]
    fn test_uniform_pentagon_fills_three_triangles() {
        let counts = [5];
        let indices = [0, 1, 2, 3, 4];
        let view = PolygonView::new(&counts, &indices);
        let target = MappingTarget::new(&view, 5, Orientation::RightHanded);
        let data = AttributeData::Float2(vec![Vec2::new(1.0, 2.0)]);
        let buffer = AttributeMappingLane::new()
            .populate("st", Interpolation::Uniform, &data, &target)
            .unwrap();
        assert_eq!(buffer.element_count(), 3);
        assert_eq!(buffer.data(), &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_uniform_short_and_oversized() {
        let counts = [3, 3];
        let indices = [0, 1, 2, 0, 2, 3];
        let view = PolygonView::new(&counts, &indices);
        let target = MappingTarget::new(&view, 4, Orientation::RightHanded);
        let lane = AttributeMappingLane::new();

        let short = AttributeData::Float(vec![4.0]);
        let buffer = lane
            .populate("u", Interpolation::Uniform, &short, &target)
            .unwrap();
        assert_eq!(buffer.data(), &[4.0, 0.0]);

        let long = AttributeData::Float(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            lane.populate("u", Interpolation::Uniform, &long, &target),
            Err(MapperError::Oversized {
                count: 3,
                faces: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_face_varying_fan_and_left_handed_swap() {
        let view = quad_view();
        let data = AttributeData::Float(vec![10.0, 11.0, 12.0, 13.0]);
        let lane = AttributeMappingLane::new();

        let right = MappingTarget::new(&view, 4, Orientation::RightHanded);
        let buffer = lane
            .populate("fv", Interpolation::FaceVarying, &data, &right)
            .unwrap();
        assert_eq!(buffer.element, AttributeElement::Corner);
        assert_eq!(buffer.data(), &[10.0, 11.0, 12.0, 10.0, 12.0, 13.0]);

        let left = MappingTarget::new(&view, 4, Orientation::LeftHanded);
        let buffer = lane
            .populate("fv", Interpolation::FaceVarying, &data, &left)
            .unwrap();
        assert_eq!(buffer.data(), &[10.0, 12.0, 11.0, 10.0, 13.0, 12.0]);
    }

    #[test]
    fn test_face_varying_over_triangle_view() {
        let triangles = [[0, 1, 2]];
        let view = TriangleView::new(&triangles);
        let target = MappingTarget::new(&view, 3, Orientation::RightHanded);
        let data = AttributeData::Float(vec![1.0, 2.0]);
        assert!(matches!(
            AttributeMappingLane::new().populate("fv", Interpolation::FaceVarying, &data, &target),
            Err(MapperError::CornerCountMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_rejected_inputs() {
        let view = quad_view();
        let target = MappingTarget::new(&view, 4, Orientation::RightHanded);
        let lane = AttributeMappingLane::new();

        let err = lane
            .populate_value(
                "ids",
                Interpolation::Instance,
                &PrimvarValue::Int(vec![1]),
                &target,
            )
            .unwrap_err();
        assert!(err.to_string().contains("instance"));

        let err = lane
            .populate_value(
                "tags",
                Interpolation::Constant,
                &PrimvarValue::Token(vec!["a".into()]),
                &target,
            )
            .unwrap_err();
        assert!(matches!(err, MapperError::UnsupportedType { .. }));

        assert!(matches!(
            lane.populate(
                "e",
                Interpolation::Vertex,
                &AttributeData::Float(Vec::new()),
                &target
            ),
            Err(MapperError::EmptyInput { .. })
        ));
    }
}
