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

//! Polygonal mesh topology as supplied by the scene host.
//!
//! A [`MeshTopology`] is validated once at ingestion with
//! [`MeshTopology::validate`]; everything downstream (refiners, mappers, tangent
//! generation) assumes the invariants hold and indexes without further checks.

use crate::scene::MaterialId;
use std::fmt;

pub mod subdivision;
pub mod view;

pub use subdivision::{StencilTable, SubdivisionRefiner, SubdivisionResult};
pub use view::{for_each_fan_triangle, FaceTopologyView, PolygonView, TriangleView};

/// Winding order of the face vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// Counter-clockwise front faces.
    #[default]
    RightHanded,
    /// Clockwise front faces.
    LeftHanded,
}

/// The subdivision scheme requested for a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubdivisionScheme {
    /// Render the control cage as-is.
    #[default]
    None,
    /// Linear (bilinear) face splitting.
    Linear,
    /// Catmull-Clark smoothing.
    CatmullClark,
}

impl SubdivisionScheme {
    /// Parses the host token for a scheme.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "none" => Some(Self::None),
            "linear" | "bilinear" => Some(Self::Linear),
            "catmull_clark" | "catmullClark" => Some(Self::CatmullClark),
            _ => None,
        }
    }
}

/// Creasing tags attached to the control cage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubdivTags {
    /// Vertex indices of crease edges, grouped by `crease_lengths`.
    pub crease_indices: Vec<u32>,
    /// Number of vertices in each crease chain.
    pub crease_lengths: Vec<u32>,
    /// Sharpness per crease chain.
    pub crease_sharpnesses: Vec<f32>,
    /// Vertex indices of sharp corners.
    pub corner_indices: Vec<u32>,
    /// Sharpness per corner.
    pub corner_sharpnesses: Vec<f32>,
}

/// A named group of faces bound to one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeomSubset {
    /// The subset's identifier.
    pub id: String,
    /// The bound material, if any.
    pub material: Option<MaterialId>,
    /// Indices of the faces in the subset.
    pub face_indices: Vec<u32>,
}

/// Errors detected while validating a topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The face vertex counts do not add up to the index count.
    CountMismatch {
        /// Sum of the face vertex counts.
        expected: usize,
        /// Length of the index array.
        actual: usize,
    },
    /// A face vertex index references a missing point.
    IndexOutOfRange {
        /// Position in the index array.
        position: usize,
        /// The offending index.
        index: u32,
        /// Number of points available.
        point_count: usize,
    },
    /// A geometry subset references a missing face.
    SubsetFaceOutOfRange {
        /// The subset identifier.
        subset: String,
        /// The offending face index.
        face: u32,
        /// Number of faces in the topology.
        face_count: usize,
    },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::CountMismatch { expected, actual } => write!(
                f,
                "Face vertex counts sum to {expected} but {actual} indices were supplied"
            ),
            TopologyError::IndexOutOfRange {
                position,
                index,
                point_count,
            } => write!(
                f,
                "Face vertex index {index} at position {position} exceeds point count {point_count}"
            ),
            TopologyError::SubsetFaceOutOfRange {
                subset,
                face,
                face_count,
            } => write!(
                f,
                "Subset '{subset}' references face {face} of a {face_count}-face mesh"
            ),
        }
    }
}

impl std::error::Error for TopologyError {}

/// The control topology of a polygonal mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshTopology {
    /// Number of vertices of each face.
    pub face_vertex_counts: Vec<u32>,
    /// Vertex indices of all faces, concatenated.
    pub face_vertex_indices: Vec<u32>,
    /// Winding order.
    pub orientation: Orientation,
    /// Requested subdivision scheme.
    pub scheme: SubdivisionScheme,
    /// Creasing tags.
    pub subdiv_tags: SubdivTags,
    /// Material subsets.
    pub geom_subsets: Vec<GeomSubset>,
}

impl MeshTopology {
    /// Creates a right-handed topology without subdivision.
    pub fn new(face_vertex_counts: Vec<u32>, face_vertex_indices: Vec<u32>) -> Self {
        Self {
            face_vertex_counts,
            face_vertex_indices,
            ..Default::default()
        }
    }

    /// Sets the winding order.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the subdivision scheme.
    pub fn with_scheme(mut self, scheme: SubdivisionScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Adds a geometry subset.
    pub fn with_subset(mut self, subset: GeomSubset) -> Self {
        self.geom_subsets.push(subset);
        self
    }

    /// Number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.face_vertex_counts.len()
    }

    /// Number of face corners.
    #[inline]
    pub fn corner_count(&self) -> usize {
        self.face_vertex_indices.len()
    }

    /// Returns `true` for left-handed winding.
    #[inline]
    pub fn is_left_handed(&self) -> bool {
        self.orientation == Orientation::LeftHanded
    }

    /// Number of triangles a fan triangulation produces.
    pub fn triangle_count(&self) -> usize {
        self.face_vertex_counts
            .iter()
            .map(|&n| (n as usize).saturating_sub(2))
            .sum()
    }

    /// Borrows the topology through the polygon face view.
    pub fn polygon_view(&self) -> PolygonView<'_> {
        PolygonView::new(&self.face_vertex_counts, &self.face_vertex_indices)
    }

    /// Checks the topology invariants against the number of available points.
    pub fn validate(&self, point_count: usize) -> Result<(), TopologyError> {
        let expected: usize = self.face_vertex_counts.iter().map(|&n| n as usize).sum();
        if expected != self.face_vertex_indices.len() {
            return Err(TopologyError::CountMismatch {
                expected,
                actual: self.face_vertex_indices.len(),
            });
        }

        if let Some((position, &index)) = self
            .face_vertex_indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= point_count)
        {
            return Err(TopologyError::IndexOutOfRange {
                position,
                index,
                point_count,
            });
        }

        let face_count = self.face_count();
        for subset in &self.geom_subsets {
            if let Some(&face) = subset
                .face_indices
                .iter()
                .find(|&&face| face as usize >= face_count)
            {
                return Err(TopologyError::SubsetFaceOutOfRange {
                    subset: subset.id.clone(),
                    face,
                    face_count,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_and_triangle() -> MeshTopology {
        MeshTopology::new(vec![4, 3], vec![0, 1, 2, 3, 0, 3, 4])
    }

    #[test]
    fn test_valid_topology() {
        let topology = quad_and_triangle();
        assert_eq!(topology.validate(5), Ok(()));
        assert_eq!(topology.face_count(), 2);
        assert_eq!(topology.corner_count(), 7);
        assert_eq!(topology.triangle_count(), 3);
    }

    #[test]
    fn test_count_mismatch() {
        let topology = MeshTopology::new(vec![4, 4], vec![0, 1, 2, 3]);
        assert_eq!(
            topology.validate(4),
            Err(TopologyError::CountMismatch {
                expected: 8,
                actual: 4
            })
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let err = quad_and_triangle().validate(4).unwrap_err();
        assert_eq!(
            err,
            TopologyError::IndexOutOfRange {
                position: 6,
                index: 4,
                point_count: 4
            }
        );
        assert!(err.to_string().contains("exceeds point count 4"));
    }

    #[test]
    fn test_subset_out_of_range() {
        let topology = quad_and_triangle().with_subset(GeomSubset {
            id: "rim".into(),
            material: None,
            face_indices: vec![1, 2],
        });
        assert!(matches!(
            topology.validate(5),
            Err(TopologyError::SubsetFaceOutOfRange { face: 2, .. })
        ));
    }

    #[test]
    fn test_degenerate_faces_produce_no_triangles() {
        let topology = MeshTopology::new(vec![2, 5], vec![0, 1, 0, 1, 2, 3, 4]);
        assert_eq!(topology.triangle_count(), 3);
    }

    #[test]
    fn test_scheme_tokens() {
        assert_eq!(
            SubdivisionScheme::from_token("catmull_clark"),
            Some(SubdivisionScheme::CatmullClark)
        );
        assert_eq!(
            SubdivisionScheme::from_token("linear"),
            Some(SubdivisionScheme::Linear)
        );
        assert_eq!(SubdivisionScheme::from_token("loop"), None);
    }
}
