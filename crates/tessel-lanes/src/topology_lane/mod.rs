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

//! The topology refiner facade.
//!
//! A [`MeshRefiner`] turns a validated control topology into the triangle list
//! the renderer traces. With subdivision active it delegates to an external
//! [`SubdivisionRefiner`] and keeps the refined polygons and stencils so any
//! payload can be refined consistently; otherwise the control polygons are
//! fan-triangulated directly.

use std::sync::Arc;
use tessel_core::lane::{Lane, LaneKind};
use tessel_core::math::Blend;
use tessel_core::primvar::{AttributeData, Interpolation};
use tessel_core::topology::{
    for_each_fan_triangle, MeshTopology, Orientation, PolygonView, StencilTable,
    SubdivisionRefiner, SubdivisionResult, SubdivisionScheme, TopologyError,
};
use thiserror::Error;

/// Errors raised by the refiner facade.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RefinerError {
    /// A refine call was made before [`MeshRefiner::build`].
    #[error("The refiner has not been built")]
    NotBuilt,
    /// The control topology failed validation.
    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyError),
    /// A payload does not match the control element count.
    #[error("{interpolation} payload holds {actual} values, expected {expected}")]
    SizeMismatch {
        /// Class of the payload.
        interpolation: Interpolation,
        /// Elements required.
        expected: usize,
        /// Elements supplied.
        actual: usize,
    },
    /// The payload class cannot be refined.
    #[error("Cannot refine {0} payloads")]
    UnsupportedInterpolation(Interpolation),
}

/// The triangulated output of one build.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedTopology {
    /// Build counter, unique per facade.
    pub generation: u64,
    /// Winding order shared by the polygons and the triangles.
    pub orientation: Orientation,
    /// Triangle vertex indices.
    pub triangles: Vec<[u32; 3]>,
    /// The rendered polygon each triangle was fanned from.
    pub triangle_faces: Vec<u32>,
    /// Corner counts of the rendered polygons.
    pub face_vertex_counts: Vec<u32>,
    /// Vertex indices of the rendered polygons.
    pub face_vertex_indices: Vec<u32>,
    /// Number of rendered vertices.
    pub vertex_count: usize,
    /// Subdivision level applied; 0 when fan-triangulated.
    pub level: u32,
    control_vertex_count: usize,
    control_face_count: usize,
    control_corner_count: usize,
    subdivision: Option<SubdivisionResult>,
}

impl RefinedTopology {
    /// Addresses the rendered polygons.
    pub fn face_view(&self) -> PolygonView<'_> {
        PolygonView::new(&self.face_vertex_counts, &self.face_vertex_indices)
    }

    /// Returns `true` if the polygons come from a subdivision refiner.
    pub fn is_subdivided(&self) -> bool {
        self.subdivision.is_some()
    }

    /// The control face of every rendered polygon.
    pub fn face_parents(&self) -> Vec<u32> {
        match &self.subdivision {
            Some(result) => result.face_parents.clone(),
            None => (0..self.control_face_count as u32).collect(),
        }
    }

    /// The control face of every triangle.
    pub fn triangle_control_faces(&self) -> Vec<u32> {
        match &self.subdivision {
            Some(result) => self
                .triangle_faces
                .iter()
                .map(|&f| result.face_parents[f as usize])
                .collect(),
            None => self.triangle_faces.clone(),
        }
    }
}

enum RefinerState {
    Unbuilt,
    Built(RefinedTopology),
}

/// Owns the refined representation of one mesh.
pub struct MeshRefiner {
    subdivider: Option<Arc<dyn SubdivisionRefiner>>,
    state: RefinerState,
    generation: u64,
}

impl MeshRefiner {
    /// Creates an unbuilt facade. Without a subdivider every mesh is
    /// fan-triangulated.
    pub fn new(subdivider: Option<Arc<dyn SubdivisionRefiner>>) -> Self {
        Self {
            subdivider,
            state: RefinerState::Unbuilt,
            generation: 0,
        }
    }

    /// Returns `true` once [`MeshRefiner::build`] succeeded.
    pub fn is_built(&self) -> bool {
        matches!(self.state, RefinerState::Built(_))
    }

    /// Drops the current refinement.
    pub fn reset(&mut self) {
        self.state = RefinerState::Unbuilt;
    }

    /// The current refinement.
    pub fn refined(&self) -> Result<&RefinedTopology, RefinerError> {
        match &self.state {
            RefinerState::Built(refined) => Ok(refined),
            RefinerState::Unbuilt => Err(RefinerError::NotBuilt),
        }
    }

    /// Refined triangle vertex triples.
    pub fn triangles(&self) -> Result<&[[u32; 3]], RefinerError> {
        Ok(&self.refined()?.triangles)
    }

    /// Vertex count of every refined triangle.
    pub fn triangle_vertex_counts(&self) -> Result<Vec<u32>, RefinerError> {
        Ok(vec![3; self.refined()?.triangles.len()])
    }

    /// Discards any previous refinement and builds a new one.
    ///
    /// Subdivision runs when `level > 0`, the topology requests a scheme and
    /// a subdivider is available; anything else fan-triangulates the cage.
    pub fn build(
        &mut self,
        topology: &MeshTopology,
        point_count: usize,
        level: u32,
    ) -> Result<&RefinedTopology, RefinerError> {
        self.state = RefinerState::Unbuilt;
        topology.validate(point_count)?;
        self.generation += 1;

        let subdivider = self
            .subdivider
            .as_ref()
            .filter(|_| level > 0 && topology.scheme != SubdivisionScheme::None);

        let refined = match subdivider {
            Some(subdivider) => {
                let result = subdivider.refine(topology, level);
                log::debug!(
                    "{} refinement at level {level}: {} faces, {} vertices",
                    subdivider.scheme_name(),
                    result.face_vertex_counts.len(),
                    result.vertex_count()
                );
                self.assemble(
                    topology,
                    point_count,
                    level,
                    result.face_vertex_counts.clone(),
                    result.face_vertex_indices.clone(),
                    result.vertex_count(),
                    Some(result),
                )
            }
            None => self.assemble(
                topology,
                point_count,
                0,
                topology.face_vertex_counts.clone(),
                topology.face_vertex_indices.clone(),
                point_count,
                None,
            ),
        };

        log::trace!(
            "Refinement generation {} holds {} triangles",
            refined.generation,
            refined.triangles.len()
        );
        self.state = RefinerState::Built(refined);
        self.refined()
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        topology: &MeshTopology,
        point_count: usize,
        level: u32,
        face_vertex_counts: Vec<u32>,
        face_vertex_indices: Vec<u32>,
        vertex_count: usize,
        subdivision: Option<SubdivisionResult>,
    ) -> RefinedTopology {
        let view = PolygonView::new(&face_vertex_counts, &face_vertex_indices);
        let mut triangles = Vec::new();
        let mut triangle_faces = Vec::new();
        for_each_fan_triangle(&view, topology.is_left_handed(), |face, corners| {
            triangles.push(corners.map(|c| face_vertex_indices[c]));
            triangle_faces.push(face as u32);
        });

        RefinedTopology {
            generation: self.generation,
            orientation: topology.orientation,
            triangles,
            triangle_faces,
            face_vertex_counts,
            face_vertex_indices,
            vertex_count,
            level,
            control_vertex_count: point_count,
            control_face_count: topology.face_count(),
            control_corner_count: topology.corner_count(),
            subdivision,
        }
    }

    /// Refines per-vertex data onto the rendered vertices.
    pub fn refine_vertex<T: Blend>(&self, data: &[T]) -> Result<Vec<T>, RefinerError> {
        let refined = self.refined()?;
        check_len(Interpolation::Vertex, refined.control_vertex_count, data.len())?;
        match &refined.subdivision {
            Some(result) => apply(&result.vertex_stencils, data, Interpolation::Vertex),
            None => Ok(data.to_vec()),
        }
    }

    /// Refines per-face data onto the rendered polygons.
    ///
    /// Short arrays are accepted; the mapper zero-fills the faces they miss.
    pub fn refine_uniform<T: Copy + Default>(&self, data: &[T]) -> Result<Vec<T>, RefinerError> {
        let refined = self.refined()?;
        if data.len() > refined.control_face_count {
            return Err(RefinerError::SizeMismatch {
                interpolation: Interpolation::Uniform,
                expected: refined.control_face_count,
                actual: data.len(),
            });
        }
        match &refined.subdivision {
            Some(result) => Ok(result
                .face_parents
                .iter()
                .map(|&parent| data.get(parent as usize).copied().unwrap_or_default())
                .collect()),
            None => Ok(data.to_vec()),
        }
    }

    /// Refines per-corner data onto the corners of the rendered polygons.
    pub fn refine_face_varying<T: Blend>(&self, data: &[T]) -> Result<Vec<T>, RefinerError> {
        let refined = self.refined()?;
        check_len(
            Interpolation::FaceVarying,
            refined.control_corner_count,
            data.len(),
        )?;
        match &refined.subdivision {
            Some(result) => apply(&result.corner_stencils, data, Interpolation::FaceVarying),
            None => Ok(data.to_vec()),
        }
    }

    /// Refines a converted payload according to its class. Constant payloads
    /// pass through unchanged.
    pub fn refine_payload(
        &self,
        data: &AttributeData,
        interpolation: Interpolation,
    ) -> Result<AttributeData, RefinerError> {
        match interpolation {
            Interpolation::Constant => {
                self.refined()?;
                Ok(data.clone())
            }
            Interpolation::Uniform => Ok(match data {
                AttributeData::Float(v) => AttributeData::Float(self.refine_uniform(v)?),
                AttributeData::Float2(v) => AttributeData::Float2(self.refine_uniform(v)?),
                AttributeData::Float3(v) => AttributeData::Float3(self.refine_uniform(v)?),
                AttributeData::Float4(v) => AttributeData::Float4(self.refine_uniform(v)?),
            }),
            Interpolation::Vertex | Interpolation::Varying => Ok(match data {
                AttributeData::Float(v) => AttributeData::Float(self.refine_vertex(v)?),
                AttributeData::Float2(v) => AttributeData::Float2(self.refine_vertex(v)?),
                AttributeData::Float3(v) => AttributeData::Float3(self.refine_vertex(v)?),
                AttributeData::Float4(v) => AttributeData::Float4(self.refine_vertex(v)?),
            }),
            Interpolation::FaceVarying => Ok(match data {
                AttributeData::Float(v) => AttributeData::Float(self.refine_face_varying(v)?),
                AttributeData::Float2(v) => AttributeData::Float2(self.refine_face_varying(v)?),
                AttributeData::Float3(v) => AttributeData::Float3(self.refine_face_varying(v)?),
                AttributeData::Float4(v) => AttributeData::Float4(self.refine_face_varying(v)?),
            }),
            Interpolation::Instance => Err(RefinerError::UnsupportedInterpolation(interpolation)),
        }
    }
}

impl Lane for MeshRefiner {
    fn strategy_name(&self) -> &'static str {
        match (&self.subdivider, &self.state) {
            (Some(subdivider), RefinerState::Built(refined)) if refined.is_subdivided() => {
                subdivider.scheme_name()
            }
            _ => "FanTriangulation",
        }
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Topology
    }
}

fn check_len(interpolation: Interpolation, expected: usize, actual: usize) -> Result<(), RefinerError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RefinerError::SizeMismatch {
            interpolation,
            expected,
            actual,
        })
    }
}

fn apply<T: Blend>(
    table: &StencilTable,
    data: &[T],
    interpolation: Interpolation,
) -> Result<Vec<T>, RefinerError> {
    table.apply(data).ok_or(RefinerError::SizeMismatch {
        interpolation,
        expected: table.max_source().map_or(0, |m| m + 1),
        actual: data.len(),
    })
}
