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

//! Tangent-space generation.
//!
//! The MikkTSpace algorithm itself comes from the `mikktspace` crate; this lane
//! feeds it faces through [`FaceTopologyView`] so triangle lists and
//! subdivision polygons go through the same path.

mod normals;

pub use normals::{compute_face_normals, compute_vertex_normals};

use tessel_core::lane::{Lane, LaneKind};
use tessel_core::math::{Vec2, Vec3};
use tessel_core::topology::FaceTopologyView;

/// Normals handed to the tangent solver.
#[derive(Debug, Clone, Copy)]
pub struct NormalInputs<'a> {
    /// Per-vertex shading normals.
    pub vertex: &'a [Vec3],
    /// Per-face normals, used for faceted faces.
    pub face: &'a [Vec3],
    /// Per-face smooth flag; `None` treats every face as smooth.
    pub smooth: Option<&'a [bool]>,
}

/// Geometry of one tangent computation.
pub struct TangentInputs<'a, V: FaceTopologyView + ?Sized> {
    /// The faces. MikkTSpace handles triangles and quads; larger faces are
    /// skipped and keep zero tangents.
    pub faces: &'a V,
    /// Vertex positions.
    pub positions: &'a [Vec3],
    /// Normals; computed from `positions` when `None`.
    pub normals: Option<NormalInputs<'a>>,
    /// Per-corner texture coordinates; zeros are used when `None`.
    pub uvs: Option<&'a [Vec2]>,
}

/// Per-corner tangents of one UV set.
#[derive(Debug, Clone, PartialEq)]
pub struct TangentOutput {
    /// Tangent of every corner, indexed like the face view's corners.
    pub tangents: Vec<Vec3>,
    /// Bitangent sign of every corner, when requested.
    pub signs: Option<Vec<f32>>,
}

impl TangentOutput {
    fn zeroed(corners: usize, need_sign: bool) -> Self {
        Self {
            tangents: vec![Vec3::ZERO; corners],
            signs: need_sign.then(|| vec![1.0; corners]),
        }
    }
}

/// Adapts a face view to the `mikktspace::Geometry` callbacks.
struct MikkGeometry<'a, V: FaceTopologyView + ?Sized> {
    faces: &'a V,
    positions: &'a [Vec3],
    normals: NormalInputs<'a>,
    uvs: Option<&'a [Vec2]>,
    output: TangentOutput,
}

impl<V: FaceTopologyView + ?Sized> mikktspace::Geometry for MikkGeometry<'_, V> {
    fn num_faces(&self) -> usize {
        self.faces.face_count()
    }

    fn num_vertices_of_face(&self, face: usize) -> usize {
        self.faces.corner_count(face)
    }

    fn position(&self, face: usize, vert: usize) -> [f32; 3] {
        self.positions[self.faces.vertex_index(face, vert)].to_array()
    }

    fn normal(&self, face: usize, vert: usize) -> [f32; 3] {
        let smooth = match self.normals.smooth {
            Some(flags) => flags.get(face).copied().unwrap_or(true),
            None => true,
        };
        let normal = if smooth {
            self.normals.vertex[self.faces.vertex_index(face, vert)]
        } else {
            self.normals.face[face]
        };
        normal.to_array()
    }

    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2] {
        self.uvs
            .map_or(Vec2::ZERO, |uvs| uvs[self.faces.corner_index(face, vert)])
            .to_array()
    }

    fn set_tangent_encoded(&mut self, tangent: [f32; 4], face: usize, vert: usize) {
        let corner = self.faces.corner_index(face, vert);
        self.output.tangents[corner] = Vec3::new(tangent[0], tangent[1], tangent[2]);
        if let Some(signs) = &mut self.output.signs {
            signs[corner] = tangent[3];
        }
    }
}

/// A lane computing MikkTSpace tangents.
#[derive(Debug, Default, Clone, Copy)]
pub struct TangentSpaceLane;

impl TangentSpaceLane {
    /// Creates a new `TangentSpaceLane`.
    pub fn new() -> Self {
        Self
    }

    /// Computes per-corner tangents and, if `need_sign`, bitangent signs.
    ///
    /// Falls back to zero tangents when the solver fails or there is nothing
    /// to solve for.
    pub fn run<V: FaceTopologyView + ?Sized>(
        &self,
        inputs: &TangentInputs<'_, V>,
        need_sign: bool,
    ) -> TangentOutput {
        let corners = inputs.faces.total_corners();
        if inputs.positions.is_empty() || corners == 0 {
            return TangentOutput::zeroed(corners, need_sign);
        }

        let (computed_face, computed_vertex);
        let normals = match inputs.normals {
            Some(normals) => normals,
            None => {
                computed_face = compute_face_normals(inputs.faces, inputs.positions);
                computed_vertex =
                    compute_vertex_normals(inputs.faces, inputs.positions.len(), &computed_face);
                NormalInputs {
                    vertex: &computed_vertex,
                    face: &computed_face,
                    smooth: None,
                }
            }
        };

        let mut geometry = MikkGeometry {
            faces: inputs.faces,
            positions: inputs.positions,
            normals,
            uvs: inputs.uvs,
            output: TangentOutput::zeroed(corners, need_sign),
        };

        if !mikktspace::generate_tangents(&mut geometry) {
            log::warn!("Tangent generation failed; using zero tangents");
            return TangentOutput::zeroed(corners, need_sign);
        }
        geometry.output
    }
}

impl Lane for TangentSpaceLane {
    fn strategy_name(&self) -> &'static str {
        "MikkTSpace"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Tangent
    }
}
