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

//! A linear (bilinear face-split) subdivision refiner.
//!
//! Every level splits each n-gon into n quads around its centroid, adding one
//! point per edge midpoint and one per face centroid. Crease tags have no
//! effect on a linear scheme and are ignored.

use ahash::AHashMap;
use tessel_core::topology::{MeshTopology, StencilTable, SubdivisionRefiner, SubdivisionResult};

type Stencil = Vec<(u32, f32)>;

/// Weighted sum of stencils, merged by source.
fn combine(terms: &[(&Stencil, f32)]) -> Stencil {
    let mut merged: AHashMap<u32, f32> = AHashMap::new();
    for (stencil, scale) in terms {
        for &(source, weight) in stencil.iter() {
            *merged.entry(source).or_insert(0.0) += weight * scale;
        }
    }
    let mut stencil: Stencil = merged.into_iter().collect();
    stencil.sort_unstable_by_key(|&(source, _)| source);
    stencil
}

/// The mesh at one refinement level, expressed over the control cage.
struct Level {
    counts: Vec<u32>,
    indices: Vec<u32>,
    parents: Vec<u32>,
    vertices: Vec<Stencil>,
    corners: Vec<Stencil>,
}

impl Level {
    fn control(topology: &MeshTopology) -> Self {
        let vertex_count = topology
            .face_vertex_indices
            .iter()
            .max()
            .map_or(0, |&m| m as usize + 1);
        Self {
            counts: topology.face_vertex_counts.clone(),
            indices: topology.face_vertex_indices.clone(),
            parents: (0..topology.face_count() as u32).collect(),
            vertices: (0..vertex_count as u32).map(|v| vec![(v, 1.0)]).collect(),
            corners: (0..topology.corner_count() as u32)
                .map(|c| vec![(c, 1.0)])
                .collect(),
        }
    }

    fn split(self) -> Self {
        let mut next = Level {
            counts: Vec::with_capacity(self.indices.len()),
            indices: Vec::with_capacity(self.indices.len() * 4),
            parents: Vec::with_capacity(self.indices.len()),
            vertices: self.vertices.clone(),
            corners: Vec::with_capacity(self.indices.len() * 4),
        };
        let mut edge_points: AHashMap<(u32, u32), u32> = AHashMap::new();

        let mut offset = 0usize;
        for (face, &count) in self.counts.iter().enumerate() {
            let n = count as usize;
            let start = offset;
            offset += n;
            if n < 3 {
                continue;
            }
            let face_vertices = &self.indices[start..start + n];
            let face_corners = &self.corners[start..start + n];
            let share = 1.0 / n as f32;

            let centre_stencil = combine(
                &face_vertices
                    .iter()
                    .map(|&v| (&self.vertices[v as usize], share))
                    .collect::<Vec<_>>(),
            );
            let centre = next.vertices.len() as u32;
            next.vertices.push(centre_stencil);

            let centre_corner = combine(
                &face_corners
                    .iter()
                    .map(|c| (c, share))
                    .collect::<Vec<_>>(),
            );

            let mut edge_point = |a: u32, b: u32, next: &mut Level| -> u32 {
                let key = (a.min(b), a.max(b));
                *edge_points.entry(key).or_insert_with(|| {
                    let index = next.vertices.len() as u32;
                    next.vertices.push(combine(&[
                        (&self.vertices[a as usize], 0.5),
                        (&self.vertices[b as usize], 0.5),
                    ]));
                    index
                })
            };

            for i in 0..n {
                let prev = (i + n - 1) % n;
                let following = (i + 1) % n;
                let (v, v_next, v_prev) = (
                    face_vertices[i],
                    face_vertices[following],
                    face_vertices[prev],
                );
                let edge_out = edge_point(v, v_next, &mut next);
                let edge_in = edge_point(v_prev, v, &mut next);

                next.counts.push(4);
                next.indices
                    .extend_from_slice(&[v, edge_out, centre, edge_in]);
                next.parents.push(self.parents[face]);
                next.corners.push(face_corners[i].clone());
                next.corners.push(combine(&[
                    (&face_corners[i], 0.5),
                    (&face_corners[following], 0.5),
                ]));
                next.corners.push(centre_corner.clone());
                next.corners.push(combine(&[
                    (&face_corners[prev], 0.5),
                    (&face_corners[i], 0.5),
                ]));
            }
        }
        next
    }
}

fn table(stencils: &[Stencil]) -> StencilTable {
    let mut table = StencilTable::new();
    for stencil in stencils {
        table.push(stencil);
    }
    table
}

/// Refines any polygon mesh by repeated linear face splitting.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearSubdivider;

impl LinearSubdivider {
    /// Creates a new `LinearSubdivider`.
    pub fn new() -> Self {
        Self
    }
}

impl SubdivisionRefiner for LinearSubdivider {
    fn scheme_name(&self) -> &'static str {
        "Linear"
    }

    fn refine(&self, topology: &MeshTopology, level: u32) -> SubdivisionResult {
        let mut current = Level::control(topology);
        for _ in 0..level {
            current = current.split();
        }
        SubdivisionResult {
            vertex_stencils: table(&current.vertices),
            corner_stencils: table(&current.corners),
            face_vertex_counts: current.counts,
            face_vertex_indices: current.indices,
            face_parents: current.parents,
        }
    }
}
