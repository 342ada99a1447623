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

//! Face and vertex normal computation over any face view.

use tessel_core::math::Vec3;
use tessel_core::topology::FaceTopologyView;

/// Unit normal of every face: the normalized sum of the edge cross products
/// (Newell's method), so non-planar polygons get a stable average.
/// Degenerate faces get a zero normal.
pub fn compute_face_normals<V: FaceTopologyView + ?Sized>(view: &V, positions: &[Vec3]) -> Vec<Vec3> {
    (0..view.face_count())
        .map(|face| {
            let n = view.corner_count(face);
            let mut normal = Vec3::ZERO;
            for corner in 0..n {
                let current = positions[view.vertex_index(face, corner)];
                let next = positions[view.vertex_index(face, (corner + 1) % n)];
                normal = normal + current.cross(next);
            }
            normal.normalize()
        })
        .collect()
}

/// Unit normal of every vertex: the normalized sum of the normals of the faces
/// using it. Unreferenced vertices get a zero normal.
pub fn compute_vertex_normals<V: FaceTopologyView + ?Sized>(
    view: &V,
    vertex_count: usize,
    face_normals: &[Vec3],
) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertex_count];
    for (face, &face_normal) in face_normals.iter().enumerate().take(view.face_count()) {
        for corner in 0..view.corner_count(face) {
            let vertex = view.vertex_index(face, corner);
            normals[vertex] = normals[vertex] + face_normal;
        }
    }
    normals.iter().map(Vec3::normalize).collect()
}
