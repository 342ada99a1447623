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

//! Uniform face addressing over triangle lists and polygon lists.

/// Addresses faces, their corners and the vertices behind those corners.
///
/// Triangulated meshes are exposed as fixed 3-gons through [`TriangleView`];
/// polygonal and subdivision faces are exposed as N-gons through
/// [`PolygonView`]. Consumers never branch on which one they hold.
pub trait FaceTopologyView {
    /// Number of faces.
    fn face_count(&self) -> usize;

    /// Number of corners of `face`.
    fn corner_count(&self, face: usize) -> usize;

    /// The vertex referenced by corner `corner` of `face`.
    fn vertex_index(&self, face: usize, corner: usize) -> usize;

    /// The flat index of corner `corner` of `face`, used to address per-corner data.
    fn corner_index(&self, face: usize, corner: usize) -> usize;

    /// Total number of corners over all faces.
    fn total_corners(&self) -> usize {
        (0..self.face_count()).map(|f| self.corner_count(f)).sum()
    }
}

/// A triangle list seen as 3-gons. Corner `c` of triangle `t` is `t * 3 + c`.
#[derive(Debug, Clone, Copy)]
pub struct TriangleView<'a> {
    triangles: &'a [[u32; 3]],
}

impl<'a> TriangleView<'a> {
    /// Wraps a triangle list.
    pub fn new(triangles: &'a [[u32; 3]]) -> Self {
        Self { triangles }
    }
}

impl FaceTopologyView for TriangleView<'_> {
    #[inline]
    fn face_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    fn corner_count(&self, _face: usize) -> usize {
        3
    }

    #[inline]
    fn vertex_index(&self, face: usize, corner: usize) -> usize {
        self.triangles[face][corner] as usize
    }

    #[inline]
    fn corner_index(&self, face: usize, corner: usize) -> usize {
        face * 3 + corner
    }

    #[inline]
    fn total_corners(&self) -> usize {
        self.triangles.len() * 3
    }
}

/// A polygon list (counts + concatenated indices) seen as N-gons.
#[derive(Debug, Clone)]
pub struct PolygonView<'a> {
    counts: &'a [u32],
    indices: &'a [u32],
    offsets: Vec<usize>,
}

impl<'a> PolygonView<'a> {
    /// Wraps a polygon list. `counts` must sum to `indices.len()`.
    pub fn new(counts: &'a [u32], indices: &'a [u32]) -> Self {
        let mut offsets = Vec::with_capacity(counts.len());
        let mut offset = 0usize;
        for &n in counts {
            offsets.push(offset);
            offset += n as usize;
        }
        Self {
            counts,
            indices,
            offsets,
        }
    }

    /// Start offset of `face` in the corner array.
    #[inline]
    pub fn face_offset(&self, face: usize) -> usize {
        self.offsets[face]
    }
}

impl FaceTopologyView for PolygonView<'_> {
    #[inline]
    fn face_count(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    fn corner_count(&self, face: usize) -> usize {
        self.counts[face] as usize
    }

    #[inline]
    fn vertex_index(&self, face: usize, corner: usize) -> usize {
        self.indices[self.offsets[face] + corner] as usize
    }

    #[inline]
    fn corner_index(&self, face: usize, corner: usize) -> usize {
        self.offsets[face] + corner
    }

    #[inline]
    fn total_corners(&self) -> usize {
        self.indices.len()
    }
}

/// Fan-triangulates every face of `view` around its first corner.
///
/// Calls `emit(face, corners)` once per triangle, in face order, where
/// `corners` holds flat corner indices. Right-handed faces emit
/// `(0, j, j + 1)`; left-handed faces emit `(0, j + 1, j)`. Faces with fewer
/// than three corners emit nothing.
pub fn for_each_fan_triangle<V, F>(view: &V, left_handed: bool, mut emit: F)
where
    V: FaceTopologyView + ?Sized,
    F: FnMut(usize, [usize; 3]),
{
    for face in 0..view.face_count() {
        let n = view.corner_count(face);
        if n < 3 {
            continue;
        }
        let first = view.corner_index(face, 0);
        for j in 1..n - 1 {
            let (b, c) = if left_handed { (j + 1, j) } else { (j, j + 1) };
            emit(
                face,
                [first, view.corner_index(face, b), view.corner_index(face, c)],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_view_addresses() {
        let tris = [[0, 1, 2], [0, 2, 3]];
        let view = TriangleView::new(&tris);
        assert_eq!(view.face_count(), 2);
        assert_eq!(view.corner_count(1), 3);
        assert_eq!(view.vertex_index(1, 2), 3);
        assert_eq!(view.corner_index(1, 2), 5);
        assert_eq!(view.total_corners(), 6);
    }

    #[test]
    fn test_polygon_view_addresses() {
        let counts = [4, 3];
        let indices = [0, 1, 2, 3, 3, 2, 4];
        let view = PolygonView::new(&counts, &indices);
        assert_eq!(view.face_count(), 2);
        assert_eq!(view.corner_count(0), 4);
        assert_eq!(view.face_offset(1), 4);
        assert_eq!(view.vertex_index(1, 2), 4);
        assert_eq!(view.corner_index(1, 0), 4);
        assert_eq!(view.total_corners(), 7);
    }

    #[test]
    fn test_fan_winding() {
        let counts = [4, 2];
        let indices = [10, 11, 12, 13, 0, 1];
        let view = PolygonView::new(&counts, &indices);

        let mut right = Vec::new();
        for_each_fan_triangle(&view, false, |face, c| right.push((face, c)));
        assert_eq!(right, vec![(0, [0, 1, 2]), (0, [0, 2, 3])]);

        let mut left = Vec::new();
        for_each_fan_triangle(&view, true, |_, c| left.push(c));
        assert_eq!(left, vec![[0, 2, 1], [0, 3, 2]]);
    }
}
