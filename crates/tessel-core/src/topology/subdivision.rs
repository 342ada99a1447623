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

//! The contract for external subdivision refiners.
//!
//! A refiner evaluates a control cage once per topology and returns stencil
//! tables. Every refined element is a weighted sum of control elements, so any
//! payload (points, primvars of any shape) can later be refined consistently
//! without calling back into the refiner.

use super::MeshTopology;
use crate::math::Blend;

/// A flattened table of weighted stencils.
///
/// Stencil `i` spans `offsets[i]..offsets[i + 1]` in `sources`/`weights`.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilTable {
    offsets: Vec<u32>,
    sources: Vec<u32>,
    weights: Vec<f32>,
}

impl Default for StencilTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StencilTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            sources: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Creates a table where stencil `i` copies source `i`.
    pub fn identity(count: usize) -> Self {
        let mut table = Self::new();
        for i in 0..count as u32 {
            table.push(&[(i, 1.0)]);
        }
        table
    }

    /// Appends a stencil.
    pub fn push(&mut self, terms: &[(u32, f32)]) {
        for &(source, weight) in terms {
            self.sources.push(source);
            self.weights.push(weight);
        }
        self.offsets.push(self.sources.len() as u32);
    }

    /// Number of stencils (refined elements).
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Returns `true` if the table holds no stencils.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the `(source, weight)` terms of stencil `index`.
    pub fn stencil(&self, index: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let start = self.offsets[index] as usize;
        let end = self.offsets[index + 1] as usize;
        self.sources[start..end]
            .iter()
            .zip(&self.weights[start..end])
            .map(|(&s, &w)| (s as usize, w))
    }

    /// Largest source index referenced, if any.
    pub fn max_source(&self) -> Option<usize> {
        self.sources.iter().max().map(|&s| s as usize)
    }

    /// Evaluates every stencil against `control` values.
    ///
    /// Returns `None` if a stencil references a missing control value.
    pub fn apply<T: Blend>(&self, control: &[T]) -> Option<Vec<T>> {
        if self.max_source().is_some_and(|m| m >= control.len()) {
            return None;
        }
        Some(
            (0..self.len())
                .map(|i| {
                    self.stencil(i)
                        .fold(T::default(), |acc, (s, w)| acc.add_scaled(control[s], w))
                })
                .collect(),
        )
    }
}

/// The output of one subdivision evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubdivisionResult {
    /// Corner count of every refined face.
    pub face_vertex_counts: Vec<u32>,
    /// Refined vertex indices, concatenated per face.
    pub face_vertex_indices: Vec<u32>,
    /// The control face each refined face descends from.
    pub face_parents: Vec<u32>,
    /// One stencil per refined vertex, over control vertices.
    pub vertex_stencils: StencilTable,
    /// One stencil per refined corner, over control corners.
    pub corner_stencils: StencilTable,
}

impl SubdivisionResult {
    /// Number of refined vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_stencils.len()
    }
}

/// An external subdivision surface evaluator.
pub trait SubdivisionRefiner: Send + Sync {
    /// Human-readable scheme name used in logs.
    fn scheme_name(&self) -> &'static str;

    /// Refines a validated control cage `level` times.
    fn refine(&self, topology: &MeshTopology, level: u32) -> SubdivisionResult;
}
