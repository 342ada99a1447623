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

//! Provides the single-precision math primitives used by the sync pipeline.
//!
//! Every renderer-side quantity (positions, normals, texture coordinates, colors,
//! transforms) is stored in these types once it has crossed the numeric
//! conversion layer. Matrices are column-major and transform column vectors,
//! i.e. `m * v`.

// --- Fundamental Constants ---

/// Squared lengths below `EPSILON²` normalize to zero.
pub const EPSILON: f32 = 1e-5;

// --- Declare Sub-Modules ---

pub mod geometry;
pub mod matrix;
pub mod vector;

// --- Re-export Principal Types ---

pub use self::geometry::Aabb;
pub use self::matrix::Mat4;
pub use self::vector::{Vec2, Vec3, Vec4};

/// Types that can be blended as a weighted sum.
///
/// Refinement stencils and temporal resampling both reduce to accumulating
/// `weight * value` terms, so every internal element type implements this.
pub trait Blend: Copy + Default {
    /// Returns `self + other * weight`.
    fn add_scaled(self, other: Self, weight: f32) -> Self;

    /// Linear interpolation between `a` and `b` with an unclamped factor `t`.
    #[inline]
    fn blend(a: Self, b: Self, t: f32) -> Self {
        Self::default().add_scaled(a, 1.0 - t).add_scaled(b, t)
    }
}

impl Blend for f32 {
    #[inline]
    fn add_scaled(self, other: Self, weight: f32) -> Self {
        self + other * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scalar_blend() {
        assert_relative_eq!(f32::blend(2.0, 4.0, 0.25), 2.5);
        assert_relative_eq!(0.0f32.add_scaled(3.0, 2.0), 6.0);
    }
}
