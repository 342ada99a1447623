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

//! Provides the 4x4 transform matrix used for object and instance transforms.

use super::vector::{Vec3, Vec4};
use super::Blend;
use std::ops::Mul;

// --- Mat4 ---

/// A 4x4 column-major matrix, used for 3D affine transformations.
///
/// Object transforms, per-instance transforms, and transform motion keys are all
/// stored as `Mat4`. Composition follows the column-vector convention: in
/// `a * b`, `b` is applied first.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// A 4x4 matrix with all elements set to 0.
    pub const ZERO: Self = Self {
        cols: [Vec4::ZERO; 4],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Returns a row of the matrix as a `Vec4`.
    #[inline]
    pub fn get_row(&self, index: usize) -> Vec4 {
        Vec4 {
            x: self.cols[0].get(index),
            y: self.cols[1].get(index),
            z: self.cols[2].get(index),
            w: self.cols[3].get(index),
        }
    }

    /// Creates a translation matrix.
    ///
    /// # Arguments
    ///
    /// * `v`: The translation vector to apply.
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self {
            cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::new(v.x, v.y, v.z, 1.0)],
        }
    }

    /// Returns the translation part of an affine matrix.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.cols[3].truncate()
    }
}

// --- Operators Overloading ---

impl Default for Mat4 {
    /// Returns the 4x4 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Multiplies this matrix by another `Mat4`. Note that matrix multiplication is not commutative.
    #[inline]
    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut result_cols = [Vec4::ZERO; 4];
        for (c_idx, target_col) in result_cols.iter_mut().enumerate() {
            let col_from_rhs = rhs.cols[c_idx];
            *target_col = Vec4 {
                x: self.get_row(0).dot(col_from_rhs),
                y: self.get_row(1).dot(col_from_rhs),
                z: self.get_row(2).dot(col_from_rhs),
                w: self.get_row(3).dot(col_from_rhs),
            };
        }
        Mat4 { cols: result_cols }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    /// Transforms a `Vec4` by this matrix.
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

/// Matrices resample element-wise, matching how time-sampled transforms are
/// interpolated between neighbouring samples.
impl Blend for Mat4 {
    #[inline]
    fn add_scaled(self, other: Self, weight: f32) -> Self {
        Self::from_cols(
            self.cols[0] + other.cols[0] * weight,
            self.cols[1] + other.cols[1] * weight,
            self.cols[2] + other.cols[2] * weight,
            self.cols[3] + other.cols[3] * weight,
        )
    }

    #[inline]
    fn blend(a: Self, b: Self, t: f32) -> Self {
        Self::ZERO.add_scaled(a, 1.0 - t).add_scaled(b, t)
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mat4_identity_default() {
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
        assert_ne!(Mat4::from_translation(Vec3::X), Mat4::IDENTITY);
    }

    #[test]
    fn test_mat4_mul_applies_right_operand_first() {
        let t = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let u = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        assert_eq!((t * u).translation(), Vec3::new(1.0, 2.0, 0.0));

        let p = t * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(p, Vec4::new(2.0, 1.0, 1.0, 1.0));
        // Directions ignore the translation column.
        let d = t * Vec4::new(1.0, 1.0, 1.0, 0.0);
        assert_eq!(d, Vec4::new(1.0, 1.0, 1.0, 0.0));
    }

    #[test]
    fn test_mat4_blend_is_elementwise() {
        let a = Mat4::from_translation(Vec3::ZERO);
        let b = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
        let mid = Mat4::blend(a, b, 0.5);
        assert_relative_eq!(mid.translation().x, 1.0);
        assert_relative_eq!(mid.cols[0].x, 1.0);
        assert_relative_eq!(mid.cols[3].w, 1.0);
    }
}
