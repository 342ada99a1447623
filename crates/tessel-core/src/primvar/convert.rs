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

//! Numeric conversion from host element types to the internal single-precision shapes.
//!
//! Conversion is a plain per-component `as f32` cast: doubles are narrowed with the
//! platform's default rounding, integers are widened, and nothing is range-checked.

use crate::math::{Vec2, Vec3, Vec4};

/// A host element type with a single-precision internal counterpart.
pub trait ToInternal: Copy {
    /// The internal element type produced by the conversion.
    type Internal: Copy + Default;

    /// Converts one element.
    fn to_internal(&self) -> Self::Internal;
}

macro_rules! impl_scalar_to_internal {
    ($($ty:ty),*) => {
        $(
            impl ToInternal for $ty {
                type Internal = f32;
                #[inline]
                fn to_internal(&self) -> f32 {
                    *self as f32
                }
            }

            impl ToInternal for [$ty; 2] {
                type Internal = Vec2;
                #[inline]
                fn to_internal(&self) -> Vec2 {
                    Vec2::new(self[0] as f32, self[1] as f32)
                }
            }

            impl ToInternal for [$ty; 3] {
                type Internal = Vec3;
                #[inline]
                fn to_internal(&self) -> Vec3 {
                    Vec3::new(self[0] as f32, self[1] as f32, self[2] as f32)
                }
            }

            impl ToInternal for [$ty; 4] {
                type Internal = Vec4;
                #[inline]
                fn to_internal(&self) -> Vec4 {
                    Vec4::new(self[0] as f32, self[1] as f32, self[2] as f32, self[3] as f32)
                }
            }
        )*
    };
}

impl_scalar_to_internal!(f32, f64, i32);

/// Converts a whole slice.
#[inline]
pub fn convert_slice<T: ToInternal>(values: &[T]) -> Vec<T::Internal> {
    values.iter().map(ToInternal::to_internal).collect()
}

/// Component count of an internal element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementShape {
    /// One `f32`.
    Scalar,
    /// A `Vec2`.
    Vec2,
    /// A `Vec3`.
    Vec3,
    /// A `Vec4`.
    Vec4,
}

impl ElementShape {
    /// Number of `f32` components per element.
    pub const fn components(self) -> usize {
        match self {
            ElementShape::Scalar => 1,
            ElementShape::Vec2 => 2,
            ElementShape::Vec3 => 3,
            ElementShape::Vec4 => 4,
        }
    }
}

/// A typed array of converted, single-precision elements.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    /// Scalars.
    Float(Vec<f32>),
    /// Two-component vectors.
    Float2(Vec<Vec2>),
    /// Three-component vectors.
    Float3(Vec<Vec3>),
    /// Four-component vectors.
    Float4(Vec<Vec4>),
}

impl AttributeData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            AttributeData::Float(v) => v.len(),
            AttributeData::Float2(v) => v.len(),
            AttributeData::Float3(v) => v.len(),
            AttributeData::Float4(v) => v.len(),
        }
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element shape.
    pub fn shape(&self) -> ElementShape {
        match self {
            AttributeData::Float(_) => ElementShape::Scalar,
            AttributeData::Float2(_) => ElementShape::Vec2,
            AttributeData::Float3(_) => ElementShape::Vec3,
            AttributeData::Float4(_) => ElementShape::Vec4,
        }
    }

    /// Borrows the elements as a flat `f32` slice.
    pub fn as_flat(&self) -> &[f32] {
        match self {
            AttributeData::Float(v) => v,
            AttributeData::Float2(v) => bytemuck::cast_slice(v),
            AttributeData::Float3(v) => bytemuck::cast_slice(v),
            AttributeData::Float4(v) => bytemuck::cast_slice(v),
        }
    }

    /// Borrows three-component data, if that is what this holds.
    pub fn as_float3(&self) -> Option<&[Vec3]> {
        match self {
            AttributeData::Float3(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows two-component data, if that is what this holds.
    pub fn as_float2(&self) -> Option<&[Vec2]> {
        match self {
            AttributeData::Float2(v) => Some(v),
            _ => None,
        }
    }

    /// Widens or narrows element `index` to a color triple.
    ///
    /// Scalars splat, two-component values pad `z` with zero and four-component
    /// values drop alpha.
    pub fn color_at(&self, index: usize) -> Option<Vec3> {
        match self {
            AttributeData::Float(v) => v.get(index).map(|s| Vec3::splat(*s)),
            AttributeData::Float2(v) => v.get(index).map(|c| c.extend(0.0)),
            AttributeData::Float3(v) => v.get(index).copied(),
            AttributeData::Float4(v) => v.get(index).map(|c| c.truncate()),
        }
    }
}
