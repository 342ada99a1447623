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

//! The type-erased primvar payload and its visitor.

use super::convert::{convert_slice, AttributeData, ToInternal};
use crate::math::{Vec2, Vec3, Vec4};

/// A primvar array as handed out by the scene host.
///
/// The twelve numeric variants cover {scalar, 2, 3, 4 components} x
/// {float, double, int}. `Bool` and `Token` carry settings and are not
/// convertible to attribute data.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimvarValue {
    /// `float[]`
    Float(Vec<f32>),
    /// `double[]`
    Double(Vec<f64>),
    /// `int[]`
    Int(Vec<i32>),
    /// `float2[]`
    Float2(Vec<[f32; 2]>),
    /// `double2[]`
    Double2(Vec<[f64; 2]>),
    /// `int2[]`
    Int2(Vec<[i32; 2]>),
    /// `float3[]`
    Float3(Vec<[f32; 3]>),
    /// `double3[]`
    Double3(Vec<[f64; 3]>),
    /// `int3[]`
    Int3(Vec<[i32; 3]>),
    /// `float4[]`
    Float4(Vec<[f32; 4]>),
    /// `double4[]`
    Double4(Vec<[f64; 4]>),
    /// `int4[]`
    Int4(Vec<[i32; 4]>),
    /// `bool[]`
    Bool(Vec<bool>),
    /// `token[]`
    Token(Vec<String>),
}

/// Visits a [`PrimvarValue`] once, with the element type resolved statically.
///
/// Each method receives the whole source array, so per-element work never
/// re-inspects the variant.
pub trait PrimvarVisitor {
    /// The visitor's result.
    type Output;

    /// Called for scalar arrays.
    fn visit_scalar<T: ToInternal<Internal = f32>>(self, values: &[T]) -> Self::Output;
    /// Called for two-component arrays.
    fn visit_vec2<T: ToInternal<Internal = Vec2>>(self, values: &[T]) -> Self::Output;
    /// Called for three-component arrays.
    fn visit_vec3<T: ToInternal<Internal = Vec3>>(self, values: &[T]) -> Self::Output;
    /// Called for four-component arrays.
    fn visit_vec4<T: ToInternal<Internal = Vec4>>(self, values: &[T]) -> Self::Output;
    /// Called for payloads with no numeric shape.
    fn visit_unsupported(self, type_name: &'static str) -> Self::Output;
}

impl PrimvarValue {
    /// Dispatches to the visitor method matching this payload's shape.
    pub fn visit<V: PrimvarVisitor>(&self, visitor: V) -> V::Output {
        match self {
            PrimvarValue::Float(v) => visitor.visit_scalar(v.as_slice()),
            PrimvarValue::Double(v) => visitor.visit_scalar(v.as_slice()),
            PrimvarValue::Int(v) => visitor.visit_scalar(v.as_slice()),
            PrimvarValue::Float2(v) => visitor.visit_vec2(v.as_slice()),
            PrimvarValue::Double2(v) => visitor.visit_vec2(v.as_slice()),
            PrimvarValue::Int2(v) => visitor.visit_vec2(v.as_slice()),
            PrimvarValue::Float3(v) => visitor.visit_vec3(v.as_slice()),
            PrimvarValue::Double3(v) => visitor.visit_vec3(v.as_slice()),
            PrimvarValue::Int3(v) => visitor.visit_vec3(v.as_slice()),
            PrimvarValue::Float4(v) => visitor.visit_vec4(v.as_slice()),
            PrimvarValue::Double4(v) => visitor.visit_vec4(v.as_slice()),
            PrimvarValue::Int4(v) => visitor.visit_vec4(v.as_slice()),
            PrimvarValue::Bool(_) | PrimvarValue::Token(_) => {
                visitor.visit_unsupported(self.type_name())
            }
        }
    }

    /// Number of elements in the array.
    pub fn len(&self) -> usize {
        match self {
            PrimvarValue::Float(v) => v.len(),
            PrimvarValue::Double(v) => v.len(),
            PrimvarValue::Int(v) => v.len(),
            PrimvarValue::Float2(v) => v.len(),
            PrimvarValue::Double2(v) => v.len(),
            PrimvarValue::Int2(v) => v.len(),
            PrimvarValue::Float3(v) => v.len(),
            PrimvarValue::Double3(v) => v.len(),
            PrimvarValue::Int3(v) => v.len(),
            PrimvarValue::Float4(v) => v.len(),
            PrimvarValue::Double4(v) => v.len(),
            PrimvarValue::Int4(v) => v.len(),
            PrimvarValue::Bool(v) => v.len(),
            PrimvarValue::Token(v) => v.len(),
        }
    }

    /// Returns `true` if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A short, host-style type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimvarValue::Float(_) => "float[]",
            PrimvarValue::Double(_) => "double[]",
            PrimvarValue::Int(_) => "int[]",
            PrimvarValue::Float2(_) => "float2[]",
            PrimvarValue::Double2(_) => "double2[]",
            PrimvarValue::Int2(_) => "int2[]",
            PrimvarValue::Float3(_) => "float3[]",
            PrimvarValue::Double3(_) => "double3[]",
            PrimvarValue::Int3(_) => "int3[]",
            PrimvarValue::Float4(_) => "float4[]",
            PrimvarValue::Double4(_) => "double4[]",
            PrimvarValue::Int4(_) => "int4[]",
            PrimvarValue::Bool(_) => "bool[]",
            PrimvarValue::Token(_) => "token[]",
        }
    }

    /// Converts the payload into internal attribute data.
    ///
    /// Returns `None` for payloads without a numeric shape.
    pub fn to_attribute_data(&self) -> Option<AttributeData> {
        self.visit(ConvertVisitor)
    }

    /// Reads the first element as a boolean setting.
    ///
    /// Numeric scalars are `true` when non-zero.
    pub fn first_as_bool(&self) -> Option<bool> {
        match self {
            PrimvarValue::Bool(v) => v.first().copied(),
            PrimvarValue::Int(v) => v.first().map(|x| *x != 0),
            PrimvarValue::Float(v) => v.first().map(|x| *x != 0.0),
            PrimvarValue::Double(v) => v.first().map(|x| *x != 0.0),
            _ => None,
        }
    }

    /// Reads the first element as a scalar setting.
    pub fn first_as_f32(&self) -> Option<f32> {
        match self {
            PrimvarValue::Float(v) => v.first().copied(),
            PrimvarValue::Double(v) => v.first().map(ToInternal::to_internal),
            PrimvarValue::Int(v) => v.first().map(ToInternal::to_internal),
            PrimvarValue::Bool(v) => v.first().map(|b| if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Reads the first element as a token setting.
    pub fn first_as_token(&self) -> Option<&str> {
        match self {
            PrimvarValue::Token(v) => v.first().map(String::as_str),
            _ => None,
        }
    }
}

/// The visitor behind [`PrimvarValue::to_attribute_data`].
struct ConvertVisitor;

impl PrimvarVisitor for ConvertVisitor {
    type Output = Option<AttributeData>;

    fn visit_scalar<T: ToInternal<Internal = f32>>(self, values: &[T]) -> Self::Output {
        Some(AttributeData::Float(convert_slice(values)))
    }

    fn visit_vec2<T: ToInternal<Internal = Vec2>>(self, values: &[T]) -> Self::Output {
        Some(AttributeData::Float2(convert_slice(values)))
    }

    fn visit_vec3<T: ToInternal<Internal = Vec3>>(self, values: &[T]) -> Self::Output {
        Some(AttributeData::Float3(convert_slice(values)))
    }

    fn visit_vec4<T: ToInternal<Internal = Vec4>>(self, values: &[T]) -> Self::Output {
        Some(AttributeData::Float4(convert_slice(values)))
    }

    fn visit_unsupported(self, _type_name: &'static str) -> Self::Output {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_numeric_shape_converts() {
        let cases = [
            (PrimvarValue::Float(vec![1.5]), AttributeData::Float(vec![1.5])),
            (PrimvarValue::Double(vec![1.5]), AttributeData::Float(vec![1.5])),
            (PrimvarValue::Int(vec![-3]), AttributeData::Float(vec![-3.0])),
            (
                PrimvarValue::Float2(vec![[0.5, -1.0]]),
                AttributeData::Float2(vec![Vec2::new(0.5, -1.0)]),
            ),
            (
                PrimvarValue::Double2(vec![[0.25, 4.0]]),
                AttributeData::Float2(vec![Vec2::new(0.25, 4.0)]),
            ),
            (
                PrimvarValue::Int2(vec![[7, -8]]),
                AttributeData::Float2(vec![Vec2::new(7.0, -8.0)]),
            ),
            (
                PrimvarValue::Float3(vec![[0.5, 1.5, -2.5]]),
                AttributeData::Float3(vec![Vec3::new(0.5, 1.5, -2.5)]),
            ),
            (
                PrimvarValue::Double3(vec![[0.125, 2.0, 1e3]]),
                AttributeData::Float3(vec![Vec3::new(0.125, 2.0, 1000.0)]),
            ),
            (
                PrimvarValue::Int3(vec![[1, 2, 3]]),
                AttributeData::Float3(vec![Vec3::new(1.0, 2.0, 3.0)]),
            ),
            (
                PrimvarValue::Float4(vec![[1.0, 0.5, 0.25, 0.0]]),
                AttributeData::Float4(vec![Vec4::new(1.0, 0.5, 0.25, 0.0)]),
            ),
            (
                PrimvarValue::Double4(vec![[0.75, -0.5, 3.0, 1.0]]),
                AttributeData::Float4(vec![Vec4::new(0.75, -0.5, 3.0, 1.0)]),
            ),
            (
                PrimvarValue::Int4(vec![[0, 1, -1, 255]]),
                AttributeData::Float4(vec![Vec4::new(0.0, 1.0, -1.0, 255.0)]),
            ),
        ];
        for (value, expected) in cases {
            assert_eq!(value.to_attribute_data(), Some(expected), "{}", value.type_name());
        }
    }

    #[test]
    fn test_non_numeric_payload_is_rejected() {
        assert_eq!(PrimvarValue::Bool(vec![true]).to_attribute_data(), None);
        assert_eq!(
            PrimvarValue::Token(vec!["linear".into()]).to_attribute_data(),
            None
        );
    }

    #[test]
    fn test_setting_readers() {
        assert_eq!(PrimvarValue::Int(vec![2]).first_as_bool(), Some(true));
        assert_eq!(PrimvarValue::Double(vec![0.0]).first_as_bool(), Some(false));
        assert_eq!(PrimvarValue::Int(vec![4]).first_as_f32(), Some(4.0));
        assert_eq!(
            PrimvarValue::Token(vec!["none".into()]).first_as_token(),
            Some("none")
        );
        assert_eq!(PrimvarValue::Float(vec![]).first_as_bool(), None);
    }
}
