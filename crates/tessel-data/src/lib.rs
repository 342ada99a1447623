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

//! Renderer-owned records written by the Tessel sync engine.
//!
//! Meshes, objects and shaders live in a [`RenderScene`] addressed through
//! generational handles; the scene is shared with render workers behind a
//! single coarse lock ([`SharedScene`]).

#![warn(missing_docs)]

pub mod arena;
pub mod attribute;
pub mod mesh;
pub mod object;
pub mod scene;
pub mod shader;

pub use arena::{Arena, Handle};
pub use attribute::{
    AttributeBuffer, AttributeElement, AttributeSet, AttributeSizeError, AttributeStandard,
    AttributeType,
};
pub use mesh::{MeshRecord, SubdFaces, SubdParams};
pub use object::ObjectRecord;
pub use scene::{RenderScene, SharedScene, UpdateCounters};
pub use shader::{Shader, ShaderHandle, ShaderTable};
