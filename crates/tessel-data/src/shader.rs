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

//! The renderer's shader table.
//!
//! Shaders are append-only and deduplicated by identity: looking up the same
//! material twice returns the same handle.

use std::collections::HashMap;
use tessel_core::scene::MaterialId;

/// An index into the [`ShaderTable`]. Handles never go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(u32);

impl ShaderHandle {
    /// The raw table index.
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// One shader entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Shader {
    /// Display name.
    pub name: String,
    /// The material this shader was created for; `None` for built-ins.
    pub material: Option<MaterialId>,
    /// Bumped every time the shader is tagged for update.
    pub update_count: u64,
}

/// Append-only, deduplicated shader storage.
#[derive(Debug, Clone)]
pub struct ShaderTable {
    shaders: Vec<Shader>,
    by_material: HashMap<MaterialId, ShaderHandle>,
    default_surface: ShaderHandle,
    default_vcol_surface: ShaderHandle,
}

impl Default for ShaderTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderTable {
    /// Creates a table holding the two built-in surfaces.
    pub fn new() -> Self {
        let mut table = Self {
            shaders: Vec::new(),
            by_material: HashMap::new(),
            default_surface: ShaderHandle(0),
            default_vcol_surface: ShaderHandle(0),
        };
        table.default_surface = table.push("default_surface", None);
        table.default_vcol_surface = table.push("default_vcol_surface", None);
        table
    }

    fn push(&mut self, name: &str, material: Option<MaterialId>) -> ShaderHandle {
        let handle = ShaderHandle(self.shaders.len() as u32);
        self.shaders.push(Shader {
            name: name.to_owned(),
            material,
            update_count: 0,
        });
        handle
    }

    /// The fallback surface for meshes without a material.
    pub fn default_surface(&self) -> ShaderHandle {
        self.default_surface
    }

    /// The fallback surface that displays vertex colors.
    pub fn default_vcol_surface(&self) -> ShaderHandle {
        self.default_vcol_surface
    }

    /// Returns the shader for `material`, creating it on first use.
    pub fn lookup_or_create(&mut self, material: &MaterialId) -> ShaderHandle {
        if let Some(&handle) = self.by_material.get(material) {
            return handle;
        }
        let handle = self.push(material.as_str(), Some(material.clone()));
        self.by_material.insert(material.clone(), handle);
        log::debug!("Created shader {} for material '{}'", handle.0, material);
        handle
    }

    /// Looks up an existing shader for `material`.
    pub fn find(&self, material: &MaterialId) -> Option<ShaderHandle> {
        self.by_material.get(material).copied()
    }

    /// Borrows a shader.
    pub fn get(&self, handle: ShaderHandle) -> Option<&Shader> {
        self.shaders.get(handle.0 as usize)
    }

    /// Marks a shader as changed.
    pub fn tag_update(&mut self, handle: ShaderHandle) {
        if let Some(shader) = self.shaders.get_mut(handle.0 as usize) {
            shader.update_count += 1;
        }
    }

    /// Number of shaders, built-ins included.
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Always `false`: the built-ins are present from construction.
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}
