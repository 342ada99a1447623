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

//! The renderer scene and the coarse lock that guards it.

use crate::arena::{Arena, Handle};
use crate::mesh::MeshRecord;
use crate::object::ObjectRecord;
use crate::shader::ShaderTable;
use parking_lot::Mutex;
use std::sync::Arc;

/// The renderer scene shared between sync and render workers.
pub type SharedScene = Arc<Mutex<RenderScene>>;

/// Counters of pending update notifications, read by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCounters {
    /// Mesh geometry or attribute updates.
    pub mesh_updates: u64,
    /// Object transform or flag updates.
    pub object_updates: u64,
    /// Records added or removed.
    pub structure_updates: u64,
}

/// Mesh, object and shader storage of the renderer.
#[derive(Default)]
pub struct RenderScene {
    meshes: Arena<MeshRecord>,
    objects: Arena<ObjectRecord>,
    /// The shader table.
    pub shaders: ShaderTable,
    updates: UpdateCounters,
}

impl RenderScene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a new empty scene in the shared lock.
    pub fn new_shared() -> SharedScene {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Registers a mesh.
    pub fn add_mesh(&mut self, mesh: MeshRecord) -> Handle<MeshRecord> {
        self.updates.structure_updates += 1;
        self.meshes.insert(mesh)
    }

    /// Unregisters a mesh.
    pub fn remove_mesh(&mut self, handle: Handle<MeshRecord>) -> Option<MeshRecord> {
        let mesh = self.meshes.remove(handle)?;
        self.updates.structure_updates += 1;
        Some(mesh)
    }

    /// Registers an object.
    pub fn add_object(&mut self, object: ObjectRecord) -> Handle<ObjectRecord> {
        self.updates.structure_updates += 1;
        self.objects.insert(object)
    }

    /// Unregisters an object together with its instances.
    pub fn remove_object(&mut self, handle: Handle<ObjectRecord>) -> Option<ObjectRecord> {
        let object = self.objects.remove(handle)?;
        for &instance in &object.instances {
            self.objects.remove(instance);
        }
        self.updates.structure_updates += 1;
        Some(object)
    }

    /// Unregisters the instances of `handle`, keeping the object itself.
    pub fn clear_instances(&mut self, handle: Handle<ObjectRecord>) {
        let instances = match self.objects.get_mut(handle) {
            Some(object) => std::mem::take(&mut object.instances),
            None => return,
        };
        if !instances.is_empty() {
            self.updates.structure_updates += 1;
        }
        for instance in instances {
            self.objects.remove(instance);
        }
    }

    /// Borrows a mesh.
    pub fn mesh(&self, handle: Handle<MeshRecord>) -> Option<&MeshRecord> {
        self.meshes.get(handle)
    }

    /// Mutably borrows a mesh.
    pub fn mesh_mut(&mut self, handle: Handle<MeshRecord>) -> Option<&mut MeshRecord> {
        self.meshes.get_mut(handle)
    }

    /// Borrows an object.
    pub fn object(&self, handle: Handle<ObjectRecord>) -> Option<&ObjectRecord> {
        self.objects.get(handle)
    }

    /// Mutably borrows an object.
    pub fn object_mut(&mut self, handle: Handle<ObjectRecord>) -> Option<&mut ObjectRecord> {
        self.objects.get_mut(handle)
    }

    /// Number of registered meshes.
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of registered objects, instances included.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Iterates registered objects.
    pub fn objects(&self) -> impl Iterator<Item = (Handle<ObjectRecord>, &ObjectRecord)> {
        self.objects.iter()
    }

    /// Notifies the renderer that a mesh must be re-traced.
    pub fn tag_mesh_update(&mut self, handle: Handle<MeshRecord>) {
        if self.meshes.contains(handle) {
            self.updates.mesh_updates += 1;
        }
    }

    /// Notifies the renderer that an object must be re-traced.
    pub fn tag_object_update(&mut self, handle: Handle<ObjectRecord>) {
        if self.objects.contains(handle) {
            self.updates.object_updates += 1;
        }
    }

    /// The pending update counters.
    pub fn updates(&self) -> UpdateCounters {
        self.updates
    }
}
