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

//! The renderer-side object record: a placed, shaded instance of a mesh.

use crate::arena::Handle;
use crate::mesh::MeshRecord;
use tessel_core::math::{Mat4, Vec3};
use tessel_core::scene::VisibilityFlags;

/// A mesh placed in the scene.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    /// Name used in logs.
    pub name: String,
    /// The mesh this object renders. Instances share their prototype's mesh.
    pub mesh: Option<Handle<MeshRecord>>,
    /// Transform at the centre of the shutter.
    pub tfm: Mat4,
    /// Transform motion keys, one per mesh motion step; empty when static.
    pub motion: Vec<Mat4>,
    /// Ray visibility mask.
    pub visibility: VisibilityFlags,
    /// Pass index written to id passes.
    pub pass_id: u32,
    /// Display color.
    pub color: Vec3,
    /// Whether the object only receives shadows.
    pub is_shadow_catcher: bool,
    /// Whether the object cuts out a holdout.
    pub use_holdout: bool,
    /// Whether back faces render.
    pub double_sided: bool,
    /// Per-instance objects placed by an instancer.
    pub instances: Vec<Handle<ObjectRecord>>,
}

impl ObjectRecord {
    /// Creates a visible, untransformed object.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mesh: None,
            tfm: Mat4::IDENTITY,
            motion: Vec::new(),
            visibility: VisibilityFlags::ALL,
            pass_id: 0,
            color: Vec3::ONE,
            is_shadow_catcher: false,
            use_holdout: false,
            double_sided: true,
            instances: Vec::new(),
        }
    }

    /// Creates an instance of `mesh` that owns only its transforms.
    pub fn instance_of(
        name: impl Into<String>,
        mesh: Option<Handle<MeshRecord>>,
        tfm: Mat4,
        motion: Vec<Mat4>,
    ) -> Self {
        Self {
            mesh,
            tfm,
            motion,
            ..Self::new(name)
        }
    }

    /// Returns `true` if transform motion keys are stored.
    pub fn has_motion(&self) -> bool {
        self.motion.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_object_is_visible() {
        let object = ObjectRecord::new("/World/Cube");
        assert_eq!(object.visibility, VisibilityFlags::ALL);
        assert_eq!(object.tfm, Mat4::IDENTITY);
        assert!(!object.has_motion());
    }

    #[test]
    fn test_instance_keeps_transform() {
        let tfm = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let instance = ObjectRecord::instance_of("i0", None, tfm, vec![tfm, tfm]);
        assert_eq!(instance.tfm, tfm);
        assert!(instance.has_motion());
        assert!(instance.instances.is_empty());
    }
}
