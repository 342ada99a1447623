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

//! Host reads of one sync pass.
//!
//! Everything the pass needs from the [`SceneDelegate`] is pulled here,
//! before the scene lock is taken, so the critical section only edits
//! renderer records.

use super::settings::PrimSettings;
use tessel_core::config::SyncConfig;
use tessel_core::math::Mat4;
use tessel_core::primvar::{tokens, Interpolation, PrimvarRecord, PrimvarRole, PrimvarValue};
use tessel_core::sampling::TimeSampleArray;
use tessel_core::scene::{DirtyBits, MaterialId, PrimId, SceneDelegate};
use tessel_core::topology::MeshTopology;

/// What the previous pass left behind, as far as the snapshot cares.
pub(super) struct PreviousPass<'a> {
    pub settings: &'a PrimSettings,
    pub has_velocities: bool,
}

/// The host data of one pass. `None` fields were not dirty.
pub(super) struct PrimSnapshot {
    pub dirty: DirtyBits,
    /// The refined topology must be rebuilt.
    pub refine: bool,
    /// Vertices and motion keys must be rebuilt.
    pub vertices: bool,
    pub topology: Option<MeshTopology>,
    pub refine_level: u32,
    pub settings: Option<PrimSettings>,
    pub has_display_color: Option<bool>,
    pub has_velocities: bool,
    pub points: Option<TimeSampleArray<PrimvarValue>>,
    pub velocities: Option<PrimvarValue>,
    pub primvars: Vec<PrimvarRecord>,
    pub transform: Option<TimeSampleArray<Mat4>>,
    pub material: Option<Option<MaterialId>>,
    pub visible: Option<bool>,
    pub double_sided: Option<bool>,
    pub prim_index: Option<u32>,
    pub instances: Option<TimeSampleArray<Vec<Mat4>>>,
}

impl PrimSnapshot {
    /// Reads the host state selected by `dirty`. `previous` is `None` on the
    /// first pass of a prim.
    pub fn read(
        delegate: &dyn SceneDelegate,
        id: &PrimId,
        mut dirty: DirtyBits,
        config: &SyncConfig,
        previous: Option<PreviousPass<'_>>,
    ) -> Self {
        if previous.is_none() {
            dirty |= DirtyBits::ALL;
        }

        let mut settings = None;
        let mut has_display_color = None;
        let mut has_velocities = previous.as_ref().is_some_and(|p| p.has_velocities);
        let mut descriptors = Vec::new();
        let mut refine = dirty.needs_refine();

        let primvars_dirty = DirtyBits::PRIMVAR | DirtyBits::POINTS | DirtyBits::NORMALS;
        if refine || dirty.intersects(primvars_dirty) {
            for interpolation in Interpolation::SYNCED {
                descriptors.extend(delegate.primvar_descriptors(id, interpolation));
            }
            has_velocities = descriptors.iter().any(|d| d.name == tokens::VELOCITIES);
            has_display_color = Some(descriptors.iter().any(|d| d.name == tokens::DISPLAY_COLOR));

            let read = PrimSettings::read(delegate, id, config);
            if previous
                .as_ref()
                .is_some_and(|p| p.settings.refine_differs(&read))
            {
                log::debug!("{id}: subdivision settings changed, rebuilding topology");
                refine = true;
            }
            settings = Some(read);
        }

        let vertices = refine
            || dirty.intersects(DirtyBits::POINTS)
            || (dirty.intersects(DirtyBits::PRIMVAR) && has_velocities);

        let topology = if refine {
            delegate.mesh_topology(id)
        } else {
            None
        };

        let (points, velocities) = if vertices {
            let velocities = if has_velocities {
                delegate.primvar(id, tokens::VELOCITIES)
            } else {
                None
            };
            (Some(delegate.sample_primvar(id, tokens::POINTS)), velocities)
        } else {
            (None, None)
        };

        let primvars = descriptors
            .into_iter()
            .filter(|d| {
                d.name != tokens::POINTS
                    && d.name != tokens::VELOCITIES
                    && !PrimSettings::is_setting(&d.name)
            })
            .filter_map(|descriptor| {
                let host_dirty = dirty.is_primvar_dirty(&descriptor.name);
                // Tangents and recomputed normals follow the vertices.
                let follows_vertices = vertices
                    && (descriptor.role == PrimvarRole::TextureCoordinate
                        || descriptor.name == tokens::NORMALS);
                if !(refine || host_dirty || follows_vertices) {
                    return None;
                }
                let value = delegate.primvar(id, &descriptor.name)?;
                Some(PrimvarRecord {
                    descriptor,
                    value,
                    dirty: host_dirty,
                })
            })
            .collect();

        let placement = refine
            || vertices
            || dirty.intersects(DirtyBits::TRANSFORM | DirtyBits::INSTANCER);
        let transform = placement.then(|| delegate.sample_transform(id));
        let instances = placement.then(|| {
            delegate
                .instancer(id)
                .map(|instancer| instancer.sample_instance_transforms(id))
                .unwrap_or_default()
        });

        Self {
            dirty,
            refine,
            vertices,
            topology,
            refine_level: delegate.display_style(id).refine_level,
            settings,
            has_display_color,
            has_velocities,
            points,
            velocities,
            primvars,
            transform,
            material: (refine || dirty.intersects(DirtyBits::MATERIAL_ID))
                .then(|| delegate.material_id(id)),
            visible: dirty
                .intersects(DirtyBits::VISIBILITY)
                .then(|| delegate.visible(id)),
            double_sided: dirty
                .intersects(DirtyBits::DOUBLE_SIDED)
                .then(|| delegate.double_sided(id)),
            prim_index: dirty
                .intersects(DirtyBits::PRIM_ID)
                .then(|| delegate.prim_index(id)),
            instances,
        }
    }
}
