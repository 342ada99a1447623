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

//! Defines the `MeshSyncAgent`, which keeps renderer meshes in step with the
//! scene host.

use super::primvars::{apply_primvars, PrimvarContext};
use super::settings::PrimSettings;
use super::snapshot::{PreviousPass, PrimSnapshot};
use anyhow::{Context, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tessel_core::config::SyncConfig;
use tessel_core::lane::Lane;
use tessel_core::math::{Aabb, Mat4, Vec3};
use tessel_core::primvar::PrimvarValue;
use tessel_core::sampling::TimeSampleArray;
use tessel_core::scene::{DirtyBits, MaterialId, PrimId, SceneDelegate, VisibilityFlags};
use tessel_core::topology::{MeshTopology, SubdivisionRefiner, SubdivisionScheme};
use tessel_data::{
    AttributeBuffer, AttributeElement, AttributeStandard, Handle, MeshRecord, ObjectRecord,
    RenderScene, SharedScene, SubdFaces, SubdParams,
};
use tessel_lanes::{
    AttributeMappingLane, MeshRefiner, MotionResampleLane, TangentSpaceLane, TransformMotion,
};

/// Name of the deformation motion key buffer.
const MOTION_POSITIONS: &str = "motion_P";
/// Name of the generated texture-space coordinates.
const GENERATED: &str = "generated";

/// What the agent remembers about one prim between passes.
struct PrimState {
    refiner: MeshRefiner,
    mesh: Handle<MeshRecord>,
    object: Handle<ObjectRecord>,
    /// The control topology of the last successful build.
    topology: Option<MeshTopology>,
    settings: PrimSettings,
    material: Option<MaterialId>,
    has_display_color: bool,
    has_velocities: bool,
    visible: bool,
}

/// The agent responsible for syncing mesh prims into the renderer scene.
///
/// Each call to [`MeshSyncAgent::sync`] handles one prim: host data selected by
/// the dirty bits is read first, then the scene lock is taken for the whole
/// pass and the steps run in a fixed order (topology, vertices and motion,
/// primvars, transform, material, visibility, instancing). Per-attribute
/// failures are logged and leave the previous buffer in place.
pub struct MeshSyncAgent {
    scene: SharedScene,
    config: SyncConfig,
    subdivider: Option<Arc<dyn SubdivisionRefiner>>,
    mapper: AttributeMappingLane,
    tangents: TangentSpaceLane,
    motion: MotionResampleLane,
    prims: HashMap<PrimId, PrimState>,
}

impl MeshSyncAgent {
    /// Creates a new `MeshSyncAgent` writing into `scene`.
    ///
    /// Without a `subdivider` every mesh is rendered as its control cage.
    pub fn new(
        scene: SharedScene,
        config: SyncConfig,
        subdivider: Option<Arc<dyn SubdivisionRefiner>>,
    ) -> Self {
        let agent = Self {
            scene,
            config,
            subdivider,
            mapper: AttributeMappingLane::new(),
            tangents: TangentSpaceLane::new(),
            motion: MotionResampleLane::new(),
            prims: HashMap::new(),
        };
        for lane in agent.lanes() {
            log::debug!(
                "MeshSyncAgent: {} lane '{}'",
                lane.lane_kind(),
                lane.strategy_name()
            );
        }
        agent
    }

    /// The lanes shared by every prim.
    pub fn lanes(&self) -> [&dyn Lane; 3] {
        [&self.mapper, &self.tangents, &self.motion]
    }

    /// The settings this agent was built with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The renderer scene this agent writes into.
    pub fn scene(&self) -> &SharedScene {
        &self.scene
    }

    /// Number of prims currently synced.
    pub fn prim_count(&self) -> usize {
        self.prims.len()
    }

    /// The mesh record of a synced prim.
    pub fn mesh_handle(&self, id: &PrimId) -> Option<Handle<MeshRecord>> {
        self.prims.get(id).map(|state| state.mesh)
    }

    /// The object record of a synced prim.
    pub fn object_handle(&self, id: &PrimId) -> Option<Handle<ObjectRecord>> {
        self.prims.get(id).map(|state| state.object)
    }

    /// Syncs one prim. A prim seen for the first time is fully synced whatever
    /// `dirty` says.
    ///
    /// Returns `true` if renderer records were tagged for update.
    pub fn sync(
        &mut self,
        delegate: &dyn SceneDelegate,
        id: &PrimId,
        dirty: DirtyBits,
    ) -> Result<bool> {
        let previous = self.prims.get(id).map(|state| PreviousPass {
            settings: &state.settings,
            has_velocities: state.has_velocities,
        });
        let snapshot = PrimSnapshot::read(delegate, id, dirty, &self.config, previous);
        if snapshot.dirty.is_empty() {
            log::trace!("{id}: nothing to sync");
            return Ok(false);
        }

        let mut scene = self.scene.lock();
        let state = match self.prims.entry(id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mesh = scene.add_mesh(MeshRecord::new(id.as_str()));
                let mut object = ObjectRecord::new(id.as_str());
                object.mesh = Some(mesh);
                let object = scene.add_object(object);
                log::debug!("{id}: registered {mesh:?} and {object:?}");
                entry.insert(PrimState {
                    refiner: MeshRefiner::new(self.subdivider.clone()),
                    mesh,
                    object,
                    topology: None,
                    settings: PrimSettings::from_config(&self.config),
                    material: None,
                    has_display_color: false,
                    has_velocities: false,
                    visible: true,
                })
            }
        };

        let pass = SyncPass {
            id,
            config: &self.config,
            mapper: &self.mapper,
            tangents: &self.tangents,
            motion: &self.motion,
        };
        pass.run(&mut scene, state, snapshot)
    }

    /// Removes a prim: its instances, object and mesh are unregistered from
    /// the scene. Returns `false` if the prim was never synced.
    pub fn finalize(&mut self, id: &PrimId) -> bool {
        let Some(state) = self.prims.remove(id) else {
            return false;
        };
        let mut scene = self.scene.lock();
        scene.remove_object(state.object);
        scene.remove_mesh(state.mesh);
        log::debug!("{id}: unregistered");
        true
    }
}

/// The borrowed context of one prim's pass.
struct SyncPass<'a> {
    id: &'a PrimId,
    config: &'a SyncConfig,
    mapper: &'a AttributeMappingLane,
    tangents: &'a TangentSpaceLane,
    motion: &'a MotionResampleLane,
}

impl SyncPass<'_> {
    fn run(
        &self,
        scene: &mut RenderScene,
        state: &mut PrimState,
        snap: PrimSnapshot,
    ) -> Result<bool> {
        let id = self.id;
        let mut mesh_changed = false;
        let mut object_changed = false;

        let settings_changed = match &snap.settings {
            Some(settings) if *settings != state.settings => {
                state.settings = settings.clone();
                true
            }
            _ => false,
        };
        if let Some(has_display_color) = snap.has_display_color {
            state.has_display_color = has_display_color;
        }
        state.has_velocities = snap.has_velocities;

        // Topology
        let mut built = state.refiner.is_built();
        if snap.refine {
            built = self.sync_topology(scene, state, &snap)?;
            mesh_changed = true;
        }

        // Vertices and motion keys
        let mut vertices_changed = false;
        if built && snap.vertices {
            match self.sync_vertices(scene, state, &snap) {
                Ok(()) => vertices_changed = true,
                // Fresh triangles must not index into stale vertices.
                Err(e) if snap.refine => {
                    log::error!("{id}: rejected topology without usable points: {e:#}");
                    let mesh = mesh_mut(scene, state.mesh)?;
                    mesh.clear_topology();
                    reject_topology(state, mesh);
                    built = false;
                }
                Err(e) => log::warn!("{id}: keeping previous vertices: {e:#}"),
            }
            mesh_changed |= vertices_changed;
        }

        // Primvars
        if built && !snap.primvars.is_empty() {
            let refined = state.refiner.refined()?;
            let ctx = PrimvarContext {
                refiner: &state.refiner,
                refined,
                mapper: self.mapper,
                tangents: self.tangents,
            };
            let mesh = mesh_mut(scene, state.mesh)?;
            let (changed, display_color) = apply_primvars(&ctx, mesh, &snap.primvars, id);
            mesh_changed |= changed;
            if let Some(color) = display_color {
                object_mut(scene, state.object)?.color = color;
                object_changed = true;
            }
        }

        // Transform
        if let Some(samples) = &snap.transform {
            let steps = mesh_mut(scene, state.mesh)?.motion_steps as usize;
            let placement = self.placement(state, samples, steps);
            let object = object_mut(scene, state.object)?;
            object.tfm = placement.tfm;
            object.motion = placement.motion;
            object_changed = true;
        }

        // Material
        if let Some(material) = &snap.material {
            state.material = material.clone();
        }
        if snap.refine || snap.material.is_some() || snap.has_display_color.is_some() {
            mesh_changed |= self.sync_shaders(scene, state)?;
        }

        // Visibility and object flags
        if let Some(visible) = snap.visible {
            state.visible = visible;
        }
        let flags_dirty = snap.visible.is_some()
            || snap.instances.is_some()
            || snap.double_sided.is_some()
            || snap.prim_index.is_some()
            || settings_changed;
        if flags_dirty {
            let object = object_mut(scene, state.object)?;
            let has_instances = match &snap.instances {
                Some(samples) => samples.values().first().is_some_and(|t| !t.is_empty()),
                None => !object.instances.is_empty(),
            };
            object.visibility = if has_instances {
                VisibilityFlags::EMPTY
            } else {
                instance_visibility(state)
            };
            object.is_shadow_catcher = state.settings.shadow_catcher;
            object.use_holdout = state.settings.holdout;
            if let Some(double_sided) = snap.double_sided {
                object.double_sided = double_sided;
            }
            if let Some(prim_index) = snap.prim_index {
                object.pass_id = prim_index + 1;
            }
            object_changed = true;
        }

        // Instancing
        if let (Some(instances), Some(prototype)) = (&snap.instances, &snap.transform) {
            scene.clear_instances(state.object);
            if !instances.is_empty() {
                let steps = mesh_mut(scene, state.mesh)?.motion_steps as usize;
                let mut handles = Vec::new();
                for (index, samples) in self
                    .motion
                    .composite_instances(prototype, instances)
                    .iter()
                    .enumerate()
                {
                    let placement = self.placement(state, samples, steps);
                    handles.push(scene.add_object(ObjectRecord::instance_of(
                        format!("{id}[{index}]"),
                        Some(state.mesh),
                        placement.tfm,
                        placement.motion,
                    )));
                }
                log::debug!("{id}: placed {} instances", handles.len());
                object_mut(scene, state.object)?.instances = handles;
            }
            object_changed = true;
        }
        if object_changed {
            propagate_to_instances(scene, state)?;
        }

        // Finish
        if vertices_changed {
            finish_mesh(mesh_mut(scene, state.mesh)?)?;
        }

        if mesh_changed {
            scene.tag_mesh_update(state.mesh);
        }
        if object_changed {
            scene.tag_object_update(state.object);
            let instances = object_mut(scene, state.object)?.instances.clone();
            for instance in instances {
                scene.tag_object_update(instance);
            }
        }
        log::debug!(
            "{id}: synced {:?} (mesh changed: {mesh_changed}, object changed: {object_changed})",
            snap.dirty
        );
        Ok(mesh_changed || object_changed)
    }

    /// Rebuilds the refined topology and the triangle buffers. Returns
    /// `false` when the topology was rejected; the mesh is left empty.
    fn sync_topology(
        &self,
        scene: &mut RenderScene,
        state: &mut PrimState,
        snap: &PrimSnapshot,
    ) -> Result<bool> {
        let id = self.id;
        let mesh = mesh_mut(scene, state.mesh)?;
        mesh.clear_topology();

        let Some(mut topology) = snap.topology.clone() else {
            log::error!("{id}: the host has no topology for this prim");
            reject_topology(state, mesh);
            return Ok(false);
        };
        if let Some(scheme) = state.settings.scheme {
            topology.scheme = scheme;
        }

        let point_count = snap
            .points
            .as_ref()
            .and_then(|samples| samples.primary())
            .map_or(0, PrimvarValue::len);
        let level = self.refine_level(&topology, snap.refine_level, &state.settings);

        let refined = match state.refiner.build(&topology, point_count, level) {
            Ok(refined) => refined,
            Err(e) => {
                log::error!("{id}: rejected topology: {e}");
                reject_topology(state, mesh);
                return Ok(false);
            }
        };

        let (face_slots, _) = subset_slots(&topology);
        let shader = refined
            .triangle_control_faces()
            .iter()
            .map(|&face| face_slots.get(face as usize).copied().unwrap_or(0))
            .collect();

        mesh.set_triangles(refined.triangles.clone());
        mesh.shader = shader;
        mesh.subd_faces = refined.is_subdivided().then(|| SubdFaces {
            counts: refined.face_vertex_counts.clone(),
            indices: refined.face_vertex_indices.clone(),
            parents: refined.face_parents(),
        });
        mesh.subd_params = SubdParams {
            dicing_rate: state.settings.dicing_rate,
            max_level: state.settings.max_level,
        };
        log::debug!(
            "{id}: {} triangles over {} vertices (level {})",
            refined.triangles.len(),
            refined.vertex_count,
            refined.level
        );

        state.topology = Some(topology);
        Ok(true)
    }

    /// The refine level: the display level clamped by the prim and engine
    /// limits, or 0 when subdivision is off.
    fn refine_level(
        &self,
        topology: &MeshTopology,
        display_level: u32,
        settings: &PrimSettings,
    ) -> u32 {
        if !self.config.enable_subdivision || topology.scheme == SubdivisionScheme::None {
            return 0;
        }
        display_level
            .min(settings.max_level)
            .min(self.config.max_subdivision_level)
    }

    /// Refines the points and builds deformation motion keys. The mesh is only
    /// touched once everything is computed.
    fn sync_vertices(
        &self,
        scene: &mut RenderScene,
        state: &PrimState,
        snap: &PrimSnapshot,
    ) -> Result<()> {
        let samples = snap.points.as_ref().context("points were not read")?;
        let points = self
            .motion
            .point_motion(samples)
            .context("the prim has no three-component points")?;
        let verts = state
            .refiner
            .refine_vertex(&points.primary)
            .context("refining points")?;

        let keys = if !state.settings.deformation_blur(self.config) {
            None
        } else if !points.is_static() {
            Some(points)
        } else {
            snap.velocities.as_ref().and_then(|value| {
                let velocities = value.to_attribute_data()?.as_float3()?.to_vec();
                self.motion
                    .velocity_motion(&points.primary, &velocities, self.config.velocity_scale)
            })
        };

        let motion = match keys {
            Some(keys) if !keys.is_static() => {
                let mut flat = Vec::with_capacity(verts.len() * keys.keys.len());
                for key in &keys.keys {
                    flat.extend(state.refiner.refine_vertex(key).context("refining motion keys")?);
                }
                Some((keys.steps() as u32, flat))
            }
            _ => None,
        };

        let mesh = mesh_mut(scene, state.mesh)?;
        mesh.verts = verts;
        mesh.attributes
            .remove_standard(AttributeStandard::MotionVertexPosition);
        match motion {
            Some((steps, flat)) => {
                mesh.motion_steps = steps;
                mesh.use_motion_blur = true;
                mesh.set_attribute(AttributeBuffer::from_vec3(
                    MOTION_POSITIONS,
                    AttributeStandard::MotionVertexPosition,
                    AttributeElement::VertexMotion,
                    &flat,
                ))?;
                log::trace!("{}: {steps} motion steps", mesh.name);
            }
            None => {
                mesh.motion_steps = 1;
                mesh.use_motion_blur = false;
            }
        }
        Ok(())
    }

    /// The object placement for transform samples, given the mesh's step count.
    fn placement(
        &self,
        state: &PrimState,
        samples: &TimeSampleArray<Mat4>,
        steps: usize,
    ) -> TransformMotion {
        let mut placement = self.motion.transform_motion(samples, steps);
        if !state.settings.transform_blur(self.config) {
            placement.motion.clear();
        }
        placement
    }

    /// Resolves the shader slots: slot 0 for the prim, then one slot per
    /// distinct subset material. Returns `true` if the slots changed.
    fn sync_shaders(&self, scene: &mut RenderScene, state: &PrimState) -> Result<bool> {
        let shaders = &mut scene.shaders;
        let own = match &state.material {
            Some(material) => shaders.lookup_or_create(material),
            None if state.has_display_color => shaders.default_vcol_surface(),
            None => shaders.default_surface(),
        };
        let mut used = vec![own];
        if let Some(topology) = &state.topology {
            let (_, materials) = subset_slots(topology);
            used.extend(materials.iter().map(|m| shaders.lookup_or_create(m)));
        }

        let mesh = mesh_mut(scene, state.mesh)?;
        if mesh.used_shaders == used {
            return Ok(false);
        }
        mesh.used_shaders = used.clone();
        for shader in used {
            scene.shaders.tag_update(shader);
        }
        Ok(true)
    }
}

fn mesh_mut(scene: &mut RenderScene, handle: Handle<MeshRecord>) -> Result<&mut MeshRecord> {
    scene
        .mesh_mut(handle)
        .with_context(|| format!("mesh record {handle:?} is not registered"))
}

fn object_mut(
    scene: &mut RenderScene,
    handle: Handle<ObjectRecord>,
) -> Result<&mut ObjectRecord> {
    scene
        .object_mut(handle)
        .with_context(|| format!("object record {handle:?} is not registered"))
}

fn reject_topology(state: &mut PrimState, mesh: &mut MeshRecord) {
    state.refiner.reset();
    state.topology = None;
    mesh.verts.clear();
    mesh.motion_steps = 1;
    mesh.use_motion_blur = false;
    mesh.compute_bounds();
}

/// The visibility mask of the prim's rendered copies.
fn instance_visibility(state: &PrimState) -> VisibilityFlags {
    if state.visible {
        state.settings.visibility
    } else {
        VisibilityFlags::EMPTY
    }
}

/// Copies the prototype's flags onto its instances.
fn propagate_to_instances(scene: &mut RenderScene, state: &PrimState) -> Result<()> {
    let prototype = object_mut(scene, state.object)?;
    let instances = prototype.instances.clone();
    let (pass_id, color, double_sided) =
        (prototype.pass_id, prototype.color, prototype.double_sided);
    for handle in instances {
        let instance = object_mut(scene, handle)?;
        instance.visibility = instance_visibility(state);
        instance.pass_id = pass_id;
        instance.color = color;
        instance.double_sided = double_sided;
        instance.is_shadow_catcher = state.settings.shadow_catcher;
        instance.use_holdout = state.settings.holdout;
    }
    Ok(())
}

/// Shader slot of every control face, and the subset materials in slot order
/// starting at slot 1. Faces outside every subset use slot 0.
fn subset_slots(topology: &MeshTopology) -> (Vec<u32>, Vec<MaterialId>) {
    let mut face_slots = vec![0u32; topology.face_count()];
    let mut materials: Vec<MaterialId> = Vec::new();
    for subset in &topology.geom_subsets {
        let Some(material) = &subset.material else {
            continue;
        };
        let slot = match materials.iter().position(|m| m == material) {
            Some(index) => index + 1,
            None => {
                materials.push(material.clone());
                materials.len()
            }
        };
        for &face in &subset.face_indices {
            if let Some(entry) = face_slots.get_mut(face as usize) {
                *entry = slot as u32;
            }
        }
    }
    (face_slots, materials)
}

/// Updates the bounds and the generated coordinates mapping them to the unit
/// cube.
fn finish_mesh(mesh: &mut MeshRecord) -> Result<()> {
    mesh.compute_bounds();
    if mesh.verts.is_empty() {
        mesh.attributes.remove(GENERATED);
        return Ok(());
    }
    let generated = generated_coordinates(&mesh.verts, &mesh.bounds);
    mesh.set_attribute(AttributeBuffer::from_vec3(
        GENERATED,
        AttributeStandard::Generated,
        AttributeElement::Vertex,
        &generated,
    ))?;
    Ok(())
}

fn generated_coordinates(verts: &[Vec3], bounds: &Aabb) -> Vec<Vec3> {
    let half = bounds.half_extents();
    let inverse = |h: f32| if h > 0.0 { 0.5 / h } else { 1.0 };
    let size = Vec3::new(inverse(half.x), inverse(half.y), inverse(half.z));
    let loc = bounds.center().mul_elem(size) - Vec3::splat(0.5);
    verts.iter().map(|&p| p.mul_elem(size) - loc).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tessel_core::topology::GeomSubset;

    fn subset(id: &str, material: Option<&str>, faces: Vec<u32>) -> GeomSubset {
        GeomSubset {
            id: id.into(),
            material: material.map(MaterialId::from),
            face_indices: faces,
        }
    }

    #[test]
    fn test_subset_slots_dedup_materials() {
        let topology = MeshTopology::new(vec![3; 4], (0..12).collect())
            .with_subset(subset("a", Some("/Looks/Red"), vec![0]))
            .with_subset(subset("b", Some("/Looks/Blue"), vec![1]))
            .with_subset(subset("c", Some("/Looks/Red"), vec![2]))
            .with_subset(subset("d", None, vec![3]));
        let (slots, materials) = subset_slots(&topology);
        assert_eq!(slots, vec![1, 2, 1, 0]);
        assert_eq!(
            materials,
            vec![MaterialId::from("/Looks/Red"), MaterialId::from("/Looks/Blue")]
        );
    }

    #[test]
    fn test_generated_coordinates_span_unit_cube() {
        let verts = [Vec3::new(-2.0, 0.0, 1.0), Vec3::new(2.0, 4.0, 1.0)];
        let bounds = Aabb::from_points(&verts).unwrap();
        let generated = generated_coordinates(&verts, &bounds);
        assert_relative_eq!(generated[0].x, 0.0);
        assert_relative_eq!(generated[1].x, 1.0);
        assert_relative_eq!(generated[1].y, 1.0);
        // Flat axis maps to the middle.
        assert_relative_eq!(generated[0].z, 0.5);
    }
}
