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

//! An in-memory scene host.
//!
//! [`MemoryStage`] implements [`SceneDelegate`] over plain maps so the sync
//! agent can be driven without an external scene graph. Edits go through
//! [`MemoryStage::prim_mut`]; change tracking stays with the caller, who
//! passes the matching dirty bits to the agent.

use ahash::AHashMap;
use tessel_core::math::Mat4;
use tessel_core::primvar::{Interpolation, PrimvarDescriptor, PrimvarRole, PrimvarValue};
use tessel_core::sampling::{SampleError, TimeSampleArray};
use tessel_core::scene::{DisplayStyle, Instancer, MaterialId, PrimId, SceneDelegate};
use tessel_core::topology::MeshTopology;

/// A primvar and its time samples.
#[derive(Debug, Clone)]
pub struct StagePrimvar {
    /// What the primvar is.
    pub descriptor: PrimvarDescriptor,
    /// Its samples; a single sample at time 0 when static.
    pub samples: TimeSampleArray<PrimvarValue>,
}

/// A mesh prim held by the stage.
#[derive(Debug, Clone)]
pub struct StagePrim {
    /// Control topology.
    pub topology: MeshTopology,
    /// Display settings.
    pub display_style: DisplayStyle,
    /// Primvars, `points` included.
    pub primvars: Vec<StagePrimvar>,
    /// Transform samples; empty means identity.
    pub transform: TimeSampleArray<Mat4>,
    /// Bound material.
    pub material: Option<MaterialId>,
    /// Visibility.
    pub visible: bool,
    /// Double-sidedness.
    pub double_sided: bool,
    /// Numeric prim id; assigned on insertion when `None`.
    pub prim_index: Option<u32>,
    /// The instancer placing this prim.
    pub instancer: Option<PrimId>,
}

impl StagePrim {
    /// Creates a visible mesh prim with static `points`.
    pub fn mesh(topology: MeshTopology, points: Vec<[f32; 3]>) -> Self {
        Self {
            topology,
            display_style: DisplayStyle::default(),
            primvars: Vec::new(),
            transform: TimeSampleArray::new(),
            material: None,
            visible: true,
            double_sided: false,
            prim_index: None,
            instancer: None,
        }
        .with_primvar(
            tessel_core::primvar::tokens::POINTS,
            Interpolation::Vertex,
            PrimvarRole::Point,
            PrimvarValue::Float3(points),
        )
    }

    /// Adds or replaces a static primvar.
    pub fn with_primvar(
        mut self,
        name: &str,
        interpolation: Interpolation,
        role: PrimvarRole,
        value: PrimvarValue,
    ) -> Self {
        self.set_primvar_samples(
            PrimvarDescriptor::new(name, interpolation, role),
            TimeSampleArray::from_static(value),
        );
        self
    }

    /// Adds or replaces a time-sampled primvar.
    pub fn with_primvar_samples(
        mut self,
        name: &str,
        interpolation: Interpolation,
        role: PrimvarRole,
        samples: &[(f32, PrimvarValue)],
    ) -> Result<Self, SampleError> {
        let mut array = TimeSampleArray::new();
        for (time, value) in samples {
            array.push(*time, value.clone())?;
        }
        self.set_primvar_samples(PrimvarDescriptor::new(name, interpolation, role), array);
        Ok(self)
    }

    /// Sets a static transform.
    pub fn with_transform(mut self, tfm: Mat4) -> Self {
        self.transform = TimeSampleArray::from_static(tfm);
        self
    }

    /// Sets transform samples.
    pub fn with_transform_samples(mut self, samples: &[(f32, Mat4)]) -> Result<Self, SampleError> {
        let mut array = TimeSampleArray::new();
        for &(time, tfm) in samples {
            array.push(time, tfm)?;
        }
        self.transform = array;
        Ok(self)
    }

    /// Binds a material.
    pub fn with_material(mut self, material: impl Into<MaterialId>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Sets the display refine level.
    pub fn with_refine_level(mut self, refine_level: u32) -> Self {
        self.display_style.refine_level = refine_level;
        self
    }

    /// Marks the prim as a prototype of `instancer`.
    pub fn with_instancer(mut self, instancer: impl Into<PrimId>) -> Self {
        self.instancer = Some(instancer.into());
        self
    }

    /// Replaces the value of a primvar, keeping its descriptor. Returns
    /// `false` if the primvar does not exist.
    pub fn set_primvar(&mut self, name: &str, value: PrimvarValue) -> bool {
        match self.primvars.iter_mut().find(|p| p.descriptor.name == name) {
            Some(primvar) => {
                primvar.samples = TimeSampleArray::from_static(value);
                true
            }
            None => false,
        }
    }

    /// Adds or replaces a primvar.
    pub fn set_primvar_samples(
        &mut self,
        descriptor: PrimvarDescriptor,
        samples: TimeSampleArray<PrimvarValue>,
    ) {
        let primvar = StagePrimvar {
            descriptor,
            samples,
        };
        match self
            .primvars
            .iter_mut()
            .find(|p| p.descriptor.name == primvar.descriptor.name)
        {
            Some(existing) => *existing = primvar,
            None => self.primvars.push(primvar),
        }
    }

    /// Removes a primvar.
    pub fn remove_primvar(&mut self, name: &str) {
        self.primvars.retain(|p| p.descriptor.name != name);
    }

    fn find_primvar(&self, name: &str) -> Option<&StagePrimvar> {
        self.primvars.iter().find(|p| p.descriptor.name == name)
    }
}

/// Instance transforms of a point instancer, keyed by prototype.
#[derive(Debug, Clone, Default)]
pub struct MemoryInstancer {
    prototypes: AHashMap<PrimId, TimeSampleArray<Vec<Mat4>>>,
}

impl MemoryInstancer {
    /// Creates an instancer without prototypes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places static instances of `prototype`.
    pub fn set_instances(&mut self, prototype: impl Into<PrimId>, transforms: Vec<Mat4>) {
        self.prototypes
            .insert(prototype.into(), TimeSampleArray::from_static(transforms));
    }

    /// Places time-sampled instances of `prototype`.
    pub fn set_instance_samples(
        &mut self,
        prototype: impl Into<PrimId>,
        samples: TimeSampleArray<Vec<Mat4>>,
    ) {
        self.prototypes.insert(prototype.into(), samples);
    }

    /// Removes every instance of `prototype`.
    pub fn clear_instances(&mut self, prototype: &PrimId) {
        self.prototypes.remove(prototype);
    }
}

impl Instancer for MemoryInstancer {
    fn sample_instance_transforms(&self, prototype: &PrimId) -> TimeSampleArray<Vec<Mat4>> {
        self.prototypes.get(prototype).cloned().unwrap_or_default()
    }
}

/// An in-memory scene of mesh prims and instancers.
#[derive(Debug, Clone, Default)]
pub struct MemoryStage {
    prims: AHashMap<PrimId, StagePrim>,
    instancers: AHashMap<PrimId, MemoryInstancer>,
    next_index: u32,
}

impl MemoryStage {
    /// Creates an empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a prim.
    pub fn insert(&mut self, id: impl Into<PrimId>, mut prim: StagePrim) -> PrimId {
        let id = id.into();
        if prim.prim_index.is_none() {
            prim.prim_index = Some(self.next_index);
            self.next_index += 1;
        }
        self.prims.insert(id.clone(), prim);
        id
    }

    /// Removes a prim.
    pub fn remove(&mut self, id: &PrimId) -> Option<StagePrim> {
        self.prims.remove(id)
    }

    /// Borrows a prim for editing.
    pub fn prim_mut(&mut self, id: &PrimId) -> Option<&mut StagePrim> {
        self.prims.get_mut(id)
    }

    /// Adds or replaces an instancer.
    pub fn insert_instancer(&mut self, id: impl Into<PrimId>, instancer: MemoryInstancer) -> PrimId {
        let id = id.into();
        self.instancers.insert(id.clone(), instancer);
        id
    }

    /// Borrows an instancer for editing.
    pub fn instancer_mut(&mut self, id: &PrimId) -> Option<&mut MemoryInstancer> {
        self.instancers.get_mut(id)
    }

    fn prim(&self, id: &PrimId) -> Option<&StagePrim> {
        self.prims.get(id)
    }
}

impl SceneDelegate for MemoryStage {
    fn mesh_topology(&self, id: &PrimId) -> Option<MeshTopology> {
        self.prim(id).map(|p| p.topology.clone())
    }

    fn display_style(&self, id: &PrimId) -> DisplayStyle {
        self.prim(id).map(|p| p.display_style).unwrap_or_default()
    }

    fn primvar_descriptors(
        &self,
        id: &PrimId,
        interpolation: Interpolation,
    ) -> Vec<PrimvarDescriptor> {
        self.prim(id)
            .map(|p| {
                p.primvars
                    .iter()
                    .filter(|pv| pv.descriptor.interpolation == interpolation)
                    .map(|pv| pv.descriptor.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn primvar(&self, id: &PrimId, name: &str) -> Option<PrimvarValue> {
        self.prim(id)?
            .find_primvar(name)?
            .samples
            .primary()
            .cloned()
    }

    fn sample_primvar(&self, id: &PrimId, name: &str) -> TimeSampleArray<PrimvarValue> {
        self.prim(id)
            .and_then(|p| p.find_primvar(name))
            .map(|pv| pv.samples.clone())
            .unwrap_or_default()
    }

    fn sample_transform(&self, id: &PrimId) -> TimeSampleArray<Mat4> {
        self.prim(id)
            .map(|p| p.transform.clone())
            .unwrap_or_default()
    }

    fn material_id(&self, id: &PrimId) -> Option<MaterialId> {
        self.prim(id)?.material.clone()
    }

    fn visible(&self, id: &PrimId) -> bool {
        self.prim(id).is_some_and(|p| p.visible)
    }

    fn double_sided(&self, id: &PrimId) -> bool {
        self.prim(id).is_some_and(|p| p.double_sided)
    }

    fn prim_index(&self, id: &PrimId) -> u32 {
        self.prim(id).and_then(|p| p.prim_index).unwrap_or(0)
    }

    fn instancer(&self, id: &PrimId) -> Option<&dyn Instancer> {
        let instancer_id = self.prim(id)?.instancer.as_ref()?;
        self.instancers
            .get(instancer_id)
            .map(|instancer| instancer as &dyn Instancer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> StagePrim {
        StagePrim::mesh(
            MeshTopology::new(vec![3], vec![0, 1, 2]),
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        )
    }

    #[test]
    fn test_points_are_a_vertex_primvar() {
        let mut stage = MemoryStage::new();
        let id = stage.insert("/tri", triangle());
        let descriptors = stage.primvar_descriptors(&id, Interpolation::Vertex);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "points");
        assert_eq!(stage.points(&id).map(|p| p.len()), Some(3));
    }

    #[test]
    fn test_prim_indices_follow_insertion() {
        let mut stage = MemoryStage::new();
        let a = stage.insert("/a", triangle());
        let b = stage.insert("/b", triangle());
        assert_eq!(stage.prim_index(&a), 0);
        assert_eq!(stage.prim_index(&b), 1);
    }

    #[test]
    fn test_sampled_primvar_primary() {
        let prim = triangle()
            .with_primvar_samples(
                "w",
                Interpolation::Constant,
                PrimvarRole::None,
                &[
                    (-0.5, PrimvarValue::Float(vec![1.0])),
                    (0.0, PrimvarValue::Float(vec![2.0])),
                ],
            )
            .unwrap();
        let mut stage = MemoryStage::new();
        let id = stage.insert("/tri", prim);
        assert_eq!(stage.primvar(&id, "w"), Some(PrimvarValue::Float(vec![2.0])));
        assert_eq!(stage.sample_primvar(&id, "w").count(), 2);
    }

    #[test]
    fn test_instancer_lookup() {
        let mut stage = MemoryStage::new();
        let proto = stage.insert("/proto", triangle().with_instancer("/inst"));
        let mut instancer = MemoryInstancer::new();
        instancer.set_instances(proto.clone(), vec![Mat4::IDENTITY; 2]);
        stage.insert_instancer("/inst", instancer);

        let samples = stage
            .instancer(&proto)
            .map(|i| i.sample_instance_transforms(&proto))
            .unwrap();
        assert_eq!(samples.values()[0].len(), 2);
        assert!(stage.instancer(&PrimId::new("/missing")).is_none());
    }
}
