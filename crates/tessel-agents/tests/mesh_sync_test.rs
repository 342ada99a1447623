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

use approx::assert_relative_eq;
use std::sync::Arc;
use tessel_agents::MeshSyncAgent;
use tessel_core::config::SyncConfig;
use tessel_core::math::{Mat4, Vec3};
use tessel_core::primvar::{tokens, Interpolation, PrimvarRole, PrimvarValue};
use tessel_core::sampling::TimeSampleArray;
use tessel_core::scene::{DirtyBits, MaterialId, PrimId, VisibilityFlags};
use tessel_core::topology::{GeomSubset, MeshTopology, Orientation, SubdivisionScheme};
use tessel_data::{AttributeElement, AttributeStandard, MeshRecord, ObjectRecord, RenderScene};
use tessel_infra::{logging, LinearSubdivider, MemoryInstancer, MemoryStage, StagePrim};

// --- HELPERS ---

fn unit_square() -> Vec<[f32; 3]> {
    vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]
}

fn quad() -> StagePrim {
    StagePrim::mesh(MeshTopology::new(vec![4], vec![0, 1, 2, 3]), unit_square())
}

fn agent(config: SyncConfig) -> MeshSyncAgent {
    logging::init_for_tests();
    MeshSyncAgent::new(RenderScene::new_shared(), config, None)
}

fn motion_config() -> SyncConfig {
    SyncConfig {
        enable_motion_blur: true,
        ..SyncConfig::default()
    }
}

fn mesh_of(agent: &MeshSyncAgent, id: &PrimId) -> MeshRecord {
    let handle = agent.mesh_handle(id).expect("prim should have a mesh");
    let scene = agent.scene().lock();
    scene.mesh(handle).expect("mesh should be registered").clone()
}

fn object_of(agent: &MeshSyncAgent, id: &PrimId) -> ObjectRecord {
    let handle = agent.object_handle(id).expect("prim should have an object");
    let scene = agent.scene().lock();
    scene.object(handle).expect("object should be registered").clone()
}

fn shifted(dx: f32) -> PrimvarValue {
    PrimvarValue::Float3(
        unit_square()
            .into_iter()
            .map(|[x, y, z]| [x + dx, y, z])
            .collect(),
    )
}

// --- TOPOLOGY ---

#[test]
fn test_first_sync_triangulates_and_registers() {
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", quad());
    let mut agent = agent(SyncConfig::default());

    // The first pass syncs everything whatever the dirty bits say.
    let changed = agent.sync(&stage, &id, DirtyBits::EMPTY).unwrap();

    assert!(changed);
    assert_eq!(agent.prim_count(), 1);
    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    assert_eq!(mesh.verts.len(), 4);
    assert_eq!(mesh.shader, vec![0, 0]);
    assert!(mesh.subd_faces.is_none());
    assert_relative_eq!(mesh.bounds.max.x, 1.0);

    let generated = mesh
        .attributes
        .find_standard(AttributeStandard::Generated)
        .and_then(|b| b.as_float3())
        .expect("generated coordinates should be set");
    assert_relative_eq!(generated[2].x, 1.0);
    assert_relative_eq!(generated[2].z, 0.5);

    let scene = agent.scene().lock();
    assert_eq!(scene.mesh_count(), 1);
    assert_eq!(scene.object_count(), 1);
    assert_eq!(
        scene.object(agent.object_handle(&id).unwrap()).unwrap().mesh,
        agent.mesh_handle(&id)
    );
}

#[test]
fn test_left_handed_winding_is_swapped() {
    let mut prim = quad();
    prim.topology = prim.topology.with_orientation(Orientation::LeftHanded);
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    assert_eq!(mesh_of(&agent, &id).triangles, vec![[0, 2, 1], [0, 3, 2]]);
}

#[test]
fn test_sync_without_dirty_bits_changes_nothing() {
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", quad());
    let mut agent = agent(SyncConfig::default());
    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();
    let before = mesh_of(&agent, &id);
    let updates = agent.scene().lock().updates();

    let changed = agent.sync(&stage, &id, DirtyBits::EMPTY).unwrap();

    assert!(!changed);
    assert_eq!(mesh_of(&agent, &id), before);
    assert_eq!(agent.scene().lock().updates(), updates);
}

#[test]
fn test_invalid_topology_leaves_mesh_empty() {
    let mut stage = MemoryStage::new();
    let id = stage.insert(
        "/World/Broken",
        StagePrim::mesh(MeshTopology::new(vec![4], vec![0, 1, 2]), unit_square()),
    );
    let mut agent = agent(SyncConfig::default());

    // A rejected topology is logged, not returned as an error.
    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert!(mesh.triangles.is_empty());
    assert!(mesh.verts.is_empty());
    assert!(mesh.attributes.is_empty());

    // Fixing the topology recovers on the next refine.
    stage.prim_mut(&id).unwrap().topology = MeshTopology::new(vec![4], vec![0, 1, 2, 3]);
    agent.sync(&stage, &id, DirtyBits::TOPOLOGY).unwrap();
    assert_eq!(mesh_of(&agent, &id).triangles.len(), 2);
}

#[test]
fn test_mistyped_points_reject_topology() {
    let prim = quad()
        .with_primvar(
            tokens::POINTS,
            Interpolation::Vertex,
            PrimvarRole::Point,
            PrimvarValue::Float2(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
        )
        .with_primvar(
            "normals",
            Interpolation::FaceVarying,
            PrimvarRole::Normal,
            PrimvarValue::Float3(vec![[0.0, 0.0, 1.0]; 4]),
        )
        .with_primvar(
            "st",
            Interpolation::FaceVarying,
            PrimvarRole::TextureCoordinate,
            PrimvarValue::Float2(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
        );
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Flat", prim);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert!(mesh.triangles.is_empty());
    assert!(mesh.verts.is_empty());
    assert!(mesh.attributes.is_empty());

    // Three-component points bring the mesh back.
    stage
        .prim_mut(&id)
        .unwrap()
        .set_primvar(tokens::POINTS, PrimvarValue::Float3(unit_square()));
    agent
        .sync(&stage, &id, DirtyBits::TOPOLOGY | DirtyBits::POINTS)
        .unwrap();
    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.triangles.len(), 2);
    assert_eq!(mesh.verts.len(), 4);
}

#[test]
fn test_grown_topology_with_mistyped_points_drops_stale_vertices() {
    let prim = quad().with_primvar(
        "st",
        Interpolation::Vertex,
        PrimvarRole::TextureCoordinate,
        PrimvarValue::Float2(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
    );
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Strip", prim);
    let mut agent = agent(SyncConfig::default());
    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();
    assert_eq!(mesh_of(&agent, &id).verts.len(), 4);

    let edited = stage.prim_mut(&id).unwrap();
    edited.topology = MeshTopology::new(vec![4, 4], vec![0, 1, 2, 3, 1, 4, 5, 2]);
    edited.set_primvar(tokens::POINTS, PrimvarValue::Float2(vec![[0.0, 0.0]; 6]));
    edited.set_primvar("st", PrimvarValue::Float2(vec![[0.0, 0.0]; 6]));
    agent
        .sync(&stage, &id, DirtyBits::TOPOLOGY | DirtyBits::POINTS | DirtyBits::PRIMVAR)
        .unwrap();

    let mesh = mesh_of(&agent, &id);
    assert!(mesh.triangles.is_empty());
    assert!(mesh.verts.is_empty());
    assert!(mesh.attributes.find("st.tangent").is_none());
}

#[test]
fn test_linear_subdivision_at_level_one() {
    let mut prim = quad().with_refine_level(1);
    prim.topology = prim.topology.with_scheme(SubdivisionScheme::Linear);
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Subd", prim);
    let mut agent = MeshSyncAgent::new(
        RenderScene::new_shared(),
        SyncConfig::default(),
        Some(Arc::new(LinearSubdivider::new())),
    );

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.triangles.len(), 8);
    assert_eq!(mesh.verts.len(), 9);
    let faces = mesh.subd_faces.expect("subdivided faces should be kept");
    assert_eq!(faces.counts, vec![4; 4]);
    assert_eq!(faces.parents, vec![0; 4]);
    // The face centre lands in the middle of the square.
    assert!(mesh
        .verts
        .iter()
        .any(|v| (v.x - 0.5).abs() < 1e-6 && (v.y - 0.5).abs() < 1e-6));
}

#[test]
fn test_subdivision_disabled_renders_the_cage() {
    let mut prim = quad().with_refine_level(2);
    prim.topology = prim.topology.with_scheme(SubdivisionScheme::Linear);
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Subd", prim);
    let config = SyncConfig {
        enable_subdivision: false,
        ..SyncConfig::default()
    };
    let mut agent = MeshSyncAgent::new(
        RenderScene::new_shared(),
        config,
        Some(Arc::new(LinearSubdivider::new())),
    );

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.triangles.len(), 2);
    assert!(mesh.subd_faces.is_none());
}

// --- PRIMVARS ---

#[test]
fn test_uniform_primvar_covers_every_triangle() {
    let pentagon = StagePrim::mesh(
        MeshTopology::new(vec![5], vec![0, 1, 2, 3, 4]),
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.5, 1.0, 0.0],
            [0.5, 2.0, 0.0],
            [-0.5, 1.0, 0.0],
        ],
    )
    .with_primvar(
        "weight",
        Interpolation::Uniform,
        PrimvarRole::None,
        PrimvarValue::Float(vec![2.0]),
    );
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Pentagon", pentagon);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.triangles.len(), 3);
    let weight = mesh.attributes.find("weight").expect("weight should be mapped");
    assert_eq!(weight.element, AttributeElement::Face);
    assert_eq!(weight.data(), &[2.0, 2.0, 2.0]);
}

#[test]
fn test_oversized_uniform_keeps_previous_buffer() {
    let prim = quad().with_primvar(
        "weight",
        Interpolation::Uniform,
        PrimvarRole::None,
        PrimvarValue::Float(vec![1.0]),
    );
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(SyncConfig::default());
    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    assert!(stage
        .prim_mut(&id)
        .unwrap()
        .set_primvar("weight", PrimvarValue::Float(vec![1.0, 2.0, 3.0])));
    agent.sync(&stage, &id, DirtyBits::PRIMVAR).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.attributes.find("weight").unwrap().data(), &[1.0, 1.0]);
}

#[test]
fn test_texcoords_get_tangents() {
    let prim = quad().with_primvar(
        "st",
        Interpolation::FaceVarying,
        PrimvarRole::TextureCoordinate,
        PrimvarValue::Float2(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]),
    );
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    let uv = mesh.attributes.find("st").expect("uvs should be mapped");
    assert_eq!(uv.standard, AttributeStandard::Uv);
    assert_eq!(uv.element, AttributeElement::Corner);
    assert_eq!(uv.element_count(), 6);

    let tangents = mesh
        .attributes
        .find("st.tangent")
        .and_then(|b| b.as_float3())
        .expect("tangents should be generated");
    assert_eq!(tangents.len(), 6);
    for tangent in tangents {
        assert_relative_eq!(tangent.x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(tangent.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(tangent.z, 0.0, epsilon = 1e-4);
    }
    let signs = mesh.attributes.find("st.tangent_sign").unwrap();
    assert_eq!(signs.standard, AttributeStandard::UvTangentSign);
    assert!(signs.data().iter().all(|s| s.abs() == 1.0));
}

#[test]
fn test_vertex_normals_are_refined() {
    let prim = quad().with_primvar(
        "normals",
        Interpolation::Vertex,
        PrimvarRole::Normal,
        PrimvarValue::Float3(vec![[0.0, 0.0, 1.0]; 4]),
    );
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    let normals = mesh
        .attributes
        .find_standard(AttributeStandard::VertexNormal)
        .and_then(|b| b.as_float3())
        .unwrap();
    assert_eq!(normals, &[Vec3::Z; 4]);
}

#[test]
fn test_display_color_tints_object_and_picks_vcol_shader() {
    let prim = quad().with_primvar(
        "displayColor",
        Interpolation::Constant,
        PrimvarRole::Color,
        PrimvarValue::Float3(vec![[1.0, 0.0, 0.0]]),
    );
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    assert_eq!(object_of(&agent, &id).color, Vec3::new(1.0, 0.0, 0.0));
    let mesh = mesh_of(&agent, &id);
    let vcol = agent.scene().lock().shaders.default_vcol_surface();
    assert_eq!(mesh.used_shaders, vec![vcol]);
}

// --- MATERIALS ---

#[test]
fn test_subset_materials_are_deduplicated() {
    let subset = |id: &str, material: &str, face: u32| GeomSubset {
        id: id.into(),
        material: Some(MaterialId::from(material)),
        face_indices: vec![face],
    };
    let topology = MeshTopology::new(vec![4, 4, 4], (0..12).map(|i| i % 4).collect())
        .with_subset(subset("a", "/Looks/Red", 0))
        .with_subset(subset("b", "/Looks/Blue", 1))
        .with_subset(subset("c", "/Looks/Red", 2));
    let prim = StagePrim::mesh(topology, unit_square()).with_material("/Looks/Green");
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Strip", prim);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.shader, vec![1, 1, 2, 2, 1, 1]);
    let scene = agent.scene().lock();
    let find = |path: &str| scene.shaders.find(&MaterialId::from(path)).unwrap();
    assert_eq!(
        mesh.used_shaders,
        vec![find("/Looks/Green"), find("/Looks/Red"), find("/Looks/Blue")]
    );
}

// --- MOTION ---

#[test]
fn test_sampled_points_become_motion_keys() {
    let prim = quad()
        .with_primvar_samples(
            "points",
            Interpolation::Vertex,
            PrimvarRole::Point,
            &[(-0.5, shifted(-0.5)), (0.0, shifted(0.0)), (0.5, shifted(0.5))],
        )
        .unwrap();
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(motion_config());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.motion_steps, 3);
    assert!(mesh.use_motion_blur);
    assert_relative_eq!(mesh.verts[1].x, 1.0);
    let keys = mesh
        .attributes
        .find_standard(AttributeStandard::MotionVertexPosition)
        .and_then(|b| b.as_float3())
        .expect("motion keys should be stored");
    assert_eq!(keys.len(), 8);
    assert_relative_eq!(keys[0].x, -0.5);
    assert_relative_eq!(keys[4].x, 0.5);
    // Bounds cover the whole shutter.
    assert_relative_eq!(mesh.bounds.min.x, -0.5);
}

#[test]
fn test_motion_blur_disabled_keeps_mesh_static() {
    let prim = quad()
        .with_primvar_samples(
            "points",
            Interpolation::Vertex,
            PrimvarRole::Point,
            &[(-0.5, shifted(-0.5)), (0.0, shifted(0.0)), (0.5, shifted(0.5))],
        )
        .unwrap();
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.motion_steps, 1);
    assert!(!mesh.use_motion_blur);
    assert!(mesh
        .attributes
        .find_standard(AttributeStandard::MotionVertexPosition)
        .is_none());
}

#[test]
fn test_velocities_synthesize_motion_keys() {
    let prim = quad().with_primvar(
        "velocities",
        Interpolation::Vertex,
        PrimvarRole::Vector,
        PrimvarValue::Float3(vec![[2.0, 0.0, 0.0]; 4]),
    );
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(motion_config());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.motion_steps, 3);
    let keys = mesh
        .attributes
        .find_standard(AttributeStandard::MotionVertexPosition)
        .and_then(|b| b.as_float3())
        .unwrap();
    assert_relative_eq!(keys[0].x, -1.0);
    assert_relative_eq!(keys[5].x, 2.0);
    // Velocities are consumed, not exported.
    assert!(mesh.attributes.find("velocities").is_none());
}

#[test]
fn test_point_edit_updates_vertices_only() {
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", quad());
    let mut agent = agent(SyncConfig::default());
    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();
    let before = mesh_of(&agent, &id);

    stage.prim_mut(&id).unwrap().set_primvar("points", shifted(3.0));
    assert!(agent.sync(&stage, &id, DirtyBits::POINTS).unwrap());

    let mesh = mesh_of(&agent, &id);
    assert_eq!(mesh.triangles, before.triangles);
    assert_relative_eq!(mesh.verts[0].x, 3.0);
    assert_relative_eq!(mesh.bounds.max.x, 4.0);
}

#[test]
fn test_transform_samples_become_object_motion() {
    let prim = quad()
        .with_transform_samples(&[
            (-0.5, Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0))),
            (0.0, Mat4::IDENTITY),
            (0.5, Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))),
        ])
        .unwrap();
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(motion_config());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let object = object_of(&agent, &id);
    assert_eq!(object.tfm, Mat4::IDENTITY);
    assert_eq!(object.motion.len(), 3);
    assert_relative_eq!(object.motion[0].translation().x, -1.0);
    assert_relative_eq!(object.motion[2].translation().x, 1.0);

    stage.prim_mut(&id).unwrap().transform =
        TimeSampleArray::from_static(Mat4::from_translation(Vec3::Y));
    agent.sync(&stage, &id, DirtyBits::TRANSFORM).unwrap();
    let object = object_of(&agent, &id);
    assert_relative_eq!(object.tfm.translation().y, 1.0);
    assert!(object.motion.is_empty());
}

// --- INSTANCING ---

#[test]
fn test_instances_hide_the_prototype() {
    let mut stage = MemoryStage::new();
    let mut instancer = MemoryInstancer::new();
    instancer.set_instances(
        "/World/Proto",
        vec![
            Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)),
            Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0)),
        ],
    );
    let instancer_id = stage.insert_instancer("/World/Instancer", instancer);
    let prim = quad()
        .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)))
        .with_instancer(instancer_id.clone());
    let id = stage.insert("/World/Proto", prim);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let prototype = object_of(&agent, &id);
    assert_eq!(prototype.visibility, VisibilityFlags::EMPTY);
    assert_eq!(prototype.instances.len(), 2);
    {
        let scene = agent.scene().lock();
        assert_eq!(scene.object_count(), 3);
        let second = scene.object(prototype.instances[1]).unwrap();
        assert_eq!(second.mesh, agent.mesh_handle(&id));
        assert_eq!(second.visibility, VisibilityFlags::ALL);
        assert_eq!(second.pass_id, prototype.pass_id);
        let translation = second.tfm.translation();
        assert_relative_eq!(translation.x, 4.0);
        assert_relative_eq!(translation.z, 5.0);
    }

    // Removing the instances shows the prototype again.
    stage
        .instancer_mut(&instancer_id)
        .unwrap()
        .clear_instances(&id);
    agent.sync(&stage, &id, DirtyBits::INSTANCER).unwrap();
    let prototype = object_of(&agent, &id);
    assert!(prototype.instances.is_empty());
    assert_eq!(prototype.visibility, VisibilityFlags::ALL);
    assert_eq!(agent.scene().lock().object_count(), 1);
}

// --- OBJECT FLAGS ---

#[test]
fn test_pass_id_follows_prim_index() {
    let mut stage = MemoryStage::new();
    let first = stage.insert("/World/A", quad());
    let second = stage.insert("/World/B", quad());
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &first, DirtyBits::ALL).unwrap();
    agent.sync(&stage, &second, DirtyBits::ALL).unwrap();

    assert_eq!(object_of(&agent, &first).pass_id, 1);
    assert_eq!(object_of(&agent, &second).pass_id, 2);
}

#[test]
fn test_settings_primvars_drive_object_flags() {
    let prim = quad()
        .with_primvar(
            "object:visibility:camera",
            Interpolation::Constant,
            PrimvarRole::None,
            PrimvarValue::Bool(vec![false]),
        )
        .with_primvar(
            "object:shadow_catcher",
            Interpolation::Constant,
            PrimvarRole::None,
            PrimvarValue::Bool(vec![true]),
        );
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", prim);
    let mut agent = agent(SyncConfig::default());

    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    let object = object_of(&agent, &id);
    assert!(!object.visibility.contains(VisibilityFlags::CAMERA));
    assert!(object.visibility.contains(VisibilityFlags::SHADOW));
    assert!(object.is_shadow_catcher);
    let mesh = mesh_of(&agent, &id);
    assert!(mesh.attributes.find("object:visibility:camera").is_none());
}

#[test]
fn test_hidden_prim_masks_all_rays() {
    let mut stage = MemoryStage::new();
    let id = stage.insert("/World/Quad", quad());
    let mut agent = agent(SyncConfig::default());
    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();

    stage.prim_mut(&id).unwrap().visible = false;
    agent.sync(&stage, &id, DirtyBits::VISIBILITY).unwrap();

    assert_eq!(object_of(&agent, &id).visibility, VisibilityFlags::EMPTY);
}

// --- REMOVAL ---

#[test]
fn test_finalize_unregisters_records() {
    let mut stage = MemoryStage::new();
    let mut instancer = MemoryInstancer::new();
    instancer.set_instances("/World/Proto", vec![Mat4::IDENTITY; 3]);
    let instancer_id = stage.insert_instancer("/World/Instancer", instancer);
    let id = stage.insert("/World/Proto", quad().with_instancer(instancer_id));
    let mut agent = agent(SyncConfig::default());
    agent.sync(&stage, &id, DirtyBits::ALL).unwrap();
    assert_eq!(agent.scene().lock().object_count(), 4);

    assert!(agent.finalize(&id));

    assert_eq!(agent.prim_count(), 0);
    assert!(agent.mesh_handle(&id).is_none());
    let scene = agent.scene().lock();
    assert_eq!(scene.mesh_count(), 0);
    assert_eq!(scene.object_count(), 0);
    drop(scene);
    assert!(!agent.finalize(&id));
}
