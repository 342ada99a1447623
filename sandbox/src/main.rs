use anyhow::{Context, Result};
use std::sync::Arc;
use tessel_agents::MeshSyncAgent;
use tessel_core::config::SyncConfig;
use tessel_core::math::{Mat4, Vec3};
use tessel_core::primvar::{tokens, Interpolation, PrimvarDescriptor, PrimvarRole, PrimvarValue};
use tessel_core::sampling::TimeSampleArray;
use tessel_core::scene::{DirtyBits, PrimId};
use tessel_core::topology::{MeshTopology, SubdivisionScheme};
use tessel_data::RenderScene;
use tessel_infra::{logging, LinearSubdivider, MemoryInstancer, MemoryStage, StagePrim};

const FRAMES: usize = 4;

fn load_config() -> Result<SyncConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file '{path}'"))?;
            SyncConfig::from_json_str(&json).with_context(|| format!("parsing '{path}'"))?
        }
        None => SyncConfig {
            enable_motion_blur: true,
            ..SyncConfig::default()
        },
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn cube_points(offset: f32) -> PrimvarValue {
    let points = [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ];
    PrimvarValue::Float3(points.map(|[x, y, z]| [x + offset, y, z]).to_vec())
}

/// A unit cube with per-face texture coordinates.
fn cube() -> StagePrim {
    let indices = vec![
        0, 3, 2, 1, // back
        4, 5, 6, 7, // front
        0, 1, 5, 4, // bottom
        3, 7, 6, 2, // top
        0, 4, 7, 3, // left
        1, 2, 6, 5, // right
    ];
    let st = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]].repeat(6);

    let mut prim = StagePrim::mesh(MeshTopology::new(vec![4; 6], indices), Vec::new())
        .with_refine_level(2)
        .with_primvar(
            tokens::POINTS,
            Interpolation::Vertex,
            PrimvarRole::Point,
            cube_points(0.0),
        )
        .with_primvar(
            "st",
            Interpolation::FaceVarying,
            PrimvarRole::TextureCoordinate,
            PrimvarValue::Float2(st),
        )
        .with_primvar(
            "displayColor",
            Interpolation::Constant,
            PrimvarRole::Color,
            PrimvarValue::Float3(vec![[0.8, 0.3, 0.1]]),
        );
    prim.topology = prim.topology.with_scheme(SubdivisionScheme::Linear);
    prim
}

fn report(agent: &MeshSyncAgent, id: &PrimId) {
    let scene = agent.scene().lock();
    log::info!(
        "Scene: {} meshes, {} objects, updates {:?}",
        scene.mesh_count(),
        scene.object_count(),
        scene.updates()
    );
    if let Some(mesh) = agent.mesh_handle(id).and_then(|h| scene.mesh(h)) {
        log::info!(
            "{id}: {} triangles, {} vertices, {} motion steps, {} attributes",
            mesh.triangle_count(),
            mesh.vertex_count(),
            mesh.motion_steps,
            mesh.attributes.len()
        );
    }
}

fn main() -> Result<()> {
    logging::init()?;

    let config = load_config()?;
    log::info!("Sync settings: {config:?}");

    let mut stage = MemoryStage::new();
    let mut instancer = MemoryInstancer::new();
    instancer.set_instances(
        "/World/Cube",
        (0..3)
            .map(|i| Mat4::from_translation(Vec3::new(2.0 * i as f32, 0.0, 0.0)))
            .collect(),
    );
    let instancer_id = stage.insert_instancer("/World/Instancer", instancer);
    let id = stage.insert("/World/Cube", cube().with_instancer(instancer_id));

    let mut agent = MeshSyncAgent::new(
        RenderScene::new_shared(),
        config,
        Some(Arc::new(LinearSubdivider::new())),
    );

    agent.sync(&stage, &id, DirtyBits::ALL)?;
    report(&agent, &id);

    for frame in 1..FRAMES {
        let offset = 0.1 * frame as f32;
        let mut shutter = TimeSampleArray::new();
        for time in [-0.5, 0.0, 0.5] {
            shutter.push(time, cube_points(offset + 0.1 * time))?;
        }
        stage
            .prim_mut(&id)
            .context("the cube disappeared from the stage")?
            .set_primvar_samples(
                PrimvarDescriptor::new(tokens::POINTS, Interpolation::Vertex, PrimvarRole::Point),
                shutter,
            );

        let changed = agent.sync(&stage, &id, DirtyBits::POINTS)?;
        log::info!("Frame {frame}: changed = {changed}");
        report(&agent, &id);
    }

    agent.finalize(&id);
    report(&agent, &id);
    log::info!("Prims left: {}", agent.prim_count());
    Ok(())
}
