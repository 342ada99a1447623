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

//! Routes primvars to attribute buffers by name and role.

use anyhow::{anyhow, bail, Context, Result};
use tessel_core::math::{Vec2, Vec3};
use tessel_core::primvar::{tokens, AttributeData, Interpolation, PrimvarRecord, PrimvarRole};
use tessel_core::scene::PrimId;
use tessel_core::topology::{FaceTopologyView, Orientation, TriangleView};
use tessel_data::{
    AttributeBuffer, AttributeElement, AttributeStandard, AttributeType, MeshRecord,
};
use tessel_lanes::attribute_lane::scatter_face_varying;
use tessel_lanes::tangent_lane::{compute_face_normals, compute_vertex_normals};
use tessel_lanes::{
    AttributeMappingLane, MappingTarget, MeshRefiner, NormalInputs, RefinedTopology,
    TangentInputs, TangentOutput, TangentSpaceLane,
};

/// Name of the per-vertex shading normal buffer.
pub(super) const VERTEX_NORMAL: &str = "N";
/// Name of the per-face normal buffer.
pub(super) const FACE_NORMAL: &str = "Ng";

/// The lanes and refinement a primvar is mapped through.
pub(super) struct PrimvarContext<'a> {
    pub refiner: &'a MeshRefiner,
    pub refined: &'a RefinedTopology,
    pub mapper: &'a AttributeMappingLane,
    pub tangents: &'a TangentSpaceLane,
}

enum PrimvarKind {
    Normals,
    TextureCoordinate,
    Color,
    Generic,
}

impl PrimvarKind {
    fn of(record: &PrimvarRecord) -> Self {
        let descriptor = &record.descriptor;
        if descriptor.name == tokens::NORMALS || descriptor.role == PrimvarRole::Normal {
            PrimvarKind::Normals
        } else if descriptor.name == tokens::DISPLAY_COLOR || descriptor.role == PrimvarRole::Color
        {
            PrimvarKind::Color
        } else if descriptor.role == PrimvarRole::TextureCoordinate {
            PrimvarKind::TextureCoordinate
        } else {
            PrimvarKind::Generic
        }
    }
}

/// Applies every record, normals first so tangents see them.
///
/// Failures are logged and skipped. Returns whether any buffer changed and
/// the display color set by a constant `displayColor`.
pub(super) fn apply_primvars(
    ctx: &PrimvarContext<'_>,
    mesh: &mut MeshRecord,
    records: &[PrimvarRecord],
    id: &PrimId,
) -> (bool, Option<Vec3>) {
    let mut ordered: Vec<&PrimvarRecord> = records.iter().collect();
    ordered.sort_by_key(|record| !matches!(PrimvarKind::of(record), PrimvarKind::Normals));

    let mut changed = false;
    let mut display_color = None;
    for record in ordered {
        match apply_primvar(ctx, mesh, record) {
            Ok(color) => {
                changed = true;
                display_color = color.or(display_color);
            }
            Err(e) => log::warn!(
                "{id}: skipping {} primvar '{}': {e:#}",
                record.descriptor.interpolation,
                record.descriptor.name
            ),
        }
    }
    (changed, display_color)
}

/// Maps one primvar into `mesh`. Returns the object display color when the
/// primvar is a constant `displayColor`.
///
/// Buffers are swapped in whole; on error the mesh keeps its previous buffer.
fn apply_primvar(
    ctx: &PrimvarContext<'_>,
    mesh: &mut MeshRecord,
    record: &PrimvarRecord,
) -> Result<Option<Vec3>> {
    match PrimvarKind::of(record) {
        PrimvarKind::Normals => apply_normals(ctx, mesh, record).map(|_| None),
        PrimvarKind::TextureCoordinate => apply_texcoord(ctx, mesh, record).map(|_| None),
        PrimvarKind::Color => apply_color(ctx, mesh, record),
        PrimvarKind::Generic => {
            let data = convert(record)?;
            let buffer = map(ctx, record, &data)?;
            mesh.set_attribute(buffer)?;
            Ok(None)
        }
    }
}

fn convert(record: &PrimvarRecord) -> Result<AttributeData> {
    record.value.to_attribute_data().ok_or_else(|| {
        anyhow!(
            "primvar '{}' has unsupported type '{}'",
            record.descriptor.name,
            record.value.type_name()
        )
    })
}

/// Refines `data` and scatters it over the rendered triangles.
fn map(
    ctx: &PrimvarContext<'_>,
    record: &PrimvarRecord,
    data: &AttributeData,
) -> Result<AttributeBuffer> {
    let name = &record.descriptor.name;
    let interpolation = record.descriptor.interpolation;
    let refined = ctx
        .refiner
        .refine_payload(data, interpolation)
        .with_context(|| format!("refining primvar '{name}'"))?;
    let view = ctx.refined.face_view();
    let target = MappingTarget::new(&view, ctx.refined.vertex_count, ctx.refined.orientation);
    Ok(ctx.mapper.populate(name, interpolation, &refined, &target)?)
}

fn apply_normals(
    ctx: &PrimvarContext<'_>,
    mesh: &mut MeshRecord,
    record: &PrimvarRecord,
) -> Result<()> {
    let data = convert(record)?;
    let normals = data.as_float3().ok_or_else(|| {
        anyhow!(
            "normals must have three components, got {}",
            record.value.type_name()
        )
    })?;

    match record.descriptor.interpolation {
        Interpolation::Vertex | Interpolation::Varying => {
            let mut refined = ctx.refiner.refine_vertex(normals)?;
            if ctx.refined.orientation == Orientation::LeftHanded {
                refined.iter_mut().for_each(|n| *n = -*n);
            }
            mesh.set_attribute(AttributeBuffer::from_vec3(
                VERTEX_NORMAL,
                AttributeStandard::VertexNormal,
                AttributeElement::Vertex,
                &refined,
            ))?;
        }
        Interpolation::Uniform => {
            let refined = AttributeData::Float3(ctx.refiner.refine_uniform(normals)?);
            let view = ctx.refined.face_view();
            let target =
                MappingTarget::new(&view, ctx.refined.vertex_count, ctx.refined.orientation);
            let buffer = ctx
                .mapper
                .populate(FACE_NORMAL, Interpolation::Uniform, &refined, &target)?
                .with_standard(AttributeStandard::FaceNormal);
            mesh.set_attribute(buffer)?;
        }
        Interpolation::FaceVarying => {
            log::debug!("Approximating face-varying normals with recomputed normals");
            ensure_refined_vertices(ctx, mesh)?;
            let (face, vertex) = {
                let view = TriangleView::new(&mesh.triangles);
                let face = compute_face_normals(&view, &mesh.verts);
                let vertex = compute_vertex_normals(&view, mesh.verts.len(), &face);
                (face, vertex)
            };
            mesh.set_attribute(AttributeBuffer::from_vec3(
                FACE_NORMAL,
                AttributeStandard::FaceNormal,
                AttributeElement::Face,
                &face,
            ))?;
            mesh.set_attribute(AttributeBuffer::from_vec3(
                VERTEX_NORMAL,
                AttributeStandard::VertexNormal,
                AttributeElement::Vertex,
                &vertex,
            ))?;
        }
        other => bail!("{other} normals are not supported"),
    }
    Ok(())
}

fn apply_texcoord(
    ctx: &PrimvarContext<'_>,
    mesh: &mut MeshRecord,
    record: &PrimvarRecord,
) -> Result<()> {
    let data = convert(record)?;
    let mut buffer = map(ctx, record, &data)?;
    let Some(uvs) = data.as_float2() else {
        // Three-component coordinates are kept as a plain attribute.
        mesh.set_attribute(buffer)?;
        return Ok(());
    };
    buffer = buffer.with_standard(AttributeStandard::Uv);

    let interpolation = record.descriptor.interpolation;
    let tangents = match interpolation {
        Interpolation::FaceVarying | Interpolation::Vertex | Interpolation::Varying => {
            Some(tangent_buffers(
                ctx,
                mesh,
                &record.descriptor.name,
                interpolation,
                uvs,
                &buffer,
            )?)
        }
        _ => None,
    };

    mesh.set_attribute(buffer)?;
    if let Some((tangent, sign)) = tangents {
        mesh.set_attribute(tangent)?;
        mesh.set_attribute(sign)?;
    }
    Ok(())
}

/// Computes `<uv>.tangent` and `<uv>.tangent_sign` per triangle corner.
///
/// Subdivided meshes solve over the refined polygons and scatter the result
/// onto triangle corners; other meshes solve over the triangles directly.
fn tangent_buffers(
    ctx: &PrimvarContext<'_>,
    mesh: &MeshRecord,
    uv_name: &str,
    interpolation: Interpolation,
    control_uvs: &[Vec2],
    mapped: &AttributeBuffer,
) -> Result<(AttributeBuffer, AttributeBuffer)> {
    ensure_refined_vertices(ctx, mesh)?;
    let vertex_normals = mesh
        .attributes
        .find_standard(AttributeStandard::VertexNormal)
        .and_then(AttributeBuffer::as_float3)
        .filter(|n| n.len() == mesh.verts.len());

    let (tangents, signs) = if ctx.refined.is_subdivided() {
        let view = ctx.refined.face_view();
        let corner_uvs = match interpolation {
            Interpolation::FaceVarying => ctx.refiner.refine_face_varying(control_uvs)?,
            _ => gather_corners(&view, &ctx.refiner.refine_vertex(control_uvs)?),
        };
        let output = solve(ctx.tangents, &view, &mesh.verts, vertex_normals, None, &corner_uvs);
        let left_handed = ctx.refined.orientation == Orientation::LeftHanded;
        let tangents = scatter_face_varying(
            &view,
            left_handed,
            bytemuck::cast_slice(&output.tangents),
            3,
        );
        let signs = output
            .signs
            .map(|s| scatter_face_varying(&view, left_handed, &s, 1))
            .unwrap_or_default();
        (tangents, signs)
    } else {
        let view = TriangleView::new(&mesh.triangles);
        let mapped_uvs = mapped
            .as_float2()
            .context("mapped texture coordinates are not two-component")?;
        let corner_uvs = match mapped.element {
            AttributeElement::Corner => mapped_uvs.to_vec(),
            _ => gather_corners(&view, mapped_uvs),
        };
        let output = solve(
            ctx.tangents,
            &view,
            &mesh.verts,
            vertex_normals,
            Some(&mesh.smooth),
            &corner_uvs,
        );
        (
            bytemuck::cast_slice::<Vec3, f32>(&output.tangents).to_vec(),
            output.signs.unwrap_or_default(),
        )
    };

    log::trace!("Generated {} tangents for '{uv_name}'", tangents.len() / 3);
    Ok((
        AttributeBuffer::new(
            format!("{uv_name}.tangent"),
            AttributeStandard::UvTangent,
            AttributeElement::Corner,
            AttributeType::Float3,
            tangents,
        ),
        AttributeBuffer::new(
            format!("{uv_name}.tangent_sign"),
            AttributeStandard::UvTangentSign,
            AttributeElement::Corner,
            AttributeType::Float,
            signs,
        ),
    ))
}

/// Fails unless the mesh holds one vertex per refined vertex.
fn ensure_refined_vertices(ctx: &PrimvarContext<'_>, mesh: &MeshRecord) -> Result<()> {
    if mesh.verts.len() != ctx.refined.vertex_count {
        bail!(
            "{} vertices do not cover the {} refined vertices",
            mesh.verts.len(),
            ctx.refined.vertex_count
        );
    }
    Ok(())
}

fn solve<V: FaceTopologyView + ?Sized>(
    lane: &TangentSpaceLane,
    view: &V,
    positions: &[Vec3],
    vertex_normals: Option<&[Vec3]>,
    smooth: Option<&[bool]>,
    uvs: &[Vec2],
) -> TangentOutput {
    let face_normals;
    let normals = match vertex_normals {
        Some(vertex) => {
            face_normals = compute_face_normals(view, positions);
            Some(NormalInputs {
                vertex,
                face: &face_normals,
                smooth,
            })
        }
        None => None,
    };
    lane.run(
        &TangentInputs {
            faces: view,
            positions,
            normals,
            uvs: Some(uvs),
        },
        true,
    )
}

/// Expands per-vertex values to the corners of `view`, in corner order.
fn gather_corners<V, T>(view: &V, per_vertex: &[T]) -> Vec<T>
where
    V: FaceTopologyView + ?Sized,
    T: Copy + Default,
{
    let mut out = vec![T::default(); view.total_corners()];
    for face in 0..view.face_count() {
        for corner in 0..view.corner_count(face) {
            out[view.corner_index(face, corner)] = per_vertex
                .get(view.vertex_index(face, corner))
                .copied()
                .unwrap_or_default();
        }
    }
    out
}

fn apply_color(
    ctx: &PrimvarContext<'_>,
    mesh: &mut MeshRecord,
    record: &PrimvarRecord,
) -> Result<Option<Vec3>> {
    let data = convert(record)?;
    let colors =
        AttributeData::Float3((0..data.len()).filter_map(|i| data.color_at(i)).collect());

    let display = (record.descriptor.name == tokens::DISPLAY_COLOR
        && record.descriptor.interpolation == Interpolation::Constant)
        .then(|| colors.color_at(0))
        .flatten();

    let buffer = map(ctx, record, &colors)?
        .with_standard(AttributeStandard::VertexColor)
        .with_type(AttributeType::Color);
    mesh.set_attribute(buffer)?;
    Ok(display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_core::topology::PolygonView;

    #[test]
    fn test_gather_corners_follows_face_order() {
        let counts = [3, 3];
        let indices = [0, 1, 2, 2, 1, 3];
        let view = PolygonView::new(&counts, &indices);
        let gathered = gather_corners(&view, &[10.0f32, 11.0, 12.0, 13.0]);
        assert_eq!(gathered, vec![10.0, 11.0, 12.0, 12.0, 11.0, 13.0]);
    }

    #[test]
    fn test_gather_corners_missing_vertex_is_default() {
        let tris = [[0, 1, 5]];
        let view = TriangleView::new(&tris);
        assert_eq!(gather_corners(&view, &[1.0f32, 2.0]), vec![1.0, 2.0, 0.0]);
    }
}
