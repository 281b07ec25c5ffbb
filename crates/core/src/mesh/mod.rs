//! Tube extrusion along sampled curves.
//!
//! A circular cross-section is swept along the curve and consecutive rings are
//! stitched into a quad strip. Every ring repeats its first vertex at the end
//! so that `u` runs from 0 to 1 without sharing a seam vertex.

mod frames;
mod obj;

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::curve::Curve;

pub use frames::Frame;
pub use obj::ObjWriter;

/// Vertex layout handed to render backends.
///
/// | Attribute | Format    | Offset |
/// |-----------|-----------|--------|
/// | position  | Float32x3 | 0      |
/// | normal    | Float32x3 | 12     |
/// | uv        | Float32x2 | 24     |
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TubeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl TubeVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }

    pub fn uv(&self) -> Vec2 {
        Vec2::from(self.uv)
    }
}

/// Extrusion settings for one tube.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeParams {
    pub length_segments: usize,
    pub radius: f32,
    pub radial_segments: usize,
    pub closed: bool,
}

impl Default for TubeParams {
    fn default() -> Self {
        Self {
            length_segments: 300,
            radius: 0.2,
            radial_segments: 32,
            closed: false,
        }
    }
}

/// Axis-aligned box around a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl MeshBounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Triangulated tube surface with positions, outward normals and UVs.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeMesh {
    params: TubeParams,
    vertices: Vec<TubeVertex>,
    indices: Vec<u32>,
    centerline: Vec<Vec3>,
}

impl TubeMesh {
    pub fn params(&self) -> TubeParams {
        self.params
    }

    pub fn vertices(&self) -> &[TubeVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Ring centers, one per length segment boundary.
    pub fn centerline(&self) -> &[Vec3] {
        &self.centerline
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn bounds(&self) -> MeshBounds {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for vertex in &self.vertices {
            let position = vertex.position();
            min = min.min(position);
            max = max.max(position);
        }
        if self.vertices.is_empty() {
            return MeshBounds {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            };
        }
        MeshBounds { min, max }
    }

    /// Writes this mesh as a standalone Wavefront OBJ document.
    pub fn write_obj<W: std::io::Write>(&self, writer: W) -> crate::Result<()> {
        let mut obj = ObjWriter::new(writer);
        obj.write_mesh("tube", self)?;
        obj.finish()
    }
}

/// Extrudes a circular cross-section along `curve`.
///
/// Produces `(length_segments + 1) * (radial_segments + 1)` vertices and
/// `2 * length_segments * radial_segments` triangles whatever the curve shape.
/// A zero length count becomes one segment and a zero radial count becomes
/// three; one or two radial segments give flat rings.
pub fn extrude_tube(
    curve: &Curve,
    length_segments: usize,
    tube_radius: f32,
    radial_segments: usize,
    closed: bool,
) -> TubeMesh {
    let length_segments = length_segments.max(1);
    let radial_segments = if radial_segments == 0 { 3 } else { radial_segments };
    let frames = frames::parallel_transport_frames(curve, length_segments, closed);

    let ring_len = radial_segments + 1;
    let mut vertices = Vec::with_capacity((length_segments + 1) * ring_len);
    let mut centerline = Vec::with_capacity(length_segments + 1);

    for i in 0..=length_segments {
        // a closed tube ends on its own starting ring
        let source = if closed && i == length_segments { 0 } else { i };
        let t = source as f32 / length_segments as f32;
        let center = curve.point_at(t);
        let frame = frames[source];
        let v = i as f32 / length_segments as f32;

        for k in 0..=radial_segments {
            let angle = k as f32 / radial_segments as f32 * TAU;
            let normal = (frame.normal * -angle.cos() + frame.binormal * angle.sin()).normalize_or_zero();
            let position = center + normal * tube_radius;
            let u = k as f32 / radial_segments as f32;
            vertices.push(TubeVertex::new(position, normal, Vec2::new(u, v)));
        }
        centerline.push(center);
    }

    let mut indices = Vec::with_capacity(length_segments * radial_segments * 6);
    for j in 1..=length_segments {
        for i in 1..=radial_segments {
            let a = (ring_len * (j - 1) + (i - 1)) as u32;
            let b = (ring_len * j + (i - 1)) as u32;
            let c = (ring_len * j + i) as u32;
            let d = (ring_len * (j - 1) + i) as u32;
            indices.extend_from_slice(&[a, b, d]);
            indices.extend_from_slice(&[b, c, d]);
        }
    }

    TubeMesh {
        params: TubeParams {
            length_segments,
            radius: tube_radius,
            radial_segments,
            closed,
        },
        vertices,
        indices,
        centerline,
    }
}

/// Extrudes with a bundled [`TubeParams`].
pub fn extrude_with(curve: &Curve, params: TubeParams) -> TubeMesh {
    extrude_tube(
        curve,
        params.length_segments,
        params.radius,
        params.radial_segments,
        params.closed,
    )
}
