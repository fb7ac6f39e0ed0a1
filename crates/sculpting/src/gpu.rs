//! GPU-facing buffer layouts and dirty tracking.
//!
//! The render collaborator uploads these buffers. Each layout is `Pod` so it
//! can be handed over with `bytemuck::cast_slice` without copying. Attribute
//! dirty flags tell the renderer which buffers changed since the last upload.

#[cfg(feature = "bevy")]
use bevy::asset::RenderAssetUsages;
#[cfg(feature = "bevy")]
use bevy::mesh::{Indices, PrimitiveTopology};
#[cfg(feature = "bevy")]
use bevy::prelude::*;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::mesh::SurfaceMesh;

/// Interleaved surface vertex: position, normal and cumulative sculpt weight.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct SurfaceVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub weight: f32,
}

/// Decal patch vertex.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct DecalVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Per-instance transform, column-major.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct InstanceRaw {
    pub transform: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub fn from_mat4(matrix: Mat4) -> Self {
        Self {
            transform: matrix.to_cols_array_2d(),
        }
    }

    /// Zero-scale transform. Collapses the instance to a point so it is not
    /// rasterized.
    pub fn hidden() -> Self {
        Self::zeroed()
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transform)
    }

    pub fn is_hidden(&self) -> bool {
        self.transform == [[0.0; 4]; 4]
    }
}

/// Which surface attribute buffers changed since the last upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyAttributes {
    pub positions: bool,
    pub normals: bool,
    pub weights: bool,
}

impl DirtyAttributes {
    /// Everything dirty, used for the first upload.
    pub fn all() -> Self {
        Self {
            positions: true,
            normals: true,
            weights: true,
        }
    }

    pub fn any(&self) -> bool {
        self.positions || self.normals || self.weights
    }
}

/// Build a Bevy mesh from the surface.
///
/// The sculpt weight travels in the red channel of the vertex color so the
/// surface material can read it without a custom vertex attribute.
#[cfg(feature = "bevy")]
pub fn surface_to_bevy_mesh(surface: &SurfaceMesh) -> Mesh {
    let positions: Vec<[f32; 3]> = surface.positions().iter().map(|p| p.to_array()).collect();
    let normals: Vec<[f32; 3]> = surface.normals().iter().map(|n| n.to_array()).collect();
    let uvs: Vec<[f32; 2]> = surface.uvs().iter().map(|uv| uv.to_array()).collect();
    let colors: Vec<[f32; 4]> = surface
        .weights()
        .iter()
        .map(|&w| [w, w, w, 1.0])
        .collect();

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh.insert_indices(Indices::U32(surface.indices().to_vec()));
    mesh
}

/// Interleave the surface attributes into a single upload buffer.
pub fn interleave_surface(surface: &SurfaceMesh) -> Vec<SurfaceVertex> {
    surface
        .positions()
        .iter()
        .zip(surface.normals())
        .zip(surface.weights())
        .map(|((p, n), &w)| SurfaceVertex {
            position: p.to_array(),
            normal: n.to_array(),
            weight: w,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<SurfaceVertex>(), 28);
        assert_eq!(std::mem::size_of::<DecalVertex>(), 32);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 64);
    }

    #[test]
    fn test_instance_roundtrip_and_hidden() {
        let m = Mat4::from_rotation_translation(Quat::from_rotation_y(0.3), Vec3::new(1.0, 2.0, 3.0));
        let raw = InstanceRaw::from_mat4(m);
        assert!(!raw.is_hidden());
        assert!(raw.to_mat4().abs_diff_eq(m, 1e-6));
        assert!(InstanceRaw::hidden().is_hidden());
    }

    #[test]
    fn test_interleave_matches_attributes() {
        let surface = SurfaceMesh::sphere(1.0, 8, 6);
        let interleaved = interleave_surface(&surface);
        assert_eq!(interleaved.len(), surface.vertex_count());
        assert_eq!(interleaved[5].position, surface.positions()[5].to_array());
        assert_eq!(interleaved[5].weight, 1.0);
        let bytes: &[u8] = bytemuck::cast_slice(&interleaved);
        assert_eq!(bytes.len(), interleaved.len() * 28);
    }
}
