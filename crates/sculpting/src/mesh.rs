//! Fixed-topology surface mesh with mutable per-vertex attributes.
//!
//! The vertex index is the stable identity used for weight accumulation and
//! instance anchoring. Topology (the index buffer) never changes after
//! construction; only positions, normals and sculpt weights are mutated.

use glam::{Vec2, Vec3};
use std::collections::{HashMap, HashSet};
use std::f32::consts::{PI, TAU};
use tracing::debug;

use crate::gpu::DirtyAttributes;
use crate::types::MeshError;

/// Quantization step used to detect vertices that share a position
/// (UV seam and pole duplicates).
const WELD_EPSILON: f32 = 1e-5;

/// Sculpt weight of an untouched vertex.
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// A triangulated surface whose vertex attributes change every frame.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    weights: Vec<f32>,
    indices: Vec<u32>,
    /// Faces touching each vertex
    vertex_faces: Vec<Vec<u32>>,
    /// Group index per vertex; vertices in one group share a position
    weld_group: Vec<u32>,
    /// Members of each weld group
    weld_members: Vec<Vec<u32>>,
    dirty: DirtyAttributes,
}

impl SurfaceMesh {
    /// Build a UV sphere centered on the local origin.
    ///
    /// Rows run from the +Y pole to the -Y pole. Seam and pole vertices are
    /// duplicated, giving `(width_segments + 1) * (height_segments + 1)`
    /// vertices.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let row_len = width_segments as usize + 1;
        let vertex_count = row_len * (height_segments as usize + 1);
        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let position = Vec3::new(
                    -radius * (u * TAU).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * TAU).sin() * (v * PI).sin(),
                );
                positions.push(position);
                normals.push(position.normalize_or_zero());
                uvs.push(Vec2::new(u, 1.0 - v));
            }
        }

        let grid = |ix: u32, iy: u32| iy * (width_segments + 1) + ix;
        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = grid(ix + 1, iy);
                let b = grid(ix, iy);
                let c = grid(ix, iy + 1);
                let d = grid(ix + 1, iy + 1);
                // Pole rows would produce degenerate triangles
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        debug!(
            vertices = positions.len(),
            triangles = indices.len() / 3,
            radius,
            "Built sphere surface"
        );

        Self::assemble(positions, normals, uvs, indices)
    }

    /// Build a surface from raw buffers. UVs default to zero.
    pub fn from_buffers(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if positions.is_empty() {
            return Err(MeshError::Empty);
        }
        if normals.len() != positions.len() {
            return Err(MeshError::NormalCountMismatch {
                positions: positions.len(),
                normals: normals.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: positions.len(),
            });
        }

        let uvs = vec![Vec2::ZERO; positions.len()];
        Ok(Self::assemble(positions, normals, uvs, indices))
    }

    fn assemble(positions: Vec<Vec3>, normals: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> Self {
        let mut vertex_faces = vec![Vec::new(); positions.len()];
        for (face, tri) in indices.chunks_exact(3).enumerate() {
            for &v in tri {
                vertex_faces[v as usize].push(face as u32);
            }
        }

        let mut by_key: HashMap<[i64; 3], u32> = HashMap::new();
        let mut weld_group = Vec::with_capacity(positions.len());
        let mut weld_members: Vec<Vec<u32>> = Vec::new();
        for (i, p) in positions.iter().enumerate() {
            let key = [
                (p.x / WELD_EPSILON).round() as i64,
                (p.y / WELD_EPSILON).round() as i64,
                (p.z / WELD_EPSILON).round() as i64,
            ];
            let group = *by_key.entry(key).or_insert_with(|| {
                weld_members.push(Vec::new());
                (weld_members.len() - 1) as u32
            });
            weld_members[group as usize].push(i as u32);
            weld_group.push(group);
        }

        let weights = vec![DEFAULT_WEIGHT; positions.len()];
        Self {
            positions,
            normals,
            uvs,
            weights,
            indices,
            vertex_faces,
            weld_group,
            weld_members,
            dirty: DirtyAttributes::all(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn position(&self, vertex: u32) -> Option<Vec3> {
        self.positions.get(vertex as usize).copied()
    }

    pub fn normal(&self, vertex: u32) -> Option<Vec3> {
        self.normals.get(vertex as usize).copied()
    }

    pub fn weight(&self, vertex: u32) -> Option<f32> {
        self.weights.get(vertex as usize).copied()
    }

    /// Vertex indices of a face.
    pub fn triangle(&self, face: u32) -> Option<[u32; 3]> {
        let base = face as usize * 3;
        let tri = self.indices.get(base..base + 3)?;
        Some([tri[0], tri[1], tri[2]])
    }

    /// Current face normal in object space, `None` for degenerate faces.
    pub fn face_normal(&self, face: u32) -> Option<Vec3> {
        let [a, b, c] = self.triangle(face)?;
        let (pa, pb, pc) = (
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        );
        let n = (pc - pb).cross(pa - pb);
        (n.length_squared() > f32::EPSILON * f32::EPSILON).then(|| n.normalize())
    }

    /// Vertices sharing a position with `vertex`, itself included.
    pub fn coincident_vertices(&self, vertex: u32) -> Option<&[u32]> {
        let group = *self.weld_group.get(vertex as usize)?;
        Some(&self.weld_members[group as usize])
    }

    /// Move a vertex. Only the sculptor writes positions.
    pub(crate) fn set_position(&mut self, vertex: u32, position: Vec3) {
        self.positions[vertex as usize] = position;
        self.dirty.positions = true;
    }

    /// Compound a vertex's cumulative sculpt weight. Only the sculptor writes
    /// weights.
    pub(crate) fn scale_weight(&mut self, vertex: u32, factor: f32) {
        self.weights[vertex as usize] *= factor;
        self.dirty.weights = true;
    }

    /// Recompute area-weighted normals around the given modified vertices.
    ///
    /// The modified vertices and their one-ring are refreshed. Coincident
    /// vertices receive one shared normal so seams stay invisible.
    /// Out-of-range indices are ignored.
    pub fn refresh_normals(&mut self, modified: impl IntoIterator<Item = u32>) {
        let mut affected = HashSet::new();
        for vertex in modified {
            let Some(faces) = self.vertex_faces.get(vertex as usize) else {
                continue;
            };
            for &face in faces {
                let base = face as usize * 3;
                affected.extend(self.indices[base..base + 3].iter().copied());
            }
        }

        let groups: HashSet<u32> = affected
            .iter()
            .map(|&v| self.weld_group[v as usize])
            .collect();

        for group in groups {
            let mut sum = Vec3::ZERO;
            for &member in &self.weld_members[group as usize] {
                for &face in &self.vertex_faces[member as usize] {
                    let base = face as usize * 3;
                    let a = self.positions[self.indices[base] as usize];
                    let b = self.positions[self.indices[base + 1] as usize];
                    let c = self.positions[self.indices[base + 2] as usize];
                    // Unnormalized cross product weights by triangle area
                    sum += (c - b).cross(a - b);
                }
            }
            let Some(normal) = sum.try_normalize() else {
                continue;
            };
            for &member in &self.weld_members[group as usize] {
                self.normals[member as usize] = normal;
            }
        }
        self.dirty.normals = true;
    }

    /// Dirty attribute flags since the last upload.
    pub fn dirty(&self) -> DirtyAttributes {
        self.dirty
    }

    /// Return and clear the dirty flags. Called by the render collaborator
    /// after uploading.
    pub fn take_dirty(&mut self) -> DirtyAttributes {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_counts() {
        let sphere = SurfaceMesh::sphere(1.0, 16, 8);
        assert_eq!(sphere.vertex_count(), 17 * 9);
        // Pole rows contribute one triangle per segment, the rest two
        assert_eq!(sphere.triangle_count(), 16 * (2 * 8 - 2));
        assert!(sphere.weights().iter().all(|&w| w == DEFAULT_WEIGHT));
    }

    #[test]
    fn test_sphere_vertices_on_radius() {
        let sphere = SurfaceMesh::sphere(2.0, 12, 10);
        for (p, n) in sphere.positions().iter().zip(sphere.normals()) {
            assert!((p.length() - 2.0).abs() < 1e-5);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(p.normalize().dot(*n) > 0.9999);
        }
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let sphere = SurfaceMesh::sphere(1.0, 12, 10);
        for face in 0..sphere.triangle_count() as u32 {
            let [a, b, c] = sphere.triangle(face).unwrap();
            let centroid =
                (sphere.positions()[a as usize] + sphere.positions()[b as usize] + sphere.positions()[c as usize]) / 3.0;
            let normal = sphere.face_normal(face).unwrap();
            assert!(normal.dot(centroid) > 0.0, "face {face} points inward");
        }
    }

    #[test]
    fn test_seam_and_pole_vertices_are_welded() {
        let sphere = SurfaceMesh::sphere(1.0, 8, 4);
        // Top pole row: all 9 vertices coincide
        assert_eq!(sphere.coincident_vertices(0).unwrap().len(), 9);
        // Seam: first and last vertex of a middle row coincide
        let row = 2 * 9;
        let seam = sphere.coincident_vertices(row).unwrap();
        assert_eq!(seam.len(), 2);
        assert!(seam.contains(&(row + 8)));
    }

    #[test]
    fn test_from_buffers_validation() {
        let p = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let n = vec![Vec3::Z; 3];
        assert!(SurfaceMesh::from_buffers(p.clone(), n.clone(), vec![0, 1, 2]).is_ok());
        assert_eq!(
            SurfaceMesh::from_buffers(Vec::new(), Vec::new(), Vec::new()).unwrap_err(),
            MeshError::Empty
        );
        assert_eq!(
            SurfaceMesh::from_buffers(p.clone(), n.clone(), vec![0, 1]).unwrap_err(),
            MeshError::NotTriangles(2)
        );
        assert_eq!(
            SurfaceMesh::from_buffers(p.clone(), n.clone(), vec![0, 1, 7]).unwrap_err(),
            MeshError::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            }
        );
        assert!(matches!(
            SurfaceMesh::from_buffers(p, vec![Vec3::Z], vec![0, 1, 2]),
            Err(MeshError::NormalCountMismatch { .. })
        ));
    }

    #[test]
    fn test_refresh_normals_after_move() {
        let mut sphere = SurfaceMesh::sphere(1.0, 16, 8);
        sphere.take_dirty();

        // Push one equator vertex outward and refresh
        let v = 4 * 17 + 4;
        let p = sphere.positions()[v];
        sphere.set_position(v as u32, p * 1.5);
        sphere.refresh_normals([v as u32]);

        let dirty = sphere.take_dirty();
        assert!(dirty.positions && dirty.normals && !dirty.weights);
        // Neighbors tilt away from the bump
        let neighbor = v + 1;
        let n = sphere.normals()[neighbor];
        assert!((n.length() - 1.0).abs() < 1e-5);
        assert!(n.dot(sphere.positions()[neighbor].normalize()) < 0.9999);
    }

    #[test]
    fn test_refresh_normals_keeps_seam_shared() {
        let mut sphere = SurfaceMesh::sphere(1.0, 8, 6);
        let row = 3 * 9;
        let seam_a = row as u32;
        let seam_b = (row + 8) as u32;
        for &v in &[seam_a, seam_b] {
            let p = sphere.positions()[v as usize];
            sphere.set_position(v, p * 1.2);
        }
        sphere.refresh_normals([seam_a]);
        assert_eq!(sphere.normals()[seam_a as usize], sphere.normals()[seam_b as usize]);
    }

    #[test]
    fn test_out_of_range_vertex_is_ignored() {
        let mut sphere = SurfaceMesh::sphere(1.0, 8, 6);
        let count = sphere.vertex_count() as u32;
        assert!(sphere.coincident_vertices(count).is_none());
        assert!(sphere.coincident_vertices(u32::MAX).is_none());

        let normals = sphere.normals().to_vec();
        sphere.refresh_normals([count, u32::MAX]);
        assert_eq!(sphere.normals(), normals.as_slice());
    }

    #[test]
    fn test_take_dirty_clears() {
        let mut sphere = SurfaceMesh::sphere(1.0, 4, 4);
        assert!(sphere.take_dirty().any());
        assert!(!sphere.dirty().any());
    }
}
