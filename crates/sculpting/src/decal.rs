//! Cursor decal projected onto the live surface.
//!
//! A box-shaped projector sits at the hit point with its local +Z pointing
//! toward the surface's local origin. Every surface triangle is clipped
//! against the box, the survivors get UVs from their projector-space XY, and
//! the result is nudged off the surface along the hit normal.
//!
//! The patch is rebuilt from scratch each frame; the previous one is dropped.

use glam::{Affine3A, Mat3, Vec2, Vec3};
use tracing::{debug, trace};

use crate::gpu::DecalVertex;
use crate::mesh::SurfaceMesh;
use crate::picker::SurfaceHit;

/// Default projector box extent in world units.
pub const DEFAULT_DECAL_SIZE: Vec3 = Vec3::splat(0.2);

/// Default offset along the hit normal to avoid depth fighting.
pub const DEFAULT_OFFSET_EPSILON: f32 = 0.002;

/// Orthonormal projector frame in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectorFrame {
    pub origin: Vec3,
    /// Columns are the projector X, Y and Z axes
    pub basis: Mat3,
}

impl ProjectorFrame {
    /// Frame at `origin` whose +Z looks along `forward`.
    ///
    /// X and Y are completed against world up, falling back to the axis
    /// least aligned with `forward` when the two are parallel.
    pub fn looking_along(origin: Vec3, forward: Vec3) -> Option<Self> {
        let z = forward.try_normalize()?;
        // Gram-Schmidt: remove the component of up parallel to forward
        let projected = Vec3::Y - z * z.dot(Vec3::Y);
        let y = if projected.length_squared() > 1e-6 {
            projected.normalize()
        } else {
            arbitrary_perpendicular(z)
        };
        let x = y.cross(z).normalize();
        Some(Self {
            origin,
            basis: Mat3::from_cols(x, y, z),
        })
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.basis.transpose() * (world - self.origin)
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.origin + self.basis * local
    }
}

/// Find an arbitrary vector perpendicular to the given direction.
fn arbitrary_perpendicular(direction: Vec3) -> Vec3 {
    let axis = if direction.x.abs() < direction.y.abs() {
        if direction.x.abs() < direction.z.abs() {
            Vec3::X
        } else {
            Vec3::Z
        }
    } else if direction.y.abs() < direction.z.abs() {
        Vec3::Y
    } else {
        Vec3::Z
    };
    direction.cross(axis).normalize()
}

/// Polygon vertex during clipping: projector-space position plus world normal.
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    position: Vec3,
    normal: Vec3,
}

impl ClipVertex {
    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}

/// Clip a convex polygon against the plane `dot(axis, p) <= limit`.
fn clip_against_plane(polygon: &[ClipVertex], axis: Vec3, limit: f32) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(polygon.len() + 2);
    let Some(&last) = polygon.last() else {
        return out;
    };

    let mut previous = last;
    let mut previous_inside = axis.dot(previous.position) <= limit;
    for &current in polygon {
        let current_inside = axis.dot(current.position) <= limit;
        if current_inside != previous_inside {
            let d0 = axis.dot(previous.position) - limit;
            let d1 = axis.dot(current.position) - limit;
            out.push(previous.lerp(current, d0 / (d0 - d1)));
        }
        if current_inside {
            out.push(current);
        }
        previous = current;
        previous_inside = current_inside;
    }
    out
}

/// Clip a polygon against all six faces of a box centered on the origin.
fn clip_to_box(mut polygon: Vec<ClipVertex>, half: Vec3) -> Vec<ClipVertex> {
    let planes = [
        (Vec3::X, half.x),
        (Vec3::NEG_X, half.x),
        (Vec3::Y, half.y),
        (Vec3::NEG_Y, half.y),
        (Vec3::Z, half.z),
        (Vec3::NEG_Z, half.z),
    ];
    for (axis, limit) in planes {
        polygon = clip_against_plane(&polygon, axis, limit);
        if polygon.len() < 3 {
            return Vec::new();
        }
    }
    polygon
}

/// Projected decal geometry for one frame, in world space.
#[derive(Debug, Clone, Default)]
pub struct DecalPatch {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
    generation: u64,
}

impl DecalPatch {
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Rebuild counter of the projector that produced this patch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaved upload buffer.
    pub fn vertices(&self) -> Vec<DecalVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((p, n), uv)| DecalVertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: uv.to_array(),
            })
            .collect()
    }
}

/// Owns the current decal patch and rebuilds it from surface hits.
#[derive(Debug, Clone)]
pub struct DecalProjector {
    /// Projector box extent (width, height, depth)
    pub size: Vec3,
    /// Offset along the hit normal
    pub offset_epsilon: f32,
    patch: Option<DecalPatch>,
    generation: u64,
}

impl Default for DecalProjector {
    fn default() -> Self {
        Self::new(DEFAULT_DECAL_SIZE, DEFAULT_OFFSET_EPSILON)
    }
}

impl DecalProjector {
    pub fn new(size: Vec3, offset_epsilon: f32) -> Self {
        Self {
            size,
            offset_epsilon,
            patch: None,
            generation: 0,
        }
    }

    /// The single live patch, if one has been built.
    pub fn patch(&self) -> Option<&DecalPatch> {
        self.patch.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebuild the patch for a new hit, replacing the previous one.
    ///
    /// Returns false when the hit has no usable normal; the previous patch
    /// stays in place.
    pub fn update(&mut self, mesh: &SurfaceMesh, transform: &Affine3A, hit: &SurfaceHit) -> bool {
        let Some(offset_normal) = hit.world_normal else {
            debug!(face = hit.face, "Decal skipped, hit has no face normal");
            return false;
        };
        let center: Vec3 = transform.translation.into();
        let Some(frame) = ProjectorFrame::looking_along(hit.point, center - hit.point) else {
            debug!("Decal skipped, hit coincides with surface origin");
            return false;
        };

        let mut patch = project(mesh, transform, &frame, self.size);
        for p in &mut patch.positions {
            *p += offset_normal * self.offset_epsilon;
        }

        self.generation += 1;
        patch.generation = self.generation;
        trace!(
            generation = self.generation,
            triangles = patch.triangle_count(),
            "Rebuilt decal"
        );
        self.patch = Some(patch);
        true
    }

    /// Drop the current patch.
    pub fn clear(&mut self) {
        self.patch = None;
    }
}

/// Clip every surface triangle into the projector box.
pub fn project(mesh: &SurfaceMesh, transform: &Affine3A, frame: &ProjectorFrame, size: Vec3) -> DecalPatch {
    let half = size * 0.5;
    let normal_matrix = Mat3::from(transform.matrix3).inverse().transpose();
    let mut patch = DecalPatch::default();

    for tri in mesh.indices().chunks_exact(3) {
        let polygon: Vec<ClipVertex> = tri
            .iter()
            .map(|&v| {
                let world = transform.transform_point3(mesh.positions()[v as usize]);
                ClipVertex {
                    position: frame.to_local(world),
                    normal: normal_matrix * mesh.normals()[v as usize],
                }
            })
            .collect();

        // Cheap reject before clipping
        let outside = (0..3).any(|axis| {
            polygon.iter().all(|v| v.position[axis] > half[axis])
                || polygon.iter().all(|v| v.position[axis] < -half[axis])
        });
        if outside {
            continue;
        }

        let clipped = clip_to_box(polygon, half);
        if clipped.len() < 3 {
            continue;
        }

        let base = patch.positions.len() as u32;
        for v in &clipped {
            patch.positions.push(frame.to_world(v.position));
            patch.normals.push(v.normal.normalize_or_zero());
            patch.uvs.push(Vec2::new(
                0.5 + v.position.x / size.x,
                0.5 + v.position.y / size.y,
            ));
        }
        for i in 1..clipped.len() as u32 - 1 {
            patch.indices.extend_from_slice(&[base, base + i, base + i + 1]);
        }
    }
    patch
}
