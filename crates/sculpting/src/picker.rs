//! Pointer-to-surface picking.
//!
//! Converts a pointer position plus camera state into a world ray and
//! intersects it against every pickable entity. Each entity carries a
//! [`PickTarget`] tag so callers filter hits by identity instead of by name.

use glam::{Affine3A, Mat3, Vec2, Vec3};
use tracing::trace;

use crate::camera::PerspectiveCamera;
use crate::mesh::SurfaceMesh;
use crate::raycast::raycast_triangles;
use crate::types::{AnchorRule, PickTarget, Ray};

/// Borrowed geometry of one pickable entity for the current frame.
#[derive(Debug, Clone, Copy)]
pub struct PickableMesh<'a> {
    pub target: PickTarget,
    /// Object-to-world transform
    pub transform: Affine3A,
    pub positions: &'a [Vec3],
    pub indices: &'a [u32],
}

impl<'a> PickableMesh<'a> {
    pub fn new(
        target: PickTarget,
        transform: Affine3A,
        positions: &'a [Vec3],
        indices: &'a [u32],
    ) -> Self {
        Self {
            target,
            transform,
            positions,
            indices,
        }
    }

    /// Pickable view of a surface mesh.
    pub fn from_surface(target: PickTarget, transform: Affine3A, mesh: &'a SurfaceMesh) -> Self {
        Self::new(target, transform, mesh.positions(), mesh.indices())
    }
}

/// One ray intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub target: PickTarget,
    /// Distance from the ray origin in world units
    pub distance: f32,
    /// Intersection point in world space
    pub point: Vec3,
    /// Intersection point in the object's local space
    pub local_point: Vec3,
    pub face: u32,
    pub face_vertices: [u32; 3],
    /// Barycentric weights of the face vertices
    pub barycentric: Vec3,
    /// Face normal in object space; `None` for a degenerate face
    pub face_normal: Option<Vec3>,
}

impl PickHit {
    /// Resolve the sculpt anchor from the hit face.
    pub fn anchor_vertex(&self, rule: AnchorRule) -> u32 {
        match rule {
            AnchorRule::FaceFirst => self.face_vertices[0],
            AnchorRule::FaceClosest => {
                let b = self.barycentric;
                if b.x >= b.y && b.x >= b.z {
                    self.face_vertices[0]
                } else if b.y >= b.z {
                    self.face_vertices[1]
                } else {
                    self.face_vertices[2]
                }
            }
        }
    }
}

/// Transient per-frame hit against the sculptable surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub point: Vec3,
    pub local_point: Vec3,
    pub distance: f32,
    pub face: u32,
    /// Anchor vertex for sculpting
    pub anchor: u32,
    /// Face normal in object space
    pub face_normal: Option<Vec3>,
    /// Face normal in world space
    pub world_normal: Option<Vec3>,
}

/// Intersect a world ray against all pickable entities.
///
/// Every intersected face of every entity is returned, sorted by increasing
/// distance. An empty result means nothing was hit.
pub fn pick(ray: &Ray, objects: &[PickableMesh<'_>]) -> Vec<PickHit> {
    let mut hits = Vec::new();

    for object in objects {
        let inverse = object.transform.inverse();
        let local_ray = ray.transformed(&inverse);

        for face_hit in raycast_triangles(&local_ray, object.positions, object.indices) {
            let base = face_hit.face as usize * 3;
            let face_vertices = [
                object.indices[base],
                object.indices[base + 1],
                object.indices[base + 2],
            ];
            let [a, b, c] = face_vertices.map(|i| object.positions[i as usize]);
            let face_normal = (c - b).cross(a - b).try_normalize();

            hits.push(PickHit {
                target: object.target,
                distance: face_hit.hit.t,
                point: ray.at(face_hit.hit.t),
                local_point: local_ray.at(face_hit.hit.t),
                face: face_hit.face,
                face_vertices,
                barycentric: face_hit.hit.barycentric(),
                face_normal,
            });
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    trace!(hits = hits.len(), "Picked");
    hits
}

/// Pick from a pointer position in normalized device coordinates.
pub fn pick_from_ndc(
    camera: &PerspectiveCamera,
    ndc: Vec2,
    objects: &[PickableMesh<'_>],
) -> Vec<PickHit> {
    pick(&camera.ray_from_ndc(ndc), objects)
}

/// Nearest hit against the given target, converted to a surface hit.
pub fn first_surface_hit(
    hits: &[PickHit],
    target: PickTarget,
    transform: &Affine3A,
    rule: AnchorRule,
) -> Option<SurfaceHit> {
    let hit = hits.iter().find(|hit| hit.target == target)?;
    let normal_matrix = Mat3::from(transform.matrix3).inverse().transpose();
    Some(SurfaceHit {
        point: hit.point,
        local_point: hit.local_point,
        distance: hit.distance,
        face: hit.face,
        anchor: hit.anchor_vertex(rule),
        face_normal: hit.face_normal,
        world_normal: hit
            .face_normal
            .and_then(|n| (normal_matrix * n).try_normalize()),
    })
}
