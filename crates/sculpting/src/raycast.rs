//! Ray-triangle intersection for picking.
//!
//! Moller-Trumbore intersection against indexed triangle lists, reporting
//! every intersected face with its barycentric coordinates.

use glam::Vec3;

use crate::types::Ray;

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-6;

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

impl TriangleHit {
    /// Barycentric weights in (w, u, v) order, matching vertices (0, 1, 2).
    pub fn barycentric(&self) -> Vec3 {
        Vec3::new(1.0 - self.u - self.v, self.u, self.v)
    }
}

/// An intersected face of an indexed mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceHit {
    pub face: u32,
    pub hit: TriangleHit,
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Both triangle sides are hit. Returns the hit distance and barycentric
/// coordinates if the ray intersects the triangle in front of its origin.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray parallel to the triangle plane
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Intersect a ray with every triangle of an indexed mesh.
///
/// Hits are sorted by increasing `t`. Brute force; a BVH is the natural
/// upgrade for large meshes.
pub fn raycast_triangles(ray: &Ray, positions: &[Vec3], indices: &[u32]) -> Vec<FaceHit> {
    let mut hits: Vec<FaceHit> = indices
        .chunks_exact(3)
        .enumerate()
        .filter_map(|(face, tri)| {
            let v0 = *positions.get(tri[0] as usize)?;
            let v1 = *positions.get(tri[1] as usize)?;
            let v2 = *positions.get(tri[2] as usize)?;
            ray_triangle_intersection(ray.origin, ray.direction, v0, v1, v2).map(|hit| FaceHit {
                face: face as u32,
                hit,
            })
        })
        .collect();
    hits.sort_by(|a, b| a.hit.t.total_cmp(&b.hit.t));
    hits
}
