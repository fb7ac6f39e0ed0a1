//! Core shared types.
//!
//! Identity tags for pickable entities, rays, error enums and the small
//! strategy enums the scene configuration selects between.

use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of a pickable entity, resolved at picking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickTarget {
    /// The sculptable planet surface
    Surface,
    /// The projected cursor decal patch
    Decal,
    /// Instanced vegetation
    Vegetation,
    /// Anything else in the scene (water, helpers)
    Other,
}

/// A ray with an origin and a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by an affine transform.
    ///
    /// The direction is transformed but not renormalized, so `t` values stay
    /// comparable with the untransformed ray.
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        Self {
            origin: transform.transform_point3(self.origin),
            direction: transform.transform_vector3(self.direction),
        }
    }
}

/// How the sculpt anchor is derived from a surface hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorRule {
    /// First vertex of the hit face
    #[default]
    FaceFirst,
    /// Face vertex with the largest barycentric weight
    FaceClosest,
}

/// Neighbor search strategy for the sculptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighborSearch {
    /// Scan every vertex
    #[default]
    BruteForce,
    /// Query a vertex octree kept in sync with sculpted positions
    Octree,
}

/// Errors building a surface mesh from raw buffers.
#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("Mesh has no vertices")]
    Empty,

    #[error("Normal count {normals} does not match position count {positions}")]
    NormalCountMismatch { positions: usize, normals: usize },

    #[error("Index count {0} is not a multiple of 3")]
    NotTriangles(usize),

    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Asset loading failure. Fatal to startup.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to read asset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode texture {path}: {reason}")]
    Texture { path: String, reason: String },

    #[error("Failed to load model {path}: {reason}")]
    Model { path: String, reason: String },

    #[error("Model {0} contains no triangles")]
    EmptyModel(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!((ray.at(2.0) - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-6);
    }

    #[test]
    fn test_ray_transform_keeps_parameter_scale() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 4.0), Vec3::NEG_Z);
        let transform = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::ZERO,
        );
        let local = ray.transformed(&transform);
        // A world point at t is the transformed point at the same t
        let world = ray.at(1.5);
        assert!((transform.transform_point3(world) - local.at(1.5)).length() < 1e-5);
    }
}
