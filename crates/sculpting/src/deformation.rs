//! Radial sculpting of surface vertices.
//!
//! Every vertex closer than the brush threshold to the anchor vertex is
//! scaled about the mesh's local origin by the brush's radial factor, and its
//! cumulative sculpt weight is multiplied by the same factor.
//!
//! Neighbor search is a brute-force O(V) scan by default. The octree
//! strategy returns exactly the same vertex set and is the better choice
//! once the vertex count grows past a few tens of thousands.

use glam::Vec3;
use tracing::{debug, trace};

use crate::brush::SculptBrush;
use crate::mesh::SurfaceMesh;
use crate::spatial::VertexOctree;
use crate::types::NeighborSearch;

/// Fraction of the mesh extent reserved around the octree root for
/// vertices that get pushed outward.
const OCTREE_HEADROOM: f32 = 0.5;

/// Outcome of one sculpt call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SculptStroke {
    /// Anchor vertex the falloff is centered on
    pub anchor: u32,
    /// Vertices strictly inside the brush threshold, ascending
    pub affected: Vec<u32>,
    /// Vertices whose position and weight changed, ascending
    pub modified: Vec<u32>,
}

impl SculptStroke {
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
    }
}

/// Vertices strictly within `threshold` of `center`, by full scan.
pub fn neighbors_brute_force(positions: &[Vec3], center: Vec3, threshold: f32) -> Vec<u32> {
    if threshold <= 0.0 {
        return Vec::new();
    }
    positions
        .iter()
        .enumerate()
        .filter(|(_, p)| p.distance(center) < threshold)
        .map(|(i, _)| i as u32)
        .collect()
}

/// Displace all vertices inside the brush around `anchor`.
///
/// The anchor position is captured before any vertex moves, so the result
/// does not depend on iteration order. Vertices at the local origin are
/// skipped.
pub fn apply_radial_sculpt(
    mesh: &mut SurfaceMesh,
    anchor: u32,
    affected: &[u32],
    brush: &SculptBrush,
) -> Vec<u32> {
    let Some(anchor_position) = mesh.position(anchor) else {
        return Vec::new();
    };

    let mut modified = Vec::with_capacity(affected.len());
    for &vertex in affected {
        let position = mesh.positions()[vertex as usize];
        let distance = position.distance(anchor_position);
        let dist_to_center = position.length();

        let Some(factor) = brush.radial_factor(dist_to_center, distance) else {
            if dist_to_center == 0.0 {
                debug!(vertex, "Skipping vertex at local origin");
            }
            continue;
        };

        mesh.set_position(vertex, position * factor);
        mesh.scale_weight(vertex, factor);
        modified.push(vertex);
    }
    modified
}

/// Stateful sculptor holding the selected neighbor search strategy.
#[derive(Debug, Default)]
pub struct Sculptor {
    search: NeighborSearch,
    octree: Option<VertexOctree>,
}

impl Sculptor {
    pub fn new(search: NeighborSearch) -> Self {
        Self {
            search,
            octree: None,
        }
    }

    pub fn search(&self) -> NeighborSearch {
        self.search
    }

    /// Vertices strictly within the threshold of the anchor vertex.
    pub fn affected_vertices(&mut self, mesh: &SurfaceMesh, anchor: u32, threshold: f32) -> Vec<u32> {
        let Some(center) = mesh.position(anchor) else {
            return Vec::new();
        };
        if threshold <= 0.0 {
            return Vec::new();
        }

        match self.search {
            NeighborSearch::BruteForce => neighbors_brute_force(mesh.positions(), center, threshold),
            NeighborSearch::Octree => {
                let octree = self
                    .octree
                    .get_or_insert_with(|| VertexOctree::from_positions(mesh.positions(), OCTREE_HEADROOM));
                // Inflate the query so float rounding in the squared test
                // never drops a vertex the exact test below would accept.
                let query_radius = threshold * (1.0 + 1e-4) + 1e-6;
                let mut candidates: Vec<u32> = octree
                    .query_sphere(center, query_radius)
                    .into_iter()
                    .filter(|&v| mesh.positions()[v as usize].distance(center) < threshold)
                    .collect();
                candidates.sort_unstable();
                candidates
            }
        }
    }

    /// Sculpt around `anchor`.
    ///
    /// With `displace` false (mow mode) only the affected set is resolved;
    /// positions and weights stay untouched.
    pub fn sculpt(
        &mut self,
        mesh: &mut SurfaceMesh,
        anchor: u32,
        brush: &SculptBrush,
        displace: bool,
    ) -> SculptStroke {
        let affected = self.affected_vertices(mesh, anchor, brush.threshold);
        if !displace || affected.is_empty() {
            return SculptStroke {
                anchor,
                affected,
                modified: Vec::new(),
            };
        }

        let before: Vec<Vec3> = if self.octree.is_some() {
            affected.iter().map(|&v| mesh.positions()[v as usize]).collect()
        } else {
            Vec::new()
        };

        let modified = apply_radial_sculpt(mesh, anchor, &affected, brush);
        self.sync_index(mesh, &affected, &before);

        trace!(anchor, affected = affected.len(), modified = modified.len(), "Sculpted");
        SculptStroke {
            anchor,
            affected,
            modified,
        }
    }

    fn sync_index(&mut self, mesh: &SurfaceMesh, affected: &[u32], before: &[Vec3]) {
        let Some(octree) = self.octree.as_mut() else {
            return;
        };
        let mut escaped = false;
        for (&vertex, &old) in affected.iter().zip(before) {
            let new = mesh.positions()[vertex as usize];
            if new != old && !octree.update(vertex, old, new) {
                escaped = true;
            }
        }
        if escaped {
            debug!("Sculpted vertices left the octree bounds, rebuilding");
            self.octree = Some(VertexOctree::from_positions(mesh.positions(), OCTREE_HEADROOM));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::FalloffCurve;

    fn brush(sign: f32, intensity: f32, threshold: f32) -> SculptBrush {
        SculptBrush {
            sign,
            intensity,
            threshold,
            falloff: FalloffCurve::Linear,
        }
    }

    /// Anchor on the unit sphere plus three vertices at known chord
    /// distances from it.
    fn probe_mesh() -> SurfaceMesh {
        let anchor = Vec3::Z;
        let at_chord = |d: f32| {
            // Point on the unit sphere at chord distance d from +Z
            let theta = 2.0 * (d / 2.0).asin();
            Vec3::new(theta.sin(), 0.0, theta.cos())
        };
        let positions = vec![anchor, at_chord(0.05), at_chord(0.2), at_chord(0.5)];
        let normals = positions.clone();
        SurfaceMesh::from_buffers(positions, normals, vec![0, 1, 2, 0, 2, 3]).unwrap()
    }

    #[test]
    fn test_only_vertices_inside_threshold_change() {
        let mut mesh = probe_mesh();
        let before = mesh.clone();

        let mut sculptor = Sculptor::default();
        let stroke = sculptor.sculpt(&mut mesh, 0, &brush(1.0, 0.01, 0.15), true);

        assert_eq!(stroke.affected, vec![0, 1]);
        assert_eq!(stroke.modified, vec![0, 1]);
        assert_ne!(mesh.positions()[1], before.positions()[1]);
        for v in [2usize, 3] {
            assert_eq!(mesh.positions()[v].to_array(), before.positions()[v].to_array());
            assert_eq!(mesh.weights()[v].to_bits(), before.weights()[v].to_bits());
        }
    }

    #[test]
    fn test_anchor_scaled_by_exact_factor() {
        let mut mesh = probe_mesh();
        let mut sculptor = Sculptor::default();
        sculptor.sculpt(&mut mesh, 0, &brush(1.0, 0.01, 0.15), true);

        assert!((mesh.positions()[0].z - 1.01).abs() < 1e-6);
        assert!((mesh.weights()[0] - 1.01).abs() < 1e-6);
    }

    #[test]
    fn test_weight_compounds_across_strokes() {
        let mut mesh = probe_mesh();
        let mut sculptor = Sculptor::default();
        let b = brush(1.0, 0.01, 0.15);
        sculptor.sculpt(&mut mesh, 0, &b, true);
        sculptor.sculpt(&mut mesh, 0, &b, true);

        // Second stroke sees d2c = 1.01, so its factor is 1 + 0.01 / 1.01
        let second = 1.0 + 0.01 / 1.01;
        assert!((mesh.weights()[0] - 1.01 * second).abs() < 1e-5);
    }

    #[test]
    fn test_same_factor_twice_squares_weight() {
        let mut mesh = probe_mesh();
        let b = brush(1.0, 0.01, 0.15);
        let factor = b.radial_factor(1.0, 0.0).unwrap();
        // Apply twice with the anchor reset to its original radius
        for _ in 0..2 {
            apply_radial_sculpt(&mut mesh, 0, &[0], &b);
            mesh.set_position(0, Vec3::Z);
        }
        assert!((mesh.weights()[0] - factor * factor).abs() < 1e-6);
    }

    #[test]
    fn test_pull_moves_inward() {
        let mut mesh = probe_mesh();
        let mut sculptor = Sculptor::default();
        sculptor.sculpt(&mut mesh, 0, &brush(-1.0, 0.02, 0.15), true);
        assert!(mesh.positions()[0].length() < 1.0);
        assert!(mesh.weights()[0] < 1.0);
    }

    #[test]
    fn test_non_positive_threshold_is_noop() {
        let mut mesh = probe_mesh();
        let before = mesh.positions().to_vec();
        let mut sculptor = Sculptor::default();
        let stroke = sculptor.sculpt(&mut mesh, 0, &brush(1.0, 0.01, 0.0), true);
        assert!(stroke.is_empty());
        assert_eq!(mesh.positions(), before.as_slice());
    }

    #[test]
    fn test_origin_vertex_is_skipped() {
        let positions = vec![Vec3::ZERO, Vec3::new(0.05, 0.0, 0.0), Vec3::new(0.0, 0.05, 0.0)];
        let normals = vec![Vec3::Z; 3];
        let mut mesh = SurfaceMesh::from_buffers(positions, normals, vec![0, 1, 2]).unwrap();
        let mut sculptor = Sculptor::default();
        let stroke = sculptor.sculpt(&mut mesh, 0, &brush(1.0, 0.01, 0.15), true);

        assert_eq!(stroke.affected, vec![0, 1, 2]);
        assert_eq!(stroke.modified, vec![1, 2]);
        assert_eq!(mesh.positions()[0], Vec3::ZERO);
        assert_eq!(mesh.weights()[0], 1.0);
    }

    #[test]
    fn test_mow_stroke_resolves_without_displacing() {
        let mut mesh = probe_mesh();
        let before = mesh.positions().to_vec();
        let mut sculptor = Sculptor::default();
        let stroke = sculptor.sculpt(&mut mesh, 0, &brush(1.0, 0.01, 0.15), false);
        assert_eq!(stroke.affected, vec![0, 1]);
        assert!(stroke.modified.is_empty());
        assert_eq!(mesh.positions(), before.as_slice());
    }

    #[test]
    fn test_octree_search_matches_brute_force() {
        let mut brute_mesh = SurfaceMesh::sphere(1.0, 48, 32);
        let mut octree_mesh = brute_mesh.clone();
        let mut brute = Sculptor::new(NeighborSearch::BruteForce);
        let mut octree = Sculptor::new(NeighborSearch::Octree);
        let b = brush(1.0, 0.05, 0.3);

        // Repeated strokes at a few anchors exercise incremental updates
        for anchor in [500u32, 510, 800, 500, 500, 500] {
            let a = brute.sculpt(&mut brute_mesh, anchor, &b, true);
            let o = octree.sculpt(&mut octree_mesh, anchor, &b, true);
            assert_eq!(a, o);
        }
        assert_eq!(brute_mesh.positions(), octree_mesh.positions());
        assert_eq!(brute_mesh.weights(), octree_mesh.weights());
    }
}
