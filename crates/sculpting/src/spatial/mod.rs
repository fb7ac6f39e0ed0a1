//! Spatial index for sculpt neighbor queries.
//!
//! An octree over vertex indices, kept in sync with sculpted positions by
//! remove + insert. Queries use an inclusive radius; callers apply the exact
//! strict distance test so results match a brute-force scan.

use glam::{BVec3, Vec3};

/// Configuration for octree construction.
#[derive(Debug, Clone)]
pub struct OctreeConfig {
    /// Maximum depth of the octree.
    pub max_depth: u32,
    /// Maximum items per leaf node before splitting.
    pub max_items_per_leaf: usize,
    /// Minimum node size (prevents infinite subdivision).
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_items_per_leaf: 16,
            min_node_size: 0.01,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// Octant index of a point: bit 0 for +x, bit 1 for +y, bit 2 for +z.
    fn octant_for_point(&self, point: Vec3) -> usize {
        point.cmpge(self.center()).bitmask() as usize
    }

    fn octant_bounds(&self, octant: usize) -> Aabb {
        let center = self.center();
        let upper = BVec3::new(octant & 1 != 0, octant & 2 != 0, octant & 4 != 0);
        Aabb::new(
            Vec3::select(upper, center, self.min),
            Vec3::select(upper, self.max, center),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct OctreeItem {
    vertex: u32,
    position: Vec3,
}

/// Arena node. Leaves hold items; split nodes hold eight child indices.
#[derive(Debug)]
struct Node {
    bounds: Aabb,
    depth: u32,
    items: Vec<OctreeItem>,
    children: Option<[u32; 8]>,
}

impl Node {
    fn leaf(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }
}

/// Vertex octree stored as a flat node arena. Node 0 is the root.
#[derive(Debug)]
pub struct VertexOctree {
    nodes: Vec<Node>,
    config: OctreeConfig,
    len: usize,
}

impl VertexOctree {
    pub fn new(bounds: Aabb) -> Self {
        Self::with_config(bounds, OctreeConfig::default())
    }

    pub fn with_config(bounds: Aabb, config: OctreeConfig) -> Self {
        Self {
            nodes: vec![Node::leaf(bounds, 0)],
            config,
            len: 0,
        }
    }

    /// Build an octree over positions indexed by their slice position.
    ///
    /// Bounds are padded by `headroom` (fraction of the extent) so vertices
    /// can be sculpted outward without leaving the root.
    pub fn from_positions(positions: &[Vec3], headroom: f32) -> Self {
        let mut bounds = Aabb::empty();
        for &p in positions {
            bounds.include_point(p);
        }
        let padding = bounds.size() * headroom + Vec3::splat(0.001);
        let mut octree = Self::new(Aabb::new(bounds.min - padding, bounds.max + padding));
        for (i, &p) in positions.iter().enumerate() {
            octree.insert(i as u32, p);
        }
        octree
    }

    pub fn bounds(&self) -> Aabb {
        self.nodes[0].bounds
    }

    /// Insert a vertex. Returns false if the position lies outside the root
    /// bounds; the caller should rebuild.
    pub fn insert(&mut self, vertex: u32, position: Vec3) -> bool {
        if !self.bounds().contains_point(position) {
            return false;
        }
        self.insert_below(0, OctreeItem { vertex, position });
        self.len += 1;
        true
    }

    fn leaf_for(&self, mut node: usize, position: Vec3) -> usize {
        while let Some(children) = self.nodes[node].children {
            node = children[self.nodes[node].bounds.octant_for_point(position)] as usize;
        }
        node
    }

    fn insert_below(&mut self, node: usize, item: OctreeItem) {
        let leaf = self.leaf_for(node, item.position);
        self.nodes[leaf].items.push(item);

        let target = &self.nodes[leaf];
        if target.items.len() > self.config.max_items_per_leaf
            && target.depth < self.config.max_depth
            && target.bounds.size().min_element() > self.config.min_node_size * 2.0
        {
            self.split(leaf);
        }
    }

    fn split(&mut self, node: usize) {
        let bounds = self.nodes[node].bounds;
        let depth = self.nodes[node].depth + 1;
        let first = self.nodes.len() as u32;
        self.nodes
            .extend((0..8).map(|octant| Node::leaf(bounds.octant_bounds(octant), depth)));
        self.nodes[node].children = Some(std::array::from_fn(|i| first + i as u32));

        for item in std::mem::take(&mut self.nodes[node].items) {
            self.insert_below(node, item);
        }
    }

    /// Vertices within a sphere (inclusive), unordered.
    pub fn query_sphere(&self, center: Vec3, radius: f32) -> Vec<u32> {
        let radius_sq = radius * radius;
        let mut results = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds.intersects_sphere(center, radius) {
                continue;
            }
            match node.children {
                Some(children) => stack.extend(children.iter().map(|&c| c as usize)),
                None => results.extend(
                    node.items
                        .iter()
                        .filter(|item| item.position.distance_squared(center) <= radius_sq)
                        .map(|item| item.vertex),
                ),
            }
        }
        results
    }

    /// Move a vertex. Returns false if the new position left the root bounds.
    pub fn update(&mut self, vertex: u32, old_position: Vec3, new_position: Vec3) -> bool {
        self.remove(vertex, old_position);
        self.insert(vertex, new_position)
    }

    /// Remove a vertex stored at `position`.
    pub fn remove(&mut self, vertex: u32, position: Vec3) -> bool {
        if !self.bounds().contains_point(position) {
            return false;
        }
        let leaf = self.leaf_for(0, position);
        let items = &mut self.nodes[leaf].items;
        let Some(slot) = items.iter().position(|item| item.vertex == vertex) else {
            return false;
        };
        items.swap_remove(slot);
        self.len -= 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octree_insert_and_query() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
        let mut octree = VertexOctree::new(bounds);

        octree.insert(0, Vec3::new(1.0, 1.0, 1.0));
        octree.insert(1, Vec3::new(2.0, 2.0, 2.0));
        octree.insert(2, Vec3::new(8.0, 8.0, 8.0));

        assert_eq!(octree.len(), 3);

        let results = octree.query_sphere(Vec3::new(1.5, 1.5, 1.5), 1.5);
        assert!(results.contains(&0));
        assert!(results.contains(&1));
        assert!(!results.contains(&2));
    }

    #[test]
    fn test_octree_from_positions_splits() {
        let positions: Vec<Vec3> = (0..200)
            .map(|i| Vec3::new((i % 10) as f32, ((i / 10) % 10) as f32, (i / 100) as f32))
            .collect();
        let octree = VertexOctree::from_positions(&positions, 0.1);
        assert_eq!(octree.len(), 200);

        let mut all = octree.query_sphere(Vec3::new(4.5, 4.5, 0.5), 100.0);
        all.sort_unstable();
        assert_eq!(all, (0..200).collect::<Vec<u32>>());
    }

    #[test]
    fn test_octree_update_moves_vertex() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        let mut octree = VertexOctree::from_positions(&positions, 0.5);

        assert!(octree.update(0, Vec3::ZERO, Vec3::splat(0.9)));
        let near_one = octree.query_sphere(Vec3::ONE, 0.2);
        assert!(near_one.contains(&0));
        assert!(!octree.query_sphere(Vec3::ZERO, 0.1).contains(&0));
        assert_eq!(octree.len(), 4);
    }

    #[test]
    fn test_octree_rejects_outside_root() {
        let positions = [Vec3::ZERO, Vec3::ONE];
        let mut octree = VertexOctree::from_positions(&positions, 0.1);
        assert!(!octree.update(1, Vec3::ONE, Vec3::splat(50.0)));
        assert_eq!(octree.len(), 1);
    }
}
