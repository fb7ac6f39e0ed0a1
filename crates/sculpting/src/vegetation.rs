//! Instanced vegetation scattered over the surface.
//!
//! Instances are placed once from seeded random vertex samples. Each one keeps
//! its anchor vertex index for life: non-mow sculpting drags visible
//! instances along with their anchor and refreshes the anchor's cumulative
//! sculpt weight, which the renderer reads per instance to drive scale and
//! fade. Mow strokes hide instances for good.
//!
//! Transforms are in the surface's object space; the renderer applies the
//! surface transform on top.

use glam::{Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI};
use tracing::{debug, info};

use crate::gpu::InstanceRaw;
use crate::mesh::SurfaceMesh;

/// Axis of the instance model that is aligned with the surface normal.
pub const REFERENCE_AXIS: Vec3 = Vec3::Y;

/// Rotation taking [`REFERENCE_AXIS`] onto `normal`.
///
/// Axis is the cross product of the two, angle the arccosine of their dot
/// product. Antiparallel input flips about X.
pub fn align_to_normal(normal: Vec3) -> Quat {
    let Some(n) = normal.try_normalize() else {
        return Quat::IDENTITY;
    };
    let cos = REFERENCE_AXIS.dot(n).clamp(-1.0, 1.0);
    let axis = REFERENCE_AXIS.cross(n);
    if axis.length_squared() < 1e-12 {
        return if cos > 0.0 {
            Quat::IDENTITY
        } else {
            Quat::from_axis_angle(Vec3::X, PI)
        };
    }
    Quat::from_axis_angle(axis.normalize(), cos.acos())
}

/// Alignment to `normal` followed by a twist of `twist` radians about it.
pub fn instance_orientation(normal: Vec3, twist: f32) -> Quat {
    let align = align_to_normal(normal);
    match normal.try_normalize() {
        Some(n) => Quat::from_axis_angle(n, twist) * align,
        None => align,
    }
}

/// Fixed-size set of vegetation instances anchored to surface vertices.
#[derive(Debug, Clone)]
pub struct VegetationField {
    anchors: Vec<u32>,
    rotations: Vec<Quat>,
    transforms: Vec<InstanceRaw>,
    /// Cumulative sculpt weight of each instance's anchor vertex
    anchor_weights: Vec<f32>,
    hidden: Vec<bool>,
    /// Instances per anchor vertex; samples may collide
    by_anchor: HashMap<u32, Vec<u32>>,
    seed: u64,
    dirty: bool,
}

impl VegetationField {
    /// Scatter `count` instances over random vertices of the surface.
    pub fn place(mesh: &SurfaceMesh, count: usize, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let vertex_count = mesh.vertex_count() as u32;

        let mut anchors = Vec::with_capacity(count);
        let mut rotations = Vec::with_capacity(count);
        let mut transforms = Vec::with_capacity(count);
        let mut by_anchor: HashMap<u32, Vec<u32>> = HashMap::new();

        if vertex_count > 0 {
            for instance in 0..count as u32 {
                let anchor = rng.random_range(0..vertex_count);
                let twist = rng.random_range(0.0..=FRAC_PI_2);
                let position = mesh.positions()[anchor as usize];
                let rotation = instance_orientation(mesh.normals()[anchor as usize], twist);

                anchors.push(anchor);
                rotations.push(rotation);
                transforms.push(InstanceRaw::from_mat4(Mat4::from_rotation_translation(
                    rotation, position,
                )));
                by_anchor.entry(anchor).or_default().push(instance);
            }
        }

        info!(
            instances = anchors.len(),
            distinct_anchors = by_anchor.len(),
            seed,
            "Placed vegetation"
        );

        let hidden = vec![false; anchors.len()];
        let anchor_weights = anchors
            .iter()
            .map(|&a| mesh.weights()[a as usize])
            .collect();
        Self {
            anchors,
            rotations,
            transforms,
            anchor_weights,
            hidden,
            by_anchor,
            seed,
            dirty: true,
        }
    }

    /// Re-scatter with a new instance count, reusing the seed.
    pub fn replace(&mut self, mesh: &SurfaceMesh, count: usize) {
        *self = Self::place(mesh, count, self.seed);
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn anchors(&self) -> &[u32] {
        &self.anchors
    }

    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    /// Upload buffer, one transform per instance.
    pub fn transforms(&self) -> &[InstanceRaw] {
        &self.transforms
    }

    /// Upload buffer, one anchor weight per instance.
    pub fn anchor_weights(&self) -> &[f32] {
        &self.anchor_weights
    }

    pub fn is_hidden(&self, instance: usize) -> bool {
        self.hidden.get(instance).copied().unwrap_or(false)
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.iter().filter(|&&h| h).count()
    }

    /// Hide every instance anchored in `affected`. One-way.
    ///
    /// Returns the number of newly hidden instances.
    pub fn mow(&mut self, affected: &[u32]) -> usize {
        let mut newly_hidden = 0;
        for vertex in affected {
            let Some(instances) = self.by_anchor.get(vertex) else {
                continue;
            };
            for &instance in instances {
                let i = instance as usize;
                if !self.hidden[i] {
                    self.hidden[i] = true;
                    self.transforms[i] = InstanceRaw::hidden();
                    newly_hidden += 1;
                }
            }
        }
        if newly_hidden > 0 {
            self.dirty = true;
            debug!(newly_hidden, total_hidden = self.hidden_count(), "Mowed vegetation");
        }
        newly_hidden
    }

    /// Move visible instances anchored at `moved` vertices to the vertices'
    /// current positions. Orientation is kept.
    ///
    /// Returns the number of instances updated.
    pub fn follow_anchors(&mut self, mesh: &SurfaceMesh, moved: &[u32]) -> usize {
        let mut updated = 0;
        for &vertex in moved {
            let Some(instances) = self.by_anchor.get(&vertex) else {
                continue;
            };
            let Some(position) = mesh.position(vertex) else {
                continue;
            };
            for &instance in instances {
                let i = instance as usize;
                if self.hidden[i] {
                    continue;
                }
                self.transforms[i] =
                    InstanceRaw::from_mat4(Mat4::from_rotation_translation(self.rotations[i], position));
                updated += 1;
            }
        }
        if updated > 0 {
            self.dirty = true;
        }
        updated
    }

    /// Copy the current sculpt weight of each `modified` vertex into the
    /// instances anchored there, hidden ones included.
    ///
    /// Returns the number of instance weights that changed.
    pub fn sync_anchor_weights(&mut self, mesh: &SurfaceMesh, modified: &[u32]) -> usize {
        let mut changed = 0;
        for &vertex in modified {
            let (Some(instances), Some(weight)) = (self.by_anchor.get(&vertex), mesh.weight(vertex)) else {
                continue;
            };
            for &instance in instances {
                let slot = &mut self.anchor_weights[instance as usize];
                if *slot != weight {
                    *slot = weight;
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and clear the dirty flag. Called after the instance buffer has
    /// been uploaded.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
