//! Camera state needed for picking.
//!
//! A perspective camera that turns normalized device coordinates into world
//! rays, and an orbit controller that places it around the planet.
//!
//! Orbit controls:
//! - Free-orbit mode drag: orbit around target
//! - Zoom: dolly toward / away from target

use glam::{Mat4, Vec2, Vec3};
use planet_config::DisplayConfig;

use crate::types::Ray;

/// Perspective camera in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width over height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 75f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection with depth mapped to [0, 1].
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio after a viewport resize.
    pub fn set_viewport(&mut self, display: &DisplayConfig) {
        self.aspect = display.aspect_ratio();
    }

    /// Build the world ray from the camera through a point in normalized
    /// device coordinates ([-1, 1] on both axes, +y up).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let on_near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        Ray::new(self.position, on_near - self.position)
    }

    /// Project a world point to normalized device coordinates.
    pub fn world_to_ndc(&self, point: Vec3) -> Vec3 {
        self.view_projection().project_point3(point)
    }
}

/// Orbit controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Point the camera orbits around
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle (yaw) in radians
    pub yaw: f32,
    /// Vertical angle (pitch) in radians
    pub pitch: f32,
    /// Orbit sensitivity (radians per NDC unit)
    pub orbit_sensitivity: f32,
    /// Zoom sensitivity (distance units per step)
    pub zoom_sensitivity: f32,
    /// Minimum distance from target
    pub min_distance: f32,
    /// Maximum distance from target
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        // Looking at the planet from +Z
        Self {
            target: Vec3::ZERO,
            distance: 3.0,
            yaw: 0.0,
            pitch: 0.0,
            orbit_sensitivity: std::f32::consts::PI,
            zoom_sensitivity: 0.25,
            min_distance: 1.2,
            max_distance: 20.0,
        }
    }
}

impl OrbitCamera {
    const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

    /// Calculate camera position from orbit parameters
    pub fn calculate_position(&self) -> Vec3 {
        // Pitch is the angle from horizontal, yaw the angle around Y
        let horizontal_distance = self.distance * self.pitch.cos();
        let y = self.distance * self.pitch.sin();
        let x = horizontal_distance * self.yaw.sin();
        let z = horizontal_distance * self.yaw.cos();

        self.target + Vec3::new(x, y, z)
    }

    /// Orbit by a pointer delta in NDC units.
    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.orbit_sensitivity;
        self.pitch = (self.pitch - delta.y * self.orbit_sensitivity)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Dolly toward (positive steps) or away from the target.
    pub fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance - steps * self.zoom_sensitivity)
            .clamp(self.min_distance, self.max_distance);
    }

    /// Write the orbit pose into a camera.
    pub fn apply(&self, camera: &mut PerspectiveCamera) {
        camera.position = self.calculate_position();
        camera.target = self.target;
    }

    /// Reset to default view
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = PerspectiveCamera::default();
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert_eq!(ray.origin, camera.position);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_ray_through_projected_point() {
        let camera = PerspectiveCamera {
            aspect: 1.5,
            ..Default::default()
        };
        let world = Vec3::new(0.4, -0.3, 0.2);
        let ndc = camera.world_to_ndc(world);
        let ray = camera.ray_from_ndc(ndc.truncate());
        let expected = (world - camera.position).normalize();
        assert!((ray.direction - expected).length() < 1e-4);
    }

    #[test]
    fn test_ndc_up_is_world_up() {
        let camera = PerspectiveCamera::default();
        let ray = camera.ray_from_ndc(Vec2::new(0.0, 0.5));
        assert!(ray.direction.y > 0.0);
        let ray = camera.ray_from_ndc(Vec2::new(0.5, 0.0));
        assert!(ray.direction.x > 0.0);
    }

    #[test]
    fn test_orbit_default_position() {
        let orbit = OrbitCamera::default();
        assert!((orbit.calculate_position() - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_orbit_keeps_distance_and_clamps_pitch() {
        let mut orbit = OrbitCamera::default();
        orbit.orbit(Vec2::new(0.3, -10.0));
        assert!(orbit.pitch <= OrbitCamera::PITCH_LIMIT);
        assert!((orbit.calculate_position().length() - orbit.distance).abs() < 1e-5);

        orbit.zoom(100.0);
        assert_eq!(orbit.distance, orbit.min_distance);
        orbit.reset();
        assert_eq!(orbit, OrbitCamera::default());
    }
}
