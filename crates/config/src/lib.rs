//! Shared configuration for the planet sculpting demo
//!
//! This crate is the single source of truth for the viewport dimensions and
//! for the live-editable sculpting parameters that a tweaking GUI binds to.
//! The GUI writes through [`ParamStore`] setters; the frame pipeline reads the
//! current values every frame and drains the recorded changes.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

mod params;

pub use params::{
    ConfigError, ParamChange, ParamListener, ParamStore, SculptParams, GRASS_SCALE_RANGE,
    INTENSITY_RANGE, THRESHOLD_RANGE, WATER_HEIGHT_RANGE,
};

/// Default viewport width in pixels
pub const DEFAULT_WIDTH: u32 = 1920;

/// Default viewport height in pixels
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Display configuration for the viewport the scene is rendered into
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct DisplayConfig {
    /// Viewport width in logical pixels
    pub width: u32,
    /// Viewport height in logical pixels
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl DisplayConfig {
    /// Create a new display config with the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, guarded against a zero-height viewport
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Convert a pixel position (origin top-left) to normalized device
    /// coordinates in [-1, 1] x [-1, 1] with +y up.
    pub fn pixel_to_ndc(&self, x: f32, y: f32) -> (f32, f32) {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        ((x / w) * 2.0 - 1.0, -(y / h) * 2.0 + 1.0)
    }
}
