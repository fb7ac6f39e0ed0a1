//! Live-editable sculpting parameters.
//!
//! Every field is a plain scalar. Writes are whole-value assignments, so a
//! frame that reads the store always sees a coherent value per field.

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Slider range for the displacement magnitude.
pub const INTENSITY_RANGE: RangeInclusive<f32> = 0.0..=0.05;

/// Slider range for the neighbor search cutoff distance.
pub const THRESHOLD_RANGE: RangeInclusive<f32> = 0.1..=0.3;

/// Slider range for the grass blade scale uniform.
pub const GRASS_SCALE_RANGE: RangeInclusive<f32> = 0.0..=0.08;

/// Slider range for the water sphere radius.
pub const WATER_HEIGHT_RANGE: RangeInclusive<f32> = 0.8..=1.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("sculpt_sign must be -1 or 1, got {0}")]
    InvalidSign(f32),
}

/// Parameters the tweaking GUI binds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct SculptParams {
    /// Push (+1) or pull (-1)
    pub sculpt_sign: f32,
    /// Displacement magnitude per sculpted frame
    pub intensity: f32,
    /// Neighbor search cutoff in object space
    pub threshold: f32,
    /// Grass blade scale passed to the instance shader
    pub grass_scale: f32,
    /// Radius of the water sphere
    pub water_height: f32,
    /// Display-only wireframe toggle
    pub wireframe: bool,
}

impl Default for SculptParams {
    fn default() -> Self {
        Self {
            sculpt_sign: 1.0,
            intensity: 0.01,
            threshold: 0.15,
            grass_scale: 0.04,
            water_height: 0.98,
            wireframe: true,
        }
    }
}

impl SculptParams {
    /// Parse parameters from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let params = Self::from_json_str(&json)?;
        info!(path = %path.display(), "Loaded sculpt parameters");
        Ok(params)
    }

    /// Check every field against its GUI range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sculpt_sign != 1.0 && self.sculpt_sign != -1.0 {
            return Err(ConfigError::InvalidSign(self.sculpt_sign));
        }
        check_range("intensity", self.intensity, &INTENSITY_RANGE)?;
        check_range("threshold", self.threshold, &THRESHOLD_RANGE)?;
        check_range("grass_scale", self.grass_scale, &GRASS_SCALE_RANGE)?;
        check_range("water_height", self.water_height, &WATER_HEIGHT_RANGE)?;
        Ok(())
    }
}

fn check_range(
    field: &'static str,
    value: f32,
    range: &RangeInclusive<f32>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Clamp a slider write into `range`. Non-finite writes are dropped.
fn clamp_to(field: &'static str, value: f32, range: &RangeInclusive<f32>) -> Option<f32> {
    if !value.is_finite() {
        warn!(field, value, "Ignoring non-finite parameter value");
        return None;
    }
    Some(value.clamp(*range.start(), *range.end()))
}

/// A single field change, delivered to listeners and to the frame pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamChange {
    SculptSign(f32),
    Intensity(f32),
    Threshold(f32),
    GrassScale(f32),
    WaterHeight(f32),
    Wireframe(bool),
}

/// Change-notification callback.
pub type ParamListener = Box<dyn FnMut(&ParamChange) + Send>;

/// Parameter store with change notification.
///
/// Setters clamp to the GUI ranges, skip no-op writes, notify subscribers
/// immediately, and queue the change for [`ParamStore::drain_changes`].
pub struct ParamStore {
    params: SculptParams,
    pending: Vec<ParamChange>,
    listeners: Vec<ParamListener>,
}

impl std::fmt::Debug for ParamStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamStore")
            .field("params", &self.params)
            .field("pending", &self.pending)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new(SculptParams::default())
    }
}

impl ParamStore {
    pub fn new(params: SculptParams) -> Self {
        Self {
            params,
            pending: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Current values.
    pub fn params(&self) -> &SculptParams {
        &self.params
    }

    /// Register a change callback.
    pub fn subscribe(&mut self, listener: impl FnMut(&ParamChange) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Take all changes recorded since the last drain, oldest first.
    pub fn drain_changes(&mut self) -> Vec<ParamChange> {
        std::mem::take(&mut self.pending)
    }

    /// Set the sculpt direction. Any value snaps to -1 or 1 (step 2 slider).
    pub fn set_sculpt_sign(&mut self, sign: f32) {
        if sign.is_nan() {
            warn!(field = "sculpt_sign", value = sign, "Ignoring non-finite parameter value");
            return;
        }
        let sign = if sign < 0.0 { -1.0 } else { 1.0 };
        if self.params.sculpt_sign != sign {
            self.params.sculpt_sign = sign;
            self.notify(ParamChange::SculptSign(sign));
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        let Some(intensity) = clamp_to("intensity", intensity, &INTENSITY_RANGE) else {
            return;
        };
        if self.params.intensity != intensity {
            self.params.intensity = intensity;
            self.notify(ParamChange::Intensity(intensity));
        }
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        let Some(threshold) = clamp_to("threshold", threshold, &THRESHOLD_RANGE) else {
            return;
        };
        if self.params.threshold != threshold {
            self.params.threshold = threshold;
            self.notify(ParamChange::Threshold(threshold));
        }
    }

    pub fn set_grass_scale(&mut self, scale: f32) {
        let Some(scale) = clamp_to("grass_scale", scale, &GRASS_SCALE_RANGE) else {
            return;
        };
        if self.params.grass_scale != scale {
            self.params.grass_scale = scale;
            self.notify(ParamChange::GrassScale(scale));
        }
    }

    pub fn set_water_height(&mut self, height: f32) {
        let Some(height) = clamp_to("water_height", height, &WATER_HEIGHT_RANGE) else {
            return;
        };
        if self.params.water_height != height {
            self.params.water_height = height;
            self.notify(ParamChange::WaterHeight(height));
        }
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        if self.params.wireframe != wireframe {
            self.params.wireframe = wireframe;
            self.notify(ParamChange::Wireframe(wireframe));
        }
    }

    fn notify(&mut self, change: ParamChange) {
        debug!(?change, "Parameter changed");
        for listener in &mut self.listeners {
            listener(&change);
        }
        self.pending.push(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_defaults_are_valid() {
        let params = SculptParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.sculpt_sign, 1.0);
        assert!((params.threshold - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params = SculptParams::from_json_str(r#"{ "intensity": 0.02 }"#).unwrap();
        assert!((params.intensity - 0.02).abs() < 1e-6);
        assert_eq!(params.threshold, SculptParams::default().threshold);
    }

    #[test]
    fn test_out_of_range_json_rejected() {
        let err = SculptParams::from_json_str(r#"{ "threshold": 0.9 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "threshold",
                ..
            }
        ));

        let err = SculptParams::from_json_str(r#"{ "sculpt_sign": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSign(_)));
    }

    #[test]
    fn test_setters_clamp_and_snap() {
        let mut store = ParamStore::default();
        store.set_intensity(1.0);
        store.set_threshold(0.0);
        store.set_sculpt_sign(-0.3);
        assert!((store.params().intensity - 0.05).abs() < 1e-6);
        assert!((store.params().threshold - 0.1).abs() < 1e-6);
        assert_eq!(store.params().sculpt_sign, -1.0);
    }

    #[test]
    fn test_setters_reject_non_finite() {
        let mut store = ParamStore::default();
        let before = store.params().clone();
        for value in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            store.set_intensity(value);
            store.set_threshold(value);
            store.set_grass_scale(value);
            store.set_water_height(value);
        }
        store.set_sculpt_sign(f32::NAN);

        assert_eq!(store.params(), &before);
        assert!(store.drain_changes().is_empty());

        // Finite writes still go through afterwards
        store.set_intensity(0.03);
        assert_eq!(store.drain_changes(), vec![ParamChange::Intensity(0.03)]);
    }

    #[test]
    fn test_changes_queue_and_notify() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut store = ParamStore::default();
        store.subscribe(move |change| sink.lock().unwrap().push(*change));

        store.set_water_height(1.2);
        store.set_wireframe(false);
        // Unchanged value does not notify
        store.set_wireframe(false);

        let drained = store.drain_changes();
        assert_eq!(
            drained,
            vec![ParamChange::WaterHeight(1.2), ParamChange::Wireframe(false)]
        );
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(store.drain_changes().is_empty());
    }
}
