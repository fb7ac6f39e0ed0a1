//! Sculpt brush settings and the radial displacement factor.

use planet_config::SculptParams;
use serde::{Deserialize, Serialize};

/// Influence of the brush at a normalized distance from the anchor
/// (0 at the anchor, 1 at the threshold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FalloffCurve {
    /// `1 - d`
    #[default]
    Linear,
    /// Smoothstep of `1 - d`; flat near the anchor, soft at the rim
    Smooth,
}

impl FalloffCurve {
    pub fn evaluate(&self, normalized_distance: f32) -> f32 {
        let t = 1.0 - normalized_distance.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Per-frame brush settings read from the parameter store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SculptBrush {
    /// +1 pushes outward, -1 pulls inward
    pub sign: f32,
    /// Radial displacement per frame at the anchor
    pub intensity: f32,
    /// Neighbor cutoff distance in object space
    pub threshold: f32,
    pub falloff: FalloffCurve,
}

impl Default for SculptBrush {
    fn default() -> Self {
        Self::from_params(&SculptParams::default())
    }
}

impl SculptBrush {
    pub fn from_params(params: &SculptParams) -> Self {
        Self {
            sign: params.sculpt_sign,
            intensity: params.intensity,
            threshold: params.threshold,
            falloff: FalloffCurve::Linear,
        }
    }

    /// Whether a vertex at `distance` from the anchor is inside the brush.
    /// The boundary itself is excluded.
    pub fn contains(&self, distance: f32) -> bool {
        distance < self.threshold
    }

    /// Scale factor applied about the local origin to a vertex at
    /// `dist_to_center` from the origin and `distance` from the anchor.
    ///
    /// `1 + sign * |1 - (d2c + sign * intensity) / d2c| * falloff`. Returns
    /// `None` outside the brush or for a vertex at the origin.
    pub fn radial_factor(&self, dist_to_center: f32, distance: f32) -> Option<f32> {
        if self.threshold <= 0.0 || !self.contains(distance) || dist_to_center == 0.0 {
            return None;
        }
        let radial = ((dist_to_center + self.sign * self.intensity) / dist_to_center - 1.0).abs();
        let falloff = self.falloff.evaluate(distance / self.threshold);
        Some(1.0 + self.sign * radial * falloff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falloff_curves() {
        for curve in [FalloffCurve::Linear, FalloffCurve::Smooth] {
            assert!((curve.evaluate(0.0) - 1.0).abs() < 1e-6);
            assert!(curve.evaluate(1.0).abs() < 1e-6);
            assert!(curve.evaluate(1.5).abs() < 1e-6);
        }
        assert!((FalloffCurve::Linear.evaluate(0.25) - 0.75).abs() < 1e-6);
        assert!((FalloffCurve::Smooth.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert!(FalloffCurve::Smooth.evaluate(0.1) > FalloffCurve::Linear.evaluate(0.1));
    }

    #[test]
    fn test_anchor_factor_push() {
        let brush = SculptBrush {
            sign: 1.0,
            intensity: 0.01,
            threshold: 0.15,
            falloff: FalloffCurve::Linear,
        };
        let factor = brush.radial_factor(1.0, 0.0).unwrap();
        assert!((factor - 1.01).abs() < 1e-6);
    }

    #[test]
    fn test_anchor_factor_pull() {
        let brush = SculptBrush {
            sign: -1.0,
            intensity: 0.02,
            threshold: 0.15,
            falloff: FalloffCurve::Linear,
        };
        let factor = brush.radial_factor(2.0, 0.0).unwrap();
        assert!((factor - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_factor_decays_to_one_at_boundary() {
        let brush = SculptBrush::default();
        let half = brush.radial_factor(1.0, brush.threshold * 0.5).unwrap();
        assert!((half - 1.005).abs() < 1e-6);
        let near_edge = brush.radial_factor(1.0, brush.threshold * 0.999).unwrap();
        assert!((near_edge - 1.0).abs() < 1e-4);
        assert!(brush.radial_factor(1.0, brush.threshold).is_none());
    }

    #[test]
    fn test_degenerate_inputs_skip() {
        let brush = SculptBrush::default();
        assert!(brush.radial_factor(0.0, 0.0).is_none());

        let flat = SculptBrush {
            threshold: 0.0,
            ..brush
        };
        assert!(flat.radial_factor(1.0, 0.0).is_none());
    }
}
