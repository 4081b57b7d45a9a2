//! Camera-motion presets for still images.
//!
//! A preset describes a simulated camera move as a start and end state.
//! Each state is a zoom factor plus the point of the source image that sits
//! at the center of the frame. Pan anchors are normalized: `(0.0, 0.0)` is
//! the top-left of the source, `(1.0, 1.0)` the bottom-right.

use serde::{Deserialize, Serialize};

/// A normalized point on the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanAnchor {
    pub x: f64,
    pub y: f64,
}

impl PanAnchor {
    /// Center of the source image.
    pub const CENTER: PanAnchor = PanAnchor { x: 0.5, y: 0.5 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Interpolate between two anchors with an already-eased progress value.
    pub fn lerp(a: &PanAnchor, b: &PanAnchor, t: f64) -> PanAnchor {
        PanAnchor {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }

    fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// Named start/end zoom-and-pan parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionPreset {
    /// Registry key, e.g. `zoom_in`.
    pub id: String,
    /// Zoom factor at the first frame (1.0 = whole image).
    pub start_zoom: f64,
    /// Zoom factor at the last frame.
    pub end_zoom: f64,
    /// Frame center at the first frame.
    pub start_anchor: PanAnchor,
    /// Frame center at the last frame.
    pub end_anchor: PanAnchor,
}

impl MotionPreset {
    pub fn new(
        id: impl Into<String>,
        (start_zoom, end_zoom): (f64, f64),
        start_anchor: PanAnchor,
        end_anchor: PanAnchor,
    ) -> Self {
        Self {
            id: id.into(),
            start_zoom,
            end_zoom,
            start_anchor,
            end_anchor,
        }
    }

    /// Check the preset never asks the camera to show anything outside the
    /// source image at either endpoint.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.start_zoom >= 1.0) || !(self.end_zoom >= 1.0) {
            return Err(format!(
                "preset '{}' zoom factors must be >= 1.0 (got {} -> {})",
                self.id, self.start_zoom, self.end_zoom
            ));
        }
        if !self.start_anchor.is_normalized() || !self.end_anchor.is_normalized() {
            return Err(format!(
                "preset '{}' pan anchors must lie within [0, 1]",
                self.id
            ));
        }
        for (zoom, anchor) in [
            (self.start_zoom, self.start_anchor),
            (self.end_zoom, self.end_anchor),
        ] {
            if !window_fits(zoom, anchor) {
                return Err(format!(
                    "preset '{}' frames outside the source at zoom {zoom} centered on ({}, {})",
                    self.id, anchor.x, anchor.y
                ));
            }
        }
        Ok(())
    }
}

/// Whether a frame at `zoom` centered on `anchor` stays inside the source.
///
/// The visible window is `1/zoom` of the source on each axis, so its center
/// must keep half of that away from every edge.
pub fn window_fits(zoom: f64, anchor: PanAnchor) -> bool {
    const EPS: f64 = 1e-9;
    let half = 0.5 / zoom;
    anchor.x + EPS >= half
        && anchor.x <= 1.0 - half + EPS
        && anchor.y + EPS >= half
        && anchor.y <= 1.0 - half + EPS
}
