//! Easing curve shared by every camera interpolation.

use std::f64::consts::PI;

/// Cosine ease-in-out: `(1 - cos(t·π)) / 2`.
///
/// Zero velocity at both ends, so a camera move never starts or stops with
/// a visible jolt. Input is clamped to `[0, 1]`.
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    (1.0 - (t * PI).cos()) / 2.0
}

/// The same curve as an ffmpeg expression over `progress`.
pub fn ease_expr(progress: &str) -> String {
    format!("(1-cos(PI*{progress}))/2")
}
