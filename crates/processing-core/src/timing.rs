//! Scene duration resolution and crossfade offset planning.

use docreel_common::config::RenderSettings;
use docreel_common::error::{ReelError, ReelResult};
use serde::Serialize;

/// How long a scene lasts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationPolicy {
    /// Hard floor for any scene.
    pub min_secs: f64,
    /// Used when there is neither narration nor an explicit duration.
    pub default_secs: f64,
    /// Silence kept after narration ends.
    pub audio_pad_secs: f64,
}

impl DurationPolicy {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            min_secs: settings.min_scene_secs,
            default_secs: settings.default_scene_secs,
            audio_pad_secs: settings.audio_pad_secs,
        }
    }

    /// Resolve a scene's clip length.
    ///
    /// Narration wins: `audio + pad`. Without narration, the explicit length
    /// or the default. Either way the result is clamped to the floor.
    pub fn resolve(&self, audio_secs: Option<f64>, explicit_secs: Option<f64>) -> f64 {
        let raw = match audio_secs {
            Some(audio) => audio + self.audio_pad_secs,
            None => explicit_secs
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(self.default_secs),
        };
        raw.max(self.min_secs)
    }
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default())
    }
}

/// Number of frames in a clip of `duration_secs` at `fps`. Never zero.
pub fn frame_count(duration_secs: f64, fps: u32) -> u64 {
    ((duration_secs * fps as f64).round() as u64).max(1)
}

/// Offsets for a chain of crossfades over clips of known length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossfadePlan {
    /// Input clip lengths, in order.
    pub durations: Vec<f64>,
    /// Length of every crossfade.
    pub transition_secs: f64,
    /// Start of crossfade `i` (between clip `i` and `i + 1`) on the output
    /// timeline. Strictly increasing.
    pub offsets: Vec<f64>,
    /// Length of the composed output.
    pub total_secs: f64,
}

/// Plan `n - 1` chained crossfades.
///
/// `offset_i = offset_{i-1} + d_i - g`, starting from zero. Fails before
/// anything is rendered when a transition does not fit strictly inside
/// both clips it bridges, since that would produce a negative or
/// non-increasing offset.
pub fn plan_crossfades(durations: &[f64], transition_secs: f64) -> ReelResult<CrossfadePlan> {
    if durations.len() < 2 {
        return Err(ReelError::transition(format!(
            "a crossfade chain needs at least two clips, got {}",
            durations.len()
        )));
    }
    if !(transition_secs > 0.0) || !transition_secs.is_finite() {
        return Err(ReelError::transition(format!(
            "transition length must be positive, got {transition_secs}"
        )));
    }
    if let Some((i, d)) = durations
        .iter()
        .enumerate()
        .find(|(_, d)| !(**d > 0.0) || !d.is_finite())
    {
        return Err(ReelError::transition(format!(
            "clip {i} has unusable duration {d}"
        )));
    }
    for (i, pair) in durations.windows(2).enumerate() {
        let shorter = pair[0].min(pair[1]);
        if transition_secs >= shorter {
            return Err(ReelError::transition(format!(
                "transition of {transition_secs}s does not fit between clip {i} ({:.3}s) and clip {} ({:.3}s)",
                pair[0],
                i + 1,
                pair[1]
            )));
        }
    }

    let mut offsets = Vec::with_capacity(durations.len() - 1);
    let mut cumulative = 0.0;
    for d in &durations[..durations.len() - 1] {
        let offset = cumulative + d - transition_secs;
        offsets.push(offset);
        cumulative = offset;
    }

    let total_secs = cumulative + durations[durations.len() - 1];
    Ok(CrossfadePlan {
        durations: durations.to_vec(),
        transition_secs,
        offsets,
        total_secs,
    })
}
