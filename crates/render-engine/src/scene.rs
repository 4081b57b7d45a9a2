//! Rendering one scene into one clip.

use std::path::Path;

use docreel_common::error::{ReelError, ReelResult};
use docreel_processing_core::filter_graph::FilterGraphBuilder;
use docreel_processing_core::text_overlay::{OverlayPrimitive, TextOverlayEngine};
use docreel_processing_core::timing::DurationPolicy;
use docreel_project_model::motion::MotionPreset;
use docreel_project_model::project::{Scene, TextOverlay};

use crate::clip::{remove_quietly, RenderedClip};
use crate::engine::{MediaEngine, MediaInput, RenderRequest};

/// Invokes the compositor once per scene.
pub struct SceneRenderer<'a> {
    engine: &'a dyn MediaEngine,
    overlays: &'a TextOverlayEngine,
    graphs: &'a FilterGraphBuilder,
    policy: DurationPolicy,
}

impl<'a> SceneRenderer<'a> {
    pub fn new(
        engine: &'a dyn MediaEngine,
        overlays: &'a TextOverlayEngine,
        graphs: &'a FilterGraphBuilder,
        policy: DurationPolicy,
    ) -> Self {
        Self {
            engine,
            overlays,
            graphs,
            policy,
        }
    }

    /// Clip length for `scene`: narration length plus pad when there is
    /// narration, otherwise the explicit or default length, never below
    /// the floor.
    pub fn resolve_duration(&self, scene: &Scene) -> ReelResult<f64> {
        let audio_secs = match &scene.audio {
            Some(audio) => Some(self.engine.probe(audio)?.duration_secs),
            None => None,
        };
        Ok(self.policy.resolve(audio_secs, scene.duration))
    }

    /// Render `scene` to `output`.
    ///
    /// `unit` names the scene in errors and logs. Missing inputs fail with
    /// `InputMissing` before the engine runs; engine failures come back as
    /// `Render` errors for `unit`. A partial output is removed on failure.
    pub fn render(
        &self,
        scene: &Scene,
        unit: &str,
        preset: &MotionPreset,
        overlay: Option<&TextOverlay>,
        output: &Path,
    ) -> ReelResult<RenderedClip> {
        if !scene.image.is_file() {
            return Err(ReelError::input_missing(unit, &scene.image));
        }
        if let Some(audio) = &scene.audio {
            if !audio.is_file() {
                return Err(ReelError::input_missing(unit, audio));
            }
        }

        let duration_secs = self.resolve_duration(scene)?;
        let primitives = self.overlay_primitives(overlay, duration_secs, unit);
        let graph = self.graphs.build_scene(preset, &primitives, duration_secs);

        let audio_input = match &scene.audio {
            Some(audio) => MediaInput::File(audio.clone()),
            None => MediaInput::Silence,
        };
        let request = RenderRequest {
            filter_complex: graph.filter_complex,
            inputs: vec![MediaInput::Still(scene.image.clone()), audio_input],
            output: output.to_path_buf(),
            duration_secs,
        };

        tracing::debug!(
            unit,
            preset = %preset.id,
            duration_secs,
            frames = graph.frames,
            overlay_primitives = primitives.len(),
            "Rendering scene"
        );

        if let Err(e) = self.engine.render(&request) {
            remove_quietly(output);
            let message = match e {
                ReelError::Render { message, .. } => message,
                other => other.to_string(),
            };
            return Err(ReelError::render(unit, message));
        }

        tracing::info!(unit, duration_secs, preset = %preset.id, "Rendered scene");
        Ok(RenderedClip::new(output, duration_secs))
    }

    /// Lay out `overlay`, dropping it when it cannot be shown in this clip.
    fn overlay_primitives(
        &self,
        overlay: Option<&TextOverlay>,
        duration_secs: f64,
        unit: &str,
    ) -> Vec<OverlayPrimitive> {
        let Some(overlay) = overlay else {
            return vec![];
        };
        if overlay.start >= duration_secs {
            tracing::warn!(
                unit,
                start = overlay.start,
                duration_secs,
                "Overlay starts after the clip ends, dropping it"
            );
            return vec![];
        }
        match self.overlays.layout(overlay) {
            Ok(primitives) => primitives,
            Err(e) => {
                tracing::warn!(unit, error = %e, "Overlay rejected, rendering without it");
                vec![]
            }
        }
    }
}
