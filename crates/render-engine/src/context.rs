use docreel_common::cancel::CancellationToken;
use docreel_common::config::RenderSettings;
use docreel_processing_core::filter_graph::FilterGraphBuilder;
use docreel_processing_core::motion::MotionLibrary;
use docreel_processing_core::text_overlay::TextOverlayEngine;
use docreel_processing_core::timing::DurationPolicy;

use crate::clip::ScratchDir;
use crate::engine::MediaEngine;
use crate::scene::SceneRenderer;
use crate::transition::TransitionComposer;

/// Borrowed view of everything a pipeline stage needs.
///
/// Cheap to copy; each assembler holds one and hands it down.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub engine: &'a dyn MediaEngine,
    pub settings: &'a RenderSettings,
    pub motion: &'a MotionLibrary,
    pub overlays: &'a TextOverlayEngine,
    pub graphs: &'a FilterGraphBuilder,
    pub scratch: &'a ScratchDir,
    pub cancel: &'a CancellationToken,
}

impl<'a> RenderContext<'a> {
    pub fn scene_renderer(&self) -> SceneRenderer<'a> {
        SceneRenderer::new(
            self.engine,
            self.overlays,
            self.graphs,
            DurationPolicy::from_settings(self.settings),
        )
    }

    pub fn composer(&self) -> TransitionComposer<'a> {
        TransitionComposer::new(self.engine, self.graphs)
    }

    /// Crossfade length to request for `clip_count` clips, or `None` for
    /// hard cuts.
    pub fn transition_for(&self, clip_count: usize) -> Option<f64> {
        let s = self.settings;
        if s.transitions_enabled
            && s.transition_secs > 0.0
            && (2..=s.max_crossfade_clips).contains(&clip_count)
        {
            Some(s.transition_secs)
        } else {
            None
        }
    }
}
