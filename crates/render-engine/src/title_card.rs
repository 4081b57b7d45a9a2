//! Synthesized opening card: the project title (and year) over a blurred
//! still or a plain dark background.

use std::path::Path;

use docreel_common::error::{ReelError, ReelResult};
use docreel_processing_core::filter_graph::{FilterGraphBuilder, TitleBackground};
use docreel_processing_core::text_overlay::TextOverlayEngine;
use docreel_project_model::project::TextOverlay;

use crate::clip::{remove_quietly, RenderedClip};
use crate::engine::{MediaEngine, MediaInput, RenderRequest};

const BACKGROUND_COLOR: &str = "0x14110f";
const TITLE_START_SECS: f64 = 0.3;
const SUBTITLE_START_SECS: f64 = 0.8;

pub struct TitleCardBuilder<'a> {
    engine: &'a dyn MediaEngine,
    overlays: &'a TextOverlayEngine,
    graphs: &'a FilterGraphBuilder,
    duration_secs: f64,
}

impl<'a> TitleCardBuilder<'a> {
    pub fn new(
        engine: &'a dyn MediaEngine,
        overlays: &'a TextOverlayEngine,
        graphs: &'a FilterGraphBuilder,
        duration_secs: f64,
    ) -> Self {
        Self {
            engine,
            overlays,
            graphs,
            duration_secs,
        }
    }

    pub fn build(
        &self,
        title: &str,
        subtitle: Option<&str>,
        background_image: Option<&Path>,
        output: &Path,
    ) -> ReelResult<RenderedClip> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ReelError::invalid_input("title card needs a title"));
        }

        let mut primitives = self
            .overlays
            .layout(&TextOverlay::new(title, "title", TITLE_START_SECS).with_typewriter(false))?;
        if let Some(sub) = subtitle.map(str::trim).filter(|s| !s.is_empty()) {
            primitives.extend(self.overlays.layout(
                &TextOverlay::new(sub, "title_year", SUBTITLE_START_SECS).with_typewriter(false),
            )?);
        }

        let image = background_image.filter(|p| p.is_file());
        let (background, video_input) = match image {
            Some(path) => (
                TitleBackground::BlurredStill,
                MediaInput::LoopedStill(path.to_path_buf()),
            ),
            None => (
                TitleBackground::Solid,
                MediaInput::SolidColor(BACKGROUND_COLOR.to_string()),
            ),
        };

        let graph = self
            .graphs
            .build_title_card(background, &primitives, self.duration_secs);
        let request = RenderRequest {
            filter_complex: graph.filter_complex,
            inputs: vec![video_input, MediaInput::Silence],
            output: output.to_path_buf(),
            duration_secs: self.duration_secs,
        };

        if let Err(e) = self.engine.render(&request) {
            remove_quietly(output);
            return Err(ReelError::render("title card", e.to_string()));
        }

        tracing::info!(
            title,
            background = ?background,
            duration_secs = self.duration_secs,
            "Built title card"
        );
        Ok(RenderedClip::new(output, self.duration_secs))
    }
}
