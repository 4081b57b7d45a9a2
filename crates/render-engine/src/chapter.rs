//! Chapter assembly: render every scene, then join the survivors.

use std::path::Path;

use docreel_common::error::{ReelError, ReelResult};
use docreel_project_model::project::{Chapter, Scene, TextOverlay};

use crate::clip::RenderedClip;
use crate::context::RenderContext;
use crate::report::{UnitReport, UnitStatus};
use crate::transition::{Composition, CompositionKind};

const DERIVED_OVERLAY_START_SECS: f64 = 0.5;

/// Overlay shown on the scene at `index` of a chapter titled `chapter_title`.
///
/// The scene's own overlay wins. Otherwise its location and date become a
/// typewriter stamp. Otherwise the first scene carries the chapter title.
pub fn overlay_for_scene(scene: &Scene, chapter_title: &str, index: usize) -> Option<TextOverlay> {
    if let Some(overlay) = &scene.overlay {
        return Some(overlay.clone());
    }

    let lines = scene.caption_lines();
    if !lines.is_empty() {
        return Some(
            TextOverlay::new(lines.join("\n"), "location_stamp", DERIVED_OVERLAY_START_SECS)
                .with_typewriter(true),
        );
    }

    let title = chapter_title.trim();
    if index == 0 && !title.is_empty() {
        return Some(
            TextOverlay::new(title, "chapter_title", DERIVED_OVERLAY_START_SECS)
                .with_typewriter(false),
        );
    }

    None
}

/// Result of assembling one chapter.
#[derive(Debug)]
pub struct ChapterOutcome {
    pub composition: Composition,
    pub scenes: Vec<UnitReport>,
}

pub struct ChapterAssembler<'a> {
    ctx: RenderContext<'a>,
}

impl<'a> ChapterAssembler<'a> {
    pub fn new(ctx: RenderContext<'a>) -> Self {
        Self { ctx }
    }

    /// Render `chapter` into `output`.
    ///
    /// `chapter_index` is zero-based and only used for labels and scratch
    /// names. Scenes that fail are skipped; the chapter fails with
    /// `EmptyInput` only when none rendered.
    pub fn assemble(
        &self,
        chapter: &Chapter,
        chapter_index: usize,
        output: &Path,
    ) -> ReelResult<ChapterOutcome> {
        let chapter_no = chapter_index + 1;
        let total = chapter.scenes.len();
        let renderer = self.ctx.scene_renderer();

        let mut clips: Vec<RenderedClip> = Vec::with_capacity(total);
        let mut reports = Vec::with_capacity(total);

        for (index, scene) in chapter.scenes.iter().enumerate() {
            if let Err(e) = self.ctx.cancel.check() {
                discard_all(clips);
                return Err(e);
            }

            let label = format!("chapter {chapter_no} scene {}", index + 1);
            let preset = self
                .ctx
                .motion
                .preset_for(index, total, scene.motion.as_deref());
            let overlay = overlay_for_scene(scene, &chapter.title, index);
            let scratch_path = self
                .ctx
                .scratch
                .clip_path(&format!("scene_{chapter_no}_{}", index + 1));

            match renderer.render(scene, &label, preset, overlay.as_ref(), &scratch_path) {
                Ok(clip) => {
                    reports.push(UnitReport::rendered(
                        index,
                        &label,
                        Some(format!("{} {:.3}s", preset.id, clip.duration_secs)),
                    ));
                    clips.push(clip);
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(chapter = chapter_no, scene = index + 1, error = %e, "Skipping scene");
                    reports.push(UnitReport::from_error(index, &label, &e));
                }
                Err(e) => {
                    discard_all(clips);
                    return Err(e);
                }
            }
        }

        if clips.is_empty() {
            return Err(ReelError::empty_input(format!("chapter {chapter_no}")));
        }

        let composition = if clips.len() == 1 {
            let clip = clips.remove(0).move_to(output)?;
            Composition {
                clip,
                kind: CompositionKind::Identity,
                fallback_reason: None,
            }
        } else {
            let transition = self.ctx.transition_for(clips.len());
            let composed = self.ctx.composer().compose(&clips, transition, output);
            discard_all(clips);
            composed?
        };

        tracing::info!(
            chapter = chapter_no,
            rendered = clips_rendered(&reports),
            scenes = total,
            duration_secs = composition.clip.duration_secs,
            "Assembled chapter"
        );

        Ok(ChapterOutcome {
            composition,
            scenes: reports,
        })
    }
}

fn clips_rendered(reports: &[UnitReport]) -> usize {
    reports
        .iter()
        .filter(|r| r.status == UnitStatus::Rendered)
        .count()
}

pub(crate) fn discard_all(clips: Vec<RenderedClip>) {
    for clip in clips {
        clip.discard();
    }
}
