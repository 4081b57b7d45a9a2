//! Project assembly.
//!
//! Clip order: intro, title card, chapters in declared order, outro. The
//! intro and outro are referenced in place and never deleted; every other
//! clip lives in the scratch directory and is removed once the final
//! composition has consumed it.

use std::path::Path;

use docreel_common::error::{ReelError, ReelResult};
use docreel_project_model::project::Project;

use crate::chapter::ChapterAssembler;
use crate::clip::RenderedClip;
use crate::context::RenderContext;
use crate::report::UnitReport;
use crate::title_card::TitleCardBuilder;
use crate::transition::Composition;

/// Result of assembling a project.
#[derive(Debug)]
pub struct ProjectOutcome {
    pub composition: Composition,
    pub chapters: Vec<UnitReport>,
    pub scenes: Vec<UnitReport>,
}

/// A clip in the final list, tagged with whether this stage owns it.
struct Slot {
    clip: RenderedClip,
    owned: bool,
}

pub struct ProjectAssembler<'a> {
    ctx: RenderContext<'a>,
}

impl<'a> ProjectAssembler<'a> {
    pub fn new(ctx: RenderContext<'a>) -> Self {
        Self { ctx }
    }

    /// Render `project` into `output`.
    ///
    /// Chapters that fail are skipped. The project fails with `EmptyInput`
    /// only when no chapter rendered; the intro, outro and title card do
    /// not count.
    pub fn assemble(&self, project: &Project, output: &Path) -> ReelResult<ProjectOutcome> {
        let mut slots: Vec<Slot> = vec![];
        let mut chapter_reports = Vec::with_capacity(project.chapters.len());
        let mut scene_reports = vec![];

        if let Some(intro) = self.external_clip(project.intro_video.as_deref(), "intro") {
            slots.push(Slot {
                clip: intro,
                owned: false,
            });
        }

        if project.title_card {
            if let Some(card) = self.title_card(project) {
                slots.push(Slot {
                    clip: card,
                    owned: true,
                });
            }
        }

        let assembler = ChapterAssembler::new(self.ctx);
        let mut chapters_rendered = 0usize;
        for (index, chapter) in project.chapters.iter().enumerate() {
            if let Err(e) = self.ctx.cancel.check() {
                release(slots);
                return Err(e);
            }

            let label = chapter_label(index, &chapter.title);
            let scratch_path = self.ctx.scratch.clip_path(&format!("chapter_{}", index + 1));

            match assembler.assemble(chapter, index, &scratch_path) {
                Ok(outcome) => {
                    chapters_rendered += 1;
                    let detail = format!(
                        "{:?} {:.3}s",
                        outcome.composition.kind, outcome.composition.clip.duration_secs
                    );
                    chapter_reports.push(UnitReport::rendered(index, label, Some(detail)));
                    scene_reports.extend(outcome.scenes);
                    slots.push(Slot {
                        clip: outcome.composition.clip,
                        owned: true,
                    });
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(chapter = index + 1, error = %e, "Skipping chapter");
                    chapter_reports.push(UnitReport::from_error(index, label, &e));
                }
                Err(e) => {
                    release(slots);
                    return Err(e);
                }
            }
        }

        if chapters_rendered == 0 {
            release(slots);
            return Err(ReelError::empty_input("project"));
        }

        if let Some(outro) = self.external_clip(project.outro_video.as_deref(), "outro") {
            slots.push(Slot {
                clip: outro,
                owned: false,
            });
        }

        if let Err(e) = self.ctx.cancel.check() {
            release(slots);
            return Err(e);
        }

        let clips: Vec<RenderedClip> = slots.iter().map(|s| s.clip.clone()).collect();
        let transition = self.ctx.transition_for(clips.len());
        let composed = self.ctx.composer().compose(&clips, transition, output);
        release(slots);
        let composition = composed?;

        tracing::info!(
            chapters = chapters_rendered,
            clips = clips.len(),
            duration_secs = composition.clip.duration_secs,
            kind = ?composition.kind,
            "Assembled project"
        );

        Ok(ProjectOutcome {
            composition,
            chapters: chapter_reports,
            scenes: scene_reports,
        })
    }

    /// Intro or outro, if it exists and can be probed.
    fn external_clip(&self, path: Option<&Path>, role: &str) -> Option<RenderedClip> {
        let path = path?;
        if !path.is_file() {
            tracing::warn!(role, path = %path.display(), "Clip not found, leaving it out");
            return None;
        }
        match self.ctx.engine.probe(path) {
            Ok(probe) => Some(RenderedClip::new(path, probe.duration_secs)),
            Err(e) => {
                tracing::warn!(role, error = %e, "Could not probe clip, leaving it out");
                None
            }
        }
    }

    /// Best effort: any failure is logged and the card omitted.
    fn title_card(&self, project: &Project) -> Option<RenderedClip> {
        let title = project
            .title_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&project.title);
        let background = project
            .chapters
            .iter()
            .flat_map(|c| c.scenes.iter())
            .map(|s| s.image.as_path())
            .find(|p| p.is_file());

        let builder = TitleCardBuilder::new(
            self.ctx.engine,
            self.ctx.overlays,
            self.ctx.graphs,
            self.ctx.settings.title_card_secs,
        );
        let output = self.ctx.scratch.clip_path("title_card");
        match builder.build(title, project.year.as_deref(), background, &output) {
            Ok(clip) => Some(clip),
            Err(e) => {
                tracing::warn!(error = %e, "Title card failed, continuing without it");
                None
            }
        }
    }
}

fn chapter_label(index: usize, title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        format!("chapter {}", index + 1)
    } else {
        format!("chapter {} ({title})", index + 1)
    }
}

fn release(slots: Vec<Slot>) {
    for slot in slots.into_iter().filter(|s| s.owned) {
        slot.clip.discard();
    }
}
