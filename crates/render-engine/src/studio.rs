//! Top-level operations.
//!
//! [`Studio`] owns the registries, the scratch directory and the
//! cancellation token, and turns every operation into an
//! [`OperationReport`]. Nothing here returns an error to the caller: a
//! failure becomes `success: false` with the reason in `message`.

use std::path::{Path, PathBuf};

use docreel_common::cancel::CancellationToken;
use docreel_common::config::RenderSettings;
use docreel_common::error::{ReelError, ReelResult};
use docreel_processing_core::filter_graph::FilterGraphBuilder;
use docreel_processing_core::motion::MotionLibrary;
use docreel_processing_core::text_overlay::{StyleRegistry, TextOverlayEngine};
use docreel_project_model::project::{Chapter, Project, Scene};

use crate::chapter::{overlay_for_scene, ChapterAssembler};
use crate::clip::{RenderedClip, ScratchDir};
use crate::context::RenderContext;
use crate::engine::MediaEngine;
use crate::project::ProjectAssembler;
use crate::report::{OperationReport, UnitReport};
use crate::title_card::TitleCardBuilder;

pub struct Studio<'e> {
    engine: &'e dyn MediaEngine,
    settings: RenderSettings,
    motion: MotionLibrary,
    overlays: TextOverlayEngine,
    graphs: FilterGraphBuilder,
    scratch: ScratchDir,
    cancel: CancellationToken,
}

impl<'e> Studio<'e> {
    /// Validate `settings` and set up the scratch directory.
    pub fn new(
        engine: &'e dyn MediaEngine,
        settings: RenderSettings,
        scratch_root: impl Into<PathBuf>,
        cancel: CancellationToken,
    ) -> ReelResult<Self> {
        settings.validate()?;
        let overlays = TextOverlayEngine::new(
            StyleRegistry::builtin(),
            settings.canvas(),
            settings.chars_per_second,
        );
        let graphs = FilterGraphBuilder::from_settings(&settings);
        let scratch = ScratchDir::create(scratch_root)?;
        tracing::debug!(
            engine = engine.name(),
            scratch = %scratch.path().display(),
            width = settings.width,
            height = settings.height,
            fps = settings.fps,
            "Studio ready"
        );
        Ok(Self {
            engine,
            settings,
            motion: MotionLibrary::builtin(),
            overlays,
            graphs,
            scratch,
            cancel,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn context(&self) -> RenderContext<'_> {
        RenderContext {
            engine: self.engine,
            settings: &self.settings,
            motion: &self.motion,
            overlays: &self.overlays,
            graphs: &self.graphs,
            scratch: &self.scratch,
            cancel: &self.cancel,
        }
    }

    /// Render one standalone scene. Its overlay falls back to the
    /// location/date stamp; there is no chapter title to show.
    pub fn render_scene(&self, scene: &Scene, output: &Path) -> OperationReport {
        let report = OperationReport::begin("render-scene");
        let preset = self.motion.preset_for(0, 1, scene.motion.as_deref());
        let overlay = overlay_for_scene(scene, "", 0);
        let result = self.context().scene_renderer().render(
            scene,
            "scene 1",
            preset,
            overlay.as_ref(),
            output,
        );
        match result {
            Ok(clip) => {
                let mut report = report.with_output(&clip.path, clip.duration_secs);
                report
                    .scenes
                    .push(UnitReport::rendered(0, "scene 1", Some(preset.id.clone())));
                report.succeed()
            }
            Err(e) => failed(report, e),
        }
    }

    pub fn assemble_chapter(&self, chapter: &Chapter, output: &Path) -> OperationReport {
        let report = OperationReport::begin("assemble-chapter");
        match ChapterAssembler::new(self.context()).assemble(chapter, 0, output) {
            Ok(outcome) => {
                let composition = outcome.composition;
                let mut report =
                    report.with_output(&composition.clip.path, composition.clip.duration_secs);
                report.scenes = outcome.scenes;
                report.composition = Some(composition.kind);
                report.fallback_reason = composition.fallback_reason;
                report.succeed()
            }
            Err(e) => failed(report, e),
        }
    }

    pub fn assemble_project(&self, project: &Project, output: &Path) -> OperationReport {
        let report = OperationReport::begin("assemble-project");
        match ProjectAssembler::new(self.context()).assemble(project, output) {
            Ok(outcome) => {
                let composition = outcome.composition;
                let mut report =
                    report.with_output(&composition.clip.path, composition.clip.duration_secs);
                report.chapters = outcome.chapters;
                report.scenes = outcome.scenes;
                report.composition = Some(composition.kind);
                report.fallback_reason = composition.fallback_reason;
                report.succeed()
            }
            Err(e) => failed(report, e),
        }
    }

    /// Join existing media files. The inputs are left untouched.
    pub fn compose_files(
        &self,
        inputs: &[PathBuf],
        transition_secs: Option<f64>,
        output: &Path,
    ) -> OperationReport {
        let report = OperationReport::begin("compose-transition");
        let result = self.probe_clips(inputs).and_then(|clips| {
            self.context()
                .composer()
                .compose(&clips, transition_secs, output)
        });
        match result {
            Ok(composition) => {
                let mut report =
                    report.with_output(&composition.clip.path, composition.clip.duration_secs);
                report.composition = Some(composition.kind);
                report.fallback_reason = composition.fallback_reason;
                report.succeed()
            }
            Err(e) => failed(report, e),
        }
    }

    pub fn build_title_card(
        &self,
        title: &str,
        subtitle: Option<&str>,
        background_image: Option<&Path>,
        output: &Path,
    ) -> OperationReport {
        let report = OperationReport::begin("title-card");
        let builder = TitleCardBuilder::new(
            self.engine,
            &self.overlays,
            &self.graphs,
            self.settings.title_card_secs,
        );
        match builder.build(title, subtitle, background_image, output) {
            Ok(clip) => report.with_output(&clip.path, clip.duration_secs).succeed(),
            Err(e) => failed(report, e),
        }
    }

    /// Slideshow of `images`, each shown for `secs_per_image` (or the
    /// default scene length), with an optional soundtrack muxed over the
    /// result. The shorter of picture and soundtrack wins.
    pub fn images_to_video(
        &self,
        images: &[PathBuf],
        secs_per_image: Option<f64>,
        soundtrack: Option<&Path>,
        output: &Path,
    ) -> OperationReport {
        let report = OperationReport::begin("images-to-video");
        let chapter = Chapter {
            title: String::new(),
            scenes: images
                .iter()
                .map(|image| {
                    let mut scene = Scene::new(image);
                    scene.duration = secs_per_image;
                    scene
                })
                .collect(),
        };

        let Some(audio) = soundtrack else {
            let mut report = self.assemble_chapter(&chapter, output);
            report.operation = "images-to-video".to_string();
            return report;
        };

        if !audio.is_file() {
            return failed(report, ReelError::input_missing("soundtrack", audio));
        }

        let silent = self.scratch.clip_path("slideshow");
        let outcome = match ChapterAssembler::new(self.context()).assemble(&chapter, 0, &silent) {
            Ok(outcome) => outcome,
            Err(e) => return failed(report, e),
        };
        let muxed = self.engine.mux_audio(&outcome.composition.clip.path, audio, output);
        let video_secs = outcome.composition.clip.duration_secs;
        outcome.composition.clip.discard();
        if let Err(e) = muxed {
            return failed(report, e);
        }

        let duration_secs = match self.engine.probe(audio) {
            Ok(probe) => video_secs.min(probe.duration_secs),
            Err(_) => video_secs,
        };
        let mut report = report.with_output(output, duration_secs);
        report.scenes = outcome.scenes;
        report.composition = Some(outcome.composition.kind);
        report.fallback_reason = outcome.composition.fallback_reason;
        report.succeed()
    }

    /// Probe a media file; the result goes in `data`.
    pub fn probe(&self, path: &Path, operation: &str) -> OperationReport {
        let report = OperationReport::begin(operation);
        if !path.is_file() {
            return failed(report, ReelError::input_missing(operation, path));
        }
        let result = self
            .engine
            .probe(path)
            .and_then(|probe| Ok((probe.duration_secs, serde_json::to_value(&probe)?)));
        match result {
            Ok((duration_secs, data)) => report
                .with_output(path, duration_secs)
                .with_data(data)
                .succeed(),
            Err(e) => failed(report, e),
        }
    }

    pub fn trim(&self, input: &Path, output: &Path, start_secs: f64, end_secs: f64) -> OperationReport {
        let report = OperationReport::begin("trim");
        if !input.is_file() {
            return failed(report, ReelError::input_missing("trim", input));
        }
        if !(start_secs >= 0.0 && end_secs > start_secs) {
            return failed(
                report,
                ReelError::invalid_input(format!(
                    "trim window must satisfy 0 <= start < end, got {start_secs}..{end_secs}"
                )),
            );
        }
        match self.engine.trim(input, output, start_secs, end_secs) {
            Ok(()) => report.with_output(output, end_secs - start_secs).succeed(),
            Err(e) => failed(report, e),
        }
    }

    /// List the project's missing sources without rendering anything.
    pub fn validate_project(&self, project: &Project) -> OperationReport {
        let problems = project.validate_sources();
        let report = OperationReport::begin("validate").with_data(serde_json::json!({
            "chapters": project.chapters.len(),
            "scenes": project.scene_count(),
            "problems": problems,
        }));
        if problems.is_empty() {
            report.succeed()
        } else {
            let message = format!("{} problem(s) found", problems.len());
            report.with_message(message).finish(false)
        }
    }

    fn probe_clips(&self, inputs: &[PathBuf]) -> ReelResult<Vec<RenderedClip>> {
        inputs
            .iter()
            .enumerate()
            .map(|(i, path)| {
                if !path.is_file() {
                    return Err(ReelError::input_missing(format!("clip {}", i + 1), path));
                }
                let probe = self.engine.probe(path)?;
                Ok(RenderedClip::new(path, probe.duration_secs))
            })
            .collect()
    }
}

fn failed(report: OperationReport, error: ReelError) -> OperationReport {
    tracing::error!(operation = %report.operation, error = %error, "Operation failed");
    report.fail(&error)
}
