//! Docreel Render Engine
//!
//! Drives the external compositor to turn a project into one video file.
//!
//! # Pipeline Architecture
//!
//! ```text
//! scene.jpg + narration ──► SceneRenderer ──► scene clip ─┐
//!                                                         ├── TransitionComposer ──► chapter clip
//! scene.jpg + narration ──► SceneRenderer ──► scene clip ─┘                              │
//!                                                                                        │
//! intro ─┬─ title card ─┬─ chapter clips ─┬─ outro ──► TransitionComposer ──► output.mp4
//! ```
//!
//! Every stage runs sequentially with one engine invocation in flight.
//! Intermediate clips live in a shared [`ScratchDir`] and are deleted by
//! the stage that consumes them.

pub mod chapter;
pub mod clip;
pub mod context;
pub mod engine;
pub mod ffmpeg;
pub mod project;
pub mod report;
pub mod scene;
pub mod studio;
pub mod title_card;
pub mod transition;

pub use chapter::{overlay_for_scene, ChapterAssembler, ChapterOutcome};
pub use clip::{RenderedClip, ScratchDir};
pub use context::RenderContext;
pub use engine::{MediaEngine, MediaInput, MediaProbe, RenderRequest, StreamInfo};
pub use ffmpeg::FfmpegEngine;
pub use project::{ProjectAssembler, ProjectOutcome};
pub use report::{OperationReport, UnitReport, UnitStatus};
pub use scene::SceneRenderer;
pub use studio::Studio;
pub use title_card::TitleCardBuilder;
pub use transition::{
    Composition, CompositionKind, CompositionStrategy, CrossfadeStrategy, HardCutStrategy,
    TransitionComposer,
};
