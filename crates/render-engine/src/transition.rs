//! Joining an ordered list of clips into one.
//!
//! Two strategies: [`CrossfadeStrategy`] chains `n - 1` dissolves with
//! planned offsets, [`HardCutStrategy`] concatenates without re-encoding.
//! [`TransitionComposer`] picks between them and degrades to hard cuts when
//! the crossfade cannot be planned or the engine rejects it. That fallback
//! is the only automatic degradation in the pipeline.

use std::path::{Path, PathBuf};

use docreel_common::error::{ReelError, ReelResult};
use docreel_processing_core::filter_graph::FilterGraphBuilder;
use docreel_processing_core::timing::plan_crossfades;
use serde::Serialize;

use crate::clip::{ensure_parent, remove_quietly, RenderedClip};
use crate::engine::{MediaEngine, MediaInput, RenderRequest};

/// How the output was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionKind {
    /// Single input, copied through unchanged.
    Identity,
    Crossfade,
    HardCut,
}

/// Output of a composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub clip: RenderedClip,
    pub kind: CompositionKind,
    /// Why a requested crossfade became a hard cut.
    pub fallback_reason: Option<String>,
}

/// A way of joining two or more clips.
pub trait CompositionStrategy {
    fn name(&self) -> &'static str;

    fn compose(&self, clips: &[RenderedClip], output: &Path) -> ReelResult<RenderedClip>;
}

/// Chained `xfade` / `acrossfade`.
pub struct CrossfadeStrategy<'a> {
    engine: &'a dyn MediaEngine,
    graphs: &'a FilterGraphBuilder,
    transition_secs: f64,
}

impl<'a> CrossfadeStrategy<'a> {
    pub fn new(
        engine: &'a dyn MediaEngine,
        graphs: &'a FilterGraphBuilder,
        transition_secs: f64,
    ) -> Self {
        Self {
            engine,
            graphs,
            transition_secs,
        }
    }
}

impl CompositionStrategy for CrossfadeStrategy<'_> {
    fn name(&self) -> &'static str {
        "crossfade"
    }

    fn compose(&self, clips: &[RenderedClip], output: &Path) -> ReelResult<RenderedClip> {
        let durations: Vec<f64> = clips.iter().map(|c| c.duration_secs).collect();
        // Planning fails before the engine is touched.
        let plan = plan_crossfades(&durations, self.transition_secs)?;

        tracing::debug!(
            clips = clips.len(),
            offsets = ?plan.offsets,
            total_secs = plan.total_secs,
            "Planned crossfade chain"
        );

        let request = RenderRequest {
            filter_complex: self.graphs.build_crossfade(&plan),
            inputs: clips
                .iter()
                .map(|c| MediaInput::File(c.path.clone()))
                .collect(),
            output: output.to_path_buf(),
            duration_secs: plan.total_secs,
        };
        self.engine
            .render(&request)
            .map_err(|e| ReelError::transition(e.to_string()))?;

        Ok(RenderedClip::new(output, plan.total_secs))
    }
}

/// Stream-copy concatenation.
pub struct HardCutStrategy<'a> {
    engine: &'a dyn MediaEngine,
}

impl<'a> HardCutStrategy<'a> {
    pub fn new(engine: &'a dyn MediaEngine) -> Self {
        Self { engine }
    }
}

impl CompositionStrategy for HardCutStrategy<'_> {
    fn name(&self) -> &'static str {
        "hard_cut"
    }

    fn compose(&self, clips: &[RenderedClip], output: &Path) -> ReelResult<RenderedClip> {
        if clips.is_empty() {
            return Err(ReelError::empty_input("hard cut"));
        }
        let paths: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
        self.engine.concatenate(&paths, output)?;
        let total: f64 = clips.iter().map(|c| c.duration_secs).sum();
        Ok(RenderedClip::new(output, total))
    }
}

/// Selects a strategy and owns the crossfade-to-hard-cut fallback.
///
/// Never deletes its inputs; they belong to the caller.
pub struct TransitionComposer<'a> {
    engine: &'a dyn MediaEngine,
    graphs: &'a FilterGraphBuilder,
}

impl<'a> TransitionComposer<'a> {
    pub fn new(engine: &'a dyn MediaEngine, graphs: &'a FilterGraphBuilder) -> Self {
        Self { engine, graphs }
    }

    /// Join `clips` into `output`.
    ///
    /// - no clips: `EmptyInput`
    /// - one clip: byte-identical copy
    /// - `transition_secs` given: crossfade, falling back to hard cuts
    /// - otherwise: hard cuts
    pub fn compose(
        &self,
        clips: &[RenderedClip],
        transition_secs: Option<f64>,
        output: &Path,
    ) -> ReelResult<Composition> {
        match clips {
            [] => Err(ReelError::empty_input("composition")),
            [only] => {
                ensure_parent(output)?;
                std::fs::copy(&only.path, output)?;
                Ok(Composition {
                    clip: RenderedClip::new(output, only.duration_secs),
                    kind: CompositionKind::Identity,
                    fallback_reason: None,
                })
            }
            _ => {
                ensure_parent(output)?;
                let Some(g) = transition_secs else {
                    return self.hard_cut(clips, output, None);
                };

                let crossfade = CrossfadeStrategy::new(self.engine, self.graphs, g);
                match crossfade.compose(clips, output) {
                    Ok(clip) => {
                        tracing::info!(
                            clips = clips.len(),
                            duration_secs = clip.duration_secs,
                            strategy = crossfade.name(),
                            "Composed clips"
                        );
                        Ok(Composition {
                            clip,
                            kind: CompositionKind::Crossfade,
                            fallback_reason: None,
                        })
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            clips = clips.len(),
                            "Crossfade failed, falling back to hard cuts"
                        );
                        remove_quietly(output);
                        self.hard_cut(clips, output, Some(e.to_string()))
                    }
                }
            }
        }
    }

    fn hard_cut(
        &self,
        clips: &[RenderedClip],
        output: &Path,
        fallback_reason: Option<String>,
    ) -> ReelResult<Composition> {
        let strategy = HardCutStrategy::new(self.engine);
        let clip = strategy.compose(clips, output)?;
        tracing::info!(
            clips = clips.len(),
            duration_secs = clip.duration_secs,
            strategy = strategy.name(),
            "Composed clips"
        );
        Ok(Composition {
            clip,
            kind: CompositionKind::HardCut,
            fallback_reason,
        })
    }
}
