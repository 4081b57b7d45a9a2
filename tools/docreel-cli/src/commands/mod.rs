//! Command implementations and the shared blocking runner.

pub mod check;
pub mod images;
pub mod info;
pub mod merge;
pub mod render;
pub mod title_card;
pub mod trim;
pub mod validate;

use std::path::{Path, PathBuf};

use docreel_common::cancel::CancellationToken;
use docreel_common::config::{AppConfig, RenderSettings};
use docreel_common::error::ReelError;
use docreel_render_engine::{FfmpegEngine, MediaEngine, OperationReport, Studio};
use serde::de::DeserializeOwned;

use crate::RenderOverrides;

/// Settings resolved from the config file plus command-line overrides.
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: RenderSettings,
    pub scratch_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Session {
    pub fn new(config: AppConfig, overrides: &RenderOverrides) -> Self {
        let mut settings = config.render;
        if let Some(width) = overrides.width {
            settings.width = width;
        }
        if let Some(height) = overrides.height {
            settings.height = height;
        }
        if let Some(fps) = overrides.fps {
            settings.fps = fps;
        }
        if let Some(secs) = overrides.transition_secs {
            settings.transition_secs = secs;
        }
        if overrides.no_transitions {
            settings.transitions_enabled = false;
        }
        Self {
            settings,
            scratch_dir: overrides
                .scratch_dir
                .clone()
                .unwrap_or(config.scratch_dir),
            output_dir: config.output_dir,
        }
    }

    pub fn engine(&self) -> FfmpegEngine {
        FfmpegEngine::new(&self.settings, &self.scratch_dir)
    }

    /// Run `op` on a blocking thread with Ctrl-C wired to cancellation,
    /// print its report, and exit non-zero if it failed.
    pub async fn execute<F>(self, operation: &'static str, op: F) -> anyhow::Result<()>
    where
        F: FnOnce(&Studio<'_>) -> OperationReport + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current step");
                watcher.cancel();
            }
        });

        let report = tokio::task::spawn_blocking(move || {
            let engine = self.engine();
            if !engine.is_available() {
                return OperationReport::begin(operation).fail(&ReelError::config(
                    "ffmpeg and ffprobe must be on PATH (run `docreel check`)",
                ));
            }
            match Studio::new(&engine, self.settings, self.scratch_dir, cancel) {
                Ok(studio) => op(&studio),
                Err(e) => OperationReport::begin(operation).fail(&e),
            }
        })
        .await?;
        interrupt.abort();

        print_report(&report)?;
        if !report.success {
            std::process::exit(1);
        }
        Ok(())
    }

    /// `name` under the configured output directory.
    pub fn default_output(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

pub fn print_report(report: &OperationReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Parse a JSON job given either as a file path or inline.
pub fn load_job<T: DeserializeOwned>(job: &str) -> anyhow::Result<T> {
    let path = Path::new(job);
    let text = if path.is_file() {
        std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read job {}: {e}", path.display()))?
    } else {
        job.to_string()
    };
    serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("Invalid job JSON: {e}"))
}
