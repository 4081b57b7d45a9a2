//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ReelError, ReelResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where finished videos are written by default.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory shared by all stages for intermediate clips.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Rendering parameters.
    #[serde(default)]
    pub render: RenderSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rendering parameters shared by every stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output canvas width in pixels.
    pub width: u32,
    /// Output canvas height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: u32,

    /// No scene clip is ever shorter than this.
    pub min_scene_secs: f64,

    /// Duration for scenes with neither narration nor an explicit length.
    pub default_scene_secs: f64,

    /// Pacing pad added after narration ends.
    pub audio_pad_secs: f64,

    /// Whether chapter and project assembly use crossfades.
    pub transitions_enabled: bool,

    /// Crossfade length between adjacent clips.
    pub transition_secs: f64,

    /// Above this many clips a chapter falls back to hard cuts directly.
    pub max_crossfade_clips: usize,

    /// Length of the synthesized title card.
    pub title_card_secs: f64,

    /// Upper bound for a single metadata probe.
    pub probe_timeout_secs: u64,

    /// Default typewriter reveal rate.
    pub chars_per_second: f64,

    /// x264 constant rate factor.
    pub video_crf: u32,

    /// x264 preset.
    pub video_preset: String,

    /// AAC bitrate.
    pub audio_bitrate_kbps: u32,

    /// Sample rate used for narration and synthesized silence.
    pub audio_sample_rate: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "docreel=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            scratch_dir: default_scratch_dir(),
            render: RenderSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 24,
            min_scene_secs: 5.0,
            default_scene_secs: 8.0,
            audio_pad_secs: 0.4,
            transitions_enabled: true,
            transition_secs: 0.75,
            max_crossfade_clips: 40,
            title_card_secs: 5.0,
            probe_timeout_secs: 60,
            chars_per_second: 14.0,
            video_crf: 23,
            video_preset: "fast".to_string(),
            audio_bitrate_kbps: 192,
            audio_sample_rate: 48000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RenderSettings {
    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::config(format!(
                "canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(ReelError::config(format!(
                "canvas dimensions must be even for yuv420p, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(ReelError::config("fps must be positive"));
        }
        if !(self.min_scene_secs > 0.0) {
            return Err(ReelError::config("min_scene_secs must be positive"));
        }
        if !(self.default_scene_secs > 0.0) {
            return Err(ReelError::config("default_scene_secs must be positive"));
        }
        if self.audio_pad_secs < 0.0 || self.transition_secs < 0.0 {
            return Err(ReelError::config(
                "audio_pad_secs and transition_secs must not be negative",
            ));
        }
        if !(self.chars_per_second > 0.0) {
            return Err(ReelError::config("chars_per_second must be positive"));
        }
        if !(self.title_card_secs > 0.0) {
            return Err(ReelError::config("title_card_secs must be positive"));
        }
        Ok(())
    }

    /// Canvas size as a `(width, height)` pair.
    pub fn canvas(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit file. Unlike [`AppConfig::load`], a
    /// missing or malformed file is an error.
    pub fn load_from(path: &std::path::Path) -> ReelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ReelError::config(format!("{}: {e}", path.display())))
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("docreel").join("config.json")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated_videos")
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("docreel-scratch")
}
