//! The compositing collaborator.
//!
//! Everything pixel-level (decode, resample, encode, mux) happens behind
//! [`MediaEngine`]. The pipeline only hands it filter graphs and file paths.

use std::path::{Path, PathBuf};

use docreel_common::error::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};

/// Metadata returned by a probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_name: Option<String>,
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

/// One elementary stream of a probed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub index: u32,
    /// `video`, `audio`, `subtitle`, ...
    pub codec_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// One input of a render invocation, in input-index order.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaInput {
    /// A single decoded frame of a still image.
    Still(PathBuf),
    /// A still image repeated at the output frame rate.
    LoopedStill(PathBuf),
    /// An existing media file.
    File(PathBuf),
    /// Synthesized stereo silence.
    Silence,
    /// A solid color source at canvas size.
    SolidColor(String),
}

impl MediaInput {
    /// The on-disk file this input reads, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            MediaInput::Still(p) | MediaInput::LoopedStill(p) | MediaInput::File(p) => Some(p),
            MediaInput::Silence | MediaInput::SolidColor(_) => None,
        }
    }
}

/// A single engine invocation: one graph, its inputs, one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub filter_complex: String,
    pub inputs: Vec<MediaInput>,
    pub output: PathBuf,
    pub duration_secs: f64,
}

/// Frame-precise compositor plus metadata prober.
pub trait MediaEngine: Send + Sync {
    /// Read duration and stream layout.
    fn probe(&self, path: &Path) -> ReelResult<MediaProbe>;

    /// Execute one filter graph. Failures carry the engine's diagnostics.
    fn render(&self, request: &RenderRequest) -> ReelResult<()>;

    /// Join clips back to back without re-encoding.
    fn concatenate(&self, clips: &[PathBuf], output: &Path) -> ReelResult<()>;

    /// Copy `[start, end)` of `input` without re-encoding.
    fn trim(&self, input: &Path, output: &Path, start_secs: f64, end_secs: f64) -> ReelResult<()>;

    /// Replace the audio of `video` with `audio`, stopping at the shorter one.
    fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> ReelResult<()>;

    /// Check if the engine can run on this system.
    fn is_available(&self) -> bool;

    /// Engine name.
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    sample_rate: Option<String>,
    #[serde(default)]
    channels: Option<u32>,
    #[serde(default)]
    duration: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
///
/// The container duration wins; the longest stream duration is the
/// fallback for formats that do not report one.
pub fn parse_ffprobe_json(json: &str, path: &Path) -> ReelResult<MediaProbe> {
    let raw: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| ReelError::probe(path, format!("unreadable ffprobe output: {e}")))?;

    let parse_secs = |s: &Option<String>| {
        s.as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
    };

    let streams: Vec<StreamInfo> = raw
        .streams
        .iter()
        .map(|s| StreamInfo {
            index: s.index,
            codec_type: s.codec_type.clone().unwrap_or_else(|| "unknown".to_string()),
            codec_name: s.codec_name.clone(),
            width: s.width,
            height: s.height,
            sample_rate: s.sample_rate.as_deref().and_then(|v| v.parse().ok()),
            channels: s.channels,
            duration_secs: parse_secs(&s.duration),
        })
        .collect();

    let container = raw
        .format
        .as_ref()
        .and_then(|f| parse_secs(&f.duration));
    let longest_stream = streams
        .iter()
        .filter_map(|s| s.duration_secs)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));

    let duration_secs = container.or(longest_stream).ok_or_else(|| {
        ReelError::probe(path, "no duration reported for container or streams")
    })?;

    Ok(MediaProbe {
        duration_secs,
        format_name: raw.format.and_then(|f| f.format_name),
        streams,
    })
}
