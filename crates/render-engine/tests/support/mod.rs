//! Scripted in-memory `MediaEngine` for pipeline tests.
//!
//! Renders write a small placeholder file and remember its duration so a
//! later probe of that file answers consistently. Failures are injected by
//! filter substring or input path.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use docreel_common::cancel::CancellationToken;
use docreel_common::config::RenderSettings;
use docreel_common::error::{ReelError, ReelResult};
use docreel_render_engine::engine::{MediaEngine, MediaInput, MediaProbe, RenderRequest, StreamInfo};
use docreel_render_engine::Studio;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Render(RenderRequest),
    Concatenate { clips: Vec<PathBuf>, output: PathBuf },
    Probe(PathBuf),
    Trim { input: PathBuf, output: PathBuf, start: f64, end: f64 },
    Mux { video: PathBuf, audio: PathBuf, output: PathBuf },
}

#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<Call>>,
    durations: Mutex<HashMap<PathBuf, f64>>,
    fail_filters: Vec<String>,
    fail_inputs: Vec<PathBuf>,
    fail_concat: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every render whose graph contains `needle`.
    pub fn failing_filter(mut self, needle: &str) -> Self {
        self.fail_filters.push(needle.to_string());
        self
    }

    /// Fail every render that reads `path`.
    pub fn failing_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_inputs.push(path.into());
        self
    }

    pub fn failing_concat(mut self) -> Self {
        self.fail_concat = true;
        self
    }

    /// Duration reported when `path` is probed.
    pub fn set_duration(&self, path: impl Into<PathBuf>, secs: f64) {
        self.durations.lock().unwrap().insert(path.into(), secs);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn renders(&self) -> Vec<RenderRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Render(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn scene_renders(&self) -> Vec<RenderRequest> {
        self.renders()
            .into_iter()
            .filter(|r| r.filter_complex.contains("zoompan"))
            .collect()
    }

    pub fn crossfade_renders(&self) -> Vec<RenderRequest> {
        self.renders()
            .into_iter()
            .filter(|r| r.filter_complex.contains("xfade"))
            .collect()
    }

    pub fn concat_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Concatenate { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn write_clip(&self, path: &Path, bytes: &[u8], secs: f64) -> ReelResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        self.set_duration(path, secs);
        Ok(())
    }
}

impl MediaEngine for FakeEngine {
    fn probe(&self, path: &Path) -> ReelResult<MediaProbe> {
        self.record(Call::Probe(path.to_path_buf()));
        let secs = self
            .durations
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .ok_or_else(|| ReelError::probe(path, "no duration scripted"))?;
        Ok(MediaProbe {
            duration_secs: secs,
            format_name: Some("fake".to_string()),
            streams: vec![StreamInfo {
                index: 0,
                codec_type: "audio".to_string(),
                codec_name: Some("pcm".to_string()),
                duration_secs: Some(secs),
                ..Default::default()
            }],
        })
    }

    fn render(&self, request: &RenderRequest) -> ReelResult<()> {
        self.record(Call::Render(request.clone()));
        if let Some(needle) = self
            .fail_filters
            .iter()
            .find(|n| request.filter_complex.contains(n.as_str()))
        {
            return Err(ReelError::render("fake", format!("scripted failure on {needle}")));
        }
        let reads_failing_input = request
            .inputs
            .iter()
            .filter_map(MediaInput::path)
            .any(|p| self.fail_inputs.iter().any(|f| f.as_path() == p));
        if reads_failing_input {
            return Err(ReelError::render("fake", "scripted input failure"));
        }
        let body = format!("render {:.3}", request.duration_secs);
        self.write_clip(&request.output, body.as_bytes(), request.duration_secs)
    }

    fn concatenate(&self, clips: &[PathBuf], output: &Path) -> ReelResult<()> {
        self.record(Call::Concatenate {
            clips: clips.to_vec(),
            output: output.to_path_buf(),
        });
        if self.fail_concat {
            return Err(ReelError::render("concat", "scripted concat failure"));
        }
        let mut bytes = vec![];
        let mut total = 0.0;
        for clip in clips {
            bytes.extend(std::fs::read(clip)?);
            total += self.durations.lock().unwrap().get(clip).copied().unwrap_or(0.0);
        }
        self.write_clip(output, &bytes, total)
    }

    fn trim(&self, input: &Path, output: &Path, start_secs: f64, end_secs: f64) -> ReelResult<()> {
        self.record(Call::Trim {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            start: start_secs,
            end: end_secs,
        });
        self.write_clip(output, b"trimmed", end_secs - start_secs)
    }

    fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> ReelResult<()> {
        self.record(Call::Mux {
            video: video.to_path_buf(),
            audio: audio.to_path_buf(),
            output: output.to_path_buf(),
        });
        let bytes = std::fs::read(video)?;
        self.write_clip(output, &bytes, 0.0)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// A fresh directory under the system temp dir.
pub fn workdir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("docreel_it_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write a placeholder still and return its path.
pub fn still(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"jpeg").unwrap();
    path
}

pub fn studio<'e>(engine: &'e FakeEngine, dir: &Path) -> Studio<'e> {
    studio_with(engine, dir, RenderSettings::default(), CancellationToken::new())
}

pub fn studio_with<'e>(
    engine: &'e FakeEngine,
    dir: &Path,
    settings: RenderSettings,
    cancel: CancellationToken,
) -> Studio<'e> {
    Studio::new(engine, settings, dir.join("scratch"), cancel).unwrap()
}

/// `.mp4` files left in the scratch directory.
pub fn scratch_leftovers(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir.join("scratch"))
        .unwrap()
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("mp4"))
        .collect()
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
