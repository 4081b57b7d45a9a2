//! `MediaEngine` backed by the `ffmpeg` and `ffprobe` binaries.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use docreel_common::config::RenderSettings;
use docreel_common::error::{ReelError, ReelResult};

use crate::engine::{parse_ffprobe_json, MediaEngine, MediaInput, MediaProbe, RenderRequest};

/// Lines of ffmpeg stderr kept as a failure diagnostic.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Encoder parameters taken from [`RenderSettings`].
#[derive(Debug, Clone)]
struct EncodeSettings {
    width: u32,
    height: u32,
    fps: u32,
    crf: u32,
    preset: String,
    audio_bitrate_kbps: u32,
    sample_rate: u32,
}

pub struct FfmpegEngine {
    encode: EncodeSettings,
    probe_timeout: Duration,
    scratch_dir: PathBuf,
    list_counter: AtomicU64,
}

impl FfmpegEngine {
    /// `scratch_dir` holds the concat list files.
    pub fn new(settings: &RenderSettings, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            encode: EncodeSettings {
                width: settings.width,
                height: settings.height,
                fps: settings.fps,
                crf: settings.video_crf,
                preset: settings.video_preset.clone(),
                audio_bitrate_kbps: settings.audio_bitrate_kbps,
                sample_rate: settings.audio_sample_rate,
            },
            probe_timeout: Duration::from_secs(settings.probe_timeout_secs.max(1)),
            scratch_dir: scratch_dir.into(),
            list_counter: AtomicU64::new(0),
        }
    }

    /// Full ffmpeg argument list for a render request.
    pub fn render_args(&self, request: &RenderRequest) -> Vec<String> {
        let e = &self.encode;
        let duration = format!("{:.3}", request.duration_secs);
        let mut args = base_args();

        for input in &request.inputs {
            match input {
                MediaInput::Still(path) | MediaInput::File(path) => {
                    args.push("-i".to_string());
                    args.push(path_arg(path));
                }
                MediaInput::LoopedStill(path) => {
                    args.extend([
                        "-loop".to_string(),
                        "1".to_string(),
                        "-framerate".to_string(),
                        e.fps.to_string(),
                        "-t".to_string(),
                        duration.clone(),
                        "-i".to_string(),
                        path_arg(path),
                    ]);
                }
                MediaInput::Silence => {
                    args.extend([
                        "-f".to_string(),
                        "lavfi".to_string(),
                        "-t".to_string(),
                        duration.clone(),
                        "-i".to_string(),
                        format!("anullsrc=r={}:cl=stereo", e.sample_rate),
                    ]);
                }
                MediaInput::SolidColor(color) => {
                    args.extend([
                        "-f".to_string(),
                        "lavfi".to_string(),
                        "-t".to_string(),
                        duration.clone(),
                        "-i".to_string(),
                        format!("color=c={color}:s={}x{}:r={}", e.width, e.height, e.fps),
                    ]);
                }
            }
        }

        args.extend([
            "-filter_complex".to_string(),
            request.filter_complex.clone(),
            "-map".to_string(),
            "[vout]".to_string(),
            "-map".to_string(),
            "[aout]".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            e.preset.clone(),
            "-crf".to_string(),
            e.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            e.fps.to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            format!("{}k", e.audio_bitrate_kbps),
            "-ar".to_string(),
            e.sample_rate.to_string(),
            "-t".to_string(),
            duration,
            "-movflags".to_string(),
            "+faststart".to_string(),
            path_arg(&request.output),
        ]);
        args
    }

    fn run_ffmpeg(&self, unit: &str, args: &[String]) -> ReelResult<()> {
        tracing::debug!(unit, args = ?args, "Running ffmpeg");
        let output = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ReelError::render(unit, format!("failed to launch ffmpeg: {e}")))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(ReelError::render(
            unit,
            format!("ffmpeg exited with {}: {}", output.status, stderr_tail(&stderr)),
        ))
    }

    fn concat_list_path(&self) -> PathBuf {
        let n = self.list_counter.fetch_add(1, Ordering::Relaxed);
        self.scratch_dir
            .join(format!("concat_{}_{n}.txt", std::process::id()))
    }
}

impl MediaEngine for FfmpegEngine {
    fn probe(&self, path: &Path) -> ReelResult<MediaProbe> {
        let mut child = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ReelError::probe(path, format!("failed to launch ffprobe: {e}")))?;

        // Drain stdout on a separate thread so a large report cannot block
        // the child while we wait on it.
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::probe(path, "ffprobe stdout unavailable"))?;
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            stdout.read_to_string(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + self.probe_timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    child.kill().ok();
                    child.wait().ok();
                    tracing::warn!(
                        path = %path.display(),
                        timeout_secs = self.probe_timeout.as_secs(),
                        "ffprobe timed out"
                    );
                    return Err(ReelError::probe(
                        path,
                        format!("timed out after {}s", self.probe_timeout.as_secs()),
                    ));
                }
                None => std::thread::sleep(PROBE_POLL_INTERVAL),
            }
        };

        let json = reader
            .join()
            .map_err(|_| ReelError::probe(path, "ffprobe reader thread panicked"))??;

        if !status.success() {
            return Err(ReelError::probe(
                path,
                format!("ffprobe exited with {status}"),
            ));
        }

        parse_ffprobe_json(&json, path)
    }

    fn render(&self, request: &RenderRequest) -> ReelResult<()> {
        for input in &request.inputs {
            if let Some(path) = input.path() {
                if !path.exists() {
                    return Err(ReelError::input_missing(output_unit(&request.output), path));
                }
            }
        }
        let args = self.render_args(request);
        self.run_ffmpeg(&output_unit(&request.output), &args)
    }

    fn concatenate(&self, clips: &[PathBuf], output: &Path) -> ReelResult<()> {
        if clips.is_empty() {
            return Err(ReelError::empty_input("concatenation"));
        }

        let list_path = self.concat_list_path();
        std::fs::create_dir_all(&self.scratch_dir)?;
        std::fs::write(&list_path, concat_list(clips)?)?;

        let mut args = base_args();
        args.extend([
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            path_arg(&list_path),
            "-c".to_string(),
            "copy".to_string(),
            path_arg(output),
        ]);
        let result = self.run_ffmpeg(&output_unit(output), &args);

        if let Err(e) = std::fs::remove_file(&list_path) {
            tracing::warn!(path = %list_path.display(), error = %e, "Failed to remove concat list");
        }
        result
    }

    fn trim(&self, input: &Path, output: &Path, start_secs: f64, end_secs: f64) -> ReelResult<()> {
        if !input.exists() {
            return Err(ReelError::input_missing("trim", input));
        }
        if !(end_secs > start_secs) || start_secs < 0.0 {
            return Err(ReelError::invalid_input(format!(
                "trim window [{start_secs}, {end_secs}) is empty or negative"
            )));
        }

        let mut args = base_args();
        args.extend([
            "-i".to_string(),
            path_arg(input),
            "-ss".to_string(),
            format!("{start_secs:.3}"),
            "-to".to_string(),
            format!("{end_secs:.3}"),
            "-c".to_string(),
            "copy".to_string(),
            path_arg(output),
        ]);
        self.run_ffmpeg(&output_unit(output), &args)
    }

    fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> ReelResult<()> {
        for path in [video, audio] {
            if !path.exists() {
                return Err(ReelError::input_missing("soundtrack mux", path));
            }
        }

        let mut args = base_args();
        args.extend([
            "-i".to_string(),
            path_arg(video),
            "-i".to_string(),
            path_arg(audio),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.encode.audio_bitrate_kbps),
            "-shortest".to_string(),
            path_arg(output),
        ]);
        self.run_ffmpeg(&output_unit(output), &args)
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg") && command_exists("ffprobe")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

fn base_args() -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ]
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn output_unit(output: &Path) -> String {
    output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| output.display().to_string())
}

/// Body of a concat-demuxer list file.
fn concat_list(clips: &[PathBuf]) -> ReelResult<String> {
    let mut list = String::new();
    for clip in clips {
        let absolute = if clip.is_absolute() {
            clip.clone()
        } else {
            std::env::current_dir()?.join(clip)
        };
        // Single quotes close, escape, and reopen in concat syntax.
        let quoted = absolute.to_string_lossy().replace('\'', r"'\''");
        list.push_str(&format!("file '{quoted}'\n"));
    }
    Ok(list)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    let tail = lines[start..].join("\n");
    if tail.is_empty() {
        "no diagnostic output".to_string()
    } else {
        tail
    }
}

fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> FfmpegEngine {
        FfmpegEngine::new(&RenderSettings::default(), std::env::temp_dir())
    }

    #[test]
    fn test_scene_render_args() {
        let request = RenderRequest {
            filter_complex: "[0:v]null[vout];[1:a]anull[aout]".to_string(),
            inputs: vec![
                MediaInput::Still(PathBuf::from("/p/a.jpg")),
                MediaInput::Silence,
            ],
            output: PathBuf::from("/tmp/scene_1_1.mp4"),
            duration_secs: 8.0,
        };
        let args = engine().render_args(&request);
        let joined = args.join(" ");

        assert!(joined.starts_with("-y -hide_banner -loglevel error -i /p/a.jpg -f lavfi -t 8.000 -i anullsrc=r=48000:cl=stereo"));
        assert!(joined.contains("-map [vout] -map [aout]"));
        assert!(joined.contains("-c:v libx264 -preset fast -crf 23"));
        assert!(joined.contains("-b:a 192k"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/scene_1_1.mp4"));
    }

    #[test]
    fn test_looped_still_and_color_inputs() {
        let request = RenderRequest {
            filter_complex: String::new(),
            inputs: vec![
                MediaInput::LoopedStill(PathBuf::from("bg.jpg")),
                MediaInput::SolidColor("0x14110f".to_string()),
            ],
            output: PathBuf::from("card.mp4"),
            duration_secs: 5.0,
        };
        let joined = engine().render_args(&request).join(" ");
        assert!(joined.contains("-loop 1 -framerate 24 -t 5.000 -i bg.jpg"));
        assert!(joined.contains("-i color=c=0x14110f:s=1920x1080:r=24"));
    }

    #[test]
    fn test_concat_list_quotes_paths() {
        let list = concat_list(&[
            PathBuf::from("/clips/a.mp4"),
            PathBuf::from("/clips/it's.mp4"),
        ])
        .unwrap();
        assert_eq!(list, "file '/clips/a.mp4'\nfile '/clips/it'\\''s.mp4'\n");
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = (0..30).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let tail = stderr_tail(&stderr);
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
        assert_eq!(stderr_tail("\n\n"), "no diagnostic output");
    }

    #[test]
    fn test_trim_rejects_empty_window() {
        let input = std::env::temp_dir().join("docreel_test_trim_input.mp4");
        std::fs::write(&input, b"x").unwrap();
        let err = engine()
            .trim(&input, Path::new("/tmp/out.mp4"), 5.0, 5.0)
            .unwrap_err();
        assert!(matches!(err, ReelError::InvalidInput { .. }));
        std::fs::remove_file(&input).ok();
    }

    #[test]
    fn test_missing_input_is_reported_before_launch() {
        let request = RenderRequest {
            filter_complex: String::new(),
            inputs: vec![MediaInput::Still(PathBuf::from("/definitely/missing.jpg"))],
            output: PathBuf::from("/tmp/never.mp4"),
            duration_secs: 5.0,
        };
        let err = engine().render(&request).unwrap_err();
        assert!(matches!(err, ReelError::InputMissing { .. }));
    }
}
