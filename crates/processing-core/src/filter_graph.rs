//! Filter-graph compilation.
//!
//! Every graph here is a pure function of its inputs, so the same scene,
//! preset, and canvas always produce byte-identical text. Input conventions:
//!
//! | Graph        | input 0                         | input 1             |
//! |--------------|---------------------------------|---------------------|
//! | scene        | still image (single frame)      | narration / silence |
//! | title card   | looped still or solid color     | silence             |
//! | crossfade    | clip 0 ... clip n-1 (video + audio)                  ||
//!
//! All graphs end in `[vout]` and `[aout]`.

use docreel_common::config::RenderSettings;
use docreel_project_model::motion::MotionPreset;

use crate::ease::ease_expr;
use crate::text_overlay::{secs, OverlayPrimitive};
use crate::timing::{frame_count, CrossfadePlan};

/// Output label of the video chain.
pub const VIDEO_OUT: &str = "vout";
/// Output label of the audio chain.
pub const AUDIO_OUT: &str = "aout";

/// Fixed documentary grade applied after motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorGrade {
    pub contrast: f64,
    pub saturation: f64,
    pub brightness: f64,
}

impl Default for ColorGrade {
    fn default() -> Self {
        Self {
            contrast: 1.08,
            saturation: 0.82,
            brightness: 0.0,
        }
    }
}

impl ColorGrade {
    fn to_filter(self) -> String {
        let mut filter = format!(
            "eq=contrast={:.3}:saturation={:.3}",
            self.contrast, self.saturation
        );
        if self.brightness != 0.0 {
            filter.push_str(&format!(":brightness={:.3}", self.brightness));
        }
        filter
    }
}

/// Background of a synthesized title card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleBackground {
    /// Input 0 is a looped still that gets blurred and darkened.
    BlurredStill,
    /// Input 0 is already a solid color source at canvas size.
    Solid,
}

/// A compiled graph plus the numbers the engine needs to run it.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    pub filter_complex: String,
    pub frames: u64,
    pub duration_secs: f64,
}

/// Compiles scenes, title cards, and crossfade chains into ffmpeg
/// `-filter_complex` text.
#[derive(Debug, Clone)]
pub struct FilterGraphBuilder {
    canvas: (u32, u32),
    fps: u32,
    sample_rate: u32,
    grade: ColorGrade,
}

impl FilterGraphBuilder {
    pub fn new(canvas: (u32, u32), fps: u32, sample_rate: u32) -> Self {
        Self {
            canvas,
            fps,
            sample_rate,
            grade: ColorGrade::default(),
        }
    }

    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(settings.canvas(), settings.fps, settings.audio_sample_rate)
    }

    /// One scene: eased zoom/pan over the still, the grade, then overlays.
    pub fn build_scene(
        &self,
        preset: &MotionPreset,
        overlays: &[OverlayPrimitive],
        duration_secs: f64,
    ) -> SceneGraph {
        let (w, h) = self.canvas;
        let frames = frame_count(duration_secs, self.fps);

        // Oversample so sub-pixel pan steps do not jitter.
        let mut video = vec![
            format!(
                "scale={sw}:{sh}:force_original_aspect_ratio=increase",
                sw = w * 2,
                sh = h * 2
            ),
            format!("crop={}:{}", w * 2, h * 2),
            "setsar=1".to_string(),
            self.motion_filter(preset, frames),
            self.grade.to_filter(),
        ];
        video.extend(overlays.iter().map(overlay_filter));
        video.extend(self.video_tail(duration_secs));

        SceneGraph {
            filter_complex: format!(
                "[0:v]{}[{VIDEO_OUT}];{}",
                video.join(","),
                self.audio_chain(1, duration_secs)
            ),
            frames,
            duration_secs,
        }
    }

    /// A static title card over a blurred still or a solid color.
    pub fn build_title_card(
        &self,
        background: TitleBackground,
        overlays: &[OverlayPrimitive],
        duration_secs: f64,
    ) -> SceneGraph {
        let (w, h) = self.canvas;
        let mut video = vec![
            format!("scale={w}:{h}:force_original_aspect_ratio=increase"),
            format!("crop={w}:{h}"),
            "setsar=1".to_string(),
        ];
        if background == TitleBackground::BlurredStill {
            video.push("boxblur=20:2".to_string());
            video.push(
                ColorGrade {
                    contrast: 1.0,
                    saturation: 0.6,
                    brightness: -0.15,
                }
                .to_filter(),
            );
        }
        video.push(format!("fps={}", self.fps));
        video.extend(overlays.iter().map(overlay_filter));
        video.extend(self.video_tail(duration_secs));

        SceneGraph {
            filter_complex: format!(
                "[0:v]{}[{VIDEO_OUT}];{}",
                video.join(","),
                self.audio_chain(1, duration_secs)
            ),
            frames: frame_count(duration_secs, self.fps),
            duration_secs,
        }
    }

    /// Chained `xfade` / `acrossfade` over `plan.durations.len()` inputs.
    ///
    /// Each input is first normalized to the canvas, frame rate, and sample
    /// layout so clips from different sources can be blended.
    pub fn build_crossfade(&self, plan: &CrossfadePlan) -> String {
        let (w, h) = self.canvas;
        let n = plan.durations.len();
        let g = secs(plan.transition_secs);
        let mut parts = Vec::with_capacity(n * 4);

        for i in 0..n {
            parts.push(format!(
                "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p,settb=AVTB[v{i}]",
                fps = self.fps
            ));
            parts.push(format!("[{i}:a]{}[a{i}]", self.audio_format()));
        }

        let label = |prefix: &str, k: usize| {
            if k == n - 1 {
                match prefix {
                    "v" => VIDEO_OUT.to_string(),
                    _ => AUDIO_OUT.to_string(),
                }
            } else {
                format!("{prefix}x{k}")
            }
        };

        let mut video_in = "v0".to_string();
        let mut audio_in = "a0".to_string();
        for (k, offset) in plan.offsets.iter().enumerate() {
            let next = k + 1;
            let (video_out, audio_out) = (label("v", next), label("a", next));
            parts.push(format!(
                "[{video_in}][v{next}]xfade=transition=fade:duration={g}:offset={}[{video_out}]",
                secs(*offset)
            ));
            parts.push(format!(
                "[{audio_in}][a{next}]acrossfade=d={g}[{audio_out}]"
            ));
            video_in = video_out;
            audio_in = audio_out;
        }

        parts.join(";")
    }

    /// `zoompan` with cosine-eased zoom and pan over `frames` frames.
    ///
    /// `x = anchor_x(t)·iw − iw/zoom/2`, likewise for `y`, so the anchor
    /// stays at the frame center while the zoom changes.
    pub fn motion_filter(&self, preset: &MotionPreset, frames: u64) -> String {
        let (w, h) = self.canvas;
        let progress = format!("on/{}", frames.saturating_sub(1).max(1));
        let ease = ease_expr(&progress);
        let lerp = |a: f64, b: f64| format!("{a:.4}+({:.4})*{ease}", b - a);

        format!(
            "zoompan=z='{z}':x='({x})*iw-iw/zoom/2':y='({y})*ih-ih/zoom/2':d={frames}:s={w}x{h}:fps={fps}",
            z = lerp(preset.start_zoom, preset.end_zoom),
            x = lerp(preset.start_anchor.x, preset.end_anchor.x),
            y = lerp(preset.start_anchor.y, preset.end_anchor.y),
            fps = self.fps,
        )
    }

    fn video_tail(&self, duration_secs: f64) -> [String; 3] {
        [
            "format=yuv420p".to_string(),
            format!("trim=duration={}", secs(duration_secs)),
            "setpts=PTS-STARTPTS".to_string(),
        ]
    }

    fn audio_format(&self) -> String {
        format!(
            "aformat=sample_fmts=fltp:sample_rates={}:channel_layouts=stereo",
            self.sample_rate
        )
    }

    /// Pad or cut the audio input to exactly the clip length.
    fn audio_chain(&self, input: usize, duration_secs: f64) -> String {
        format!(
            "[{input}:a]{},apad,atrim=duration={},asetpts=PTS-STARTPTS[{AUDIO_OUT}]",
            self.audio_format(),
            secs(duration_secs)
        )
    }
}

/// One `drawbox` or `drawtext` step.
pub fn overlay_filter(primitive: &OverlayPrimitive) -> String {
    match primitive {
        OverlayPrimitive::Box {
            rect,
            color,
            visibility,
        } => format!(
            "drawbox=x={:.1}:y={:.1}:w={:.1}:h={:.1}:color={}:t=fill:enable='{}'",
            rect.x,
            rect.y,
            rect.w,
            rect.h,
            quote_filter_value(color),
            visibility.enable_expr()
        ),
        OverlayPrimitive::ShadowGlyph(run) | OverlayPrimitive::Glyph(run) => {
            let mut filter = format!(
                "drawtext=font={}:text={}:fontsize={}:fontcolor={}:x='{}':y='{}':enable='{}'",
                quote_filter_value(&run.font),
                quote_drawtext_value(&run.text),
                run.font_size,
                quote_filter_value(&run.color),
                run.x.to_expr(),
                run.y.to_expr(),
                run.visibility.enable_expr()
            );
            if let Some(alpha) = run.visibility.alpha_expr() {
                filter.push_str(&format!(":alpha='{alpha}'"));
            }
            filter
        }
    }
}

/// Quote a value for one filter option inside `-filter_complex`.
///
/// The graph parser strips the outer quotes, then the option parser
/// unescapes `\`, `'` and `:`. Quoted spans have no escapes, so a literal
/// `'` closes the span, is escaped on its own, and reopens it.
pub fn quote_filter_value(raw: &str) -> String {
    let mut option = String::with_capacity(raw.len() + 2);
    for c in raw.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            option.push('\\');
        }
        option.push(c);
    }
    format!("'{}'", option.replace('\'', r"'\''"))
}

/// Quote user text for `drawtext`, which unescapes `\` and expands `%{...}`
/// once more after the option parser.
pub fn quote_drawtext_value(raw: &str) -> String {
    quote_filter_value(&raw.replace('\\', r"\\").replace('%', r"\%"))
}
