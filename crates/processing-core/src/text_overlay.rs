//! Text overlay timing and layout.
//!
//! Turns a [`TextOverlay`] into an ordered list of drawing primitives, each
//! with its own position and visibility window. Two modes:
//!
//! - **Static fade:** one run per line, alpha ramps in over the style's fade
//!   length and, when an end time is given, ramps out symmetrically before it.
//! - **Typewriter:** one run per glyph. Glyph `i` of the flattened text
//!   (newlines count as one step) appears at `start + i / chars_per_second`
//!   and stays.
//!
//! Glyph placement uses a fixed-width estimate (`size * 0.55` per glyph,
//! `size * 1.4` per line). Real advances depend on the compositor's font
//! rasterizer, so typewriter text in proportional fonts is only roughly
//! spaced.

use std::collections::BTreeMap;

use docreel_common::error::{ReelError, ReelResult};
use docreel_project_model::project::TextOverlay;
use docreel_project_model::style::{StyleFlags, TextAnchor, TextStyle};
use serde::Serialize;

/// How far ahead of the first glyph a typewriter box appears.
pub const BOX_LEAD_SECS: f64 = 0.15;

/// Shadow offset in pixels.
pub const SHADOW_OFFSET: f64 = 2.0;

const SHADOW_COLOR: &str = "black@0.6";
const BOX_COLOR: &str = "black@0.45";

/// When a primitive is drawn and how opaque it is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Visibility {
    /// First visible instant, in clip seconds.
    pub start: f64,
    /// Alpha ramp length; `0` means a hard step.
    pub fade_in: f64,
    /// Instant by which the primitive has faded out, if any.
    pub end: Option<f64>,
}

impl Visibility {
    /// Visible from `start` onwards with no fade.
    pub fn at(start: f64) -> Self {
        Self {
            start,
            fade_in: 0.0,
            end: None,
        }
    }

    pub fn is_visible_at(&self, t: f64) -> bool {
        t >= self.start && self.end.map_or(true, |end| t <= end)
    }

    /// Opacity at clip time `t`, in `[0, 1]`.
    pub fn alpha_at(&self, t: f64) -> f64 {
        if !self.is_visible_at(t) {
            return 0.0;
        }
        if self.fade_in <= 0.0 {
            return 1.0;
        }
        let rise = (t - self.start) / self.fade_in;
        let alpha = match self.end {
            Some(end) => rise.min((end - t) / self.fade_in),
            None => rise,
        };
        alpha.clamp(0.0, 1.0)
    }

    /// ffmpeg timeline expression for the `enable` option.
    pub fn enable_expr(&self) -> String {
        match self.end {
            Some(end) => format!("between(t,{},{})", secs(self.start), secs(end)),
            None => format!("gte(t,{})", secs(self.start)),
        }
    }

    /// ffmpeg `alpha` expression, or `None` for a hard step.
    pub fn alpha_expr(&self) -> Option<String> {
        if self.fade_in <= 0.0 {
            return None;
        }
        let (s, f) = (secs(self.start), secs(self.fade_in));
        Some(match self.end {
            Some(end) => format!("clip(min((t-{s})/{f},({e}-t)/{f}),0,1)", e = secs(end)),
            None => format!("clip((t-{s})/{f},0,1)"),
        })
    }
}

/// Seconds formatted for filter expressions.
pub(crate) fn secs(value: f64) -> String {
    format!("{value:.3}")
}

/// A horizontal or vertical position: a pixel value, or an ffmpeg
/// expression evaluated by the compositor (e.g. centering on `text_w`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Position {
    Px(f64),
    Expr(String),
}

impl Position {
    /// Shift by a pixel offset.
    pub fn offset(&self, delta: f64) -> Position {
        match self {
            Position::Px(v) => Position::Px(v + delta),
            Position::Expr(e) => Position::Expr(format!("{e}+{delta}")),
        }
    }

    pub fn to_expr(&self) -> String {
        match self {
            Position::Px(v) => format!("{v:.1}"),
            Position::Expr(e) => e.clone(),
        }
    }
}

/// A run of text drawn with one font, color, and visibility window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlyphRun {
    pub text: String,
    pub x: Position,
    pub y: Position,
    pub font_size: u32,
    pub color: String,
    pub font: String,
    pub visibility: Visibility,
}

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One drawing step, in paint order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayPrimitive {
    Box {
        rect: Rect,
        color: String,
        visibility: Visibility,
    },
    ShadowGlyph(GlyphRun),
    Glyph(GlyphRun),
}

impl OverlayPrimitive {
    pub fn visibility(&self) -> &Visibility {
        match self {
            OverlayPrimitive::Box { visibility, .. } => visibility,
            OverlayPrimitive::ShadowGlyph(run) | OverlayPrimitive::Glyph(run) => &run.visibility,
        }
    }
}

/// Read-only registry of text styles.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    styles: BTreeMap<String, TextStyle>,
}

impl StyleRegistry {
    pub fn new(styles: impl IntoIterator<Item = TextStyle>) -> Self {
        Self {
            styles: styles.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    /// Built-in documentary styles.
    pub fn builtin() -> Self {
        let style = |id: &str,
                     size: u32,
                     color: &str,
                     font: &str,
                     anchor: TextAnchor,
                     flags: StyleFlags,
                     fade_in_secs: f64| TextStyle {
            id: id.to_string(),
            size,
            color: color.to_string(),
            font: font.to_string(),
            anchor,
            flags,
            fade_in_secs,
        };
        let shadow = StyleFlags {
            shadow: true,
            ..StyleFlags::default()
        };
        let boxed = StyleFlags {
            shadow: true,
            boxed: true,
            typewriter: false,
        };
        let stamp = StyleFlags {
            shadow: true,
            boxed: true,
            typewriter: true,
        };

        Self::new([
            style("title", 84, "0xF4E9D8", "Serif", TextAnchor::Center, shadow, 1.0),
            style("title_year", 44, "0xD8C9A8", "Serif", TextAnchor::BelowCenter, shadow, 1.2),
            style("chapter_title", 64, "white", "Serif", TextAnchor::LowerThird, boxed, 0.8),
            style("caption", 40, "white", "Sans", TextAnchor::BottomCenter, boxed, 0.5),
            style("location_stamp", 36, "0xF4E9D8", "Monospace", TextAnchor::BottomLeft, stamp, 0.0),
            style("quote", 48, "white", "Serif", TextAnchor::Center, shadow, 1.0),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&TextStyle> {
        self.styles.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }
}

/// Lays out overlays on a fixed canvas.
#[derive(Debug, Clone)]
pub struct TextOverlayEngine {
    styles: StyleRegistry,
    canvas: (u32, u32),
    default_chars_per_second: f64,
}

impl TextOverlayEngine {
    pub fn new(styles: StyleRegistry, canvas: (u32, u32), default_chars_per_second: f64) -> Self {
        Self {
            styles,
            canvas,
            default_chars_per_second,
        }
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Primitives for `overlay`, in paint order.
    pub fn layout(&self, overlay: &TextOverlay) -> ReelResult<Vec<OverlayPrimitive>> {
        let style = self.styles.get(&overlay.style).ok_or_else(|| {
            ReelError::invalid_input(format!("unknown text style '{}'", overlay.style))
        })?;
        if !overlay.start.is_finite() || overlay.start < 0.0 {
            return Err(ReelError::invalid_input(format!(
                "overlay start must be a non-negative time, got {}",
                overlay.start
            )));
        }
        if overlay.text.trim().is_empty() {
            return Ok(vec![]);
        }

        if overlay.typewriter.unwrap_or(style.flags.typewriter) {
            let cps = overlay
                .chars_per_second
                .unwrap_or(self.default_chars_per_second);
            if !(cps > 0.0) {
                return Err(ReelError::invalid_input(format!(
                    "chars_per_second must be positive, got {cps}"
                )));
            }
            Ok(self.typewriter(&overlay.text, style, overlay.start, cps))
        } else {
            if let Some(end) = overlay.end {
                if end <= overlay.start {
                    return Err(ReelError::invalid_input(format!(
                        "overlay end {end} is not after its start {}",
                        overlay.start
                    )));
                }
            }
            let visibility = Visibility {
                start: overlay.start,
                fade_in: style.fade_in_secs,
                end: overlay.end,
            };
            Ok(self.static_fade(&overlay.text, style, visibility))
        }
    }

    /// One run per line, all sharing `visibility`.
    pub fn static_fade(
        &self,
        text: &str,
        style: &TextStyle,
        visibility: Visibility,
    ) -> Vec<OverlayPrimitive> {
        let lines: Vec<&str> = text.lines().collect();
        let block = self.block_origin(style, &lines);
        let mut out = vec![];

        if style.flags.boxed {
            out.push(self.box_for(style, &lines, block, visibility));
        }

        let centered = is_horizontally_centered(style.anchor);
        for (li, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let x = if centered {
                Position::Expr("(w-text_w)/2".to_string())
            } else {
                Position::Px(block.0)
            };
            let y = Position::Px(block.1 + li as f64 * style.line_height());
            push_run(&mut out, style, line.to_string(), x, y, visibility);
        }

        out
    }

    /// One run per visible glyph, revealed at `start + i / cps`.
    pub fn typewriter(
        &self,
        text: &str,
        style: &TextStyle,
        start: f64,
        chars_per_second: f64,
    ) -> Vec<OverlayPrimitive> {
        let lines: Vec<&str> = text.split('\n').collect();
        let block = self.block_origin(style, &lines);
        let mut out = vec![];

        if style.flags.boxed {
            let lead = Visibility::at((start - BOX_LEAD_SECS).max(0.0));
            out.push(self.box_for(style, &lines, block, lead));
        }

        let mut index = 0usize;
        for (li, line) in lines.iter().enumerate() {
            if li > 0 {
                // The newline itself takes one reveal step.
                index += 1;
            }
            for (col, ch) in line.chars().enumerate() {
                let reveal = start + index as f64 / chars_per_second;
                index += 1;
                if ch.is_whitespace() {
                    continue;
                }
                let x = Position::Px(block.0 + col as f64 * style.glyph_advance());
                let y = Position::Px(block.1 + li as f64 * style.line_height());
                push_run(&mut out, style, ch.to_string(), x, y, Visibility::at(reveal));
            }
        }

        out
    }

    /// Top-left corner of the text block.
    fn block_origin(&self, style: &TextStyle, lines: &[&str]) -> (f64, f64) {
        let (w, h) = (self.canvas.0 as f64, self.canvas.1 as f64);
        let (bw, bh) = block_size(style, lines);
        let margin = h * 0.06;
        let centered_x = (w - bw) / 2.0;

        let (x, y) = match style.anchor {
            TextAnchor::TopLeft => (margin, margin),
            TextAnchor::TopCenter => (centered_x, margin),
            TextAnchor::Center => (centered_x, (h - bh) / 2.0),
            TextAnchor::BelowCenter => (centered_x, h / 2.0 + style.size as f64 * 0.8),
            TextAnchor::LowerThird => (margin, h * 2.0 / 3.0),
            TextAnchor::BottomLeft => (margin, h - margin - bh),
            TextAnchor::BottomCenter => (centered_x, h - margin - bh),
        };
        (x.max(0.0), y.max(0.0))
    }

    fn box_for(
        &self,
        style: &TextStyle,
        lines: &[&str],
        origin: (f64, f64),
        visibility: Visibility,
    ) -> OverlayPrimitive {
        let (bw, bh) = block_size(style, lines);
        let pad = style.size as f64 * 0.4;
        let x = (origin.0 - pad).max(0.0);
        let y = (origin.1 - pad).max(0.0);
        OverlayPrimitive::Box {
            rect: Rect {
                x,
                y,
                w: (bw + 2.0 * pad).min(self.canvas.0 as f64 - x),
                h: (bh + 2.0 * pad).min(self.canvas.1 as f64 - y),
            },
            color: BOX_COLOR.to_string(),
            visibility,
        }
    }
}

/// Block size from the longest line and the line count.
fn block_size(style: &TextStyle, lines: &[&str]) -> (f64, f64) {
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    (
        longest as f64 * style.glyph_advance(),
        lines.len() as f64 * style.line_height(),
    )
}

fn is_horizontally_centered(anchor: TextAnchor) -> bool {
    matches!(
        anchor,
        TextAnchor::TopCenter | TextAnchor::Center | TextAnchor::BelowCenter | TextAnchor::BottomCenter
    )
}

fn push_run(
    out: &mut Vec<OverlayPrimitive>,
    style: &TextStyle,
    text: String,
    x: Position,
    y: Position,
    visibility: Visibility,
) {
    if style.flags.shadow {
        out.push(OverlayPrimitive::ShadowGlyph(GlyphRun {
            text: text.clone(),
            x: x.offset(SHADOW_OFFSET),
            y: y.offset(SHADOW_OFFSET),
            font_size: style.size,
            color: SHADOW_COLOR.to_string(),
            font: style.font.clone(),
            visibility,
        }));
    }
    out.push(OverlayPrimitive::Glyph(GlyphRun {
        text,
        x,
        y,
        font_size: style.size,
        color: style.color.clone(),
        font: style.font.clone(),
        visibility,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> TextOverlayEngine {
        TextOverlayEngine::new(StyleRegistry::builtin(), (1920, 1080), 14.0)
    }

    fn glyphs(primitives: &[OverlayPrimitive]) -> Vec<&GlyphRun> {
        primitives
            .iter()
            .filter_map(|p| match p {
                OverlayPrimitive::Glyph(run) => Some(run),
                _ => None,
            })
            .collect()
    }

    fn plain_style() -> TextStyle {
        TextStyle {
            id: "plain".to_string(),
            size: 40,
            color: "white".to_string(),
            font: "Sans".to_string(),
            anchor: TextAnchor::TopLeft,
            flags: StyleFlags::default(),
            fade_in_secs: 0.5,
        }
    }

    #[test]
    fn test_typewriter_reveal_times() {
        let prims = engine().typewriter("AB", &plain_style(), 1.0, 2.0);
        let runs = glyphs(&prims);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "A");
        assert!((runs[0].visibility.start - 1.0).abs() < 1e-9);
        assert_eq!(runs[1].text, "B");
        assert!((runs[1].visibility.start - 1.5).abs() < 1e-9);

        assert!(!runs[0].visibility.is_visible_at(0.99));
        assert!(runs[0].visibility.is_visible_at(1.0));
        assert!(!runs[1].visibility.is_visible_at(1.49));
        assert!(runs[1].visibility.is_visible_at(1.5));
        // Monotonic: once shown, glyphs stay.
        assert!(runs[0].visibility.is_visible_at(1_000.0));
    }

    #[test]
    fn test_typewriter_newline_counts_as_one_step() {
        let style = plain_style();
        let prims = engine().typewriter("A\nB", &style, 0.0, 1.0);
        let runs = glyphs(&prims);
        assert!((runs[1].visibility.start - 2.0).abs() < 1e-9);
        assert_eq!(runs[1].x, Position::Px(runs[0].x_px()));
        assert_eq!(runs[1].y, Position::Px(runs[0].y_px() + style.line_height()));
    }

    #[test]
    fn test_typewriter_spaces_take_time_but_emit_nothing() {
        let style = plain_style();
        let prims = engine().typewriter("A B", &style, 0.0, 10.0);
        let runs = glyphs(&prims);
        assert_eq!(runs.len(), 2);
        assert!((runs[1].visibility.start - 0.2).abs() < 1e-9);
        assert!((runs[1].x_px() - runs[0].x_px() - 2.0 * style.glyph_advance()).abs() < 1e-9);
    }

    #[test]
    fn test_typewriter_box_is_single_and_leads_text() {
        let engine = engine();
        let style = engine.styles().get("location_stamp").unwrap().clone();
        let prims = engine.typewriter("Lyon\n1962", &style, 0.5, 14.0);

        let boxes: Vec<_> = prims
            .iter()
            .filter(|p| matches!(p, OverlayPrimitive::Box { .. }))
            .collect();
        assert_eq!(boxes.len(), 1);
        assert!(matches!(prims[0], OverlayPrimitive::Box { .. }));

        let OverlayPrimitive::Box { rect, visibility, .. } = &prims[0] else {
            unreachable!()
        };
        assert!((visibility.start - (0.5 - BOX_LEAD_SECS)).abs() < 1e-9);
        let pad = style.size as f64 * 0.4;
        assert!((rect.w - (4.0 * style.glyph_advance() + 2.0 * pad)).abs() < 1e-9);
        assert!((rect.h - (2.0 * style.line_height() + 2.0 * pad)).abs() < 1e-9);
    }

    #[test]
    fn test_box_lead_never_negative() {
        let engine = engine();
        let style = engine.styles().get("location_stamp").unwrap().clone();
        let prims = engine.typewriter("X", &style, 0.05, 14.0);
        assert_eq!(prims[0].visibility().start, 0.0);
    }

    #[test]
    fn test_shadow_precedes_glyph() {
        let engine = engine();
        let style = engine.styles().get("quote").unwrap().clone();
        let prims = engine.typewriter("Q", &style, 0.0, 1.0);
        assert_eq!(prims.len(), 2);
        let (OverlayPrimitive::ShadowGlyph(shadow), OverlayPrimitive::Glyph(glyph)) =
            (&prims[0], &prims[1])
        else {
            panic!("expected shadow then glyph, got {prims:?}");
        };
        assert!((shadow.x_px() - glyph.x_px() - SHADOW_OFFSET).abs() < 1e-9);
    }

    #[test]
    fn test_static_fade_alpha_ramp() {
        let vis = Visibility {
            start: 1.0,
            fade_in: 0.5,
            end: Some(4.0),
        };
        assert_eq!(vis.alpha_at(0.5), 0.0);
        assert!((vis.alpha_at(1.25) - 0.5).abs() < 1e-9);
        assert!((vis.alpha_at(2.0) - 1.0).abs() < 1e-9);
        assert!((vis.alpha_at(3.75) - 0.5).abs() < 1e-9);
        assert_eq!(vis.alpha_at(4.5), 0.0);
        assert_eq!(vis.enable_expr(), "between(t,1.000,4.000)");
        assert_eq!(
            vis.alpha_expr().unwrap(),
            "clip(min((t-1.000)/0.500,(4.000-t)/0.500),0,1)"
        );
    }

    #[test]
    fn test_static_fade_without_end_stays() {
        let vis = Visibility {
            start: 0.5,
            fade_in: 0.8,
            end: None,
        };
        assert!((vis.alpha_at(100.0) - 1.0).abs() < 1e-9);
        assert_eq!(vis.enable_expr(), "gte(t,0.500)");
        assert_eq!(vis.alpha_expr().unwrap(), "clip((t-0.500)/0.800,0,1)");
        assert_eq!(Visibility::at(2.0).alpha_expr(), None);
    }

    #[test]
    fn test_static_layout_one_run_per_line_centered() {
        let overlay = TextOverlay::new("Line one\nLine two", "quote", 1.0);
        let prims = engine().layout(&overlay).unwrap();
        let runs = glyphs(&prims);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].x, Position::Expr("(w-text_w)/2".to_string()));
        assert_eq!(runs[0].visibility.fade_in, 1.0);
    }

    #[test]
    fn test_layout_uses_style_typewriter_flag_unless_overridden() {
        let engine = engine();
        let stamp = TextOverlay::new("Lyon", "location_stamp", 0.5);
        assert_eq!(glyphs(&engine.layout(&stamp).unwrap()).len(), 4);

        let forced_static = stamp.clone().with_typewriter(false);
        assert_eq!(glyphs(&engine.layout(&forced_static).unwrap()).len(), 1);
    }

    #[test]
    fn test_layout_rejects_unknown_style_and_bad_timing() {
        let engine = engine();
        assert!(engine.layout(&TextOverlay::new("x", "comic_sans", 0.0)).is_err());

        let mut overlay = TextOverlay::new("x", "caption", 2.0);
        overlay.end = Some(1.0);
        assert!(engine.layout(&overlay).is_err());

        let mut overlay = TextOverlay::new("x", "caption", 0.0).with_typewriter(true);
        overlay.chars_per_second = Some(0.0);
        assert!(engine.layout(&overlay).is_err());
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let prims = engine().layout(&TextOverlay::new("  ", "caption", 0.0)).unwrap();
        assert!(prims.is_empty());
    }

    impl GlyphRun {
        fn x_px(&self) -> f64 {
            match self.x {
                Position::Px(v) => v,
                Position::Expr(_) => panic!("expected pixel x"),
            }
        }

        fn y_px(&self) -> f64 {
            match self.y {
                Position::Px(v) => v,
                Position::Expr(_) => panic!("expected pixel y"),
            }
        }
    }
}
