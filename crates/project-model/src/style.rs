//! Text styles for overlays.

use serde::{Deserialize, Serialize};

/// Where a block of text is placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    TopLeft,
    TopCenter,
    /// Block centered on the canvas.
    Center,
    /// Just below the canvas center (subtitle under a centered title).
    BelowCenter,
    /// Left-aligned, about two thirds down the canvas.
    LowerThird,
    BottomLeft,
    BottomCenter,
}

/// Rendering switches for a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleFlags {
    /// Draw a dark offset copy under each glyph.
    pub shadow: bool,
    /// Draw a translucent box behind the whole block.
    pub boxed: bool,
    /// Reveal glyph by glyph unless the overlay says otherwise.
    pub typewriter: bool,
}

/// Typography and placement for an overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Registry key, e.g. `caption`.
    pub id: String,
    /// Font size in pixels.
    pub size: u32,
    /// Fill color in ffmpeg syntax (`white`, `0xF4E9D8`, `black@0.5`).
    pub color: String,
    /// Font family tag passed to the compositor's font lookup.
    pub font: String,
    /// Placement on the canvas.
    pub anchor: TextAnchor,
    #[serde(default)]
    pub flags: StyleFlags,
    /// Alpha ramp length for static overlays.
    pub fade_in_secs: f64,
}

impl TextStyle {
    /// Vertical distance between consecutive lines.
    pub fn line_height(&self) -> f64 {
        self.size as f64 * 1.4
    }

    /// Approximate horizontal advance of one glyph.
    ///
    /// A fixed-width estimate: real advances depend on the compositor's
    /// font rasterizer, which this crate does not see.
    pub fn glyph_advance(&self) -> f64 {
        self.size as f64 * 0.55
    }
}
