//! Docreel Project Model
//!
//! Defines the core data contracts for Docreel projects:
//! - **Project:** Title, optional title card, ordered chapters, intro/outro
//! - **Chapter / Scene:** Ordered stills with optional narration and overlay
//! - **MotionPreset:** Start/end zoom and pan anchor for a simulated camera move
//! - **TextStyle:** Typography and placement for text overlays
//!
//! Pan anchors are normalized to `[0.0, 1.0]` of the source image so a
//! preset applies to any image resolution.

pub mod motion;
pub mod project;
pub mod style;

pub use motion::*;
pub use project::*;
pub use style::*;
