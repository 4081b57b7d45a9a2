//! Docreel Processing Core
//!
//! Turns scene descriptions into compositor instructions:
//! - **Motion:** Named zoom/pan presets and the rotation that assigns them
//! - **Text overlays:** Typewriter and fade timing, anchored layout
//! - **Filter graphs:** Scene, title-card, and crossfade-chain graphs
//! - **Timing:** Scene duration resolution and crossfade offset planning
//!
//! This crate is pure computation: no I/O, no processes.
//! All inputs are data; all outputs are data.

pub mod ease;
pub mod filter_graph;
pub mod motion;
pub mod text_overlay;
pub mod timing;

pub use filter_graph::{FilterGraphBuilder, SceneGraph, TitleBackground};
pub use motion::MotionLibrary;
pub use text_overlay::{OverlayPrimitive, StyleRegistry, TextOverlayEngine, Visibility};
pub use timing::{plan_crossfades, CrossfadePlan, DurationPolicy};
