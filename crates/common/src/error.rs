//! Error types shared across Docreel crates.

use std::path::PathBuf;

/// Top-level error type for Docreel operations.
///
/// The first four variants are the pipeline's failure taxonomy. Assemblers
/// recover from them at the lowest level that can (a scene, a chapter, a
/// transition) and only propagate when nothing survived.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("Input missing for {unit}: {path}")]
    InputMissing { unit: String, path: PathBuf },

    #[error("Render failed for {unit}: {message}")]
    Render { unit: String, message: String },

    #[error("Transition failed: {message}")]
    Transition { message: String },

    #[error("Nothing to assemble: {unit}")]
    EmptyInput { unit: String },

    #[error("Probe failed for {path}: {message}")]
    Probe { path: PathBuf, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    pub fn input_missing(unit: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::InputMissing {
            unit: unit.into(),
            path: path.into(),
        }
    }

    pub fn render(unit: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Render {
            unit: unit.into(),
            message: msg.into(),
        }
    }

    pub fn transition(msg: impl Into<String>) -> Self {
        Self::Transition {
            message: msg.into(),
        }
    }

    pub fn empty_input(unit: impl Into<String>) -> Self {
        Self::EmptyInput { unit: unit.into() }
    }

    pub fn probe(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether an assembler may skip the failing unit and keep going.
    ///
    /// Cancellation and configuration problems abort the whole operation;
    /// everything tied to a single scene or chapter is skippable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InputMissing { .. }
            | Self::Render { .. }
            | Self::Transition { .. }
            | Self::EmptyInput { .. }
            | Self::Probe { .. }
            | Self::InvalidInput { .. }
            | Self::Io(_) => true,
            Self::Cancelled | Self::Config { .. } | Self::Json(_) | Self::Other(_) => false,
        }
    }
}
