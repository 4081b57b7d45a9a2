//! Structured operation results.
//!
//! Every top-level operation ends in an [`OperationReport`], including
//! failed ones. Partial success (some scenes or chapters skipped) is still
//! `success: true`; the per-unit entries say what was dropped and why.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use docreel_common::error::ReelError;
use serde::Serialize;

use crate::transition::CompositionKind;

/// What happened to one scene or chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Rendered,
    /// Not attempted because an input was missing.
    Skipped,
    /// Attempted and failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    pub index: usize,
    pub label: String,
    pub status: UnitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl UnitReport {
    pub fn rendered(index: usize, label: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            index,
            label: label.into(),
            status: UnitStatus::Rendered,
            detail,
        }
    }

    /// Skipped for missing inputs, failed for anything else.
    pub fn from_error(index: usize, label: impl Into<String>, error: &ReelError) -> Self {
        let status = match error {
            ReelError::InputMissing { .. } => UnitStatus::Skipped,
            _ => UnitStatus::Failed,
        };
        Self {
            index,
            label: label.into(),
            status,
            detail: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    pub success: bool,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<UnitReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<UnitReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<CompositionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Operation-specific payload (probe results, validation findings).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OperationReport {
    /// Start a report; `finished_at` is stamped by `succeed` / `fail`.
    pub fn begin(operation: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            success: false,
            operation: operation.into(),
            output: None,
            duration_secs: None,
            message: None,
            scenes: vec![],
            chapters: vec![],
            composition: None,
            fallback_reason: None,
            data: None,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn succeed(self) -> Self {
        self.finish(true)
    }

    pub fn fail(mut self, error: &ReelError) -> Self {
        self.message = Some(error.to_string());
        self.finish(false)
    }

    /// Stamp `finished_at` with an explicit outcome.
    pub fn finish(mut self, success: bool) -> Self {
        self.success = success;
        self.finished_at = Utc::now();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>, duration_secs: f64) -> Self {
        self.output = Some(output.into());
        self.duration_secs = Some(duration_secs);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Number of scenes that did not make it into the output.
    pub fn dropped_scenes(&self) -> usize {
        self.scenes
            .iter()
            .filter(|s| s.status != UnitStatus::Rendered)
            .count()
    }
}
