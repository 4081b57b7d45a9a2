//! Intermediate clips and the scratch directory that holds them.
//!
//! A [`RenderedClip`] is owned by the stage that produced it until the next
//! stage consumes it; the consumer deletes it with [`RenderedClip::discard`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use docreel_common::error::ReelResult;
use serde::Serialize;

/// A media file on disk with a known duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedClip {
    pub path: PathBuf,
    pub duration_secs: f64,
}

impl RenderedClip {
    pub fn new(path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            path: path.into(),
            duration_secs,
        }
    }

    /// Delete the backing file. Failures are logged, not returned.
    pub fn discard(self) {
        remove_quietly(&self.path);
    }

    /// Move the clip to `dest`, falling back to copy + delete across
    /// filesystems.
    pub fn move_to(self, dest: &Path) -> ReelResult<RenderedClip> {
        ensure_parent(dest)?;
        if std::fs::rename(&self.path, dest).is_err() {
            std::fs::copy(&self.path, dest)?;
            remove_quietly(&self.path);
        }
        Ok(RenderedClip::new(dest, self.duration_secs))
    }
}

/// Create the directory `path` will be written into.
pub(crate) fn ensure_parent(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Remove a file if it exists, logging anything but "not found".
pub(crate) fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::trace!(path = %path.display(), "Removed scratch file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch file"),
    }
}

/// Directory shared by every stage for intermediate clips.
#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
    counter: AtomicU64,
}

impl ScratchDir {
    /// Use (and create) `root`.
    pub fn create(root: impl Into<PathBuf>) -> ReelResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            counter: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// A fresh `.mp4` path that no other stage or process is using.
    pub fn clip_path(&self, stem: &str) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!("{stem}_{}_{n}.mp4", std::process::id()))
    }
}
