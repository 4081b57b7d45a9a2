//! Probe a media file.

use std::path::PathBuf;

use super::Session;

/// `operation` is `info` or `analyze-audio`; both print the probe result.
pub async fn run(session: Session, path: PathBuf, operation: &'static str) -> anyhow::Result<()> {
    session
        .execute(operation, move |studio| studio.probe(&path, operation))
        .await
}
