//! Join existing clips.

use std::path::PathBuf;

use super::Session;

pub async fn run(
    session: Session,
    clips: Vec<PathBuf>,
    output: PathBuf,
    transition: Option<f64>,
) -> anyhow::Result<()> {
    tracing::info!(
        clips = clips.len(),
        transition_secs = ?transition,
        output = %output.display(),
        "Merging clips"
    );
    session
        .execute("compose-transition", move |studio| {
            studio.compose_files(&clips, transition, &output)
        })
        .await
}
