//! Build a standalone title card.

use std::path::PathBuf;

use super::Session;

pub async fn run(
    session: Session,
    title: String,
    subtitle: Option<String>,
    background: Option<PathBuf>,
    output: PathBuf,
) -> anyhow::Result<()> {
    session
        .execute("title-card", move |studio| {
            studio.build_title_card(
                &title,
                subtitle.as_deref(),
                background.as_deref(),
                &output,
            )
        })
        .await
}
