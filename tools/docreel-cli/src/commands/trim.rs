//! Stream-copy trim.

use std::path::PathBuf;

use super::Session;

pub async fn run(
    session: Session,
    input: PathBuf,
    output: PathBuf,
    start: f64,
    end: f64,
) -> anyhow::Result<()> {
    session
        .execute("trim", move |studio| studio.trim(&input, &output, start, end))
        .await
}
