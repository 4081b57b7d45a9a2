//! render-scene, assemble-chapter, assemble-project.

use std::path::PathBuf;

use docreel_project_model::project::{Chapter, Project, Scene};
use serde::Deserialize;

use super::{load_job, Session};

#[derive(Debug, Deserialize)]
struct SceneJob {
    #[serde(flatten)]
    scene: Scene,
    #[serde(alias = "output_path")]
    output: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ChapterJob {
    #[serde(flatten)]
    chapter: Chapter,
    #[serde(alias = "output_path")]
    output: PathBuf,
}

pub async fn scene(session: Session, job: &str) -> anyhow::Result<()> {
    let job: SceneJob = load_job(job)?;
    session
        .execute("render-scene", move |studio| {
            studio.render_scene(&job.scene, &job.output)
        })
        .await
}

pub async fn chapter(session: Session, job: &str) -> anyhow::Result<()> {
    let job: ChapterJob = load_job(job)?;
    session
        .execute("assemble-chapter", move |studio| {
            studio.assemble_chapter(&job.chapter, &job.output)
        })
        .await
}

pub async fn project(
    session: Session,
    path: PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let project =
        Project::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    let output = output.unwrap_or_else(|| session.default_output(&output_name(&project)));

    tracing::info!(
        project = %project.title,
        chapters = project.chapters.len(),
        scenes = project.scene_count(),
        output = %output.display(),
        "Assembling project"
    );

    session
        .execute("assemble-project", move |studio| {
            studio.assemble_project(&project, &output)
        })
        .await
}

/// `The River Years` -> `the_river_years.mp4`.
fn output_name(project: &Project) -> String {
    let stem: String = project
        .title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "documentary.mp4".to_string()
    } else {
        format!("{stem}.mp4")
    }
}
