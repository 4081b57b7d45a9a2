//! Validate a Docreel project file.

use std::path::PathBuf;

use docreel_common::cancel::CancellationToken;
use docreel_project_model::project::Project;
use docreel_render_engine::Studio;

use super::{print_report, Session};

pub fn run(session: Session, path: PathBuf, json: bool) -> anyhow::Result<()> {
    let project =
        Project::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    if json {
        let engine = session.engine();
        let studio = Studio::new(
            &engine,
            session.settings,
            session.scratch_dir,
            CancellationToken::new(),
        )?;
        return print_report(&studio.validate_project(&project));
    }

    println!("Validating project at: {}", path.display());

    println!("  Title: {}", project.title);
    if let Some(year) = &project.year {
        println!("  Year: {year}");
    }
    println!("  Title card: {}", if project.title_card { "yes" } else { "no" });
    println!("  Chapters: {}", project.chapters.len());
    for (i, chapter) in project.chapters.iter().enumerate() {
        println!("    {}. {} ({} scenes)", i + 1, chapter.title, chapter.scenes.len());
    }

    let errors = project.validate_sources();
    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Affected scenes will be skipped when rendering.",
            errors.len()
        );
    }

    Ok(())
}
