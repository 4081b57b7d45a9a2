mod support;

use std::path::PathBuf;

use docreel_common::cancel::CancellationToken;
use docreel_common::config::RenderSettings;
use docreel_project_model::project::{Chapter, Project, Scene};
use docreel_render_engine::engine::MediaInput;
use docreel_render_engine::{CompositionKind, UnitStatus};

use support::{approx, scratch_leftovers, still, studio, studio_with, workdir, Call, FakeEngine};

fn project(chapters: Vec<Chapter>) -> Project {
    Project {
        title: "The River Years".to_string(),
        year: Some("1962".to_string()),
        title_text: None,
        title_card: false,
        chapters,
        intro_video: None,
        outro_video: None,
    }
}

fn chapter(title: &str, images: Vec<PathBuf>) -> Chapter {
    Chapter {
        title: title.to_string(),
        scenes: images.into_iter().map(Scene::new).collect(),
    }
}

#[test]
fn chapter_without_valid_images_is_omitted() {
    let dir = workdir("project_skip_chapter");
    let engine = FakeEngine::new();
    let studio = studio(&engine, &dir);
    let project = project(vec![
        chapter("Beginnings", vec![still(&dir, "a.jpg"), still(&dir, "b.jpg")]),
        chapter("The Flood", vec![dir.join("gone1.jpg"), dir.join("gone2.jpg")]),
    ]);
    let output = dir.join("film.mp4");

    let report = studio.assemble_project(&project, &output);

    assert!(report.success, "{:?}", report.message);
    assert_eq!(report.chapters.len(), 2);
    assert_eq!(report.chapters[0].status, UnitStatus::Rendered);
    assert_eq!(report.chapters[1].status, UnitStatus::Failed);
    assert!(report.chapters[1]
        .detail
        .as_deref()
        .unwrap()
        .contains("chapter 2"));
    assert_eq!(report.scenes.len(), 2);
    // Only chapter 1 survives: its 2-scene crossfade is copied through.
    assert_eq!(report.composition, Some(CompositionKind::Identity));
    assert!(approx(report.duration_secs.unwrap(), 15.25));
    assert!(output.is_file());
    assert!(scratch_leftovers(&dir).is_empty());
}

#[test]
fn scenes_without_an_image_are_skipped_not_fatal() {
    let dir = workdir("project_null_image");
    let engine = FakeEngine::new();
    let studio = studio(&engine, &dir);
    let project: Project = serde_json::from_value(serde_json::json!({
        "title": "The River Years",
        "chapters": [
            { "title": "Beginnings", "scenes": [{ "image_path": still(&dir, "a.jpg") }] },
            { "title": "Lost", "scenes": [{ "image_path": null }, { "duration": 6.0 }] }
        ]
    }))
    .unwrap();

    let report = studio.assemble_project(&project, &dir.join("film.mp4"));

    assert!(report.success, "{:?}", report.message);
    assert_eq!(report.chapters[0].status, UnitStatus::Rendered);
    assert_eq!(report.chapters[1].status, UnitStatus::Failed);
    assert_eq!(report.composition, Some(CompositionKind::Identity));
    assert!(approx(report.duration_secs.unwrap(), 8.0));
    assert_eq!(engine.scene_renders().len(), 1);
}

#[test]
fn project_fails_when_every_chapter_fails() {
    let dir = workdir("project_all_fail");
    let engine = FakeEngine::new();
    let studio = studio(&engine, &dir);
    let mut project = project(vec![
        chapter("One", vec![dir.join("x.jpg")]),
        chapter("Two", vec![]),
    ]);
    project.title_card = true;

    let report = studio.assemble_project(&project, &dir.join("film.mp4"));

    assert!(!report.success);
    assert_eq!(report.message.as_deref(), Some("Nothing to assemble: project"));
    // The title card rendered but was cleaned up.
    assert!(scratch_leftovers(&dir).is_empty());
}

#[test]
fn title_card_intro_and_outro_are_placed_around_chapters() {
    let dir = workdir("project_full");
    let engine = FakeEngine::new();
    let intro = still(&dir, "intro.mp4");
    let outro = still(&dir, "outro.mp4");
    engine.set_duration(&intro, 4.0);
    engine.set_duration(&outro, 6.0);
    let studio = studio(&engine, &dir);

    let image = still(&dir, "a.jpg");
    let mut project = project(vec![
        chapter("Beginnings", vec![image.clone()]),
        chapter("Later", vec![still(&dir, "b.jpg")]),
    ]);
    project.title_card = true;
    project.intro_video = Some(intro.clone());
    project.outro_video = Some(outro.clone());

    let report = studio.assemble_project(&project, &dir.join("film.mp4"));
    assert!(report.success, "{:?}", report.message);
    assert_eq!(report.composition, Some(CompositionKind::Crossfade));

    let title = engine
        .renders()
        .into_iter()
        .find(|r| r.filter_complex.contains("boxblur"))
        .expect("title card render");
    assert_eq!(title.inputs[0], MediaInput::LoopedStill(image));
    assert_eq!(title.inputs[1], MediaInput::Silence);
    assert!(title.filter_complex.contains("text='1962'"));

    let finale = engine.crossfade_renders().pop().unwrap();
    let inputs: Vec<PathBuf> = finale
        .inputs
        .iter()
        .filter_map(|i| i.path().map(PathBuf::from))
        .collect();
    assert_eq!(inputs.len(), 5);
    assert_eq!(inputs[0], intro);
    assert_eq!(inputs[4], outro);
    // 4 + 5 + 8 + 8 + 6 - 4 * 0.75
    assert!(approx(report.duration_secs.unwrap(), 28.0));

    // External clips are referenced, never consumed.
    assert!(intro.is_file());
    assert!(outro.is_file());
    assert!(scratch_leftovers(&dir).is_empty());
}

#[test]
fn missing_intro_is_left_out() {
    let dir = workdir("project_missing_intro");
    let engine = FakeEngine::new();
    let studio = studio(&engine, &dir);
    let mut project = project(vec![chapter("One", vec![still(&dir, "a.jpg")])]);
    project.intro_video = Some(dir.join("nope.mp4"));

    let report = studio.assemble_project(&project, &dir.join("film.mp4"));

    assert!(report.success);
    assert_eq!(report.composition, Some(CompositionKind::Identity));
    assert!(approx(report.duration_secs.unwrap(), 8.0));
}

#[test]
fn title_card_failure_is_not_fatal() {
    let dir = workdir("project_title_fails");
    let engine = FakeEngine::new().failing_filter("boxblur");
    let studio = studio(&engine, &dir);
    let mut project = project(vec![chapter("One", vec![still(&dir, "a.jpg")])]);
    project.title_card = true;

    let report = studio.assemble_project(&project, &dir.join("film.mp4"));

    assert!(report.success);
    assert_eq!(report.composition, Some(CompositionKind::Identity));
    assert!(approx(report.duration_secs.unwrap(), 8.0));
}

#[test]
fn title_card_without_image_uses_solid_background() {
    let dir = workdir("title_card_solid");
    let engine = FakeEngine::new();
    let studio = studio(&engine, &dir);

    let report = studio.build_title_card("The River Years", None, None, &dir.join("card.mp4"));

    assert!(report.success);
    assert!(approx(report.duration_secs.unwrap(), 5.0));
    let render = &engine.renders()[0];
    assert!(matches!(render.inputs[0], MediaInput::SolidColor(_)));
    assert!(!render.filter_complex.contains("boxblur"));

    let empty = studio.build_title_card("  ", None, None, &dir.join("card2.mp4"));
    assert!(!empty.success);
}

#[test]
fn cancellation_before_chapters_cleans_up() {
    let dir = workdir("project_cancel");
    let engine = FakeEngine::new();
    let cancel = CancellationToken::new();
    let studio = studio_with(&engine, &dir, RenderSettings::default(), cancel.clone());
    let mut project = project(vec![chapter("One", vec![still(&dir, "a.jpg")])]);
    project.title_card = true;
    cancel.cancel();

    let report = studio.assemble_project(&project, &dir.join("film.mp4"));

    assert!(!report.success);
    assert_eq!(report.message.as_deref(), Some("Operation cancelled"));
    assert!(scratch_leftovers(&dir).is_empty());
}

#[test]
fn single_file_composition_is_a_byte_identical_copy() {
    let dir = workdir("compose_identity");
    let engine = FakeEngine::new();
    let clip = dir.join("clip.mp4");
    std::fs::write(&clip, b"original bytes").unwrap();
    engine.set_duration(&clip, 12.0);
    let studio = studio(&engine, &dir);
    let output = dir.join("copy.mp4");

    let report = studio.compose_files(&[clip.clone()], Some(0.75), &output);

    assert!(report.success);
    assert_eq!(report.composition, Some(CompositionKind::Identity));
    assert_eq!(std::fs::read(&output).unwrap(), b"original bytes");
    assert!(clip.is_file());
    assert!(engine.renders().is_empty());
}

#[test]
fn composing_files_probes_durations() {
    let dir = workdir("compose_files");
    let engine = FakeEngine::new();
    let a = still(&dir, "a.mp4");
    let b = still(&dir, "b.mp4");
    engine.set_duration(&a, 10.0);
    engine.set_duration(&b, 4.0);
    let studio = studio(&engine, &dir);

    let crossfaded = studio.compose_files(&[a.clone(), b.clone()], Some(1.0), &dir.join("x.mp4"));
    assert_eq!(crossfaded.composition, Some(CompositionKind::Crossfade));
    assert!(approx(crossfaded.duration_secs.unwrap(), 13.0));

    let cut = studio.compose_files(&[a.clone(), b.clone()], None, &dir.join("y.mp4"));
    assert_eq!(cut.composition, Some(CompositionKind::HardCut));
    assert!(approx(cut.duration_secs.unwrap(), 14.0));
    assert!(a.is_file() && b.is_file());

    let none = studio.compose_files(&[], None, &dir.join("z.mp4"));
    assert!(!none.success);
    assert_eq!(none.message.as_deref(), Some("Nothing to assemble: composition"));

    let missing = studio.compose_files(&[a, dir.join("gone.mp4")], None, &dir.join("w.mp4"));
    assert!(!missing.success);
}

#[test]
fn images_to_video_muxes_soundtrack() {
    let dir = workdir("images_to_video");
    let engine = FakeEngine::new();
    let music = still(&dir, "music.mp3");
    engine.set_duration(&music, 12.0);
    let studio = studio(&engine, &dir);
    let images = vec![still(&dir, "a.jpg"), still(&dir, "b.jpg")];
    let output = dir.join("slides.mp4");

    let report = studio.images_to_video(&images, Some(6.0), Some(&music), &output);

    assert!(report.success, "{:?}", report.message);
    assert_eq!(report.operation, "images-to-video");
    // Pictures run 6 + 6 - 0.75; the soundtrack is longer.
    assert!(approx(report.duration_secs.unwrap(), 11.25));
    assert!(engine
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Mux { audio, .. } if *audio == music)));
    assert!(output.is_file());
    assert!(scratch_leftovers(&dir).is_empty());

    let plain = studio.images_to_video(&images, None, None, &dir.join("plain.mp4"));
    assert_eq!(plain.operation, "images-to-video");
    assert!(approx(plain.duration_secs.unwrap(), 15.25));
}

#[test]
fn trim_validates_window() {
    let dir = workdir("trim");
    let engine = FakeEngine::new();
    let studio = studio(&engine, &dir);
    let input = still(&dir, "in.mp4");

    let bad = studio.trim(&input, &dir.join("out.mp4"), 5.0, 2.0);
    assert!(!bad.success);

    let ok = studio.trim(&input, &dir.join("out.mp4"), 1.0, 4.5);
    assert!(ok.success);
    assert!(approx(ok.duration_secs.unwrap(), 3.5));

    let missing = studio.trim(&dir.join("gone.mp4"), &dir.join("out.mp4"), 0.0, 1.0);
    assert!(!missing.success);
}

#[test]
fn probe_reports_streams_as_data() {
    let dir = workdir("probe");
    let engine = FakeEngine::new();
    let audio = still(&dir, "voice.mp3");
    engine.set_duration(&audio, 42.5);
    let studio = studio(&engine, &dir);

    let report = studio.probe(&audio, "analyze-audio");

    assert!(report.success);
    assert_eq!(report.operation, "analyze-audio");
    let data = report.data.unwrap();
    assert_eq!(data["duration_secs"], 42.5);
    assert_eq!(data["streams"][0]["codec_type"], "audio");
}

#[test]
fn validate_lists_missing_sources() {
    let dir = workdir("validate");
    let engine = FakeEngine::new();
    let studio = studio(&engine, &dir);
    let project = project(vec![chapter("One", vec![still(&dir, "a.jpg"), dir.join("b.jpg")])]);

    let report = studio.validate_project(&project);

    assert!(!report.success);
    let problems = report.data.unwrap()["problems"].as_array().unwrap().clone();
    assert_eq!(problems.len(), 1);
    assert!(problems[0].as_str().unwrap().contains("b.jpg"));
}
