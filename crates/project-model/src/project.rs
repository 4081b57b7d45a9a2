//! Project, chapter, and scene types.
//!
//! A project is the top-level container: an ordered list of chapters, each
//! an ordered list of scenes. Order is significant everywhere: it drives
//! playback order, motion rotation, and which scene carries a chapter title.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level project description (`project.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Human-readable title, also used on the title card.
    #[serde(default)]
    pub title: String,

    /// Optional year or period shown under the title.
    #[serde(default)]
    pub year: Option<String>,

    /// Title card text when it should differ from `title`.
    #[serde(default)]
    pub title_text: Option<String>,

    /// Whether to synthesize a title card as the first clip.
    #[serde(default)]
    pub title_card: bool,

    /// Chapters in playback order.
    #[serde(default)]
    pub chapters: Vec<Chapter>,

    /// Pre-rendered clip placed before everything else.
    #[serde(default, deserialize_with = "non_empty_path")]
    pub intro_video: Option<PathBuf>,

    /// Pre-rendered clip placed after everything else.
    #[serde(default, deserialize_with = "non_empty_path")]
    pub outro_video: Option<PathBuf>,
}

/// An ordered run of scenes rendered into one clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// One still image shown for the length of its narration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Source still. Empty when the file gives none; rendering reports it
    /// as missing and skips the scene.
    #[serde(default, alias = "image_path", deserialize_with = "path_or_empty")]
    pub image: PathBuf,

    /// Narration track. Its length drives the scene duration.
    #[serde(default, alias = "audio_path", deserialize_with = "non_empty_path")]
    pub audio: Option<PathBuf>,

    /// Explicit length in seconds, used when there is no narration.
    #[serde(default)]
    pub duration: Option<f64>,

    /// Motion preset id; assigned by rotation when absent.
    #[serde(default, alias = "ken_burns_effect")]
    pub motion: Option<String>,

    /// Explicit overlay. Takes precedence over date/location text.
    #[serde(default, alias = "text_overlay")]
    pub overlay: Option<TextOverlay>,

    /// Date caption, e.g. "Spring 1962".
    #[serde(default)]
    pub date: Option<String>,

    /// Location caption, e.g. "Lyon, France".
    #[serde(default)]
    pub location: Option<String>,
}

/// Text drawn over a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    /// The text. Newlines split it into lines.
    pub text: String,

    /// Text style id.
    #[serde(default = "default_overlay_style")]
    pub style: String,

    /// Force typewriter reveal on or off; the style decides when absent.
    #[serde(default)]
    pub typewriter: Option<bool>,

    /// Seconds into the clip at which the text starts to appear.
    #[serde(default, alias = "start_time")]
    pub start: f64,

    /// Seconds into the clip at which a static overlay has faded out.
    #[serde(default, alias = "end_time")]
    pub end: Option<f64>,

    /// Typewriter reveal rate; the render settings decide when absent.
    #[serde(default)]
    pub chars_per_second: Option<f64>,
}

fn default_overlay_style() -> String {
    "caption".to_string()
}

/// Treat `""` the same as a missing path, as older project files do.
fn non_empty_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from))
}

/// Accept `null` or `""` as "no path" for a required path field.
fn path_or_empty<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(non_empty_path(deserializer)?.unwrap_or_default())
}

impl TextOverlay {
    /// A static overlay in the given style.
    pub fn new(text: impl Into<String>, style: impl Into<String>, start: f64) -> Self {
        Self {
            text: text.into(),
            style: style.into(),
            typewriter: None,
            start,
            end: None,
            chars_per_second: None,
        }
    }

    /// Builder-style switch for typewriter reveal.
    pub fn with_typewriter(mut self, enabled: bool) -> Self {
        self.typewriter = Some(enabled);
        self
    }
}

impl Scene {
    /// A scene showing `image` with no narration or overlay.
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            audio: None,
            duration: None,
            motion: None,
            overlay: None,
            date: None,
            location: None,
        }
    }

    /// Lines derived from the scene's location and date, in that order.
    pub fn caption_lines(&self) -> Vec<&str> {
        [self.location.as_deref(), self.date.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl Project {
    /// Load a project file and resolve relative paths against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut project: Project =
            serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        project.resolve_paths(base);
        Ok(project)
    }

    /// Make every relative media path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() && !p.as_os_str().is_empty() {
                *p = base.join(&*p);
            }
        };

        for chapter in &mut self.chapters {
            for scene in &mut chapter.scenes {
                resolve(&mut scene.image);
                if let Some(audio) = scene.audio.as_mut() {
                    resolve(audio);
                }
            }
        }
        if let Some(intro) = self.intro_video.as_mut() {
            resolve(intro);
        }
        if let Some(outro) = self.outro_video.as_mut() {
            resolve(outro);
        }
    }

    /// Total number of scenes across all chapters.
    pub fn scene_count(&self) -> usize {
        self.chapters.iter().map(|c| c.scenes.len()).sum()
    }

    /// Check that all referenced source files exist.
    ///
    /// Missing files are not fatal to assembly (the affected scenes are
    /// skipped), so this only reports them.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        if self.chapters.is_empty() {
            errors.push("Project has no chapters".to_string());
        }

        for (ci, chapter) in self.chapters.iter().enumerate() {
            if chapter.scenes.is_empty() {
                errors.push(format!("Chapter {} has no scenes", ci + 1));
            }
            for (si, scene) in chapter.scenes.iter().enumerate() {
                let label = format!("Chapter {} scene {}", ci + 1, si + 1);
                if scene.image.as_os_str().is_empty() {
                    errors.push(format!("{label} has no image"));
                } else if !scene.image.is_file() {
                    errors.push(format!("{label} image missing: {}", scene.image.display()));
                }
                if let Some(audio) = &scene.audio {
                    if !audio.is_file() {
                        errors.push(format!("{label} audio missing: {}", audio.display()));
                    }
                }
                if let Some(d) = scene.duration {
                    if !(d > 0.0) {
                        errors.push(format!("{label} has a non-positive duration: {d}"));
                    }
                }
            }
        }

        for (label, path) in [("Intro", &self.intro_video), ("Outro", &self.outro_video)] {
            if let Some(p) = path {
                if !p.is_file() {
                    errors.push(format!("{label} video missing: {}", p.display()));
                }
            }
        }

        errors
    }
}

/// Errors that can occur when working with project files.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_JSON: &str = r#"{
        "title": "The River Years",
        "chapters": [
            {
                "title": "Beginnings",
                "scenes": [
                    { "image_path": "img/a.jpg", "audio_path": "", "duration": 6.0,
                      "ken_burns_effect": "pan_left" },
                    { "image_path": "img/b.jpg", "audio_path": "audio/b.mp3",
                      "date": "1962", "location": "Lyon" }
                ]
            }
        ],
        "intro_video": "",
        "outro_video": "clips/outro.mp4"
    }"#;

    #[test]
    fn test_legacy_keys_are_accepted() {
        let project: Project = serde_json::from_str(LEGACY_JSON).unwrap();
        let scenes = &project.chapters[0].scenes;
        assert_eq!(scenes[0].image, PathBuf::from("img/a.jpg"));
        assert_eq!(scenes[0].audio, None);
        assert_eq!(scenes[0].motion.as_deref(), Some("pan_left"));
        assert_eq!(scenes[1].audio, Some(PathBuf::from("audio/b.mp3")));
        assert_eq!(project.intro_video, None);
        assert!(!project.title_card);
    }

    #[test]
    fn test_scene_without_image_still_parses() {
        let project: Project = serde_json::from_str(
            r#"{"chapters": [
                {"scenes": [{"image_path": "a.jpg"}]},
                {"scenes": [{"image_path": null}, {"duration": 4.0}, {"image_path": ""}]}
            ]}"#,
        )
        .unwrap();
        let scenes = &project.chapters[1].scenes;
        assert!(scenes.iter().all(|s| s.image.as_os_str().is_empty()));
        assert_eq!(scenes[1].duration, Some(4.0));

        let errors = project.validate_sources();
        assert!(errors.iter().any(|e| e == "Chapter 2 scene 1 has no image"));
    }

    #[test]
    fn test_resolve_paths_joins_relative_only() {
        let mut project: Project = serde_json::from_str(LEGACY_JSON).unwrap();
        project.chapters[0].scenes[0].image = PathBuf::from("/abs/a.jpg");
        project.resolve_paths(Path::new("/projects/river"));

        let scenes = &project.chapters[0].scenes;
        assert_eq!(scenes[0].image, PathBuf::from("/abs/a.jpg"));
        assert_eq!(
            scenes[1].audio,
            Some(PathBuf::from("/projects/river/audio/b.mp3"))
        );
        assert_eq!(
            project.outro_video,
            Some(PathBuf::from("/projects/river/clips/outro.mp4"))
        );
    }

    #[test]
    fn test_caption_lines_order_and_blank_filtering() {
        let mut scene = Scene::new("a.jpg");
        scene.date = Some("1962".to_string());
        scene.location = Some("  Lyon ".to_string());
        assert_eq!(scene.caption_lines(), vec!["Lyon", "1962"]);

        scene.location = Some("   ".to_string());
        assert_eq!(scene.caption_lines(), vec!["1962"]);
    }

    #[test]
    fn test_overlay_defaults() {
        let overlay: TextOverlay = serde_json::from_str(r#"{"text": "Hello"}"#).unwrap();
        assert_eq!(overlay.style, "caption");
        assert_eq!(overlay.typewriter, None);
        assert_eq!(overlay.start, 0.0);
        assert_eq!(overlay.end, None);
    }

    #[test]
    fn test_validate_sources_reports_missing() {
        let project: Project = serde_json::from_str(LEGACY_JSON).unwrap();
        let errors = project.validate_sources();
        assert!(errors.iter().any(|e| e.contains("scene 1 image missing")));
        assert!(errors.iter().any(|e| e.contains("audio missing")));
        assert!(errors.iter().any(|e| e.starts_with("Outro video missing")));
    }

    #[test]
    fn test_load_resolves_against_project_dir() {
        let dir = std::env::temp_dir().join("docreel_test_project_roundtrip");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("project.json");
        std::fs::write(&path, LEGACY_JSON).unwrap();

        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded.title, "The River Years");
        assert_eq!(loaded.scene_count(), 2);
        assert_eq!(loaded.chapters[0].scenes[0].image, dir.join("img/a.jpg"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let dir = std::env::temp_dir().join("docreel_test_project_bad");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("project.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Project::load(&path).unwrap_err();
        assert!(matches!(err, ProjectError::ParseError { .. }));
        assert!(err.to_string().contains("project.json"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
