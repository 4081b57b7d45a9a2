//! Slideshow of stills with an optional soundtrack.

use std::path::PathBuf;

use serde::Deserialize;

use super::{load_job, Session};

#[derive(Debug, Deserialize)]
struct ImagesJob {
    images: Vec<PathBuf>,
    #[serde(alias = "output_path")]
    output: PathBuf,
    /// Seconds per image.
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    fps: Option<u32>,
    /// `WIDTHxHEIGHT`
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default, alias = "audio_path")]
    audio: Option<PathBuf>,
}

pub async fn run(mut session: Session, job: &str) -> anyhow::Result<()> {
    let job: ImagesJob = load_job(job)?;
    if let Some(fps) = job.fps {
        session.settings.fps = fps;
    }
    if let Some(resolution) = &job.resolution {
        let (width, height) = parse_resolution(resolution)?;
        session.settings.width = width;
        session.settings.height = height;
    }

    session
        .execute("images-to-video", move |studio| {
            studio.images_to_video(
                &job.images,
                job.duration,
                job.audio.as_deref(),
                &job.output,
            )
        })
        .await
}

fn parse_resolution(raw: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("Resolution must look like 1920x1080, got {raw}"))?;
    let width = w.trim().parse()?;
    let height = h.trim().parse()?;
    Ok((width, height))
}
