//! Docreel CLI: render documentary-style videos from stills and narration.
//!
//! Usage:
//!   docreel render-scene <JOB>          Render one scene
//!   docreel assemble-chapter <JOB>      Render and join a chapter
//!   docreel assemble-project <PATH>     Render a whole project
//!   docreel merge -o <OUT> <CLIPS...>   Join existing clips
//!   docreel title-card --title <T>      Build a title card
//!   docreel images-to-video <JOB>       Slideshow with optional soundtrack
//!   docreel info <MEDIA>                Probe a media file
//!   docreel analyze-audio <AUDIO>       Probe an audio file
//!   docreel trim <IN> <OUT> <S> <E>     Stream-copy trim
//!   docreel validate <PATH>             List missing project sources
//!   docreel check                       Check for ffmpeg/ffprobe
//!
//! Every rendering command prints a JSON report on stdout. Logs go to stderr.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "docreel",
    about = "Documentary video assembly over ffmpeg",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to ~/.config/docreel/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: RenderOverrides,

    #[command(subcommand)]
    command: Commands,
}

/// Per-invocation overrides of the configured render settings.
#[derive(Args, Debug, Default, Clone)]
pub struct RenderOverrides {
    /// Output width
    #[arg(long, global = true)]
    pub width: Option<u32>,

    /// Output height
    #[arg(long, global = true)]
    pub height: Option<u32>,

    /// Output frame rate
    #[arg(long, global = true)]
    pub fps: Option<u32>,

    /// Crossfade length between clips (seconds)
    #[arg(long, global = true)]
    pub transition_secs: Option<f64>,

    /// Join chapters and projects with hard cuts only
    #[arg(long, global = true)]
    pub no_transitions: bool,

    /// Directory for intermediate clips
    #[arg(long, global = true)]
    pub scratch_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one scene: JSON job `{image_path, audio_path?, duration?, ..., output}`
    RenderScene {
        /// Job file path or inline JSON
        job: String,
    },

    /// Render and join the scenes of one chapter: JSON job `{title, scenes, output}`
    AssembleChapter {
        /// Job file path or inline JSON
        job: String,
    },

    /// Render a full project file
    AssembleProject {
        /// Path to project.json
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Join existing clips, crossfading when a transition is given
    #[command(alias = "compose-transition")]
    Merge {
        /// Clips in playback order
        #[arg(required = true)]
        clips: Vec<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Crossfade length (seconds); hard cuts when omitted
        #[arg(short, long)]
        transition: Option<f64>,
    },

    /// Build a title card clip
    TitleCard {
        #[arg(long)]
        title: String,

        /// Smaller line under the title, e.g. a year
        #[arg(long)]
        subtitle: Option<String>,

        /// Still to blur behind the text
        #[arg(long)]
        background: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Slideshow of stills: JSON job `{images, output, duration?, fps?, resolution?, audio?}`
    ImagesToVideo {
        /// Job file path or inline JSON
        job: String,
    },

    /// Probe a media file
    Info {
        path: PathBuf,
    },

    /// Probe an audio file
    AnalyzeAudio {
        path: PathBuf,
    },

    /// Cut `[start, end)` out of a media file without re-encoding
    Trim {
        input: PathBuf,
        output: PathBuf,
        start: f64,
        end: f64,
    },

    /// List missing sources in a project file
    Validate {
        path: PathBuf,

        /// Print a JSON report instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg and ffprobe are available
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => docreel_common::config::AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?,
        None => docreel_common::config::AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    docreel_common::logging::init_logging(&config.logging);

    let session = commands::Session::new(config, &cli.overrides);

    match cli.command {
        Commands::RenderScene { job } => commands::render::scene(session, &job).await,
        Commands::AssembleChapter { job } => commands::render::chapter(session, &job).await,
        Commands::AssembleProject { path, output } => {
            commands::render::project(session, path, output).await
        }
        Commands::Merge {
            clips,
            output,
            transition,
        } => commands::merge::run(session, clips, output, transition).await,
        Commands::TitleCard {
            title,
            subtitle,
            background,
            output,
        } => commands::title_card::run(session, title, subtitle, background, output).await,
        Commands::ImagesToVideo { job } => commands::images::run(session, &job).await,
        Commands::Info { path } => commands::info::run(session, path, "info").await,
        Commands::AnalyzeAudio { path } => commands::info::run(session, path, "analyze-audio").await,
        Commands::Trim {
            input,
            output,
            start,
            end,
        } => commands::trim::run(session, input, output, start, end).await,
        Commands::Validate { path, json } => commands::validate::run(session, path, json),
        Commands::Check => commands::check::run(&session),
    }
}
