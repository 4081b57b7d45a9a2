//! Check system capabilities.

use docreel_render_engine::MediaEngine;

use super::Session;

pub fn run(session: &Session) -> anyhow::Result<()> {
    println!("Docreel System Check");
    println!("{}", "=".repeat(50));

    let engine = session.engine();
    let available = engine.is_available();
    if available {
        println!("[OK] ffmpeg and ffprobe found on PATH");
    } else {
        println!("[FAIL] ffmpeg and/or ffprobe not found on PATH");
    }

    let s = &session.settings;
    match s.validate() {
        Ok(()) => println!(
            "[OK] Render settings: {}x{} @ {}fps, crossfade {:.2}s{}",
            s.width,
            s.height,
            s.fps,
            s.transition_secs,
            if s.transitions_enabled { "" } else { " (disabled)" }
        ),
        Err(e) => println!("[FAIL] Render settings: {e}"),
    }
    println!("     Scratch directory: {}", session.scratch_dir.display());
    println!("     Output directory: {}", session.output_dir.display());

    if !available || s.validate().is_err() {
        anyhow::bail!("System check failed");
    }
    Ok(())
}
