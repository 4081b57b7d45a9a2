//! Logging and tracing initialization.
//!
//! Logs always go to stderr (or a file); stdout is reserved for the
//! structured JSON results printed by the CLI.

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file = config.file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| eprintln!("Failed to open log file {}: {e}", path.display()))
            .ok()
    });

    if let Some(file) = file {
        let builder = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file));
        if config.json {
            tracing::subscriber::set_global_default(builder.json().finish()).ok();
        } else {
            tracing::subscriber::set_global_default(builder.finish()).ok();
        }
    } else if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logs_honour_json_flag() {
        let path = std::env::temp_dir().join(format!(
            "docreel_test_log_{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        init_logging(&LoggingConfig {
            level: "info".to_string(),
            json: true,
            file: Some(path.clone()),
        });

        tracing::warn!(scene = 3, "Scene skipped");

        let contents = std::fs::read_to_string(&path).unwrap();
        let event: serde_json::Value =
            serde_json::from_str(contents.lines().last().unwrap()).unwrap();
        assert_eq!(event["fields"]["message"], "Scene skipped");
        assert_eq!(event["fields"]["scene"], 3);
        std::fs::remove_file(&path).ok();
    }
}
