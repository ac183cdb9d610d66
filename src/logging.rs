// Copyright (c) 2026 rezky_nightky

use std::path::PathBuf;

use color_eyre::eyre::{ContextCompat as _, Result};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use crate::config::LogLevel;

/// Env var holding full `tracing` filter directives; overrides `--log-level`.
pub const LOG_ENV: &str = "RAINSTORM_LOG";

pub fn default_log_path() -> PathBuf {
    let directory = dirs::state_dir().unwrap_or_else(std::env::temp_dir);
    directory.join("rainstorm").join("rainstorm.log")
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
        LogLevel::Off => "off",
    }
}

/// Logs go to a file: stdout belongs to the animation.
pub fn setup_logging(path: Option<PathBuf>, level: LogLevel) -> Result<()> {
    let user_filters = std::env::var(LOG_ENV).ok();
    if level == LogLevel::Off && user_filters.is_none() {
        return Ok(());
    }

    let path = path.unwrap_or_else(default_log_path);
    let directory = path.parent().context("Couldn't get log path's parent")?;
    if !directory.as_os_str().is_empty() {
        std::fs::create_dir_all(directory)?;
    }
    let file = std::fs::File::create(&path)?;

    let filters = match user_filters {
        Some(directives) => tracing_subscriber::EnvFilter::builder()
            .with_default_directive("error".parse()?)
            .parse_lossy(directives),
        None => tracing_subscriber::EnvFilter::builder()
            .with_default_directive("off".parse()?)
            .parse_lossy("")
            .add_directive(format!("rainstorm={}", level_name(level)).parse()?),
    };

    let logfile_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(filters);

    tracing_subscriber::registry().with(logfile_layer).init();
    tracing::info!(path = %path.display(), "logging started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_ends_in_app_log_file() {
        let path = default_log_path();
        assert!(path.ends_with("rainstorm/rainstorm.log"));
    }

    #[test]
    fn level_names_are_valid_directives() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
            LogLevel::Off,
        ] {
            let directive = format!("rainstorm={}", level_name(level));
            assert!(directive
                .parse::<tracing_subscriber::filter::Directive>()
                .is_ok());
        }
    }
}
