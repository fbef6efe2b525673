//! Logging and tracing initialization.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Crates whose events a bare level such as `debug` applies to.
const BOOTH_TARGETS: [&str; 7] = [
    "photobooth",
    "photobooth_common",
    "photobooth_model",
    "photobooth_platform",
    "photobooth_capture",
    "photobooth_render",
    "photobooth_controller",
];

/// Expand a configured level into filter directives.
///
/// A bare level (`debug`) is scoped to the booth's own crates and leaves
/// everything else at `warn`. Anything containing `=` or `,` is already a
/// directive list and is used verbatim.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let level = if level.is_empty() { "info" } else { level };
    let mut directives = vec!["warn".to_string()];
    directives.extend(BOOTH_TARGETS.iter().map(|t| format!("{t}={level}")));
    directives.join(",")
}

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level. A log file, when
/// configured and writable, receives plain text without ANSI colors.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.level)));

    if let Some(path) = &config.file {
        match std::fs::File::create(path) {
            Ok(file) => {
                let subscriber = fmt::Subscriber::builder()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .finish();
                tracing::subscriber::set_global_default(subscriber).ok();
                return;
            }
            Err(e) => {
                eprintln!("Failed to open log file {}: {e}", path.display());
            }
        }
    }

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_is_scoped_to_booth_crates() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("photobooth_capture=debug"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn directive_lists_pass_through() {
        assert_eq!(
            filter_directives("photobooth_render=trace,info"),
            "photobooth_render=trace,info"
        );
    }

    #[test]
    fn empty_level_defaults_to_info() {
        assert!(filter_directives("  ").contains("photobooth_model=info"));
    }
}
