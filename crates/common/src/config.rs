//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default booth settings.
    pub booth: BoothDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default booth parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothDefaults {
    /// Layout id selected on startup ("single", "column", "row", "grid").
    pub layout: String,

    /// Frame color name selected on startup.
    pub frame_color: String,

    /// Countdown length in ticks (one tick per second).
    pub countdown_secs: u8,

    /// Width of one composite cell in pixels.
    pub cell_width: u32,

    /// Height of one composite cell in pixels.
    pub cell_height: u32,

    /// Interior padding between a cell edge and its photo.
    pub cell_padding: u32,

    /// Width of the frame border stroke.
    pub border_width: u32,

    /// Watermark glyph height in pixels.
    pub watermark_size: u32,

    /// Delay before starting playback on Safari-family browsers.
    pub safari_playback_delay_ms: u64,

    /// Directory that receives downloaded composites.
    pub output_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "photobooth=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for BoothDefaults {
    fn default() -> Self {
        Self {
            layout: "single".to_string(),
            frame_color: "pink".to_string(),
            countdown_secs: 3,
            cell_width: 400,
            cell_height: 300,
            cell_padding: 10,
            border_width: 10,
            watermark_size: 16,
            safari_playback_delay_ms: 300,
            output_dir: default_download_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("photobooth").join("config.json")
}

/// Default download directory.
fn default_download_dir() -> PathBuf {
    std::env::var("XDG_DOWNLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("Downloads"))
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_booth_geometry() {
        let defaults = BoothDefaults::default();
        assert_eq!(defaults.cell_width, 400);
        assert_eq!(defaults.cell_height, 300);
        assert_eq!(defaults.countdown_secs, 3);
        assert_eq!(defaults.layout, "single");
    }

    #[test]
    fn partial_booth_section_fills_in_defaults() {
        let json = r#"{
            "booth": { "layout": "grid", "frame_color": "blue" },
            "logging": { "level": "debug", "json": false, "file": null }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.booth.layout, "grid");
        assert_eq!(config.booth.cell_padding, 10);
        assert_eq!(config.logging.level, "debug");
    }
}
