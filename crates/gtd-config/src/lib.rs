//! GNOME To Do configuration system
//!
//! This crate provides centralized configuration for the animation engine and
//! the headless animation driver, loading settings from `gtd.toml` with
//! environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "gtd.toml";

/// Errors produced while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GtdConfig {
    /// Animation engine defaults
    pub animation: AnimationConfig,
    /// Headless animation driver settings
    pub demo: DemoConfig,
}

/// Animation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Duration given to timelines built from the configuration, in milliseconds
    pub default_duration_ms: u32,
    /// Name of the easing curve used by default (e.g. "easeOutCubic")
    pub default_easing: String,
    /// Frame deltas are divided by this factor; values above 1.0 slow every
    /// animation down
    pub slowdown_factor: f64,
    /// Refresh rate of the headless frame clock, in frames per second
    pub frame_rate: u32,
}

/// Headless animation driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Property of the demo task row to animate ("opacity" or "height")
    pub property: String,
    /// Value the property starts from; the row's current value when unset
    pub from: Option<f64>,
    /// Value the property animates to
    pub to: f64,
    /// Intermediate key frame positions; empty plays a plain property transition
    pub key_frames: Vec<f64>,
    /// Values reached at each key frame
    pub key_values: Vec<f64>,
    /// Number of repeats (-1 repeats forever)
    pub repeat_count: i32,
    /// Flip direction at the end of each repeat
    pub auto_reverse: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 250,
            default_easing: "easeOutCubic".to_string(),
            slowdown_factor: 1.0,
            frame_rate: 60,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            property: "opacity".to_string(),
            from: None,
            to: 0.0,
            key_frames: Vec::new(),
            key_values: Vec::new(),
            repeat_count: 0,
            auto_reverse: false,
        }
    }
}

impl AnimationConfig {
    /// Length of one frame of the headless clock, in milliseconds.
    pub fn frame_interval_ms(&self) -> i64 {
        let rate = self.frame_rate.max(1) as i64;
        (1000 / rate).max(1)
    }
}

impl GtdConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `gtd.toml` in the current directory, or return
    /// the default configuration if the file doesn't exist or is invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file(CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("GTD_ANIMATION_DURATION") {
            if let Ok(duration) = val.parse::<u32>() {
                self.animation.default_duration_ms = duration;
            }
        }
        if let Ok(easing) = std::env::var("GTD_ANIMATION_EASING") {
            self.animation.default_easing = easing;
        }
        if let Ok(val) = std::env::var("GTD_ANIMATION_SLOWDOWN") {
            if let Ok(factor) = val.parse::<f64>() {
                if factor > 0.0 {
                    self.animation.slowdown_factor = factor;
                }
            }
        }
        if let Ok(val) = std::env::var("GTD_FRAME_RATE") {
            if let Ok(rate) = val.parse::<u32>() {
                self.animation.frame_rate = rate;
            }
        }

        if let Ok(property) = std::env::var("GTD_DEMO_PROPERTY") {
            self.demo.property = property;
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from gtd.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GtdConfig::default();
        assert_eq!(config.animation.default_duration_ms, 250);
        assert_eq!(config.animation.default_easing, "easeOutCubic");
        assert_eq!(config.animation.slowdown_factor, 1.0);
        assert_eq!(config.demo.property, "opacity");
        assert!(config.demo.key_frames.is_empty());
    }

    #[test]
    fn test_toml_serialization() {
        let config = GtdConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: GtdConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.animation.frame_rate, 60);
        assert_eq!(parsed.demo.to, 0.0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: GtdConfig = toml::from_str(
            r#"
            [animation]
            default_duration_ms = 400

            [demo]
            property = "height"
            key_frames = [0.3, 0.6]
            key_values = [10.0, 40.0]
            "#,
        )
        .unwrap();

        assert_eq!(parsed.animation.default_duration_ms, 400);
        assert_eq!(parsed.animation.default_easing, "easeOutCubic");
        assert_eq!(parsed.demo.property, "height");
        assert_eq!(parsed.demo.key_frames, vec![0.3, 0.6]);
        assert_eq!(parsed.demo.repeat_count, 0);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = GtdConfig::load_from_file("does-not-exist/gtd.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_frame_interval() {
        let mut config = AnimationConfig::default();
        assert_eq!(config.frame_interval_ms(), 16);
        config.frame_rate = 0;
        assert_eq!(config.frame_interval_ms(), 1000);
        config.frame_rate = 5000;
        assert_eq!(config.frame_interval_ms(), 1);
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("GTD_ANIMATION_DURATION", "900");
            std::env::set_var("GTD_ANIMATION_SLOWDOWN", "-3");
            std::env::set_var("GTD_ANIMATION_EASING", "easeInBounce");
        }

        let mut config = GtdConfig::default();
        config.merge_with_env();

        assert_eq!(config.animation.default_duration_ms, 900);
        assert_eq!(config.animation.default_easing, "easeInBounce");
        // Non-positive factors are ignored
        assert_eq!(config.animation.slowdown_factor, 1.0);

        unsafe {
            std::env::remove_var("GTD_ANIMATION_DURATION");
            std::env::remove_var("GTD_ANIMATION_SLOWDOWN");
            std::env::remove_var("GTD_ANIMATION_EASING");
        }
    }
}
