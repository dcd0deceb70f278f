//! Rune animation configuration
//!
//! This crate provides centralized configuration for the animation runtime,
//! loading settings from `rune.toml` with environment variable overrides.
//!
//! ```toml
//! [animation]
//! duration = 400.0
//! easing = "ease-out"
//! infinite = false
//! debug = false
//!
//! [scheduler]
//! mode = "timer"
//! frame_interval_ms = 16.67
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Default configuration file looked up in the current directory.
pub const CONFIG_FILE: &str = "rune.toml";

/// Errors raised while loading `rune.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[from] io::Error),

    /// The file is not valid TOML for [`RuneConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuneConfig {
    /// Defaults applied to every new animation
    pub animation: AnimationConfig,
    /// Tick scheduling settings
    pub scheduler: SchedulerConfig,
}

/// Global animation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Duration in milliseconds
    pub duration: f64,
    /// Easing curve name (linear, ease-in, ease-out, ease-in-out).
    /// Unknown names are treated as linear by the animation runtime.
    pub easing: String,
    /// Wrap progress forever instead of finishing
    pub infinite: bool,
    /// Record per-frame diagnostics for inspection
    pub debug: bool,
}

/// Strategy used to request the next scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerMode {
    /// Align ticks with the host's display refresh.
    #[default]
    Frame,
    /// Fixed interval timer, for headless hosts and tests.
    Timer,
}

impl SchedulerMode {
    /// Parse a mode name, accepting a few common spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "frame" | "raf" | "vsync" => Some(Self::Frame),
            "timer" | "interval" | "headless" => Some(Self::Timer),
            _ => None,
        }
    }
}

/// Tick scheduling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Frame-driven or timer-driven ticks
    pub mode: SchedulerMode,
    /// Interval used by the timer-driven strategy
    pub frame_interval_ms: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration: 1000.0,
            easing: "ease-in-out".to_string(),
            infinite: false,
            debug: false,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mode: SchedulerMode::Frame,
            frame_interval_ms: 1000.0 / 60.0,
        }
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl RuneConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `rune.toml` in the current directory,
    /// or return the default configuration if it is missing or invalid.
    pub fn load_or_default() -> Self {
        match Self::load_from_file(CONFIG_FILE) {
            Ok(config) => config,
            Err(ConfigError::Read(error)) if error.kind() == io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(error) => {
                warn!(%error, path = CONFIG_FILE, "falling back to default configuration");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Values that fail to parse are ignored.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("RUNE_ANIM_DURATION") {
            if let Ok(duration) = val.parse::<f64>() {
                self.animation.duration = duration;
            }
        }
        if let Ok(easing) = std::env::var("RUNE_ANIM_EASING") {
            self.animation.easing = easing;
        }
        if let Ok(val) = std::env::var("RUNE_ANIM_INFINITE") {
            self.animation.infinite = env_flag(&val);
        }
        if let Ok(val) = std::env::var("RUNE_ANIM_DEBUG") {
            self.animation.debug = env_flag(&val);
        }

        if let Ok(val) = std::env::var("RUNE_ANIM_SCHEDULER") {
            match SchedulerMode::from_name(&val) {
                Some(mode) => self.scheduler.mode = mode,
                None => warn!(value = %val, "ignoring unknown RUNE_ANIM_SCHEDULER"),
            }
        }
        if let Ok(val) = std::env::var("RUNE_ANIM_FRAME_INTERVAL_MS") {
            if let Ok(interval) = val.parse::<f64>() {
                self.scheduler.frame_interval_ms = interval;
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from rune.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
