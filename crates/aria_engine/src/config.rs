//! Engine configuration
//!
//! Loaded from a TOML file with environment-variable overrides on top.
//!
//! # Example Config File
//!
//! ```toml
//! [sync]
//! queue_capacity = 65536   # omit for unbounded
//! stall_warn_ms = 1000
//!
//! [window]
//! title = "Aria"
//! width = 1280
//! height = 720
//! fullscreen = false
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Producer/consumer synchronization tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound on pending commands; `None` means unbounded
    pub queue_capacity: Option<usize>,
    /// How long the consumer waits at the barrier before logging laggards
    pub stall_warn_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_capacity: None,
            stall_warn_ms: 1000,
        }
    }
}

impl SyncConfig {
    pub fn stall_warn(&self) -> Duration {
        Duration::from_millis(self.stall_warn_ms)
    }
}

/// Initial window state
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Aria".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sync: SyncConfig,
    pub window: WindowConfig,
}

impl EngineConfig {
    /// Load from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self = toml::from_str(&content)?;
        log::info!("Loaded engine config from {}", path.as_ref().display());
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(cap) = std::env::var("ARIA_QUEUE_CAPACITY") {
            match cap.parse() {
                Ok(0) => self.sync.queue_capacity = None,
                Ok(n) => self.sync.queue_capacity = Some(n),
                Err(_) => log::warn!("ignoring unparsable ARIA_QUEUE_CAPACITY={}", cap),
            }
        }
        if let Ok(ms) = std::env::var("ARIA_STALL_WARN_MS") {
            match ms.parse() {
                Ok(n) => self.sync.stall_warn_ms = n,
                Err(_) => log::warn!("ignoring unparsable ARIA_STALL_WARN_MS={}", ms),
            }
        }
        if let Ok(title) = std::env::var("ARIA_WINDOW_TITLE") {
            if !title.is_empty() {
                self.window.title = title;
            }
        }
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        log::info!("Engine configuration:");
        match self.sync.queue_capacity {
            Some(cap) => log::info!("  queue: bounded at {} commands", cap),
            None => log::info!("  queue: unbounded"),
        }
        log::info!("  stall warning after {} ms", self.sync.stall_warn_ms);
        log::info!(
            "  window: \"{}\" {}x{}{}",
            self.window.title,
            self.window.width,
            self.window.height,
            if self.window.fullscreen { " fullscreen" } else { "" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.sync.queue_capacity, None);
        assert_eq!(config.sync.stall_warn_ms, 1000);
        assert_eq!(config.window.width, 1280);
        assert!(!config.window.fullscreen);
    }

    #[test]
    fn test_parse_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            [sync]
            queue_capacity = 4096

            [window]
            title = "demo"
            fullscreen = true
            "#,
        )
        .unwrap();
        assert_eq!(config.sync.queue_capacity, Some(4096));
        assert_eq!(config.window.title, "demo");
        assert!(config.window.fullscreen);
        // Unset fields keep defaults.
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.sync.stall_warn_ms, 1000);
    }

    #[test]
    fn test_stall_warn_duration() {
        let sync = SyncConfig {
            stall_warn_ms: 250,
            ..SyncConfig::default()
        };
        assert_eq!(sync.stall_warn(), Duration::from_millis(250));
    }
}
