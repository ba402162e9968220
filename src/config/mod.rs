//! Configuration management for FreeKeys
//!
//! Handles loading, parsing and validation of the YAML application config.
//! The keymap it points to is watched separately by [`KeymapWatcher`].

pub mod watcher;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::engine::EngineOptions;
use crate::song::DEFAULT_MAX_EVENTS;
use crate::transient::DEFAULT_RESTORE_WINDOW_MS;

pub use watcher::KeymapWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    /// Keymap file; the compiled-in default keymap is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keymap: Option<PathBuf>,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// MIDI port configuration, matched by case-insensitive substring
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MidiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_port: Option<String>,
}

/// Engine timing and capacity
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Host update cadence
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_play_speed")]
    pub play_speed: f64,
    #[serde(default = "default_restore_window_ms")]
    pub restore_window_ms: f64,
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            play_speed: default_play_speed(),
            restore_window_ms: default_restore_window_ms(),
            max_events: default_max_events(),
        }
    }
}

impl EngineConfig {
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            restore_window_ms: self.restore_window_ms,
            max_events: self.max_events,
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        for (name, port) in [("output_port", &self.midi.output_port), ("input_port", &self.midi.input_port)] {
            if port.as_deref().is_some_and(|p| p.trim().is_empty()) {
                anyhow::bail!("MIDI {} cannot be empty (omit it instead)", name);
            }
        }

        if self.engine.tick_ms == 0 || self.engine.tick_ms > 1000 {
            anyhow::bail!("engine.tick_ms must be 1-1000, got {}", self.engine.tick_ms);
        }
        if !(self.engine.play_speed.is_finite() && self.engine.play_speed >= 0.0) {
            anyhow::bail!("engine.play_speed must be a non-negative number");
        }
        if !(self.engine.restore_window_ms.is_finite() && self.engine.restore_window_ms >= 0.0) {
            anyhow::bail!("engine.restore_window_ms must be a non-negative number");
        }
        if self.engine.max_events < 2 {
            anyhow::bail!("engine.max_events must be at least 2, got {}", self.engine.max_events);
        }

        Ok(())
    }

    /// Keymap path, relative paths resolved against the config file's directory
    pub fn keymap_path(&self, config_path: &Path) -> Option<PathBuf> {
        let keymap = self.keymap.as_ref()?;
        if keymap.is_absolute() {
            return Some(keymap.clone());
        }
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        Some(base.join(keymap))
    }
}

// Default value functions
fn default_tick_ms() -> u64 { 1 }
fn default_play_speed() -> f64 { 1.0 }
fn default_restore_window_ms() -> f64 { DEFAULT_RESTORE_WINDOW_MS }
fn default_max_events() -> usize { DEFAULT_MAX_EVENTS }
