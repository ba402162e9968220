//! Application path management for portable and installed modes.
//!
//! ## Mode Detection
//!
//! - **Portable mode**: If a `.portable` marker file exists next to the
//!   executable, config, keymaps and songs live in the same directory.
//! - **Installed mode** (default): Data is stored in the platform data
//!   directory under `FreeKeys` (`%APPDATA%\FreeKeys`, `~/.local/share/FreeKeys`).

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::keymap::DEFAULT_KEYMAP;

/// Application name used for directories in installed mode
const APP_NAME: &str = "FreeKeys";

/// Application paths for config, keymaps and songs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Directory holding `.map` keymaps
    pub keymaps_dir: PathBuf,
    /// Directory holding recorded `.fpm` songs
    pub songs_dir: PathBuf,
    /// Whether running in portable mode (config next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// All paths rooted at `base`
    pub fn rooted(base: &Path, is_portable: bool) -> Self {
        Self {
            config: base.join("config.yaml"),
            keymaps_dir: base.join("keymaps"),
            songs_dir: base.join("songs"),
            is_portable,
        }
    }

    /// Detect the appropriate paths based on environment.
    ///
    /// **Debug mode**: If `config.yaml` exists in the current working
    /// directory, that directory is used.
    ///
    /// **Portable mode**: a `.portable` marker next to the executable keeps
    /// all data there.
    ///
    /// **Installed mode** (default): the platform data directory.
    ///
    /// Note: This is called before logging is initialized, so we use eprintln
    /// for early diagnostic output.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join("config.yaml").exists() {
                eprintln!("[paths] Running in DEV mode (config.yaml found in cwd: {})", cwd.display());
                return Self::rooted(&cwd, true);
            }
        }

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            Self::rooted(&exe_dir, true)
        } else {
            let app_data = dirs::data_dir()
                .unwrap_or_else(|| {
                    eprintln!("[paths] WARNING: dirs::data_dir() returned None, falling back to exe dir");
                    exe_dir.clone()
                })
                .join(APP_NAME);

            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in INSTALLED mode (data dir: {})", app_data.display());

            Self::rooted(&app_data, false)
        }
    }

    /// Get the base directory (for displaying in logs)
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Keymap written on first run
    pub fn default_keymap(&self) -> PathBuf {
        self.keymaps_dir.join("default.map")
    }

    /// Ensure all required directories exist.
    ///
    /// Also writes the built-in keymap to the keymaps directory when it is
    /// missing, so there is a file to edit.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [&self.keymaps_dir, &self.songs_dir] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }

        if let Some(config_parent) = self.config.parent() {
            if !config_parent.exists() {
                debug!("Creating config directory: {}", config_parent.display());
                std::fs::create_dir_all(config_parent)?;
            }
        }

        let keymap = self.default_keymap();
        if !keymap.exists() {
            info!("Writing default keymap to {}", keymap.display());
            std::fs::write(&keymap, DEFAULT_KEYMAP)
                .with_context(|| format!("Failed to write {}", keymap.display()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rooted_layout() {
        let paths = AppPaths::rooted(Path::new("data"), true);
        assert!(paths.is_portable);
        assert_eq!(paths.config, PathBuf::from("data/config.yaml"));
        assert_eq!(paths.default_keymap(), PathBuf::from("data/keymaps/default.map"));
        assert_eq!(paths.base_dir(), PathBuf::from("data"));
    }

    #[test]
    fn test_ensure_directories_writes_default_keymap() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::rooted(&temp_dir.path().join("FreeKeys"), false);
        paths.ensure_directories().unwrap();

        assert!(paths.songs_dir.is_dir());
        let text = std::fs::read_to_string(paths.default_keymap()).unwrap();
        assert_eq!(text, DEFAULT_KEYMAP);

        // an edited keymap is left alone
        std::fs::write(paths.default_keymap(), "FreePiano 1.8\r\n").unwrap();
        paths.ensure_directories().unwrap();
        let text = std::fs::read_to_string(paths.default_keymap()).unwrap();
        assert_eq!(text, "FreePiano 1.8\r\n");
    }
}
