//! Window configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/fanduino/window.toml`
//! - Windows: `%APPDATA%/fanduino/window.toml`
//!
//! `FANDUINO_CONFIG` overrides the path.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configuration path.
const CONFIG_ENV: &str = "FANDUINO_CONFIG";

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupConfiguration {
    /// Collapse into the tray instead of showing the window.
    #[serde(default)]
    pub start_minimized: bool,

    /// Port the engine listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the engine binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Initial window placement.
    #[serde(default)]
    pub window: WindowSettings,
}

/// Initial window title, size and position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: f32,
    pub height: f32,
    /// Top-left corner in screen points; `None` lets the OS place it.
    pub position: Option<[f32; 2]>,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Fanduino".into(),
            width: 320.0,
            height: 120.0,
            position: None,
        }
    }
}

fn default_port() -> u16 {
    5757
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

impl Default for StartupConfiguration {
    fn default() -> Self {
        Self {
            start_minimized: false,
            port: default_port(),
            bind_address: default_bind_address(),
            window: WindowSettings::default(),
        }
    }
}

impl StartupConfiguration {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    /// Loads configuration from `path`, writing defaults there if missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let config: StartupConfiguration = toml::from_str(&content)
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            Ok(config)
        } else {
            let config = StartupConfiguration::default();
            if let Err(e) = config.save_to(path) {
                // Defaults still work without a file on disk.
                tracing::warn!(path = %path.display(), "could not write default configuration: {e:#}");
            }
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the configuration file path.
fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    platform_config_path()
}

fn platform_config_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("fanduino")
            .join("window.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("fanduino").join("window.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::temp_dir().join("fanduino").join("window.toml")
    }
}
