//! Cotick configuration file handling

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "cotick.toml";

/// Top-level Cotick configuration (cotick.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CotickConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Scheduler settings
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Diagnostic name; generated when absent
    #[serde(default)]
    pub name: Option<String>,
}

/// Which scheduling source drives the tick loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DriverKind {
    /// Tick on every turn of a local run queue
    #[default]
    EventLoop,
    /// Tick once per frame at a fixed rate
    Frames,
}

/// Drive loop settings
#[derive(Debug, Deserialize, Serialize)]
pub struct DriverConfig {
    #[serde(default)]
    pub kind: DriverKind,
    /// Frame rate for the `frames` driver
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Give up after this many turns (or frames)
    #[serde(default)]
    pub max_turns: Option<u64>,
}

fn default_fps() -> u32 {
    60
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: DriverKind::default(),
            fps: default_fps(),
            max_turns: None,
        }
    }
}

/// The demo timeline
#[derive(Debug, Deserialize, Serialize)]
pub struct DemoConfig {
    /// Seconds to wait before anything moves
    #[serde(default = "default_wait_seconds")]
    pub wait_seconds: f64,
    /// Ticks to hold after the wait
    #[serde(default = "default_frames")]
    pub frames: i64,
    /// Where the marker ends up
    #[serde(default = "default_target")]
    pub target: f64,
    /// Easing curve name, e.g. `ease-in-out`
    #[serde(default = "default_easing")]
    pub easing: String,
    /// Fixed seconds per tick. When set, time is simulated instead of read
    /// from the wall clock.
    #[serde(default)]
    pub time_step: Option<f64>,
}

fn default_wait_seconds() -> f64 {
    0.5
}

fn default_frames() -> i64 {
    30
}

fn default_target() -> f64 {
    100.0
}

fn default_easing() -> String {
    "ease-in-out".to_string()
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            wait_seconds: default_wait_seconds(),
            frames: default_frames(),
            target: default_target(),
            easing: default_easing(),
            time_step: None,
        }
    }
}

fn config_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(CONFIG_FILE)
    } else {
        path.to_path_buf()
    }
}

impl CotickConfig {
    /// Load from an explicit file or directory, or from `./cotick.toml`.
    ///
    /// An explicit path must exist; the implicit one falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => {
                let config_path = config_path(path);
                if !config_path.exists() {
                    anyhow::bail!(
                        "No {} found at {}. Run `cotick init` to create one.",
                        CONFIG_FILE,
                        config_path.display()
                    );
                }
                config_path
            }
            None => {
                let config_path = PathBuf::from(CONFIG_FILE);
                if !config_path.exists() {
                    tracing::debug!("no {} in working directory, using defaults", CONFIG_FILE);
                    return Ok(Self::default());
                }
                config_path
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Write a default config into `dir`, refusing to overwrite
    pub fn write_default(dir: &Path) -> Result<PathBuf> {
        let path = config_path(dir);
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        fs::write(&path, Self::default().to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
