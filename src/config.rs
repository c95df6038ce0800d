//! Read-only application settings.
//!
//! Loaded once at startup from `config.toml` in the platform config directory.
//! A missing file means defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::model::{AudioFormat, VideoQuality};

/// Overrides `ytdlp_path` from the environment
pub const YTDLP_ENV: &str = "YT_DOWNLOADER_YTDLP";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Explicit yt-dlp executable; skips the bundled copy and PATH lookup
    pub ytdlp_path: Option<PathBuf>,
    /// Folder preselected in the UI instead of the current directory
    pub default_folder: Option<PathBuf>,
    pub default_quality: VideoQuality,
    pub default_audio_format: AudioFormat,
    /// tracing filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "yt-downloader").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Loads the config file and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(std::env::var_os(YTDLP_ENV).map(PathBuf::from));
        Ok(config)
    }

    /// Defaults plus environment overrides, used when the file is unreadable.
    pub fn fallback() -> Self {
        let mut config = Self::default();
        config.apply_env(std::env::var_os(YTDLP_ENV).map(PathBuf::from));
        config
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self, ytdlp: Option<PathBuf>) {
        if let Some(path) = ytdlp.filter(|p| !p.as_os_str().is_empty()) {
            self.ytdlp_path = Some(path);
        }
    }
}
