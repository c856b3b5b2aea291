// Configuration management for gridtune
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the music library scanned at startup.
    pub music_dir: PathBuf,
    /// Startup volume, percent 0-100.
    pub default_volume: u8,
    /// Seconds between now-playing scrolls while idle in PlayingNow.
    pub idle_interval_secs: u64,
    /// Seconds per scrolled column; lower is faster.
    pub scroll_speed: f32,
    /// Dim the matrix (full brightness is a lot at arm's length).
    pub low_light: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            music_dir: dirs::audio_dir().unwrap_or_else(|| PathBuf::from("~/Music")),
            default_volume: 70,
            idle_interval_secs: 60,
            scroll_speed: 0.08,
            low_light: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("gridtune");

        Ok(config_dir.join("config.toml"))
    }
}
