use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for rolling log files when journald is unavailable.
    /// Kept ahead of the sections so it serializes as a top-level key.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photovault")
        .join("logs")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_originals_dir")]
    pub originals_dir: PathBuf,

    #[serde(default = "default_thumbnails_dir")]
    pub thumbnails_dir: PathBuf,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_originals_dir() -> PathBuf {
    data_dir().join("photos")
}

fn default_thumbnails_dir() -> PathBuf {
    data_dir().join("photos_thumbnails")
}

fn default_db_path() -> PathBuf {
    data_dir().join("photovault.db")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photovault")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            originals_dir: default_originals_dir(),
            thumbnails_dir: default_thumbnails_dir(),
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// File extensions accepted for upload, matched case-insensitively.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Ceiling on the original file size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_allowed_extensions() -> Vec<String> {
    vec![
        "gif".to_string(),
        "png".to_string(),
        "jpg".to_string(),
        "jpeg".to_string(),
        "bmp".to_string(),
    ]
}

fn default_max_upload_bytes() -> u64 {
    50 * 1024 * 1024 // 50MB
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Target thumbnail width in pixels; height follows the source aspect ratio.
    #[serde(default = "default_thumbnail_width")]
    pub width: u32,
}

fn default_thumbnail_width() -> u32 {
    80
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: default_thumbnail_width(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            storage: StorageConfig::default(),
            upload: UploadConfig::default(),
            thumbnails: ThumbnailConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photovault")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.thumbnails.width, 80);
        assert_eq!(config.upload.max_upload_bytes, 50 * 1024 * 1024);
        assert!(config
            .upload
            .allowed_extensions
            .contains(&"jpeg".to_string()));
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let config: Config = toml::from_str("[thumbnails]\nwidth = 120\n").unwrap();
        assert_eq!(config.thumbnails.width, 120);
        assert_eq!(config.upload.max_upload_bytes, default_max_upload_bytes());
        assert_eq!(config.log_dir, default_log_dir());
    }

    #[test]
    fn log_dir_is_configurable() {
        let config: Config = toml::from_str("log_dir = \"/tmp/pv-logs\"\n").unwrap();
        assert_eq!(config.log_dir, PathBuf::from("/tmp/pv-logs"));
    }
}
