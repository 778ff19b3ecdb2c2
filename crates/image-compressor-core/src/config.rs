use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compression::CompressionOptions;
use crate::error::{Error, Result};

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Configuration for the image compressor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding every managed image
    pub storage_dir: PathBuf,

    /// Path to the SQLite record store
    pub database_path: PathBuf,

    /// Quality used when none is given (1-95)
    pub default_quality: u8,

    /// Bit depth used when none is given (1, 8 or 16)
    pub default_bit_depth: u8,

    /// Output format used when none is given (JPEG, PNG, WEBP, BMP)
    pub default_format: String,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("stored_images"),
            database_path: PathBuf::from("images.db"),
            default_quality: 75,
            default_bit_depth: 8,
            default_format: "JPEG".to_string(),
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Compression options built from the configured defaults
    pub fn default_options(&self) -> Result<CompressionOptions> {
        CompressionOptions::from_raw(
            self.default_quality,
            self.default_bit_depth,
            &self.default_format,
        )
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage_dir.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "Storage directory must not be empty".to_string(),
            ));
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "Database path must not be empty".to_string(),
            ));
        }

        self.default_options()
            .map_err(|e| Error::Configuration(format!("Bad compression defaults: {}", e)))?;

        Ok(())
    }
}
