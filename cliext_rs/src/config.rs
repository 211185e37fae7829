//! Configuration file loading for [`crate::options::config_option`].
//!
//! The format is picked from the extension (`.json`, `.toml`, `.yaml`,
//! `.yml`); every format is loaded into a `serde_json::Value` so commands
//! see one document shape regardless of the file type.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

/// Why a configuration file could not be loaded. The messages are shown to
/// users as-is.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Configuration file not found")]
    NotFound,

    #[error("Failed to read configuration file")]
    Read(#[source] io::Error),

    #[error("Unknown configuration file format \".{0}\"")]
    UnknownFormat(String),

    #[error("Failed to parse configuration file")]
    Parse(#[source] anyhow::Error),
}

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigFileError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            _ => Err(ConfigFileError::UnknownFormat(ext)),
        }
    }

    pub fn parse(self, data: &str) -> Result<serde_json::Value, ConfigFileError> {
        let parsed = match self {
            ConfigFormat::Json => serde_json::from_str(data).map_err(anyhow::Error::from),
            ConfigFormat::Toml => toml::from_str(data).map_err(anyhow::Error::from),
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(anyhow::Error::from),
        };
        parsed.map_err(ConfigFileError::Parse)
    }
}

/// Load `path`.
///
/// A missing file is `Ok(None)` unless `required` is set.
pub fn load_config(path: &Path, required: bool) -> Result<Option<serde_json::Value>, ConfigFileError> {
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "configuration file not found");
        return if required {
            Err(ConfigFileError::NotFound)
        } else {
            Ok(None)
        };
    }
    let data = fs::read_to_string(path).map_err(ConfigFileError::Read)?;
    let format = ConfigFormat::from_path(path)?;
    let value = format.parse(&data)?;
    tracing::debug!(path = %path.display(), ?format, "loaded configuration file");
    Ok(Some(value))
}
