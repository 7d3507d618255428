use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sub-tiles spanned by one layout cell along each axis.
pub const TILES_PER_STAMP_UNIT: i32 = 5;

/// File-list slot value meaning "no file".
pub const NO_FILE_SENTINEL: &str = "0";

pub const DEFAULT_TILES_DIR: &str = "/data/global/tiles/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StampConfigFile")]
pub struct StampConfig {
    /// Archive directory that DT1 and DS1 names are relative to.
    pub tiles_dir: String,
    /// Always positive once parsed.
    pub tiles_per_stamp_unit: i32,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            tiles_dir: DEFAULT_TILES_DIR.to_string(),
            tiles_per_stamp_unit: TILES_PER_STAMP_UNIT,
        }
    }
}

/// On-disk shape before validation. Missing keys take the defaults.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct StampConfigFile {
    tiles_dir: String,
    tiles_per_stamp_unit: i32,
}

impl Default for StampConfigFile {
    fn default() -> Self {
        let StampConfig {
            tiles_dir,
            tiles_per_stamp_unit,
        } = StampConfig::default();
        Self {
            tiles_dir,
            tiles_per_stamp_unit,
        }
    }
}

impl TryFrom<StampConfigFile> for StampConfig {
    type Error = String;

    fn try_from(file: StampConfigFile) -> Result<Self, Self::Error> {
        if file.tiles_per_stamp_unit <= 0 {
            return Err(format!(
                "tiles_per_stamp_unit must be positive, got {}",
                file.tiles_per_stamp_unit
            ));
        }
        Ok(Self {
            tiles_dir: file.tiles_dir,
            tiles_per_stamp_unit: file.tiles_per_stamp_unit,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read stamp config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse stamp config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StampConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn read_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn asset_path(&self, file: &str) -> String {
        if self.tiles_dir.ends_with('/') || self.tiles_dir.ends_with('\\') {
            format!("{}{file}", self.tiles_dir)
        } else {
            format!("{}/{file}", self.tiles_dir)
        }
    }
}
