//! Byte sources for archive paths such as `/data/global/tiles/A1\Cave.ds1`.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {path}")]
    NotFound { path: String },
    #[error("asset path {path} escapes the archive root")]
    InvalidPath { path: String },
    #[error("failed to read asset {path} from {resolved}: {source}")]
    Io {
        path: String,
        resolved: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub trait AssetSource {
    fn load_file(&self, path: &str) -> Result<Vec<u8>, AssetError>;
}

/// Canonical key for an archive path: forward slashes, no leading slash.
pub fn normalize_asset_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Extracted data tree on disk.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins each segment under the root. Only plain names are accepted.
    fn resolve(&self, key: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        for segment in key.split('/').filter(|segment| !segment.is_empty()) {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) => resolved.push(name),
                _ => return None,
            }
        }
        Some(resolved)
    }
}

impl AssetSource for DirectoryArchive {
    fn load_file(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let key = normalize_asset_path(path);
        let invalid = || AssetError::InvalidPath {
            path: path.to_string(),
        };
        let exact = self.resolve(&key).ok_or_else(invalid)?;
        let resolved = if exact.is_file() {
            exact
        } else {
            let lowered = self
                .resolve(&key.to_ascii_lowercase())
                .ok_or_else(invalid)?;
            if !lowered.is_file() {
                return Err(AssetError::NotFound {
                    path: path.to_string(),
                });
            }
            lowered
        };

        fs::read(&resolved).map_err(|source| AssetError::Io {
            path: path.to_string(),
            resolved,
            source,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, bytes: Vec<u8>) {
        self.files.insert(normalize_asset_path(path), bytes);
    }

    pub fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AssetSource for MemoryArchive {
    fn load_file(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.files
            .get(&normalize_asset_path(path))
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                path: path.to_string(),
            })
    }
}
