use crate::error::{AamError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Local directory holding downloaded update payloads
#[derive(Debug, Clone)]
pub struct UpdateCache {
    root: PathBuf,
}

impl UpdateCache {
    /// Open the cache directory, creating it when missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() && !path.is_dir() {
            return Err(AamError::Cache(format!(
                "Local cache path '{}' exists, but it is not a directory",
                path.display()
            )));
        }

        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| {
                AamError::Cache(format!(
                    "Local cache path '{}' could not be created: {e}",
                    path.display()
                ))
            })?;
        }

        // The scratch file is unlinked as soon as it is dropped
        tempfile::tempfile_in(path).map_err(|e| {
            AamError::Cache(format!(
                "Cannot write to local cache path '{}': {e}",
                path.display()
            ))
        })?;

        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the payload for a product build is stored
    pub fn installer_path(&self, product: &str, version: &str) -> PathBuf {
        self.root.join(format!("{product}-{version}.dmg"))
    }

    /// A cached file only counts as complete when its size matches the feed's
    pub fn needs_download(&self, path: &Path, expected_size: u64) -> bool {
        match fs::metadata(path) {
            Ok(metadata) => metadata.len() != expected_size,
            Err(_) => true,
        }
    }
}
