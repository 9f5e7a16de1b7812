use crate::error::{AppError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// A destination folder that existed and was a directory when checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFolder {
    path: PathBuf,
}

impl DownloadFolder {
    /// Creates the folder tree if needed and validates the result.
    ///
    /// Creation failures are reported as folder errors so the caller can ask
    /// for another location.
    pub fn ensure(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(AppError::invalid_folder(path, "no download folder configured"));
        }
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| AppError::invalid_folder(path, e))?;
            info!("Created download folder {}", path.display());
        }
        Self::validate(path)
    }

    /// Checks that `path` exists and is a directory, without creating it.
    pub fn validate(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(AppError::invalid_folder(path, "no download folder configured"));
        }
        let metadata = std::fs::metadata(path).map_err(|e| AppError::invalid_folder(path, e))?;
        if !metadata.is_dir() {
            return Err(AppError::invalid_folder(path, "not a directory"));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute form of the path, used when persisting it.
    pub fn absolute(&self) -> PathBuf {
        std::fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone())
    }
}

impl AsRef<Path> for DownloadFolder {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for DownloadFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
