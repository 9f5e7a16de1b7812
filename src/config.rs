use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration management for the application.
///
/// Two layers:
/// - [`Config`]: where things live for this run (settings file, ledger,
///   staging folder, binaries). Built from defaults and CLI flags.
/// - [`Settings`]: the small record persisted between runs.

/// Runtime configuration.
///
/// # Examples
///
/// ```
/// use ytgrab::Config;
///
/// let config = Config::default();
/// assert_eq!(config.settings_file.to_str(), Some("config.json"));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub settings_file: PathBuf,
    pub ledger_file: PathBuf,
    pub staging_dir: PathBuf,
    pub libraries_dir: PathBuf,
    pub default_download_folder: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_file: PathBuf::from("config.json"),
            ledger_file: PathBuf::from("cleanup_list.txt"),
            staging_dir: PathBuf::from("youtube_downloads"),
            libraries_dir: PathBuf::from("libs"),
            default_download_folder: PathBuf::from("youtube_downloads"),
        }
    }
}

/// Settings persisted across runs as a JSON object.
///
/// A missing `download_folder` key means "use the default"; an explicit
/// empty string means "nothing configured, ask the user".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_folder: Option<PathBuf>,
}

impl Settings {
    /// Loads settings, treating a missing or unreadable file as empty.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!("Error reading {}: {}. Using defaults.", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Error parsing {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Writes the settings back. Not atomic; concurrent writers can lose updates.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// The folder to use, falling back to `default` when the key is absent.
    pub fn download_folder_or(&self, default: &Path) -> PathBuf {
        self.download_folder
            .clone()
            .unwrap_or_else(|| default.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("config.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ download_folder: ").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn settings_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = Settings {
            download_folder: Some(dir.path().join("videos")),
        };
        settings.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"download_folder\""));
        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"download_folder": "/tmp/x", "theme": "dark"}"#).unwrap();
        assert_eq!(
            Settings::load(&path).download_folder,
            Some(PathBuf::from("/tmp/x"))
        );
    }

    #[test]
    fn absent_folder_uses_default() {
        let settings = Settings::default();
        assert_eq!(
            settings.download_folder_or(Path::new("youtube_downloads")),
            PathBuf::from("youtube_downloads")
        );
    }
}
