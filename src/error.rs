use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for the application.
///
/// Every failure is eventually shown to the user as a single message; the
/// [`ErrorKind`] returned by [`AppError::kind`] decides how the front-end
/// reacts (warn, re-prompt for a folder, or just report).

/// Represents all possible errors that can occur in the application.
///
/// # Error Categories
///
/// - Input: missing or malformed URL, unknown selection
/// - Adapter: anything raised while fetching or transferring through yt-dlp
/// - Config: settings file (de)serialisation
/// - Folder: destination folder missing, not a directory, or not creatable
/// - Cleanup: staged files that could not be removed
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Youtube error: {0}")]
    Youtube(#[from] yt_dlp::error::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Please enter a video URL first")]
    EmptyUrl,

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid download folder '{}': {reason}", .path.display())]
    InvalidFolder { path: PathBuf, reason: String },

    #[error("No streams available in the {0} category")]
    NoStreams(String),

    #[error("Fetch the available formats first")]
    NotFetched,

    #[error("No stream selected")]
    NoSelection,

    #[error("Unknown selection: {0}")]
    UnknownSelection(String),

    #[error("Unknown format type: {0}")]
    UnknownCategory(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Another operation is still running")]
    Busy,

    #[error("Could not remove staged file '{}': {source}", .path.display())]
    Cleanup { path: PathBuf, source: io::Error },

    #[error("Download error: {0}")]
    Download(String),

    #[error("{0}")]
    Custom(String),
}

/// How a failure is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Adapter,
    Config,
    Folder,
    Cleanup,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::EmptyUrl
            | AppError::UnsupportedScheme(_)
            | AppError::UrlParse(_)
            | AppError::NoStreams(_)
            | AppError::NotFetched
            | AppError::NoSelection
            | AppError::UnknownSelection(_)
            | AppError::UnknownCategory(_)
            | AppError::UnknownCommand(_)
            | AppError::Busy => ErrorKind::Input,
            AppError::Settings(_) => ErrorKind::Config,
            AppError::InvalidFolder { .. } => ErrorKind::Folder,
            AppError::Cleanup { .. } => ErrorKind::Cleanup,
            AppError::Io(_)
            | AppError::Youtube(_)
            | AppError::Download(_)
            | AppError::Custom(_) => ErrorKind::Adapter,
        }
    }

    pub fn invalid_folder(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AppError::InvalidFolder {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::Custom(error.to_string())
    }
}

impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::Custom(error)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_classified_as_input() {
        assert_eq!(AppError::EmptyUrl.kind(), ErrorKind::Input);
        assert_eq!(AppError::Busy.kind(), ErrorKind::Input);
        assert_eq!(
            AppError::UnknownSelection("999p".into()).kind(),
            ErrorKind::Input
        );
    }

    #[test]
    fn folder_and_adapter_errors_keep_their_kind() {
        let err = AppError::invalid_folder("/nope", "does not exist");
        assert_eq!(err.kind(), ErrorKind::Folder);
        assert!(err.to_string().contains("/nope"));

        let err = AppError::Download("connection reset".into());
        assert_eq!(err.kind(), ErrorKind::Adapter);
    }
}
