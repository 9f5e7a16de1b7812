use crate::error::{AppError, Result};
use crate::extractor::Extractor;
use crate::folder::DownloadFolder;
use crate::stream::{FetchedVideo, StreamDescriptor};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use url::Url;

/// Length of the random part appended to every file name.
const SUFFIX_LEN: usize = 8;

/// Drives the extractor for one fetch or one download.
///
/// # Fields
/// * `extractor` - Capability used for all network and transfer work
#[derive(Clone)]
pub struct Downloader<E> {
    extractor: E,
}

/// A finished transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub path: PathBuf,
    pub file_name: String,
}

impl<E: Extractor> Downloader<E> {
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Validates `url` and lists its streams
    ///
    /// # Errors
    /// * Input error if the URL is empty or not http(s)
    /// * Adapter error if the extractor fails
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedVideo<E::Handle>> {
        let url = validate_url(url)?;
        let video = self.extractor.fetch(url.as_str()).await?;
        info!("Fetched {} streams for '{}'", video.streams.len(), video.title);
        Ok(video)
    }

    /// Saves `stream` into `folder` under a generated file name
    ///
    /// # Arguments
    /// * `stream` - The chosen descriptor
    /// * `title` - Video title the file name is derived from
    /// * `folder` - Destination; checked before anything is written
    ///
    /// # Returns
    /// * `Result<Downloaded>` - Final path and file name
    ///
    /// # Errors
    /// * Folder error if `folder` is missing or not a directory
    /// * Adapter error if the transfer fails; nothing is retried
    #[instrument(skip(self, stream))]
    pub async fn download(
        &self,
        stream: &StreamDescriptor<E::Handle>,
        title: &str,
        folder: &Path,
    ) -> Result<Downloaded> {
        let folder = DownloadFolder::validate(folder)?;
        let file_name = unique_file_name(title, &stream.subtype);

        let written = self
            .extractor
            .transfer(stream, folder.path(), &file_name)
            .await?;

        let path = if written.as_os_str().is_empty() {
            folder.path().join(&file_name)
        } else {
            written
        };
        info!("Downloaded {}", path.display());

        Ok(Downloaded { path, file_name })
    }
}

/// Rejects empty input and anything that is not an absolute http(s) URL.
pub fn validate_url(input: &str) -> Result<Url> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::EmptyUrl);
    }
    let url = Url::parse(input)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::UnsupportedScheme(other.to_string())),
    }
}

/// Replaces every non-alphanumeric character of `title` with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// `{sanitized title}_{8 hex chars}.{subtype}`
///
/// # Examples
///
/// ```
/// use ytgrab::downloader::unique_file_name;
///
/// let name = unique_file_name("My Video! #1", "mp4");
/// assert!(name.starts_with("My_Video___1_"));
/// assert!(name.ends_with(".mp4"));
/// ```
pub fn unique_file_name(title: &str, subtype: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}.{}", sanitize_title(title), &id[..SUFFIX_LEN], subtype)
}
