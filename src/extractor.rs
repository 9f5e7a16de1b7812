use crate::error::Result;
use crate::stream::{CategorizedStreams, Category, FetchedVideo, StreamDescriptor};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use yt_dlp::fetcher::deps::Libraries;
use yt_dlp::model::format::{Container, Extension, Format};
use yt_dlp::Youtube;

/// Boundary to the extraction library.
///
/// Everything the application knows about a remote site goes through the
/// two operations of [`Extractor`]: listing the streams of a URL and saving
/// one of them to disk.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Adapter data a descriptor carries back into [`Extractor::transfer`].
    type Handle: Clone + Send + Sync + 'static;

    /// Fetches the title and categorised streams of `url`.
    async fn fetch(&self, url: &str) -> Result<FetchedVideo<Self::Handle>>;

    /// Writes `stream` to `folder/filename` and returns the written path.
    async fn transfer(
        &self,
        stream: &StreamDescriptor<Self::Handle>,
        folder: &Path,
        filename: &str,
    ) -> Result<PathBuf>;
}

/// [`Extractor`] backed by the `yt-dlp` crate.
///
/// # Fields
/// * `fetcher` - Shared Youtube instance holding the binaries
#[derive(Clone)]
pub struct YtDlpExtractor {
    fetcher: Arc<Youtube>,
}

impl YtDlpExtractor {
    /// Creates the extractor, installing binaries when they are missing
    ///
    /// # Arguments
    /// * `libraries_dir` - Directory holding the `yt-dlp` and `ffmpeg` binaries
    /// * `output_dir` - Default output directory of the underlying fetcher
    ///
    /// # Details
    /// Checks for existing yt-dlp and ffmpeg binaries. If not found,
    /// downloads new ones. Otherwise, uses existing binaries and updates the downloader.
    #[instrument]
    pub async fn new(libraries_dir: &Path, output_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(libraries_dir).await?;

        let yt_dlp = libraries_dir.join("yt-dlp");
        let ffmpeg = libraries_dir.join("ffmpeg");

        let fetcher = if !yt_dlp.exists() || !ffmpeg.exists() {
            info!("Installing yt-dlp and ffmpeg into {}", libraries_dir.display());
            Youtube::with_new_binaries(libraries_dir.to_path_buf(), output_dir.to_path_buf())
                .await?
        } else {
            let libraries = Libraries::new(yt_dlp, ffmpeg);
            let youtube = Youtube::new(libraries, output_dir.to_path_buf())?;
            youtube.update_downloader().await?;
            youtube
        };

        Ok(Self {
            fetcher: Arc::new(fetcher),
        })
    }

    /// File extension and MIME subtype of a format.
    ///
    /// Falls back to the DASH container when the extension is not one the
    /// model knows; `None` when neither gives a saveable file.
    fn extension(format: &Format) -> Option<(&'static str, &'static str)> {
        match format.download_info.ext {
            Extension::Mp4 => return Some(("mp4", "mp4")),
            Extension::M4A => return Some(("m4a", "mp4")),
            Extension::Webm => return Some(("webm", "webm")),
            Extension::Mhtml | Extension::None | Extension::Unknown => {}
        }
        match format.container.as_ref()? {
            Container::Mp4 => Some(("mp4", "mp4")),
            Container::M4A => Some(("m4a", "mp4")),
            Container::Webm => Some(("webm", "webm")),
            Container::Unknown => None,
        }
    }

    fn describe(format: &Format) -> Option<(Category, StreamDescriptor<Format>)> {
        let format_type = format.format_type();
        let category = if format_type.is_audio_and_video() {
            Category::Progressive
        } else if format_type.is_video() {
            Category::Video
        } else if format_type.is_audio() {
            Category::Audio
        } else {
            return None;
        };

        let (subtype, container) = Self::extension(format)?;
        let media = if category == Category::Audio { "audio" } else { "video" };

        let resolution = match category {
            Category::Audio => None,
            _ => format.video_resolution.height.map(|h| format!("{}p", h)),
        };
        let abr = format
            .rates_info
            .audio_rate
            .map(|rate| format!("{}kbps", rate.round() as u64));

        Some((
            category,
            StreamDescriptor {
                resolution,
                abr,
                mime_type: format!("{}/{}", media, container),
                subtype: subtype.to_string(),
                handle: format.clone(),
            },
        ))
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    type Handle = Format;

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchedVideo<Format>> {
        let video = self.fetcher.fetch_video_infos(url.to_string()).await?;

        let mut streams = CategorizedStreams::new();
        for (category, descriptor) in video.formats.iter().filter_map(Self::describe) {
            streams.push(category, descriptor);
        }
        debug!("Found {} usable formats for {}", streams.len(), video.title);

        Ok(FetchedVideo {
            title: video.title.clone(),
            streams,
        })
    }

    #[instrument(skip(self, stream))]
    async fn transfer(
        &self,
        stream: &StreamDescriptor<Format>,
        folder: &Path,
        filename: &str,
    ) -> Result<PathBuf> {
        let mut fetcher = (*self.fetcher).clone();
        fetcher.output_dir = folder.to_path_buf();

        let path = fetcher.download_format(&stream.handle, filename).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn format(id: &str, fields: Value) -> Format {
        let mut raw = json!({
            "format": format!("{} - test", id),
            "format_id": id,
            "resolution": "audio only",
            "url": format!("https://cdn.example.com/{}", id),
            "http_headers": {
                "User-Agent": "Mozilla/5.0",
                "Accept": "*/*",
                "Accept-Language": "en-us,en;q=0.5",
                "Sec-Fetch-Mode": "navigate"
            }
        });
        if let (Some(raw), Value::Object(extra)) = (raw.as_object_mut(), fields) {
            raw.extend(extra);
        }
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn progressive_format_carries_resolution_and_bitrate() {
        let f = format(
            "18",
            json!({"ext": "mp4", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2",
                   "height": 360, "abr": 95.6, "resolution": "640x360"}),
        );
        let (category, stream) = YtDlpExtractor::describe(&f).unwrap();
        assert_eq!(category, Category::Progressive);
        assert_eq!(stream.resolution.as_deref(), Some("360p"));
        assert_eq!(stream.abr.as_deref(), Some("96kbps"));
        assert_eq!(stream.mime_type, "video/mp4");
        assert_eq!(stream.subtype, "mp4");
        assert_eq!(stream.handle.format_id, "18");
    }

    #[test]
    fn video_only_format_is_video() {
        let f = format(
            "248",
            json!({"ext": "webm", "vcodec": "vp9", "acodec": "none",
                   "height": 1080, "resolution": "1920x1080"}),
        );
        let (category, stream) = YtDlpExtractor::describe(&f).unwrap();
        assert_eq!(category, Category::Video);
        assert_eq!(stream.quality(), Some("1080p"));
        assert_eq!(stream.abr, None);
        assert_eq!(stream.mime_type, "video/webm");
    }

    #[test]
    fn audio_only_format_uses_rounded_bitrate() {
        let f = format(
            "251",
            json!({"ext": "webm", "vcodec": "none", "acodec": "opus", "abr": 129.476}),
        );
        let (category, stream) = YtDlpExtractor::describe(&f).unwrap();
        assert_eq!(category, Category::Audio);
        assert_eq!(stream.resolution, None);
        assert_eq!(stream.quality(), Some("129kbps"));
        assert_eq!(stream.mime_type, "audio/webm");
        assert_eq!(stream.subtype, "webm");
    }

    #[test]
    fn m4a_audio_is_saved_as_m4a_with_mp4_mime() {
        let f = format(
            "140",
            json!({"ext": "m4a", "container": "m4a_dash", "vcodec": "none",
                   "acodec": "mp4a.40.2", "abr": 129.5}),
        );
        let (category, stream) = YtDlpExtractor::describe(&f).unwrap();
        assert_eq!(category, Category::Audio);
        assert_eq!(stream.abr.as_deref(), Some("130kbps"));
        assert_eq!(stream.mime_type, "audio/mp4");
        assert_eq!(stream.subtype, "m4a");
    }

    #[test]
    fn manifests_storyboards_and_unknown_extensions_are_dropped() {
        let manifest = format(
            "hls-720",
            json!({"ext": "mp4", "vcodec": "avc1", "acodec": "mp4a.40.2", "height": 720,
                   "manifest_url": "https://cdn.example.com/master.m3u8"}),
        );
        let storyboard = format(
            "sb0",
            json!({"ext": "mhtml", "vcodec": "none", "acodec": "none", "rows": 3, "columns": 3,
                   "fragments": [{"url": "https://cdn.example.com/sb0", "duration": 10.0}]}),
        );
        let unknown = format(
            "999",
            json!({"ext": "flv", "vcodec": "h263", "acodec": "mp3", "height": 240}),
        );

        assert!(YtDlpExtractor::describe(&manifest).is_none());
        assert!(YtDlpExtractor::describe(&storyboard).is_none());
        assert!(YtDlpExtractor::describe(&unknown).is_none());
    }
}
