//! Stream descriptors as handed out by an [`Extractor`](crate::Extractor).
//!
//! The descriptor carries the display attributes used for ranking and
//! labelling, plus an adapter-owned `handle` that the same adapter needs
//! back when the descriptor is transferred.

use crate::error::AppError;
use std::fmt;
use std::str::FromStr;

/// One downloadable variant of a video.
///
/// # Fields
/// * `resolution` - Vertical resolution label such as `"720p"`
/// * `abr` - Audio bitrate label such as `"128kbps"`
/// * `mime_type` - Container MIME type such as `"video/mp4"`
/// * `subtype` - File extension used for the saved file
/// * `handle` - Adapter-specific data needed by `transfer`
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor<H> {
    pub resolution: Option<String>,
    pub abr: Option<String>,
    pub mime_type: String,
    pub subtype: String,
    pub handle: H,
}

impl<H> StreamDescriptor<H> {
    /// Resolution if populated, otherwise the audio bitrate.
    ///
    /// Empty strings count as absent.
    pub fn quality(&self) -> Option<&str> {
        non_empty(&self.resolution).or_else(|| non_empty(&self.abr))
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Stream category, matching the three choices offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    /// Audio and video in one file
    #[default]
    Progressive,
    /// Video only
    Video,
    /// Audio only
    Audio,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Progressive, Category::Video, Category::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Progressive => "progressive",
            Category::Video => "video",
            Category::Audio => "audio",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Progressive => "Progressive (Video+Audio)",
            Category::Video => "Video Only",
            Category::Audio => "Audio Only",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "progressive" | "p" => Ok(Category::Progressive),
            "video" | "v" => Ok(Category::Video),
            "audio" | "a" => Ok(Category::Audio),
            other => Err(AppError::UnknownCategory(other.to_string())),
        }
    }
}

/// Streams of one fetch, grouped by [`Category`].
///
/// Every category is present, possibly empty.
#[derive(Debug, Clone)]
pub struct CategorizedStreams<H> {
    progressive: Vec<StreamDescriptor<H>>,
    video: Vec<StreamDescriptor<H>>,
    audio: Vec<StreamDescriptor<H>>,
}

impl<H> Default for CategorizedStreams<H> {
    fn default() -> Self {
        Self {
            progressive: Vec::new(),
            video: Vec::new(),
            audio: Vec::new(),
        }
    }
}

impl<H> CategorizedStreams<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: Category, stream: StreamDescriptor<H>) {
        self.slot_mut(category).push(stream);
    }

    pub fn get(&self, category: Category) -> &[StreamDescriptor<H>] {
        match category {
            Category::Progressive => &self.progressive,
            Category::Video => &self.video,
            Category::Audio => &self.audio,
        }
    }

    pub fn len(&self) -> usize {
        self.progressive.len() + self.video.len() + self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_mut(&mut self, category: Category) -> &mut Vec<StreamDescriptor<H>> {
        match category {
            Category::Progressive => &mut self.progressive,
            Category::Video => &mut self.video,
            Category::Audio => &mut self.audio,
        }
    }
}

/// Result of a single `fetch`: the title plus every categorised stream.
#[derive(Debug, Clone)]
pub struct FetchedVideo<H> {
    pub title: String,
    pub streams: CategorizedStreams<H>,
}
