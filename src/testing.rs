use crate::error::{AppError, Result};
use crate::extractor::Extractor;
use crate::stream::{CategorizedStreams, Category, FetchedVideo, StreamDescriptor};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory extractor for tests; counts calls and writes a small file on transfer.
#[derive(Clone)]
pub struct FakeExtractor {
    title: String,
    streams: CategorizedStreams<String>,
    failing: bool,
    fetches: Arc<AtomicUsize>,
    transfers: Arc<AtomicUsize>,
}

pub fn fake_stream(resolution: Option<&str>, abr: Option<&str>, mime: &str) -> StreamDescriptor<String> {
    let subtype = mime.rsplit('/').next().unwrap_or("bin").to_string();
    StreamDescriptor {
        resolution: resolution.map(String::from),
        abr: abr.map(String::from),
        mime_type: mime.to_string(),
        subtype,
        handle: format!("{}-{}", resolution.or(abr).unwrap_or("none"), mime),
    }
}

impl FakeExtractor {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            streams: CategorizedStreams::new(),
            failing: false,
            fetches: Arc::new(AtomicUsize::new(0)),
            transfers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_stream(mut self, category: Category, stream: StreamDescriptor<String>) -> Self {
        self.streams.push(category, stream);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn transfer_calls(&self) -> usize {
        self.transfers.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    type Handle = String;

    async fn fetch(&self, _url: &str) -> Result<FetchedVideo<String>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::Download("video unavailable".into()));
        }
        Ok(FetchedVideo {
            title: self.title.clone(),
            streams: self.streams.clone(),
        })
    }

    async fn transfer(
        &self,
        stream: &StreamDescriptor<String>,
        folder: &Path,
        filename: &str,
    ) -> Result<PathBuf> {
        self.transfers.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::Download("connection reset".into()));
        }
        let path = folder.join(filename);
        tokio::fs::write(&path, stream.handle.as_bytes()).await?;
        Ok(path)
    }
}
