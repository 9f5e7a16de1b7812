//! Background execution of network-bound work.
//!
//! A [`Job`] is a spawned task plus a single completion channel. The
//! [`Worker`] keeps at most one job in flight and refuses new work until it
//! has been collected, so only the owner of the worker ever mutates state.

use crate::downloader::{Downloaded, Downloader};
use crate::error::{AppError, Result};
use crate::extractor::Extractor;
use crate::stream::{FetchedVideo, StreamDescriptor};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;

/// A spawned task whose result arrives over a oneshot channel.
///
/// A task that panics or is dropped without sending resolves to an error.
pub struct Job<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T: Send + 'static> Job<T> {
    pub fn spawn<F>(task: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
        Self { rx }
    }
}

impl<T> Future for Job<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match futures::ready!(Pin::new(&mut self.rx).poll(cx)) {
            Ok(result) => Poll::Ready(result),
            Err(_) => Poll::Ready(Err(AppError::Download(
                "background task ended without a result".into(),
            ))),
        }
    }
}

/// What the worker is busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Fetching,
    Downloading,
}

/// A finished job, as seen by the front-end.
#[derive(Debug)]
pub enum Completion<H> {
    Fetched {
        url: String,
        result: Result<FetchedVideo<H>>,
    },
    Downloaded {
        folder: PathBuf,
        result: Result<Downloaded>,
    },
}

enum Pending<H> {
    Fetch(String, Job<FetchedVideo<H>>),
    Download(PathBuf, Job<Downloaded>),
}

/// Runs fetches and downloads off the front-end task, one at a time.
pub struct Worker<E: Extractor> {
    downloader: Arc<Downloader<E>>,
    pending: Option<Pending<E::Handle>>,
}

impl<E: Extractor + 'static> Worker<E> {
    pub fn new(downloader: Downloader<E>) -> Self {
        Self {
            downloader: Arc::new(downloader),
            pending: None,
        }
    }

    pub fn activity(&self) -> Option<Activity> {
        self.pending.as_ref().map(|p| match p {
            Pending::Fetch(..) => Activity::Fetching,
            Pending::Download(..) => Activity::Downloading,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn start_fetch(&mut self, url: &str) -> Result<()> {
        if self.is_busy() {
            return Err(AppError::Busy);
        }
        let downloader = Arc::clone(&self.downloader);
        let owned = url.to_string();
        let job = Job::spawn(async move { downloader.fetch(&owned).await });

        debug!("Started fetch job for {}", url);
        self.pending = Some(Pending::Fetch(url.to_string(), job));
        Ok(())
    }

    pub fn start_download(
        &mut self,
        stream: StreamDescriptor<E::Handle>,
        title: String,
        folder: PathBuf,
    ) -> Result<()> {
        if self.is_busy() {
            return Err(AppError::Busy);
        }
        let downloader = Arc::clone(&self.downloader);
        let target = folder.clone();
        let job = Job::spawn(async move { downloader.download(&stream, &title, &target).await });

        debug!("Started download job into {}", folder.display());
        self.pending = Some(Pending::Download(folder, job));
        Ok(())
    }

    /// Waits for the job in flight; never resolves while idle.
    ///
    /// Cancel safe: dropping the returned future leaves the job pending.
    pub async fn completed(&mut self) -> Completion<E::Handle> {
        let completion = match self.pending.as_mut() {
            Some(Pending::Fetch(url, job)) => Completion::Fetched {
                url: url.clone(),
                result: job.await,
            },
            Some(Pending::Download(folder, job)) => Completion::Downloaded {
                folder: folder.clone(),
                result: job.await,
            },
            None => return futures::future::pending().await,
        };
        self.pending = None;
        completion
    }
}
