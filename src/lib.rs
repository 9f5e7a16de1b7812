//! A terminal front-end for downloading single video streams.
//!
//! This library lists the stream variants of a video URL, ranks them by
//! quality, and saves the chosen one through the `yt-dlp` crate. It also
//! keeps a small settings file and a ledger of staged files to clean up.
//!
//! # Architecture
//!
//! The application is structured into several key components:
//! - `Extractor`: capability boundary to the extraction library
//! - `ranking`: quality ordering and the selection menu
//! - `Downloader`: file naming, folder checks and transfers
//! - `Worker`: background jobs for the interactive form
//! - `App` / `Interactive`: the two front-ends
//! - `Config` / `Settings` / `CleanupLedger`: persisted state
//!
//! # Example
//! ```no_run
//! use ytgrab::{App, Category, Config, Downloader, YtDlpExtractor};
//!
//! async fn example() -> ytgrab::error::Result<()> {
//!     let config = Config::default();
//!     let extractor = YtDlpExtractor::new(&config.libraries_dir, &config.staging_dir).await?;
//!     let app = App::new(config, Downloader::new(extractor));
//!     let done = app
//!         .download("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Category::Progressive, None, None)
//!         .await?;
//!     println!("Saved {}", done.path.display());
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod folder;
pub mod interactive;
pub mod ledger;
pub mod ranking;
pub mod session;
pub mod stream;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use app::App;
pub use config::{Config, Settings};
pub use downloader::{Downloaded, Downloader};
pub use error::{AppError, ErrorKind};
pub use extractor::{Extractor, YtDlpExtractor};
pub use folder::DownloadFolder;
pub use interactive::Interactive;
pub use ledger::CleanupLedger;
pub use ranking::SelectionMenu;
pub use session::Session;
pub use stream::{CategorizedStreams, Category, FetchedVideo, StreamDescriptor};
pub use worker::Worker;
