use crate::config::{Config, Settings};
use crate::downloader::{Downloaded, Downloader};
use crate::error::{AppError, Result};
use crate::extractor::Extractor;
use crate::folder::DownloadFolder;
use crate::ledger::CleanupLedger;
use crate::ranking::SelectionMenu;
use crate::session::Session;
use crate::stream::{Category, StreamDescriptor};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// One-shot operations behind the non-interactive subcommands.
///
/// Every call is a complete cycle: fetch, pick, and (for downloads) save.
/// Nothing survives between calls except the settings file and the
/// cleanup ledger.
pub struct App<E: Extractor> {
    config: Config,
    downloader: Downloader<E>,
}

/// Ranked menus of a fetched URL, one per requested category.
pub struct FormatListing<H> {
    pub title: String,
    pub menus: Vec<(Category, SelectionMenu<H>)>,
}

impl<H> fmt::Display for FormatListing<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for (category, menu) in &self.menus {
            writeln!(f, "\n{}:", category.description())?;
            if menu.is_empty() {
                writeln!(f, "  No streams available in this category")?;
            }
            for (i, label) in menu.labels().enumerate() {
                writeln!(f, "  {:>2}. {}", i + 1, label)?;
            }
        }
        Ok(())
    }
}

impl<E: Extractor> App<E> {
    pub fn new(config: Config, downloader: Downloader<E>) -> Self {
        Self { config, downloader }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_parts(self) -> (Config, Downloader<E>) {
        (self.config, self.downloader)
    }

    /// Fetches `url` and ranks either one category or all of them.
    #[instrument(skip(self))]
    pub async fn list_formats(
        &self,
        url: &str,
        category: Option<Category>,
    ) -> Result<FormatListing<E::Handle>> {
        let video = self.downloader.fetch(url).await?;
        let categories = match category {
            Some(c) => vec![c],
            None => Category::ALL.to_vec(),
        };
        let menus = categories
            .into_iter()
            .map(|c| (c, SelectionMenu::build(video.streams.get(c))))
            .collect();

        Ok(FormatListing {
            title: video.title,
            menus,
        })
    }

    /// Downloads into the configured folder, or into `folder` which is then
    /// remembered for later runs.
    #[instrument(skip(self))]
    pub async fn download(
        &self,
        url: &str,
        category: Category,
        quality: Option<&str>,
        folder: Option<&Path>,
    ) -> Result<Downloaded> {
        let folder = match folder {
            Some(path) => self.set_folder(path)?,
            None => {
                let settings = Settings::load(&self.config.settings_file);
                DownloadFolder::ensure(
                    settings.download_folder_or(&self.config.default_download_folder),
                )?
            }
        };

        let (title, stream) = self.pick(url, category, quality).await?;
        self.downloader.download(&stream, &title, folder.path()).await
    }

    /// A single staging pass: clear files left by earlier passes, then
    /// download into the staging folder and schedule the result for the
    /// next pass to remove.
    #[instrument(skip(self))]
    pub async fn stage(
        &self,
        url: &str,
        category: Category,
        quality: Option<&str>,
    ) -> Result<Downloaded> {
        let ledger = CleanupLedger::new(&self.config.ledger_file);
        let report = ledger.process();
        if !report.failed.is_empty() {
            warn!("{} staged file(s) could not be removed", report.failed.len());
        }

        let folder = DownloadFolder::ensure(&self.config.staging_dir)?;
        let (title, stream) = self.pick(url, category, quality).await?;
        let downloaded = self.downloader.download(&stream, &title, folder.path()).await?;

        if let Err(e) = ledger.append(&downloaded.path) {
            warn!("Could not schedule {} for cleanup: {}", downloaded.path.display(), e);
        }
        Ok(downloaded)
    }

    /// Current download folder as persisted, or the default.
    pub fn folder(&self) -> PathBuf {
        current_download_folder(&self.config)
    }

    /// Creates `path` if needed and persists it as the download folder.
    pub fn set_folder(&self, path: &Path) -> Result<DownloadFolder> {
        set_download_folder(&self.config, path)
    }

    async fn pick(
        &self,
        url: &str,
        category: Category,
        quality: Option<&str>,
    ) -> Result<(String, StreamDescriptor<E::Handle>)> {
        let video = self.downloader.fetch(url).await?;

        let mut session = Session::new();
        session.set_category(category);
        session.load(url, video);

        let entry = match quality {
            Some(choice) => session.select(choice)?,
            None => session
                .selected_entry()
                .ok_or_else(|| AppError::NoStreams(category.to_string()))?,
        };
        info!("Selected {}", entry.label);

        let stream = entry.stream.clone();
        let title = session.title().unwrap_or_default().to_string();
        Ok((title, stream))
    }
}

/// Download folder from the settings file, or the configured default.
pub fn current_download_folder(config: &Config) -> PathBuf {
    Settings::load(&config.settings_file).download_folder_or(&config.default_download_folder)
}

/// Creates `path` if needed and records its absolute form in the settings file.
///
/// Other keys already in the file are dropped; the read and the write are
/// not atomic.
pub fn set_download_folder(config: &Config, path: &Path) -> Result<DownloadFolder> {
    let folder = DownloadFolder::ensure(path)?;
    let mut settings = Settings::load(&config.settings_file);
    settings.download_folder = Some(folder.absolute());
    settings.save(&config.settings_file)?;
    info!("Download folder set to {}", folder);
    Ok(folder)
}
