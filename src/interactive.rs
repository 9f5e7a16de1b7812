//! Console form: URL entry, category and quality choice, folder choice and
//! a status line.
//!
//! The form task owns all state. Fetches and downloads run on the
//! [`Worker`]; while one is in flight the commands that would start
//! another are refused.

use crate::app::{current_download_folder, set_download_folder};
use crate::config::Config;
use crate::downloader::Downloader;
use crate::error::{AppError, ErrorKind, Result};
use crate::extractor::Extractor;
use crate::folder::DownloadFolder;
use crate::session::Session;
use crate::stream::Category;
use crate::worker::{Activity, Completion, Worker};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, warn};

const HELP: &str = "\
Commands:
  url <URL>          fetch the available formats (a bare URL works too)
  kind <type>        progressive | video | audio
  quality <N|label>  pick an entry of the quality list
  folder [PATH]      choose the download folder
  download           download the selected format
  show               show the current formats and selection
  help               show this help
  quit               exit";

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch(String),
    Kind(Category),
    Quality(String),
    Folder(Option<PathBuf>),
    Download,
    Show,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "url" | "fetch" => Command::Fetch(rest.to_string()),
            "kind" | "type" => Command::Kind(rest.parse()?),
            "quality" | "q" => Command::Quality(rest.to_string()),
            "folder" => Command::Folder((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "download" | "d" => Command::Download,
            "show" | "ls" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ if word.starts_with("http://") || word.starts_with("https://") => {
                Command::Fetch(line.to_string())
            }
            other => return Err(AppError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prompt {
    Command,
    Folder,
}

pub struct Interactive<E: Extractor> {
    config: Config,
    folder: Option<DownloadFolder>,
    worker: Worker<E>,
    session: Session<E::Handle>,
    prompt: Prompt,
}

impl<E: Extractor + 'static> Interactive<E> {
    pub fn new(config: Config, downloader: Downloader<E>) -> Self {
        Self {
            config,
            folder: None,
            worker: Worker::new(downloader),
            session: Session::new(),
            prompt: Prompt::Command,
        }
    }

    /// Runs until `quit` or end of input.
    pub async fn run(mut self) -> Result<()> {
        println!("Video Downloader");
        println!("{}", HELP);
        self.load_settings();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            self.print_prompt();
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !self.handle_line(&line) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                completion = self.worker.completed() => self.on_completion(completion),
            }
        }

        if let Some(activity) = self.worker.activity() {
            warn!("Exiting while {:?} is still running", activity);
        }
        Ok(())
    }

    fn load_settings(&mut self) {
        let configured = current_download_folder(&self.config);

        if configured.as_os_str().is_empty() {
            self.warning("No download folder configured. Please select one.");
            self.prompt = Prompt::Folder;
            return;
        }

        match DownloadFolder::ensure(&configured) {
            Ok(folder) => {
                self.status(&format!("Current folder: {}", folder));
                self.folder = Some(folder);
            }
            Err(e) => {
                self.error(&format!("{}\nPlease select a different folder.", e));
                self.prompt = Prompt::Folder;
            }
        }
    }

    /// Returns false when the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        if self.prompt == Prompt::Folder {
            return self.handle_folder_line(line);
        }

        match Command::parse(line) {
            Ok(Some(Command::Quit)) => return false,
            Ok(Some(command)) => {
                if let Err(e) = self.execute(command) {
                    self.report(&e);
                }
            }
            Ok(None) => {}
            Err(e) => self.report(&e),
        }
        true
    }

    /// Folder prompt: a path, an empty line to cancel, or `quit`/`help`.
    ///
    /// Anything else that parses as a command is refused and the prompt stays.
    fn handle_folder_line(&mut self, line: &str) -> bool {
        let path = line.trim();
        if path.is_empty() {
            self.prompt = Prompt::Command;
            self.select_folder(None);
            return true;
        }

        match Command::parse(path) {
            Ok(Some(Command::Quit)) => return false,
            Ok(Some(Command::Help)) => println!("{}", HELP),
            Ok(Some(Command::Folder(Some(path)))) => {
                self.prompt = Prompt::Command;
                self.select_folder(Some(path));
            }
            Ok(Some(_)) => {
                self.warning("Expected a folder path, not a command or URL.");
                println!("Enter the download folder (empty to cancel):");
            }
            Ok(None) | Err(_) => {
                self.prompt = Prompt::Command;
                self.select_folder(Some(PathBuf::from(path)));
            }
        }
        true
    }

    fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Fetch(url) => self.fetch(&url),
            Command::Kind(category) => {
                self.session.set_category(category);
                self.show_formats();
                Ok(())
            }
            Command::Quality(choice) => {
                let label = self.session.select(&choice)?.label.clone();
                self.status(&format!("Selected {}", label));
                Ok(())
            }
            Command::Folder(path) => {
                match path {
                    Some(path) => self.select_folder(Some(path)),
                    None => {
                        println!("Enter the download folder (empty to cancel):");
                        self.prompt = Prompt::Folder;
                    }
                }
                Ok(())
            }
            Command::Download => self.download(),
            Command::Show => {
                self.show_formats();
                Ok(())
            }
            Command::Help => {
                println!("{}", HELP);
                Ok(())
            }
            Command::Quit => Ok(()),
        }
    }

    fn fetch(&mut self, url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(AppError::EmptyUrl);
        }
        self.worker.start_fetch(url.trim())?;
        self.status("Fetching formats...");
        Ok(())
    }

    fn download(&mut self) -> Result<()> {
        let Some(entry) = self.session.selected_entry() else {
            return Err(AppError::NoSelection);
        };
        if self.worker.is_busy() {
            return Err(AppError::Busy);
        }

        let folder = match self.folder.as_ref().map(DownloadFolder::validate) {
            Some(Ok(folder)) => folder,
            Some(Err(e)) => return Err(e),
            None => return Err(AppError::invalid_folder("", "no download folder selected")),
        };

        let stream = entry.stream.clone();
        let title = self.session.title().unwrap_or_default().to_string();
        self.worker
            .start_download(stream, title, folder.path().to_path_buf())?;
        self.status("Downloading...");
        Ok(())
    }

    fn select_folder(&mut self, path: Option<PathBuf>) {
        let Some(path) = path else {
            if self.folder.is_none() {
                self.error("Folder selection cancelled. Please select a folder to enable downloads.");
            } else {
                self.status("Folder selection cancelled.");
            }
            return;
        };

        match set_download_folder(&self.config, &path) {
            Ok(folder) => {
                self.status(&format!("Download folder set to: {}", folder));
                self.folder = Some(folder);
            }
            Err(e) => self.report(&e),
        }
    }

    fn on_completion(&mut self, completion: Completion<E::Handle>) {
        match completion {
            Completion::Fetched { url, result } => match result {
                Ok(video) => {
                    self.session.load(url, video);
                    self.status("Formats loaded. Select type and quality.");
                    self.show_formats();
                }
                Err(e) => self.error(&format!("Failed to fetch formats: {}", e)),
            },
            Completion::Downloaded { folder, result } => match result {
                Ok(done) => self.status(&format!(
                    "Download complete: '{}' saved to '{}'",
                    done.file_name,
                    folder.display()
                )),
                Err(e) if e.kind() == ErrorKind::Folder => self.report(&e),
                Err(e) => self.error(&format!("Failed to download: {}", e)),
            },
        }
    }

    fn show_formats(&self) {
        let Some(title) = self.session.title() else {
            println!("No formats loaded yet. Use `url <URL>` first.");
            return;
        };
        println!("\n{}", title);
        println!("Format type: {}", self.session.category().description());

        let menu = self.session.menu();
        if menu.is_empty() {
            println!("  No streams available in this category");
            return;
        }
        let selected = self.session.selected_entry().map(|e| e.label.as_str());
        for (i, label) in menu.labels().enumerate() {
            let marker = if Some(label) == selected { '*' } else { ' ' };
            println!(" {} {:>2}. {}", marker, i + 1, label);
        }
    }

    fn report(&mut self, e: &AppError) {
        debug!("Reporting {:?} error: {}", e.kind(), e);
        match e.kind() {
            ErrorKind::Input => self.warning(&e.to_string()),
            ErrorKind::Folder => {
                self.error(&e.to_string());
                println!("Please select a valid folder (empty to cancel):");
                self.prompt = Prompt::Folder;
            }
            _ => self.error(&e.to_string()),
        }
    }

    fn print_prompt(&self) {
        let prompt = match (self.prompt, self.worker.activity()) {
            (Prompt::Folder, _) => "folder> ",
            (_, Some(Activity::Fetching)) => "[fetching] > ",
            (_, Some(Activity::Downloading)) => "[downloading] > ",
            (_, None) => "> ",
        };
        print!("{}", prompt);
        let _ = std::io::stdout().flush();
    }

    fn status(&self, text: &str) {
        println!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), text);
    }

    fn warning(&self, text: &str) {
        warn!("{}", text);
        println!("[{}] Warning: {}", chrono::Local::now().format("%H:%M:%S"), text);
    }

    fn error(&self, text: &str) {
        error!("{}", text);
        println!("[{}] Error: {}", chrono::Local::now().format("%H:%M:%S"), text);
    }
}
