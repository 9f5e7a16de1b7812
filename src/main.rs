use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, Level};
use ytgrab::app::{current_download_folder, set_download_folder};
use ytgrab::error::Result;
use ytgrab::{App, Category, Config, Downloader, ErrorKind, Interactive, YtDlpExtractor};

#[derive(Debug, Parser)]
#[command(name = "ytgrab")]
#[command(about = "List the streams of a video URL and download one of them")]
struct Cli {
    /// Settings file holding the download folder
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger of staged files to remove on the next stage run
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Directory holding the yt-dlp and ffmpeg binaries
    #[arg(long, global = true)]
    libs: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the ranked formats of a URL
    Formats {
        url: String,
        /// progressive, video or audio; all when omitted
        #[arg(long, value_parser = parse_category)]
        kind: Option<Category>,
    },
    /// Download one format into the download folder
    Download {
        url: String,
        #[arg(long, default_value = "progressive", value_parser = parse_category)]
        kind: Category,
        /// Menu label or 1-based position; the best entry when omitted
        #[arg(long)]
        quality: Option<String>,
        /// Download folder, remembered for later runs
        #[arg(long)]
        folder: Option<PathBuf>,
    },
    /// Download into the staging folder and schedule it for cleanup
    Stage {
        url: String,
        #[arg(long, default_value = "progressive", value_parser = parse_category)]
        kind: Category,
        #[arg(long)]
        quality: Option<String>,
    },
    /// Show or set the download folder
    Folder { path: Option<PathBuf> },
    /// Console form (default)
    Interactive,
}

/// Main entry point for the application.
///
/// # Steps
/// 1. Initializes logging with file, line numbers and thread IDs
/// 2. Builds the configuration from defaults and flags
/// 3. Runs the selected subcommand
///
/// Failures are printed once and turn into a non-zero exit code.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!("Starting application...");

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        match e.kind() {
            ErrorKind::Input => eprintln!("Warning: {}", e),
            ErrorKind::Folder => eprintln!(
                "Error: {}\nPlease choose another folder with `ytgrab folder <PATH>`.",
                e
            ),
            _ => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }

    info!("Application completed successfully");
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Config {
    let mut config = Config::default();
    if let Some(path) = &cli.config {
        config.settings_file = path.clone();
    }
    if let Some(path) = &cli.ledger {
        config.ledger_file = path.clone();
    }
    if let Some(path) = &cli.libs {
        config.libraries_dir = path.clone();
    }
    config
}

/// Dispatches the subcommand.
///
/// `folder` never touches the network, so the extractor (and its binaries)
/// is only set up for the commands that need it.
async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli);

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Folder { path: Some(path) } => {
            let folder = set_download_folder(&config, &path)?;
            println!("Download folder set to: {}", folder);
        }
        Command::Folder { path: None } => {
            println!("Current folder: {}", current_download_folder(&config).display());
        }
        Command::Formats { url, kind } => {
            let listing = build_app(config).await?.list_formats(&url, kind).await?;
            print!("{}", listing);
        }
        Command::Download {
            url,
            kind,
            quality,
            folder,
        } => {
            let done = build_app(config)
                .await?
                .download(&url, kind, quality.as_deref(), folder.as_deref())
                .await?;
            println!("Downloaded '{}' to '{}'", done.file_name, done.path.display());
        }
        Command::Stage { url, kind, quality } => {
            let done = build_app(config)
                .await?
                .stage(&url, kind, quality.as_deref())
                .await?;
            println!("{}", done.path.display());
        }
        Command::Interactive => {
            let (config, downloader) = build_app(config).await?.into_parts();
            Interactive::new(config, downloader).run().await?;
        }
    }
    Ok(())
}

async fn build_app(config: Config) -> Result<App<YtDlpExtractor>> {
    let extractor = YtDlpExtractor::new(&config.libraries_dir, &config.staging_dir).await?;
    Ok(App::new(config, Downloader::new(extractor)))
}

fn parse_category(value: &str) -> std::result::Result<Category, String> {
    value.parse().map_err(|e: ytgrab::AppError| e.to_string())
}
