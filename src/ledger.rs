use crate::error::{AppError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Flat list of staged files waiting to be deleted by a later run.
///
/// One path per line. Producers only append; [`CleanupLedger::process`]
/// deletes what it can and rewrites the file without those lines.
/// Neither side locks the file.
#[derive(Debug, Clone)]
pub struct CleanupLedger {
    path: PathBuf,
}

/// Outcome of one [`CleanupLedger::process`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl CleanupLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records `file` for deletion, creating the ledger when needed.
    pub fn append(&self, file: &Path) -> std::io::Result<()> {
        let handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = std::io::BufWriter::new(handle);
        writeln!(writer, "{}", file.display())?;
        writer.flush()?;

        debug!("Scheduled {} for cleanup", file.display());
        Ok(())
    }

    /// Pending entries, trimmed, blank lines skipped.
    pub fn pending(&self) -> std::io::Result<Vec<PathBuf>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(PathBuf::from)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Deletes every listed file that still exists.
    ///
    /// Every line naming a deleted path is dropped from the ledger; lines
    /// that could not be deleted, or whose file was already gone, are
    /// written back unchanged.
    /// Never fails: problems are logged and reported.
    pub fn process(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
            Err(e) => {
                warn!("Could not perform cleanup: {}", e);
                return report;
            }
        };

        for line in content.lines() {
            let entry = line.trim();
            if entry.is_empty() || !Path::new(entry).exists() {
                continue;
            }
            match remove_staged(Path::new(entry)) {
                Ok(()) => report.removed.push(PathBuf::from(entry)),
                Err(e) => {
                    warn!("{}", e);
                    report.failed.push(PathBuf::from(entry));
                }
            }
        }

        // Every line naming a removed file goes, duplicates included.
        let kept: String = content
            .split_inclusive('\n')
            .filter(|line| !report.removed.iter().any(|r| r.as_os_str() == line.trim()))
            .collect();

        if !report.removed.is_empty() {
            if let Err(e) = std::fs::write(&self.path, kept) {
                warn!("Could not update {}: {}", self.path.display(), e);
            }
            info!("Removed {} staged file(s)", report.removed.len());
        }

        report
    }
}

fn remove_staged(path: &Path) -> Result<()> {
    std::fs::remove_file(path).map_err(|source| AppError::Cleanup {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_creates_then_extends_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CleanupLedger::new(dir.path().join("cleanup_list.txt"));

        ledger.append(Path::new("/tmp/a.mp4")).unwrap();
        ledger.append(Path::new("/tmp/b.webm")).unwrap();

        assert_eq!(
            ledger.pending().unwrap(),
            [PathBuf::from("/tmp/a.mp4"), PathBuf::from("/tmp/b.webm")]
        );
    }

    #[test]
    fn process_deletes_files_and_drops_their_lines() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CleanupLedger::new(dir.path().join("cleanup_list.txt"));
        let staged = dir.path().join("clip.mp4");
        let gone = dir.path().join("gone.mp4");
        std::fs::write(&staged, b"data").unwrap();

        ledger.append(&staged).unwrap();
        ledger.append(&gone).unwrap();

        let report = ledger.process();
        assert_eq!(report.removed, [staged.clone()]);
        assert!(report.failed.is_empty());
        assert!(!staged.exists());
        assert_eq!(ledger.pending().unwrap(), [gone]);
    }

    #[test]
    fn process_drops_every_line_of_a_removed_file() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CleanupLedger::new(dir.path().join("cleanup_list.txt"));
        let staged = dir.path().join("clip.mp4");
        std::fs::write(&staged, b"data").unwrap();

        ledger.append(&staged).unwrap();
        ledger.append(&staged).unwrap();

        let report = ledger.process();
        assert_eq!(report.removed, [staged.clone()]);
        assert!(!staged.exists());
        assert!(ledger.pending().unwrap().is_empty());
    }

    #[test]
    fn process_keeps_entries_it_cannot_delete() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CleanupLedger::new(dir.path().join("cleanup_list.txt"));
        let not_a_file = dir.path().join("subdir");
        std::fs::create_dir(&not_a_file).unwrap();

        ledger.append(&not_a_file).unwrap();

        let report = ledger.process();
        assert!(report.removed.is_empty());
        assert_eq!(report.failed, [not_a_file.clone()]);
        assert_eq!(ledger.pending().unwrap(), [not_a_file]);
    }

    #[test]
    fn process_without_ledger_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = CleanupLedger::new(dir.path().join("cleanup_list.txt"));
        assert_eq!(ledger.process(), CleanupReport::default());
        assert!(!ledger.path().exists());
    }
}
