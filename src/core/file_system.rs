use super::config::ScanMode;
use super::file_patterns::PatternSet;
use super::marker_store::{CoreMarkerStore, MarkerStoreOperations};
use super::models::{CoreEvent, CoreEventSender, ItemStatus, ScanItem, sort_scan_items};
use super::task_handle::TaskHandle;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/*
 * This module lists the items eligible for processing below an input folder.
 * EventInc archives are listed from the folder itself only, and each is
 * pre-labelled `Processed` when its success marker exists. Photos are found
 * by walking the whole folder tree and are always listed as unprocessed. It
 * defines the scanning errors, a trait `FileSystemScannerOperations` for
 * abstracting the scan, the concrete `CoreFileSystemScanner`, and
 * `spawn_scan`, which runs a scan on a background thread and posts the result
 * to the event consumer.
 */

#[derive(Debug)]
pub enum FileSystemError {
    Io(io::Error),
    Walk(walkdir::Error),
    InvalidPath(PathBuf),
}

impl From<io::Error> for FileSystemError {
    fn from(err: io::Error) -> Self {
        FileSystemError::Io(err)
    }
}

impl From<walkdir::Error> for FileSystemError {
    fn from(err: walkdir::Error) -> Self {
        FileSystemError::Walk(err)
    }
}

impl std::fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileSystemError::Io(e) => write!(f, "I/O error: {e}"),
            FileSystemError::Walk(e) => write!(f, "Directory traversal error: {e}"),
            FileSystemError::InvalidPath(p) => {
                write!(f, "Input path is not an existing directory: {p:?}")
            }
        }
    }
}

impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileSystemError::Io(e) => Some(e),
            FileSystemError::Walk(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FileSystemError>;

/*
 * Defines the scan operation. Implementations list the entries below
 * `input_root` that match the mode's name patterns and return them sorted by
 * name in reverse lexicographic order. `output_root` is the EventInc base
 * folder whose success markers decide the initial status of archives.
 */
pub trait FileSystemScannerOperations: Send + Sync {
    fn scan_directory(&self, input_root: &Path, output_root: &Path) -> Result<Vec<ScanItem>>;
}

pub struct CoreFileSystemScanner {
    mode: ScanMode,
    patterns: PatternSet,
}

impl CoreFileSystemScanner {
    pub fn new(mode: ScanMode) -> Self {
        CoreFileSystemScanner {
            mode,
            patterns: PatternSet::for_mode(mode),
        }
    }

    fn scan_event_inc_archives(
        &self,
        input_root: &Path,
        marker_store: &dyn MarkerStoreOperations,
    ) -> Result<Vec<ScanItem>> {
        let mut items = Vec::new();
        for entry_result in fs::read_dir(input_root)? {
            let entry = entry_result?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.patterns.matches(&name) {
                continue;
            }
            if !entry.path().is_file() {
                log::debug!("FileSystemScanner: Skipping non-file entry {name:?}.");
                continue;
            }
            let status = if marker_store.has_succeeded(&name) {
                ItemStatus::Processed
            } else {
                ItemStatus::Empty
            };
            items.push(ScanItem::new(name, status));
        }
        Ok(items)
    }

    fn scan_photos(&self, input_root: &Path) -> Vec<ScanItem> {
        let mut items = Vec::new();
        for entry_result in WalkDir::new(input_root).min_depth(1) {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("FileSystemScanner: Skipping unreadable entry: {err}");
                    continue;
                }
            };
            // `path().is_file()` follows symlinked files; symlinked directories are not descended.
            if !entry.path().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if !self.patterns.matches(&file_name) {
                continue;
            }
            match relative_item_name(input_root, entry.path()) {
                Some(name) => items.push(ScanItem::new(name, ItemStatus::Empty)),
                None => log::error!(
                    "FileSystemScanner: Entry {:?} is not below scan root {input_root:?}.",
                    entry.path()
                ),
            }
        }
        items
    }
}

impl FileSystemScannerOperations for CoreFileSystemScanner {
    fn scan_directory(&self, input_root: &Path, output_root: &Path) -> Result<Vec<ScanItem>> {
        if !input_root.is_dir() {
            return Err(FileSystemError::InvalidPath(input_root.to_path_buf()));
        }
        log::debug!(
            "FileSystemScanner: Scanning {input_root:?} in {} mode.",
            self.mode
        );

        let mut items = match self.mode {
            ScanMode::EventInc => {
                let marker_store = CoreMarkerStore::for_base(output_root);
                self.scan_event_inc_archives(input_root, &marker_store)?
            }
            ScanMode::Photo => self.scan_photos(input_root),
        };

        sort_scan_items(&mut items);
        log::debug!(
            "FileSystemScanner: Scan complete. Found {} matching entries in {input_root:?}.",
            items.len()
        );
        Ok(items)
    }
}

/*
 * Item name of `path` relative to `root`, with components joined by '/'.
 * Returns None if `path` is not strictly below `root`.
 */
pub fn relative_item_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/*
 * Runs a scan on a background thread and posts exactly one event with the
 * outcome: `FilesListed` with the whole result, or `ScanFailed`. The input
 * root is validated before the thread is started, so an invalid path is
 * reported to the caller directly and no work is scheduled.
 */
pub fn spawn_scan(
    scanner: Arc<dyn FileSystemScannerOperations>,
    input_root: PathBuf,
    output_root: PathBuf,
    events: CoreEventSender,
) -> Result<TaskHandle> {
    if !input_root.is_dir() {
        log::warn!("FileSystemScanner: Refusing to scan invalid input path {input_root:?}.");
        return Err(FileSystemError::InvalidPath(input_root));
    }

    let task = TaskHandle::spawn("scan", move || {
        let event = match scanner.scan_directory(&input_root, &output_root) {
            Ok(items) => CoreEvent::FilesListed { items },
            Err(err) => {
                log::error!("FileSystemScanner: Scan of {input_root:?} failed: {err}");
                CoreEvent::ScanFailed {
                    message: err.to_string(),
                }
            }
        };
        if events.send(event).is_err() {
            log::debug!("FileSystemScanner: Event consumer is gone; scan result dropped.");
        }
    })?;
    Ok(task)
}
