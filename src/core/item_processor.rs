/*
 * Defines the per-item processing contract shared by the EventInc archive
 * processor and the photo renamer. A processor is built for one job (it
 * already knows its input and output roots) and is then asked to process
 * items one at a time by the batch runner.
 *
 * Errors returned from `process` are item-level: the batch runner logs them,
 * reports the item as skipped and moves on to the next item.
 */
use super::archive_unpacker::ArchiveTransformError;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ItemError {
    // The capture timestamp (or other required metadata) could not be read.
    MetadataUnreadable { path: PathBuf, reason: String },
    // Copy, move or marker I/O failed for the item.
    IoFailure { path: PathBuf, source: io::Error },
    // The archive transform failed; treated like an I/O failure of the item.
    TransformFailed {
        path: PathBuf,
        source: ArchiveTransformError,
    },
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemError::MetadataUnreadable { path, reason } => {
                write!(f, "Metadata unreadable for {path:?}: {reason}")
            }
            ItemError::IoFailure { path, source } => {
                write!(f, "I/O failure for {path:?}: {source}")
            }
            ItemError::TransformFailed { path, source } => {
                write!(f, "Archive transform failed for {path:?}: {source}")
            }
        }
    }
}

impl std::error::Error for ItemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ItemError::IoFailure { source, .. } => Some(source),
            ItemError::TransformFailed { source, .. } => Some(source),
            ItemError::MetadataUnreadable { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ItemError>;

pub trait ItemProcessor: Send + Sync {
    // Short name used in log messages.
    fn name(&self) -> &'static str;

    /*
     * Directories that must exist before a batch using this processor may
     * start. The batch runner checks them synchronously and rejects the job
     * if any is missing.
     */
    fn required_directories(&self) -> Vec<PathBuf>;

    /*
     * Processes the item named `item_name` (its path relative to the input
     * root). `progress` may be called any number of times, including zero,
     * with a completion fraction in [0, 1].
     */
    fn process(&self, item_name: &str, progress: &mut dyn FnMut(f64)) -> Result<()>;
}
