/*
 * The EventInc archive transform: files one `EventInc_YYYY-MM-DD.uat.zip`
 * archive into the EventInc base folder. The archive's entries are unpacked
 * into `<base>/Project/SJ_X2U/<archive stem>/`, progress is reported after
 * every entry, and finally the archive's success marker is written to
 * `<base>/Status/EventInc/` so later scans list it as processed.
 *
 * The transform sits behind `ArchiveTransformOperations` so the processor can
 * be exercised with a scripted transform in tests.
 */
use super::config;
use super::marker_store::{CoreMarkerStore, MarkerStoreOperations};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use zip::ZipArchive;
use zip::result::ZipError;

const ARCHIVE_SUFFIX: &str = ".uat.zip";

#[derive(Debug)]
pub enum ArchiveTransformError {
    Io(io::Error),
    Zip(ZipError),
    UnsafeEntry(String),
    InvalidArchivePath(PathBuf),
}

impl From<io::Error> for ArchiveTransformError {
    fn from(err: io::Error) -> Self {
        ArchiveTransformError::Io(err)
    }
}

impl From<ZipError> for ArchiveTransformError {
    fn from(err: ZipError) -> Self {
        ArchiveTransformError::Zip(err)
    }
}

impl std::fmt::Display for ArchiveTransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveTransformError::Io(e) => write!(f, "I/O error: {e}"),
            ArchiveTransformError::Zip(e) => write!(f, "Zip archive error: {e}"),
            ArchiveTransformError::UnsafeEntry(name) => {
                write!(f, "Archive entry escapes the output folder: {name}")
            }
            ArchiveTransformError::InvalidArchivePath(p) => {
                write!(f, "Not an archive file path: {p:?}")
            }
        }
    }
}

impl std::error::Error for ArchiveTransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveTransformError::Io(e) => Some(e),
            ArchiveTransformError::Zip(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveTransformError>;

/*
 * Files one archive into the base folder. `progress` receives the archive's
 * file name and a completion fraction in [0, 1]; it may be called any number
 * of times, including zero. A successful return means the success marker has
 * been written.
 */
pub trait ArchiveTransformOperations: Send + Sync {
    fn transform(
        &self,
        archive_path: &Path,
        base_path: &Path,
        progress: &mut dyn FnMut(&str, f64),
    ) -> Result<()>;
}

pub struct CoreEventIncUnpacker {}

impl CoreEventIncUnpacker {
    pub fn new() -> Self {
        CoreEventIncUnpacker {}
    }
}

impl Default for CoreEventIncUnpacker {
    fn default() -> Self {
        Self::new()
    }
}

// `EventInc_2021-05-01.uat.zip` -> `EventInc_2021-05-01`. Suffix comparison ignores ASCII case.
pub fn archive_stem(archive_name: &str) -> &str {
    let suffix_start = archive_name.len().saturating_sub(ARCHIVE_SUFFIX.len());
    match archive_name.get(suffix_start..) {
        Some(tail) if tail.eq_ignore_ascii_case(ARCHIVE_SUFFIX) => &archive_name[..suffix_start],
        _ => archive_name,
    }
}

impl ArchiveTransformOperations for CoreEventIncUnpacker {
    fn transform(
        &self,
        archive_path: &Path,
        base_path: &Path,
        progress: &mut dyn FnMut(&str, f64),
    ) -> Result<()> {
        let archive_name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ArchiveTransformError::InvalidArchivePath(archive_path.to_path_buf()))?;
        let target_dir = config::event_inc_output_dir(base_path).join(archive_stem(&archive_name));
        log::debug!("CoreEventIncUnpacker: Unpacking {archive_path:?} into {target_dir:?}.");

        let mut archive = ZipArchive::new(BufReader::new(File::open(archive_path)?))?;
        let total_entries = archive.len();
        fs::create_dir_all(&target_dir)?;

        for index in 0..total_entries {
            let mut entry = archive.by_index(index)?;
            let Some(relative_path) = entry.enclosed_name() else {
                return Err(ArchiveTransformError::UnsafeEntry(entry.name().to_string()));
            };
            let entry_target = target_dir.join(relative_path);
            if entry.is_dir() {
                fs::create_dir_all(&entry_target)?;
            } else {
                if let Some(parent) = entry_target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut output = File::create(&entry_target)?;
                io::copy(&mut entry, &mut output)?;
            }
            progress(&archive_name, (index + 1) as f64 / total_entries as f64);
        }

        let marker_store = CoreMarkerStore::for_base(base_path);
        let marker = marker_store.marker_path(&archive_name);
        let stamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        fs::write(&marker, stamp)?;
        log::info!(
            "CoreEventIncUnpacker: Unpacked {total_entries} entries from {archive_name}, marker written to {marker:?}."
        );
        Ok(())
    }
}
