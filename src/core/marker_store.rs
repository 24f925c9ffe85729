/*
 * Success markers record that an EventInc archive has already been processed.
 * A marker is a regular file `<archive name>.success` in `<base>/Status/EventInc/`;
 * only its existence matters. Markers are written by the archive transform
 * once an archive has been filed; this module only observes them.
 */
use super::config::{self, SUCCESS_MARKER_EXTENSION};
use std::path::{Path, PathBuf};

pub trait MarkerStoreOperations: Send + Sync {
    // True if a regular file exists at the marker path of `item_name`.
    fn has_succeeded(&self, item_name: &str) -> bool;

    fn marker_path(&self, item_name: &str) -> PathBuf;
}

#[derive(Debug, Clone)]
pub struct CoreMarkerStore {
    status_dir: PathBuf,
}

impl CoreMarkerStore {
    pub fn new(status_dir: PathBuf) -> Self {
        CoreMarkerStore { status_dir }
    }

    // Marker store rooted at the standard status folder of an EventInc base folder.
    pub fn for_base(base_path: &Path) -> Self {
        Self::new(config::event_inc_status_dir(base_path))
    }
}

impl MarkerStoreOperations for CoreMarkerStore {
    fn has_succeeded(&self, item_name: &str) -> bool {
        let marker = self.marker_path(item_name);
        let succeeded = marker.is_file();
        log::trace!("CoreMarkerStore: Marker {marker:?} present: {succeeded}");
        succeeded
    }

    fn marker_path(&self, item_name: &str) -> PathBuf {
        self.status_dir
            .join(format!("{item_name}.{SUCCESS_MARKER_EXTENSION}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io;
    use tempfile::tempdir;

    #[test]
    fn test_marker_path_is_below_status_dir() {
        let store = CoreMarkerStore::for_base(Path::new("/base"));
        assert_eq!(
            store.marker_path("EventInc_2021-05-01.uat.zip"),
            Path::new("/base")
                .join("Status")
                .join("EventInc")
                .join("EventInc_2021-05-01.uat.zip.success")
        );
    }

    #[test]
    fn test_regular_file_marker_counts_as_success() -> io::Result<()> {
        let dir = tempdir()?;
        let store = CoreMarkerStore::for_base(dir.path());
        fs::create_dir_all(config::event_inc_status_dir(dir.path()))?;
        assert!(!store.has_succeeded("EventInc_2021-05-01.uat.zip"));

        fs::write(store.marker_path("EventInc_2021-05-01.uat.zip"), b"")?;
        assert!(store.has_succeeded("EventInc_2021-05-01.uat.zip"));
        Ok(())
    }

    #[test]
    fn test_directory_at_marker_path_does_not_count() -> io::Result<()> {
        let dir = tempdir()?;
        let store = CoreMarkerStore::for_base(dir.path());
        fs::create_dir_all(store.marker_path("EventInc_2021-05-01.uat.zip"))?;
        assert!(!store.has_succeeded("EventInc_2021-05-01.uat.zip"));
        Ok(())
    }

    #[test]
    fn test_missing_status_dir_means_not_processed() {
        let dir = tempdir().unwrap();
        let store = CoreMarkerStore::for_base(&dir.path().join("missing"));
        assert!(!store.has_succeeded("EventInc_2021-05-01.uat.zip"));
    }
}
