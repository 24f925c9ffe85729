use super::archive_unpacker::ArchiveTransformOperations;
use super::config;
use super::item_processor::{ItemError, ItemProcessor, Result};
use std::path::PathBuf;
use std::sync::Arc;

/*
 * `ItemProcessor` for EventInc incident archives. Each item is an archive
 * file name in the input folder; processing hands it to the archive transform
 * together with the EventInc base folder and forwards the transform's
 * fractional progress to the batch runner.
 */
pub struct EventIncProcessor {
    input_root: PathBuf,
    base_root: PathBuf,
    transform: Arc<dyn ArchiveTransformOperations>,
}

impl EventIncProcessor {
    pub fn new(
        input_root: PathBuf,
        base_root: PathBuf,
        transform: Arc<dyn ArchiveTransformOperations>,
    ) -> Self {
        EventIncProcessor {
            input_root,
            base_root,
            transform,
        }
    }
}

impl ItemProcessor for EventIncProcessor {
    fn name(&self) -> &'static str {
        "EventIncProcessor"
    }

    fn required_directories(&self) -> Vec<PathBuf> {
        vec![
            config::event_inc_output_dir(&self.base_root),
            config::event_inc_status_dir(&self.base_root),
        ]
    }

    fn process(&self, item_name: &str, progress: &mut dyn FnMut(f64)) -> Result<()> {
        let archive_path = self.input_root.join(item_name);
        log::debug!("EventIncProcessor: Processing archive {archive_path:?}.");
        self.transform
            .transform(&archive_path, &self.base_root, &mut |_archive_name, fraction| {
                progress(fraction)
            })
            .map_err(|source| ItemError::TransformFailed {
                path: archive_path.clone(),
                source,
            })
    }
}
