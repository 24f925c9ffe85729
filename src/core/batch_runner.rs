/*
 * Runs a batch of selected items through one `ItemProcessor` on a background
 * thread. Items are processed strictly one after another in selection order.
 * Every progress tick and every finished item is posted to the event consumer
 * as a `CoreEvent`; the runner never touches the status table itself.
 *
 * Preconditions (non-empty selection, required output directories present)
 * are checked synchronously by `BatchRunner::start` before any thread is
 * created. Failures of individual items, panics included, are logged,
 * reported as `ItemSkipped` and do not stop the batch.
 */
use super::archive_unpacker::ArchiveTransformOperations;
use super::config::{AppConfig, PhotoAction, ScanMode};
use super::event_inc_processor::EventIncProcessor;
use super::item_processor::ItemProcessor;
use super::models::{BatchSummary, CoreEvent, CoreEventSender, ItemStatus};
use super::photo_renamer::PhotoRenamer;
use super::task_handle::TaskHandle;
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub enum BatchError {
    EmptySelection,
    OutputNotReady(PathBuf),
    UnknownItem(String),
    Spawn(io::Error),
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::EmptySelection => write!(f, "No files to process"),
            BatchError::OutputNotReady(p) => write!(f, "Output directory doesn't exist: {p:?}"),
            BatchError::UnknownItem(name) => {
                write!(f, "Selected item is not in the current file list: {name}")
            }
            BatchError::Spawn(e) => write!(f, "Could not start batch worker: {e}"),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;

/*
 * Everything a batch needs besides the selection: the roots it works on and
 * the processor variant, chosen when the job is built.
 */
#[derive(Clone)]
pub struct ProcessingJob {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    processor: Arc<dyn ItemProcessor>,
}

impl ProcessingJob {
    pub fn new(input_root: PathBuf, output_root: PathBuf, processor: Arc<dyn ItemProcessor>) -> Self {
        ProcessingJob {
            input_root,
            output_root,
            processor,
        }
    }

    pub fn event_inc(
        input_root: PathBuf,
        base_root: PathBuf,
        transform: Arc<dyn ArchiveTransformOperations>,
    ) -> Self {
        let processor = EventIncProcessor::new(input_root.clone(), base_root.clone(), transform);
        Self::new(input_root, base_root, Arc::new(processor))
    }

    pub fn photo(input_root: PathBuf, dest_root: PathBuf, action: PhotoAction) -> Self {
        let processor = PhotoRenamer::new(input_root.clone(), dest_root.clone(), action);
        Self::new(input_root, dest_root, Arc::new(processor))
    }

    // Builds the job matching the configured mode.
    pub fn from_config(config: &AppConfig, transform: Arc<dyn ArchiveTransformOperations>) -> Self {
        match config.mode {
            ScanMode::EventInc => Self::event_inc(
                config.input_dir.clone(),
                config.output_dir.clone(),
                transform,
            ),
            ScanMode::Photo => Self::photo(
                config.input_dir.clone(),
                config.output_dir.clone(),
                config.photo_action,
            ),
        }
    }

    pub fn processor(&self) -> &dyn ItemProcessor {
        self.processor.as_ref()
    }

    // Fails with the first required directory that does not exist.
    pub fn check_ready(&self) -> Result<()> {
        for directory in self.processor.required_directories() {
            if !directory.is_dir() {
                return Err(BatchError::OutputNotReady(directory));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProcessingJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingJob")
            .field("input_root", &self.input_root)
            .field("output_root", &self.output_root)
            .field("processor", &self.processor.name())
            .finish()
    }
}

pub struct BatchRunner {}

impl BatchRunner {
    /*
     * Validates the job and selection, then processes the selection on a new
     * background thread. Returns the handle of that thread. On a precondition
     * failure nothing is scheduled and no event is posted.
     */
    pub fn start(
        job: ProcessingJob,
        selection: Vec<String>,
        events: CoreEventSender,
    ) -> Result<TaskHandle> {
        if selection.is_empty() {
            log::warn!("BatchRunner: No files to process.");
            return Err(BatchError::EmptySelection);
        }
        if let Err(err) = job.check_ready() {
            log::warn!("BatchRunner: Rejecting batch: {err}");
            return Err(err);
        }

        log::info!(
            "BatchRunner: Processing {} item(s) with {}.",
            selection.len(),
            job.processor().name()
        );
        TaskHandle::spawn("batch", move || {
            let summary = Self::run_to_completion(&job, &selection, &events);
            log::info!(
                "BatchRunner: Done. {} processed, {} skipped.",
                summary.processed,
                summary.skipped
            );
            post(&events, CoreEvent::BatchFinished { summary });
        })
        .map_err(BatchError::Spawn)
    }

    /*
     * Processes every selected item in order on the calling thread and posts
     * the item events. Used by the background worker started by `start`.
     */
    pub(crate) fn run_to_completion(
        job: &ProcessingJob,
        selection: &[String],
        events: &CoreEventSender,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for item_name in selection {
            let mut on_progress = |fraction: f64| {
                post(
                    events,
                    CoreEvent::ItemStatusChanged {
                        name: item_name.clone(),
                        status: ItemStatus::from_fraction(fraction),
                    },
                );
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                job.processor().process(item_name, &mut on_progress)
            }));
            let outcome = match outcome {
                Ok(result) => result.map_err(|err| err.to_string()),
                Err(payload) => Err(format!("processing panicked: {}", panic_message(&*payload))),
            };

            match outcome {
                Ok(()) => {
                    summary.processed += 1;
                    post(
                        events,
                        CoreEvent::ItemStatusChanged {
                            name: item_name.clone(),
                            status: ItemStatus::Processed,
                        },
                    );
                }
                Err(err) => {
                    summary.skipped += 1;
                    log::warn!("BatchRunner: Skipping {item_name}: {err}");
                    post(
                        events,
                        CoreEvent::ItemSkipped {
                            name: item_name.clone(),
                            reason: err,
                        },
                    );
                }
            }
        }
        summary
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn post(events: &CoreEventSender, event: CoreEvent) {
    if events.send(event).is_err() {
        log::trace!("BatchRunner: Event consumer is gone; event dropped.");
    }
}
