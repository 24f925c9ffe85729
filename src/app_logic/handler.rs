use super::status_table::StatusTable;
use crate::core::{
    AppConfig, ArchiveTransformOperations, BatchError, BatchRunner, CoreEvent, CoreEventReceiver,
    CoreEventSender, FileSystemError, FileSystemScannerOperations, ProcessingJob, ScanItem,
    TaskHandle, spawn_scan,
};
use serde::Serialize;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSeverity {
    Information,
    Warning,
    Error,
}

/*
 * Rendering instructions produced by `AppLogic` for the front-end. The
 * front-end only draws; all state lives in `AppLogic`.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum UiCommand {
    PopulateTable { rows: Vec<ScanItem> },
    UpdateRow { index: usize, row: ScanItem },
    SetStatusText { text: String },
    ShowMessage { severity: MessageSeverity, text: String },
}

/*
 * The event consumer. It owns the status table and the receiving end of the
 * core event channel, starts scans and batches on background threads, and
 * turns each delivered `CoreEvent` into table changes and `UiCommand`s. It is
 * meant to be driven from a single thread, which makes it the only writer of
 * the status table.
 *
 * Only one scan or batch is expected to run at a time; this is not enforced.
 * Events of concurrently running workers may interleave.
 */
pub struct AppLogic {
    pub(crate) config: AppConfig,
    scanner: Arc<dyn FileSystemScannerOperations>,
    transform: Arc<dyn ArchiveTransformOperations>,
    pub(crate) table: StatusTable,
    events_tx: CoreEventSender,
    events_rx: CoreEventReceiver,
    pub(crate) tasks: Vec<TaskHandle>,
}

impl AppLogic {
    pub fn new(
        config: AppConfig,
        scanner: Arc<dyn FileSystemScannerOperations>,
        transform: Arc<dyn ArchiveTransformOperations>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        AppLogic {
            config,
            scanner,
            transform,
            table: StatusTable::new(),
            events_tx,
            events_rx,
            tasks: Vec::new(),
        }
    }

    pub fn status_table(&self) -> &StatusTable {
        &self.table
    }

    /*
     * Starts listing the configured input folder in the background. The
     * result arrives later as `FilesListed` (or `ScanFailed`). An input path
     * that is not a directory is reported here and nothing is started.
     */
    pub fn request_scan(&mut self) -> Result<(), FileSystemError> {
        log::info!(
            "AppLogic: Looking for {} files in {:?}.",
            self.config.mode,
            self.config.input_dir
        );
        let task = spawn_scan(
            Arc::clone(&self.scanner),
            self.config.input_dir.clone(),
            self.config.output_dir.clone(),
            self.events_tx.clone(),
        )?;
        self.tasks.push(task);
        Ok(())
    }

    /*
     * Validates the selection against the current table, checks the output
     * folders, starts the batch in the background and marks the selected rows
     * `Queued`. Returns the row updates for the queued rows. On any
     * precondition failure the table is left untouched and no work starts.
     */
    pub fn request_batch(&mut self, selection: Vec<String>) -> Result<Vec<UiCommand>, BatchError> {
        log::info!("AppLogic: Processing {} file(s).", selection.len());
        self.table.validate_selection(&selection)?;

        let job = ProcessingJob::from_config(&self.config, Arc::clone(&self.transform));
        let task = BatchRunner::start(job, selection.clone(), self.events_tx.clone())?;
        self.tasks.push(task);

        // Events of the new batch are applied only after this returns, so they always see the queued rows.
        let commands = self
            .table
            .mark_queued(&selection)
            .into_iter()
            .map(|index| self.row_update(index))
            .collect();
        Ok(commands)
    }

    // Waits up to `timeout` for the next core event.
    pub fn wait_for_event(&self, timeout: Duration) -> Option<CoreEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            // The consumer holds a sender itself, so the channel never disconnects.
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /*
     * Blocks until the next core event arrives, polling every `poll`. Returns
     * `None` once no background task is left running and no event is pending.
     */
    pub fn next_event(&mut self, poll: Duration) -> Option<CoreEvent> {
        loop {
            if let Some(event) = self.wait_for_event(poll) {
                return Some(event);
            }
            if self.running_task_count() == 0 {
                // A task posts all its events before it ends.
                return self.wait_for_event(Duration::ZERO);
            }
        }
    }

    pub fn handle_event(&mut self, event: CoreEvent) -> Vec<UiCommand> {
        let mut commands = Vec::new();
        match event {
            CoreEvent::FilesListed { items } => {
                log::info!("AppLogic: Populating file list with {} item(s).", items.len());
                self.table.replace_all(items);
                commands.push(UiCommand::PopulateTable {
                    rows: self.table.rows().to_vec(),
                });
                commands.push(UiCommand::SetStatusText {
                    text: self.table.status_line(),
                });
            }
            CoreEvent::ScanFailed { message } => {
                log::error!("AppLogic: Listing failed: {message}");
                commands.push(UiCommand::ShowMessage {
                    severity: MessageSeverity::Error,
                    text: format!("Listing failed: {message}"),
                });
            }
            CoreEvent::ItemStatusChanged { name, status } => {
                if let Some(index) = self.table.apply(&name, status) {
                    commands.push(self.row_update(index));
                }
            }
            CoreEvent::ItemSkipped { name, reason } => {
                commands.push(UiCommand::ShowMessage {
                    severity: MessageSeverity::Warning,
                    text: format!("Skipped {name}: {reason}"),
                });
            }
            CoreEvent::BatchFinished { summary } => {
                self.reap_finished_tasks();
                commands.push(UiCommand::SetStatusText {
                    text: format!(
                        "{} - done, {} processed, {} skipped",
                        self.table.status_line(),
                        summary.processed,
                        summary.skipped
                    ),
                });
            }
        }
        commands
    }

    // Number of background tasks that have not finished yet.
    pub fn running_task_count(&mut self) -> usize {
        self.reap_finished_tasks();
        self.tasks.len()
    }

    fn reap_finished_tasks(&mut self) {
        let (finished, running): (Vec<TaskHandle>, Vec<TaskHandle>) =
            self.tasks.drain(..).partition(|task| task.is_finished());
        for task in finished {
            task.join();
        }
        self.tasks = running;
    }

    /*
     * Ends the session. With `wait` the remaining background tasks are
     * joined; otherwise they are abandoned, which their handles log.
     */
    pub fn shutdown(mut self, wait: bool) {
        self.reap_finished_tasks();
        if self.tasks.is_empty() {
            return;
        }
        if wait {
            log::info!(
                "AppLogic: Waiting for {} background task(s) to finish.",
                self.tasks.len()
            );
            for task in self.tasks.drain(..) {
                task.join();
            }
        } else {
            log::warn!(
                "AppLogic: Shutting down with {} background task(s) still running.",
                self.tasks.len()
            );
        }
    }

    fn row_update(&self, index: usize) -> UiCommand {
        UiCommand::UpdateRow {
            index,
            row: self.table.rows()[index].clone(),
        }
    }
}
