/*
 * Ownership handle for a background worker thread (a directory scan or a
 * batch run). Workers cannot be cancelled; the owner either waits for them
 * with `join` or lets them go. A handle dropped while its worker is still
 * running logs that the worker is being abandoned, so an early shutdown is
 * always visible in the log.
 */
use std::io;
use std::thread::{self, JoinHandle};

#[derive(Debug)]
pub struct TaskHandle {
    label: String,
    handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /*
     * Starts `work` on a new named thread. Fails only if the operating
     * system refuses to create the thread.
     */
    pub fn spawn<F>(label: impl Into<String>, work: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let label = label.into();
        let handle = thread::Builder::new().name(label.clone()).spawn(work)?;
        log::debug!("TaskHandle: Started background task '{label}'.");
        Ok(TaskHandle {
            label,
            handle: Some(handle),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /*
     * Blocks until the worker has finished. Returns false if the worker
     * panicked.
     */
    pub fn join(mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };
        match handle.join() {
            Ok(()) => {
                log::debug!("TaskHandle: Task '{}' joined.", self.label);
                true
            }
            Err(_) => {
                log::error!("TaskHandle: Task '{}' panicked.", self.label);
                false
            }
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                // Reap the finished thread; a panic was already reported by the panic hook.
                let _ = handle.join();
            } else {
                log::warn!(
                    "TaskHandle: Abandoning background task '{}' while it is still running.",
                    self.label
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_join_waits_for_completion() {
        let (tx, rx) = mpsc::channel();
        let task = TaskHandle::spawn("test-join", move || {
            tx.send(7).unwrap();
        })
        .unwrap();
        assert_eq!(task.label, "test-join");
        assert!(task.join());
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok(7));
    }

    #[test]
    fn test_join_reports_panicking_worker() {
        let task = TaskHandle::spawn("test-panic", || panic!("worker failure")).unwrap();
        assert!(!task.join());
    }

    #[test]
    fn test_dropping_running_task_does_not_block() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let task = TaskHandle::spawn("test-abandon", move || {
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        })
        .unwrap();
        assert!(!task.is_finished());
        drop(task);
        drop(release_tx);
    }
}
