/*
 * This module consolidates the core, UI-independent logic of the application:
 * name pattern matching, success-marker lookup, directory scanning, the
 * per-item processors (EventInc archive filing and photo renaming), and the
 * batch runner that executes a selection on a background thread while
 * posting `CoreEvent`s to a single consumer. It re-exports the key types and
 * the `*Operations` traits that form the seams for testing.
 */
pub mod archive_unpacker;
pub mod batch_runner;
pub mod config;
pub mod event_inc_processor;
pub mod file_patterns;
pub mod file_system;
pub mod item_processor;
pub mod marker_store;
pub mod models;
pub mod photo_renamer;
pub mod task_handle;

pub use models::{
    CoreEvent, CoreEventReceiver, CoreEventSender, ItemStatus, ScanItem,
};

pub use config::{AppConfig, PhotoAction, ScanMode};

// Re-export file system related items
pub use file_system::{
    CoreFileSystemScanner, FileSystemError, FileSystemScannerOperations, spawn_scan,
};

pub use archive_unpacker::{
    ArchiveTransformOperations, CoreEventIncUnpacker,
};

pub use batch_runner::{BatchError, BatchRunner, ProcessingJob};

pub use task_handle::TaskHandle;
