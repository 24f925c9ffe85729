/*
 * This module provides the application logic layer: `AppLogic`, the single
 * consumer of core events, and the `StatusTable` it owns. The front-end only
 * renders the `UiCommand`s produced here. Unit tests for `AppLogic` are in
 * `handler_tests.rs`.
 */
pub mod handler;
pub mod status_table;


pub use handler::{AppLogic, MessageSeverity, UiCommand};
