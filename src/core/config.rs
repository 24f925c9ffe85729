/*
 * Holds the resolved run configuration and the fixed directory layout of the
 * EventInc data folder. Nothing here is persisted: the values are assembled by
 * the front-end from command-line flags (or interactive prompts) and passed
 * explicitly into the scanner and batch runner.
 *
 * Layout below an EventInc base ("data") folder:
 *   <base>/Project/SJ_X2U/          unpacked archive output
 *   <base>/Status/EventInc/         `<archive>.success` markers
 */
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const STATUS_DIR_COMPONENTS: [&str; 2] = ["Status", "EventInc"];
const PROJECT_OUTPUT_DIR_COMPONENTS: [&str; 2] = ["Project", "SJ_X2U"];
pub const SUCCESS_MARKER_EXTENSION: &str = "success";

pub fn event_inc_status_dir(base_path: &Path) -> PathBuf {
    STATUS_DIR_COMPONENTS
        .iter()
        .fold(base_path.to_path_buf(), |path, component| path.join(component))
}

pub fn event_inc_output_dir(base_path: &Path) -> PathBuf {
    PROJECT_OUTPUT_DIR_COMPONENTS
        .iter()
        .fold(base_path.to_path_buf(), |path, component| path.join(component))
}

/*
 * Which kind of items a run lists and processes. The mode decides the name
 * patterns, whether the scan recurses, whether success markers are consulted
 * and which `ItemProcessor` variant a batch uses.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    EventInc,
    Photo,
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event-inc" | "eventinc" | "archive" => Ok(ScanMode::EventInc),
            "photo" | "photos" => Ok(ScanMode::Photo),
            other => Err(format!(
                "unknown mode '{other}', expected 'event-inc' or 'photo'"
            )),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::EventInc => f.write_str("event-inc"),
            ScanMode::Photo => f.write_str("photo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhotoAction {
    #[default]
    CopyAndRename,
    MoveAndRename,
}

impl FromStr for PhotoAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" | "copy and rename" => Ok(PhotoAction::CopyAndRename),
            "move" | "move and rename" => Ok(PhotoAction::MoveAndRename),
            other => Err(format!(
                "unknown action '{other}', expected 'copy' or 'move'"
            )),
        }
    }
}

impl fmt::Display for PhotoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoAction::CopyAndRename => f.write_str("Copy and rename"),
            PhotoAction::MoveAndRename => f.write_str("Move and rename"),
        }
    }
}

/*
 * Resolved settings for one application session. `input_dir` is the folder
 * that is scanned; `output_dir` is the EventInc base folder (archive mode) or
 * the destination folder for renamed photos (photo mode).
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub mode: ScanMode,
    pub photo_action: PhotoAction,
}

impl AppConfig {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, mode: ScanMode) -> Self {
        AppConfig {
            input_dir,
            output_dir,
            mode,
            photo_action: PhotoAction::default(),
        }
    }

    pub fn with_photo_action(mut self, action: PhotoAction) -> Self {
        self.photo_action = action;
        self
    }
}
