// src/main.rs

mod app_logic;
mod console_view;
mod core;

use crate::app_logic::{AppLogic, MessageSeverity, UiCommand};
use crate::console_view::{ConsoleView, OutputFormat};
use crate::core::{
    AppConfig, CoreEvent, CoreEventIncUnpacker, CoreFileSystemScanner, PhotoAction, ScanMode,
};
use clap::Parser;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Lists EventInc incident archives or photos in a folder and processes a selection of them.
#[derive(Parser, Debug)]
#[command(name = "inc-batch-processor", version)]
struct Cli {
    /// Folder to scan (asked for interactively when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// EventInc base folder, or destination folder for renamed photos
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Kind of items to look for: event-inc or photo
    #[arg(short, long, default_value_t = ScanMode::EventInc)]
    mode: ScanMode,

    /// Photo mode only: copy or move the renamed photos
    #[arg(short, long, default_value = "copy")]
    action: PhotoAction,

    /// Item to process, as listed; may be repeated. Defaults to every unprocessed item
    #[arg(short, long = "select", value_name = "NAME")]
    select: Vec<String>,

    /// Only list the items and their status
    #[arg(long)]
    list_only: bool,

    /// Print table changes as JSON lines
    #[arg(long)]
    json: bool,

    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn init_logging(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Debug)
        .build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Could not initialise logging: {e}");
    }
}

// Asks for a folder on the terminal. Without a terminal the folder must be given on the command line.
fn resolve_folder(given: Option<PathBuf>, prompt: &str, flag: &str) -> Result<PathBuf, String> {
    if let Some(path) = given {
        return Ok(path);
    }
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(format!("missing {flag} <folder>"));
    }
    eprint!("{prompt}: ");
    io::stderr().flush().map_err(|e| e.to_string())?;
    let mut line = String::new();
    stdin.lock().read_line(&mut line).map_err(|e| e.to_string())?;
    let answer = line.trim();
    if answer.is_empty() {
        return Err(format!("no folder given for {flag}"));
    }
    Ok(PathBuf::from(answer))
}

/*
 * Pumps core events into `AppLogic` and renders the resulting commands until
 * an event matching `stop` has been handled. Returns that event. Fails if
 * every background task has ended and the event never came.
 */
fn pump_events<W: Write>(
    logic: &mut AppLogic,
    view: &mut ConsoleView<W>,
    stop: impl Fn(&CoreEvent) -> bool,
) -> io::Result<CoreEvent> {
    loop {
        let event = logic.next_event(EVENT_POLL_INTERVAL).ok_or_else(|| {
            io::Error::other("background work ended without reporting completion")
        })?;
        let last = stop(&event).then(|| event.clone());
        let commands = logic.handle_event(event);
        view.render_all(&commands)?;
        if let Some(last) = last {
            return Ok(last);
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let input = resolve_folder(cli.input, "Folder to scan", "--input")?;
    let output = resolve_folder(cli.output, "Output folder", "--output")?;
    let config = AppConfig::new(input, output, cli.mode).with_photo_action(cli.action);
    log::info!("main: Starting with {config:?}.");

    let scanner = Arc::new(CoreFileSystemScanner::new(config.mode));
    let transform = Arc::new(CoreEventIncUnpacker::new());
    let mut logic = AppLogic::new(config, scanner, transform);
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let mut view = ConsoleView::stdout(format);

    logic.request_scan().map_err(|e| e.to_string())?;
    let listing = pump_events(&mut logic, &mut view, |e| {
        matches!(e, CoreEvent::FilesListed { .. } | CoreEvent::ScanFailed { .. })
    })
    .map_err(|e| e.to_string())?;
    if let CoreEvent::ScanFailed { message } = listing {
        logic.shutdown(true);
        return Err(format!("listing failed: {message}"));
    }

    if cli.list_only {
        logic.shutdown(true);
        return Ok(());
    }

    let selection = if cli.select.is_empty() {
        logic.status_table().pending_names()
    } else {
        cli.select
    };
    if selection.is_empty() && !logic.status_table().is_empty() {
        view.render_all(&[UiCommand::ShowMessage {
            severity: MessageSeverity::Information,
            text: "Every listed item is already processed".to_string(),
        }])
        .map_err(|e| e.to_string())?;
        logic.shutdown(true);
        return Ok(());
    }

    let queued = logic.request_batch(selection).map_err(|e| e.to_string())?;
    view.render_all(&queued).map_err(|e| e.to_string())?;
    pump_events(&mut logic, &mut view, |e| {
        matches!(e, CoreEvent::BatchFinished { .. })
    })
    .map_err(|e| e.to_string())?;

    logic.shutdown(true);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
