/*
 * Terminal rendering of `UiCommand`s. Plain mode prints the table and row
 * changes as aligned text on stdout; JSON mode prints every command as one
 * JSON object per line. Messages always go to stderr in plain mode so that
 * stdout stays a clean listing.
 */
use crate::app_logic::{MessageSeverity, UiCommand};
use crate::core::ScanItem;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct ConsoleView<W: Write> {
    format: OutputFormat,
    out: W,
}

impl ConsoleView<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        ConsoleView::new(format, io::stdout())
    }
}

impl<W: Write> ConsoleView<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        ConsoleView { format, out }
    }

    pub fn render_all(&mut self, commands: &[UiCommand]) -> io::Result<()> {
        for command in commands {
            self.render(command)?;
        }
        self.out.flush()
    }

    pub fn render(&mut self, command: &UiCommand) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, command).map_err(io::Error::other)?;
                writeln!(self.out)
            }
            OutputFormat::Text => self.render_text(command),
        }
    }

    fn render_text(&mut self, command: &UiCommand) -> io::Result<()> {
        match command {
            UiCommand::PopulateTable { rows } => {
                let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
                for row in rows {
                    write_row(&mut self.out, row, width)?;
                }
                Ok(())
            }
            UiCommand::UpdateRow { index, row } => {
                writeln!(self.out, "[{index}] {} {}", row.name, row.status)
            }
            UiCommand::SetStatusText { text } => writeln!(self.out, "{text}"),
            UiCommand::ShowMessage { severity, text } => {
                let prefix = match severity {
                    MessageSeverity::Information => "info",
                    MessageSeverity::Warning => "warning",
                    MessageSeverity::Error => "error",
                };
                eprintln!("{prefix}: {text}");
                Ok(())
            }
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

fn write_row(out: &mut impl Write, row: &ScanItem, width: usize) -> io::Result<()> {
    let status = row.status.to_string();
    if status.is_empty() {
        writeln!(out, "{}", row.name)
    } else {
        writeln!(out, "{:<width$}  {status}", row.name)
    }
}
