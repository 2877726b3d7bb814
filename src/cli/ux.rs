use crate::cli::commands::StatusSnapshot;
use crate::migration::MigrationName;
use crate::runner::{EventListener, MigrationEvent};

use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Instant;
use tracing::subscriber::SetGlobalDefaultError;


pub const USAGE: &str = "Usage: migrate [status|up|down|next|prev]";
pub const SUCCESS_MARKER: &str = ":)";
pub const FAILURE_MARKER: &str = ":(";


pub fn setup_logging(verbose: u8, quiet: bool) -> Result<(), SetGlobalDefaultError> {
    let level = if quiet {
        tracing::Level::ERROR
    } else { match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }};

    // stdout carries the command's own output
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}


/// Render the Current/Executed/Pending sections of a status snapshot.
pub fn render_status(status: &StatusSnapshot) -> String {
    let mut output = String::new();

    // writeln! into a String cannot fail
    let mut section = |title: &str, names: &[&MigrationName]| {
        let _ = writeln!(&mut output, "{title}:");
        if names.is_empty() {
            let _ = writeln!(&mut output, "  (none)");
        }
        for name in names {
            let _ = writeln!(&mut output, "  {name}");
        }
    };

    section("Current", &status.current.iter().collect::<Vec<_>>());
    section("\nExecuted", &status.executed.iter().collect::<Vec<_>>());
    section("\nPending", &status.pending.iter().collect::<Vec<_>>());
    output.push('\n');

    output
}


/// One progress line: elapsed seconds, event name, migration.
pub fn format_event_line(elapsed_secs: f64, event: MigrationEvent, name: &MigrationName) -> String {
    format!("{:06.3} | {:>9} | {}", elapsed_secs, event.as_str(), name)
}


/// Prints a timestamped line for every lifecycle event it is notified of.
pub struct EventLogger<W: Write + Send + Sync> {
    started: Instant,
    out: W,
}

impl<W: Write + Send + Sync> EventLogger<W> {
    pub fn new(started: Instant, out: W) -> Self {
        EventLogger { started, out }
    }

    fn write_event(&mut self, event: MigrationEvent, name: &MigrationName) -> io::Result<()> {
        let elapsed = self.started.elapsed().as_secs_f64();
        writeln!(self.out, "{}", format_event_line(elapsed, event, name))?;
        if matches!(event, MigrationEvent::Migrated | MigrationEvent::Reverted) {
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send + Sync> EventListener for EventLogger<W> {
    fn notify(&mut self, event: MigrationEvent, name: &MigrationName) {
        if let Err(e) = self.write_event(event, name) {
            tracing::warn!("Failed to log '{event}' for {name}: {e}");
        }
    }
}


pub fn write_success(out: &mut impl Write) -> io::Result<()> {
    write!(out, "{SUCCESS_MARKER}\n\n")?;
    out.flush()
}

pub fn write_failure(err: &mut impl Write, command: &str, error: &dyn std::fmt::Display) -> io::Result<()> {
    writeln!(err, "Caught error at command: {command}")?;
    writeln!(err, "{error}")?;
    write!(err, "{FAILURE_MARKER}\n\n")?;
    err.flush()
}

pub fn write_usage(err: &mut impl Write, verb: &str) -> io::Result<()> {
    write!(err, "Invalid cmd: {verb}\n\n{USAGE}\n\n{FAILURE_MARKER}\n\n")?;
    err.flush()
}
