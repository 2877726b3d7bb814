use crate::cli::error::{MigrateError, MigrateErrorKind};
use crate::cli::{ux, Command};
use crate::migration::{Migration, MigrationName};
use crate::runner::{DownTo, Runner, UpTo};

use std::io::Write;


pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;


/// Point-in-time view of the runner's state. Rebuilt on every query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub current: Option<MigrationName>,
    pub executed: Vec<MigrationName>,
    pub pending: Vec<MigrationName>,
}

impl StatusSnapshot {
    pub fn new(executed: Vec<MigrationName>, pending: Vec<MigrationName>) -> Self {
        let current = executed.last().cloned();
        StatusSnapshot { current, executed, pending }
    }
}


fn into_names(migrations: Vec<Migration>) -> Vec<MigrationName> {
    migrations.into_iter().map(|m| m.name).collect()
}


/// Drives one command against a runner, writing its output to `out`.
pub struct Orchestrator<R: Runner, W: Write> {
    runner: R,
    out: W,
}

impl<R: Runner, W: Write> Orchestrator<R, W> {
    pub fn new(runner: R, out: W) -> Self {
        Orchestrator { runner, out }
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    #[cfg(test)]
    pub(crate) fn into_output(self) -> W {
        self.out
    }

    pub async fn status(&self) -> Result<StatusSnapshot, MigrateError> {
        let (executed, pending) = self.runner.status().await?;

        Ok(StatusSnapshot::new(into_names(executed), into_names(pending)))
    }

    pub async fn print_status(&mut self) -> Result<(), MigrateError> {
        let status = self.status().await?;
        write!(self.out, "{}", ux::render_status(&status))?;
        Ok(())
    }

    /// Apply pending migrations up to and including `target`, or all of them.
    pub async fn up(&mut self, target: Option<&str>) -> Result<Vec<MigrationName>, MigrateError> {
        let to = match target {
            Some(name) => UpTo::Migration(self.runner.find(name).await?.name),
            None => UpTo::Latest,
        };
        Ok(self.runner.up(to).await?)
    }

    /// Revert executed migrations down to and including `target`, or all of them.
    pub async fn down(&mut self, target: Option<&str>) -> Result<Vec<MigrationName>, MigrateError> {
        let to = match target {
            Some(name) => DownTo::Migration(self.runner.find(name).await?.name),
            None => DownTo::Initial,
        };
        Ok(self.runner.down(to).await?)
    }

    /// Apply exactly the first pending migration.
    pub async fn next(&mut self) -> Result<Vec<MigrationName>, MigrateError> {
        let StatusSnapshot { pending, .. } = self.status().await?;
        let next = pending
            .into_iter()
            .next()
            .ok_or(MigrateError { kind: MigrateErrorKind::NoPendingMigrations })?;

        tracing::debug!("Next migration: {next}");
        Ok(self.runner.up(UpTo::Migration(next)).await?)
    }

    /// Revert exactly the last executed migration.
    pub async fn prev(&mut self) -> Result<Vec<MigrationName>, MigrateError> {
        let StatusSnapshot { current, .. } = self.status().await?;
        let prev = current
            .ok_or(MigrateError { kind: MigrateErrorKind::AlreadyAtInitialState })?;

        tracing::debug!("Previous migration: {prev}");
        Ok(self.runner.down(DownTo::Migration(prev)).await?)
    }

    pub async fn dispatch(&mut self, command: &Command) -> Result<Vec<MigrationName>, MigrateError> {
        match command {
            Command::Status => {
                self.print_status().await?;
                Ok(Vec::new())
            }
            Command::Up(target) => self.up(target.as_deref()).await,
            Command::Down(target) => self.down(target.as_deref()).await,
            Command::Next => self.next().await,
            Command::Prev => self.prev().await,
        }
    }

    /// Run `command` to completion and report the outcome; returns the process exit code.
    pub async fn run(&mut self, command: &Command, err: &mut impl Write) -> u8 {
        if let Err(e) = writeln!(self.out) {
            tracing::warn!("Failed to write output: {e}");
        }

        match self.dispatch(command).await {
            Ok(names) => {
                tracing::debug!("Command '{command}' touched {} migration(s)", names.len());
                if let Err(e) = ux::write_success(&mut self.out) {
                    tracing::warn!("Failed to write output: {e}");
                }
                EXIT_SUCCESS
            }
            Err(error) => {
                report_failure(err, command.name(), &error);
                EXIT_FAILURE
            }
        }
    }
}


/// Turn a verb and optional target into a command, printing usage when the verb is unknown.
///
/// `Err` carries the exit code. No runner exists at this point, so nothing is executed.
pub fn parse_command(
    verb: Option<&str>,
    target: Option<&str>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<Command, u8> {
    match Command::parse(verb, target) {
        Ok(command) => Ok(command),
        Err(error) => {
            tracing::debug!("{error}");
            if let Err(e) = writeln!(out) {
                tracing::warn!("Failed to write output: {e}");
            }
            if let Err(e) = ux::write_usage(err, verb.unwrap_or_default().trim()) {
                tracing::warn!("Failed to write output: {e}");
            }
            Err(EXIT_FAILURE)
        }
    }
}


/// Print the failure banner for an error raised while `command` was active.
pub fn report_failure(err: &mut impl Write, command: &str, error: &MigrateError) {
    tracing::debug!("Command '{command}' failed: {error:?}");
    if let Err(e) = ux::write_failure(err, command, error) {
        tracing::warn!("Failed to write output: {e}");
    }
}
