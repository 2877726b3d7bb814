//! The migration runner contract the CLI drives, and a directory-backed implementation.
mod error;

pub use error::{RunnerError, RunnerErrorKind};

use crate::db::DbEngine;
use crate::migration::{collect_migrations_from_directory, Migration, MigrationDirection, MigrationName};

use std::fmt;
use std::path::PathBuf;


/// Lifecycle notification emitted around every migration step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationEvent {
    Migrating,
    Migrated,
    Reverting,
    Reverted,
}

impl MigrationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Migrating => "migrating",
            Self::Migrated => "migrated",
            Self::Reverting => "reverting",
            Self::Reverted => "reverted",
        }
    }
}

impl fmt::Display for MigrationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Receives lifecycle events synchronously, in the order the runner emits them.
pub trait EventListener: Send + Sync {
    fn notify(&mut self, event: MigrationEvent, name: &MigrationName);
}

impl<F> EventListener for F
where
    F: FnMut(MigrationEvent, &MigrationName) + Send + Sync,
{
    fn notify(&mut self, event: MigrationEvent, name: &MigrationName) {
        (*self)(event, name)
    }
}


/// Inclusive stopping point of a forward run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpTo {
    Latest,
    Migration(MigrationName),
}

/// Inclusive stopping point of a backward run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownTo {
    Initial,
    Migration(MigrationName),
}


#[async_trait::async_trait]
pub trait Runner: Send + Sync {
    /// Executed migrations, oldest first.
    async fn executed(&self) -> Result<Vec<Migration>, RunnerError>;
    /// Pending migrations, next to run first.
    async fn pending(&self) -> Result<Vec<Migration>, RunnerError>;
    /// Executed and pending migrations, read together.
    async fn status(&self) -> Result<(Vec<Migration>, Vec<Migration>), RunnerError>;
    /// Look up a known migration by its name.
    async fn find(&self, name: &str) -> Result<Migration, RunnerError>;
    /// Apply pending migrations; returns the names applied.
    async fn up(&mut self, to: UpTo) -> Result<Vec<MigrationName>, RunnerError>;
    /// Revert executed migrations, newest first; returns the names reverted.
    async fn down(&mut self, to: DownTo) -> Result<Vec<MigrationName>, RunnerError>;
    fn subscribe(&mut self, listener: Box<dyn EventListener>);
}


/// Runs SQL migrations discovered in a directory against a [`DbEngine`].
pub struct Migrator<E: DbEngine> {
    engine: E,
    directory: PathBuf,
    listeners: Vec<Box<dyn EventListener>>,
}

impl<E: DbEngine> Migrator<E> {
    pub fn new(engine: E, directory: impl Into<PathBuf>) -> Self {
        Migrator { engine, directory: directory.into(), listeners: Vec::new() }
    }

    #[cfg(test)]
    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    fn emit(&mut self, event: MigrationEvent, name: &MigrationName) {
        tracing::debug!("Emitting '{event}' for {name}");
        for listener in self.listeners.iter_mut() {
            listener.notify(event, name);
        }
    }

    /// Discovered migrations split into (executed, pending).
    async fn partition(&self) -> Result<(Vec<Migration>, Vec<Migration>), RunnerError> {
        let discovered = collect_migrations_from_directory(&self.directory)?;
        let records = self.engine.executed().await?;

        let mut executed = Vec::with_capacity(records.len());
        for record in &records {
            let migration = discovered
                .iter()
                .find(|m| m.name == *record.name)
                .ok_or_else(|| RunnerError { kind: RunnerErrorKind::MissingMigration(record.name.clone()) })?;

            if !record.checksum.is_empty() {
                match migration.checksum() {
                    Ok(checksum) if checksum != record.checksum => tracing::warn!(
                        "Migration {} changed on disk since it was executed", migration.name
                    ),
                    Ok(_) => {}
                    Err(e) => tracing::debug!("Skipping checksum of {}: {e:#}", migration.name),
                }
            }
            executed.push(migration.clone());
        }

        let pending = discovered
            .into_iter()
            .filter(|m| !records.iter().any(|r| m.name == *r.name))
            .collect();

        Ok((executed, pending))
    }

    async fn step(&mut self, migration: &Migration, direction: MigrationDirection) -> Result<(), RunnerError> {
        let (before, after) = direction.events();
        let sql = migration.script(direction)?;
        let checksum = match direction {
            MigrationDirection::Up => migration.checksum()?,
            MigrationDirection::Down => String::new(),
        };

        self.emit(before, &migration.name);
        tracing::debug!("{} {}", direction.verb(), migration.name);
        self.engine
            .apply(migration.name.as_str(), &checksum, &sql, direction)
            .await?;
        self.emit(after, &migration.name);

        Ok(())
    }

    /// Run `plan` in order, stopping at the first failure.
    async fn run(&mut self, plan: Vec<Migration>, direction: MigrationDirection) -> Result<Vec<MigrationName>, RunnerError> {
        let mut done = Vec::with_capacity(plan.len());
        for migration in &plan {
            self.step(migration, direction).await?;
            done.push(migration.name.clone());
        }

        Ok(done)
    }
}


/// Take migrations from the front of `list` up to and including `target`.
fn take_until(list: Vec<Migration>, target: &MigrationName) -> Option<Vec<Migration>> {
    let position = list.iter().position(|m| m.name == *target)?;
    Some(list.into_iter().take(position + 1).collect())
}


#[async_trait::async_trait]
impl<E: DbEngine> Runner for Migrator<E> {
    async fn executed(&self) -> Result<Vec<Migration>, RunnerError> {
        Ok(self.status().await?.0)
    }

    async fn pending(&self) -> Result<Vec<Migration>, RunnerError> {
        Ok(self.status().await?.1)
    }

    async fn status(&self) -> Result<(Vec<Migration>, Vec<Migration>), RunnerError> {
        self.engine.ensure_table().await?;
        self.partition().await
    }

    async fn find(&self, name: &str) -> Result<Migration, RunnerError> {
        collect_migrations_from_directory(&self.directory)?
            .into_iter()
            .find(|m| m.name == *name)
            .ok_or_else(|| RunnerError { kind: RunnerErrorKind::UnknownMigration(name.to_string()) })
    }

    async fn up(&mut self, to: UpTo) -> Result<Vec<MigrationName>, RunnerError> {
        let pending = self.pending().await?;
        let plan = match to {
            UpTo::Latest => pending,
            UpTo::Migration(target) => take_until(pending, &target)
                .ok_or_else(|| RunnerError { kind: RunnerErrorKind::NotPending(target.to_string()) })?,
        };

        tracing::info!("Applying {} migration(s)", plan.len());
        self.run(plan, MigrationDirection::Up).await
    }

    async fn down(&mut self, to: DownTo) -> Result<Vec<MigrationName>, RunnerError> {
        let mut executed = self.executed().await?;
        executed.reverse();
        let plan = match to {
            DownTo::Initial => executed,
            DownTo::Migration(target) => take_until(executed, &target)
                .ok_or_else(|| RunnerError { kind: RunnerErrorKind::NotExecuted(target.to_string()) })?,
        };

        tracing::info!("Reverting {} migration(s)", plan.len());
        self.run(plan, MigrationDirection::Down).await
    }

    fn subscribe(&mut self, listener: Box<dyn EventListener>) {
        self.listeners.push(listener);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryEngine;
    use crate::migration::tests::migration_dir;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    fn names(migrations: &[Migration]) -> Vec<String> {
        migrations.iter().map(|m| m.name.to_string()).collect()
    }

    fn strings(names: &[MigrationName]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn partitions_discovered_migrations() {
        let dir = migration_dir(&["001_a", "002_b", "003_c"]);
        let migrator = Migrator::new(MemoryEngine::with_executed(&["001_a"]), dir.path());

        assert_eq!(names(&migrator.executed().await.unwrap()), vec!["001_a"]);
        assert_eq!(names(&migrator.pending().await.unwrap()), vec!["002_b", "003_c"]);
    }

    #[tokio::test]
    async fn status_prepares_the_table_once() {
        let dir = migration_dir(&["001_a", "002_b"]);
        let migrator = Migrator::new(MemoryEngine::with_executed(&["001_a"]), dir.path());

        let (executed, pending) = migrator.status().await.unwrap();

        assert_eq!(names(&executed), vec!["001_a"]);
        assert_eq!(names(&pending), vec!["002_b"]);
        assert_eq!(migrator.engine().table_checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn executed_record_without_source_fails() {
        let dir = migration_dir(&["001_a"]);
        let migrator = Migrator::new(MemoryEngine::with_executed(&["000_gone"]), dir.path());

        let err = migrator.executed().await.unwrap_err();
        assert!(matches!(err.kind, RunnerErrorKind::MissingMigration(ref n) if n == "000_gone"));
    }

    #[tokio::test]
    async fn up_to_target_is_inclusive() {
        let dir = migration_dir(&["001_a", "002_b", "003_c"]);
        let mut migrator = Migrator::new(MemoryEngine::default(), dir.path());

        let target = migrator.find("002_b").await.unwrap().name;
        let applied = migrator.up(UpTo::Migration(target)).await.unwrap();

        assert_eq!(strings(&applied), vec!["001_a", "002_b"]);
        assert_eq!(names(&migrator.pending().await.unwrap()), vec!["003_c"]);
    }

    #[tokio::test]
    async fn up_to_executed_target_is_rejected() {
        let dir = migration_dir(&["001_a", "002_b"]);
        let mut migrator = Migrator::new(MemoryEngine::with_executed(&["001_a"]), dir.path());

        let target = migrator.find("001_a").await.unwrap().name;
        let err = migrator.up(UpTo::Migration(target)).await.unwrap_err();

        assert!(matches!(err.kind, RunnerErrorKind::NotPending(_)));
        assert_eq!(migrator.engine().writes, 0);
    }

    #[tokio::test]
    async fn down_to_target_reverts_newest_first() {
        let dir = migration_dir(&["001_a", "002_b", "003_c"]);
        let mut migrator = Migrator::new(
            MemoryEngine::with_executed(&["001_a", "002_b", "003_c"]),
            dir.path(),
        );

        let target = migrator.find("002_b").await.unwrap().name;
        let reverted = migrator.down(DownTo::Migration(target)).await.unwrap();

        assert_eq!(strings(&reverted), vec!["003_c", "002_b"]);
        assert_eq!(names(&migrator.executed().await.unwrap()), vec!["001_a"]);
    }

    #[tokio::test]
    async fn down_to_initial_reverts_everything() {
        let dir = migration_dir(&["001_a", "002_b"]);
        let mut migrator = Migrator::new(MemoryEngine::with_executed(&["001_a", "002_b"]), dir.path());

        migrator.down(DownTo::Initial).await.unwrap();

        assert!(migrator.executed().await.unwrap().is_empty());
        assert_eq!(names(&migrator.pending().await.unwrap()), vec!["001_a", "002_b"]);
    }

    #[tokio::test]
    async fn find_unknown_migration_fails() {
        let dir = migration_dir(&["001_a"]);
        let migrator = Migrator::new(MemoryEngine::default(), dir.path());

        let err = migrator.find("999_nope").await.unwrap_err();
        assert!(matches!(err.kind, RunnerErrorKind::UnknownMigration(_)));
    }

    #[tokio::test]
    async fn listeners_see_every_event_in_order() {
        let dir = migration_dir(&["001_a", "002_b"]);
        let mut migrator = Migrator::new(MemoryEngine::default(), dir.path());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        migrator.subscribe(Box::new(move |event: MigrationEvent, name: &MigrationName| {
            sink.lock().unwrap().push(format!("{event} {name}"));
        }));

        migrator.up(UpTo::Latest).await.unwrap();
        migrator.down(DownTo::Initial).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![
            "migrating 001_a", "migrated 001_a",
            "migrating 002_b", "migrated 002_b",
            "reverting 002_b", "reverted 002_b",
            "reverting 001_a", "reverted 001_a",
        ]);
    }

    #[tokio::test]
    async fn failing_step_stops_the_run() {
        let dir = migration_dir(&["001_a", "002_b", "003_c"]);
        let engine = MemoryEngine { fail_on: Some("002_b".into()), ..Default::default() };
        let mut migrator = Migrator::new(engine, dir.path());

        let err = migrator.up(UpTo::Latest).await.unwrap_err();

        assert!(matches!(err.kind, RunnerErrorKind::Engine(_)));
        assert_eq!(names(&migrator.executed().await.unwrap()), vec!["001_a"]);
    }
}
