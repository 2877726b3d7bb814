mod error;
#[cfg(test)]
pub(crate) mod memory;
mod postgres;

pub use error::{EngineError, EngineErrorKind};
pub use postgres::PostgresEngine;

use crate::migration::MigrationDirection;


/// A row of the executed-migrations table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutedRecord {
    pub name: String,
    pub checksum: String,
}


/// Durable state behind a migrator: runs scripts and remembers which migrations ran.
#[async_trait::async_trait]
pub trait DbEngine: Send + Sync {
    async fn ensure_table(&self) -> Result<(), EngineError>;
    /// Executed migrations, oldest first.
    async fn executed(&self) -> Result<Vec<ExecutedRecord>, EngineError>;
    /// Run `sql` and record (up) or forget (down) `name`, atomically.
    async fn apply(
        &mut self,
        name: &str,
        checksum: &str,
        sql: &str,
        direction: MigrationDirection,
    ) -> Result<(), EngineError>;
}
