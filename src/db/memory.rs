use crate::db::{DbEngine, EngineError, ExecutedRecord};
use crate::migration::MigrationDirection;

use std::sync::atomic::{AtomicUsize, Ordering};


/// In-process engine for tests. Counts every write it performs.
#[derive(Default)]
pub struct MemoryEngine {
    pub records: Vec<ExecutedRecord>,
    pub writes: usize,
    pub fail_on: Option<String>,
    pub fail_executed: bool,
    pub table_checks: AtomicUsize,
}

impl MemoryEngine {
    pub fn with_executed(names: &[&str]) -> Self {
        MemoryEngine {
            records: names.iter()
                .map(|n| ExecutedRecord { name: n.to_string(), checksum: String::new() })
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl DbEngine for MemoryEngine {
    async fn ensure_table(&self) -> Result<(), EngineError> {
        self.table_checks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn executed(&self) -> Result<Vec<ExecutedRecord>, EngineError> {
        if self.fail_executed {
            return Err(sqlx::Error::Protocol("executed migrations unavailable".to_string()).into());
        }
        Ok(self.records.clone())
    }

    async fn apply(
        &mut self,
        name: &str,
        checksum: &str,
        _sql: &str,
        direction: MigrationDirection,
    ) -> Result<(), EngineError> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(sqlx::Error::Protocol(format!("failed to execute migration '{name}'")).into());
        }

        self.writes += 1;
        match direction {
            MigrationDirection::Up => self.records.push(ExecutedRecord {
                name: name.to_string(),
                checksum: checksum.to_string(),
            }),
            MigrationDirection::Down => self.records.retain(|r| r.name != name),
        }
        Ok(())
    }
}
