use crate::db::{DbEngine, EngineError, EngineErrorKind, ExecutedRecord};
use crate::migration::MigrationDirection;

use sqlx::{Executor, PgPool};


pub struct PostgresEngine {
    pool: PgPool,
    table: String,
}


/// Accept `name` or `schema.name` made of ASCII alphanumerics and underscores.
fn is_valid_table_name(table: &str) -> bool {
    let parts: Vec<&str> = table.split('.').collect();
    parts.len() <= 2 && parts.iter().all(|part| {
        part.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}


impl PostgresEngine {
    pub async fn connect(conn_str: &str, table: &str) -> Result<Self, EngineError> {
        if !is_valid_table_name(table) {
            return Err(EngineError { kind: EngineErrorKind::InvalidTableName(table.to_string()) });
        }

        let pool = PgPool::connect(conn_str).await?;
        Ok(PostgresEngine { pool, table: table.to_string() })
    }
}


#[async_trait::async_trait]
impl DbEngine for PostgresEngine {
    async fn ensure_table(&self) -> Result<(), EngineError> {
        if let Some((schema, _)) = self.table.split_once('.') {
            let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {schema};");
            sqlx::query(&create_schema)
                .execute(&self.pool)
                .await?;
        }

        let create_table = format!(r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                checksum TEXT NOT NULL,
                executed_at TIMESTAMP DEFAULT now()
            );
        "#, self.table);
        sqlx::query(&create_table)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn executed(&self) -> Result<Vec<ExecutedRecord>, EngineError> {
        let select = format!("SELECT name, checksum FROM {} ORDER BY id", self.table);
        let rows: Vec<(String, String)> = sqlx::query_as(&select)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter()
            .map(|(name, checksum)| ExecutedRecord { name, checksum })
            .collect())
    }

    async fn apply(
        &mut self,
        name: &str,
        checksum: &str,
        sql: &str,
        direction: MigrationDirection,
    ) -> Result<(), EngineError> {
        let record_sql = match direction {
            MigrationDirection::Up => format!("INSERT INTO {} (name, checksum) VALUES ($1, $2)", self.table),
            MigrationDirection::Down => format!("DELETE FROM {} WHERE name = $1", self.table),
        };

        let mut tx = self.pool.begin().await?;

        Executor::execute(&mut *tx, sqlx::raw_sql(sql)).await?;

        let record = match direction {
            MigrationDirection::Up => sqlx::query(&record_sql).bind(name).bind(checksum),
            MigrationDirection::Down => sqlx::query(&record_sql).bind(name),
        };
        Executor::execute(&mut *tx, record).await?;

        tx.commit().await?;
        Ok(())
    }
}
