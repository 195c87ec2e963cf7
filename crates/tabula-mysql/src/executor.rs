//! The executor contract and its sqlx-backed MySQL implementation.
//!
//! Everything above this module speaks to the database through a single
//! operation: `execute(statement, parameters)`. The physical connection,
//! its pool, and the reconnect policy all live behind [`Executor`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row as _;
use tracing::{info, warn};

use tabula_core::SqlValue;

use crate::config::DatabaseConfig;
use crate::error::{DbError, Result};

/// One result row, values in column order.
pub type Row = Vec<SqlValue>;

/// A fully buffered query result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    /// Fetched rows; empty for data-modifying statements.
    pub rows: Vec<Row>,
    /// Rows affected by a data-modifying statement.
    pub rows_affected: u64,
}

impl Rows {
    /// An empty result.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A result holding the given rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            rows_affected: 0,
        }
    }

    /// The first row, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Whether no rows were fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of fetched rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// The connection-executor collaborator.
///
/// Implementations own the physical connection and serialize access to it;
/// the schema layer never touches the wire directly.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executes one statement with bound parameters and buffers the result.
    async fn execute(&self, statement: &str, params: &[SqlValue]) -> Result<Rows>;
}

/// [`Executor`] backed by an sqlx MySQL connection pool.
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connects using the config's auto-connect policy: a blocking retry
    /// loop with a fixed delay, bounded by `max_attempts` when set.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut attempt: u32 = 1;
        loop {
            info!(
                database = %config.database,
                host = %config.host,
                attempt,
                "connecting to database"
            );
            match MySqlPoolOptions::new()
                .connect_with(config.connect_options())
                .await
            {
                Ok(pool) => {
                    info!(database = %config.database, "connection established");
                    return Ok(Self { pool });
                }
                Err(err) => {
                    warn!(error = %err, attempt, "connection attempt failed");
                    let exhausted = !config.auto_connect
                        || config.max_attempts.is_some_and(|max| attempt >= max);
                    if exhausted {
                        return Err(DbError::Connection(err.to_string()));
                    }
                    tokio::time::sleep(Duration::from_secs(config.auto_connect_delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Shares the executor behind an `Arc` for database handles.
    #[must_use]
    pub fn shared(self) -> Arc<dyn Executor> {
        Arc::new(self)
    }
}

#[async_trait]
impl Executor for MySqlExecutor {
    async fn execute(&self, statement: &str, params: &[SqlValue]) -> Result<Rows> {
        let mut query = sqlx::query(statement);
        for param in params {
            query = bind_param(query, param.clone());
        }

        if returns_rows(statement) {
            let fetched = query.fetch_all(&self.pool).await?;
            let rows = fetched.iter().map(decode_row).collect();
            Ok(Rows {
                rows,
                rows_affected: 0,
            })
        } else {
            let done = query.execute(&self.pool).await?;
            Ok(Rows {
                rows: Vec::new(),
                rows_affected: done.rows_affected(),
            })
        }
    }
}

/// Whether a statement produces a result set rather than an OK packet.
fn returns_rows(statement: &str) -> bool {
    let verb = statement
        .trim_start()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();
    matches!(verb.as_str(), "SELECT" | "SHOW" | "DESCRIBE" | "EXPLAIN")
}

type MySqlQuery<'q> = sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>;

fn bind_param(query: MySqlQuery<'_>, value: SqlValue) -> MySqlQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn decode_row(row: &MySqlRow) -> Row {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

/// Decodes one column by trying the canonical variants in turn. The driver
/// reports everything the schema layer emits as one of these.
fn decode_value(row: &MySqlRow, index: usize) -> SqlValue {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Int);
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(index) {
        return value.map_or(SqlValue::Null, |v| SqlValue::Int(v as i64));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Float);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Text);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return value.map_or(SqlValue::Null, SqlValue::Bool);
    }
    match row.try_get::<Option<Vec<u8>>, _>(index) {
        Ok(value) => value.map_or(SqlValue::Null, SqlValue::Blob),
        Err(_) => SqlValue::Null,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_classification() {
        assert!(returns_rows("SELECT * FROM users"));
        assert!(returns_rows("  show tables"));
        assert!(returns_rows("DESCRIBE shop.users;"));
        assert!(!returns_rows("INSERT INTO users (id) VALUES (?)"));
        assert!(!returns_rows("CREATE TABLE IF NOT EXISTS users (id INT);"));
    }

    #[tokio::test]
    async fn mock_records_and_replays() {
        let executor = mock::MockExecutor::new();
        executor.push_response(Rows::from_rows(vec![vec![SqlValue::Int(1)]]));

        let rows = executor
            .execute("SELECT id FROM users", &[SqlValue::Int(1)])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let empty = executor.execute("DELETE FROM users", &[]).await.unwrap();
        assert!(empty.is_empty());
        assert_eq!(executor.call_count(), 2);
    }
}
