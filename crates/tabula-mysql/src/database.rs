//! The database handle: statement dispatch, introspection, charset sync.

use std::sync::Arc;

use tracing::{debug, warn};

use tabula_core::{Charset, SqlValue, TypeRegistry, NOT_NULL, PRIMARY};

use crate::column::Column;
use crate::config::DatabaseConfig;
use crate::error::{DbError, Result};
use crate::executor::{Executor, MySqlExecutor, Rows};

/// A handle to one logical database.
///
/// Cheap to clone; every clone shares the same executor. The type registry
/// is carried explicitly so introspection never consults hidden global
/// state.
#[derive(Clone)]
pub struct Database {
    executor: Arc<dyn Executor>,
    name: String,
    registry: TypeRegistry,
    safe: bool,
}

impl Database {
    /// Creates a handle over an executor, with the built-in type registry.
    /// The safety guard starts on.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, name: impl Into<String>) -> Self {
        Self {
            executor,
            name: name.into(),
            registry: TypeRegistry::builtin(),
            safe: true,
        }
    }

    /// Connects through the sqlx executor and applies the configured
    /// charset, if any.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let executor = MySqlExecutor::connect(config).await?;
        let database = Self::new(executor.shared(), config.database.clone());
        if let Some(charset) = &config.charset {
            database
                .sync_charset(&Charset::new(&charset.name, &charset.collation))
                .await;
        }
        Ok(database)
    }

    /// Replaces the type registry used for introspection.
    #[must_use]
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The database (schema) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registry used to map driver type names during introspection.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Whether the safety guard is on. While it is, unfiltered UPDATE and
    /// DELETE commands are refused.
    #[must_use]
    pub fn safe(&self) -> bool {
        self.safe
    }

    /// Turns the safety guard off when `confirm` is true. Only clones
    /// created after this call are affected.
    #[must_use]
    pub fn remove_safety(mut self, confirm: bool) -> Self {
        self.safe = !confirm;
        self
    }

    /// Executes one statement through the executor.
    pub async fn execute(&self, statement: &str, params: &[SqlValue]) -> Result<Rows> {
        debug!(statement, params = params.len(), "executing SQL");
        self.executor.execute(statement, params).await
    }

    /// Whether a table with this name exists in the database.
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let statement = format!(
            "SHOW TABLES FROM {0} WHERE Tables_in_{0} = '{1}';",
            self.name, table
        );
        Ok(!self.execute(&statement, &[]).await?.is_empty())
    }

    /// Introspects a table's live column set via `DESCRIBE`.
    ///
    /// Each reported row is `(Field, Type, Null, Key, Default)`; the type
    /// name is resolved through the registry, NOT NULL and PRIMARY KEY are
    /// inferred from the Null/Key flags, and the reported default is re-cast
    /// through the resolved type when possible.
    pub async fn describe_table(&self, table: &str) -> Result<Vec<Column>> {
        let statement = format!("DESCRIBE {}.{};", self.name, table);
        let result = self.execute(&statement, &[]).await?;

        let mut columns = Vec::with_capacity(result.len());
        for row in &result.rows {
            let field = text_at(row, 0).ok_or_else(|| {
                DbError::Schema(format!("malformed DESCRIBE row for table '{table}'"))
            })?;
            let type_name = text_at(row, 1).ok_or_else(|| {
                DbError::Schema(format!("DESCRIBE row for '{field}' is missing a type"))
            })?;
            let sql_type = self.registry.resolve(&type_name)?;

            let mut column = Column::new(field, sql_type.clone());
            if text_at(row, 2).as_deref() == Some("NO") {
                column = column.tag(NOT_NULL);
            }
            if text_at(row, 3).as_deref() == Some("PRI") {
                column = column.tag(PRIMARY);
            }
            if let Some(raw) = row.get(4).filter(|value| !value.is_null()) {
                let default = sql_type.cast(raw).unwrap_or_else(|_| raw.clone());
                column = column.default(default);
            }
            columns.push(column);
        }
        Ok(columns)
    }

    /// Aligns the database's charset/collation with the given descriptor.
    ///
    /// Queries the current settings first and only issues the ALTER when
    /// they differ. Failure is downgraded to a warning: charset drift does
    /// not block schema preparation.
    pub async fn sync_charset(&self, charset: &Charset) {
        let query = format!(
            "SELECT DEFAULT_COLLATION_NAME, DEFAULT_CHARACTER_SET_NAME FROM information_schema.SCHEMATA WHERE information_schema.SCHEMATA.SCHEMA_NAME = '{}'",
            self.name
        );
        let current = match self.execute(&query, &[]).await {
            Ok(rows) => rows
                .rows
                .into_iter()
                .next()
                .map(|row| (text_at(&row, 0), text_at(&row, 1))),
            Err(err) => {
                warn!(error = %err, "querying database charset failed");
                None
            }
        };

        let up_to_date = matches!(
            &current,
            Some((Some(collation), Some(name)))
                if name.as_str() == charset.name() && collation.as_str() == charset.collation()
        );
        if up_to_date {
            return;
        }

        let alter = format!(
            "ALTER DATABASE {} CHARACTER SET = {} COLLATE = {};",
            self.name,
            charset.name(),
            charset.collation()
        );
        if let Err(err) = self.execute(&alter, &[]).await {
            warn!(error = %err, "altering database charset failed");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Reads a text field from a result row, tolerating byte-string decoding.
fn text_at(row: &[SqlValue], index: usize) -> Option<String> {
    match row.get(index)? {
        SqlValue::Text(s) => Some(s.clone()),
        SqlValue::Blob(b) => String::from_utf8(b.clone()).ok(),
        _ => None,
    }
}
