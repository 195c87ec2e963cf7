//! Table declarations and schema reconciliation.

use tracing::{info, warn};

use tabula_core::{SqlValue, Where};

use crate::column::Column;
use crate::commands::{Delete, Insert, Select, Update};
use crate::database::Database;
use crate::error::{DbError, Result};

/// An ordered, named collection of columns bound to a database.
///
/// A table is declared once, reconciled against the live schema with
/// [`Table::prepare`], and then queried through the CRUD facade. The column
/// set is immutable once the table is prepared.
#[derive(Debug)]
pub struct Table {
    database: Database,
    name: String,
    columns: Vec<Column>,
    prepared: bool,
}

impl Table {
    /// Declares a table from an ordered list of columns.
    ///
    /// Columns are sorted by declaration order; unordered columns keep
    /// their declaration position after the ordered ones.
    #[must_use]
    pub fn new(database: Database, name: impl Into<String>, columns: Vec<Column>) -> Self {
        let mut indexed: Vec<(usize, Column)> = columns.into_iter().enumerate().collect();
        indexed.sort_by_key(|(index, column)| {
            (column.declaration_order().unwrap_or(u32::MAX), *index)
        });
        Self {
            database,
            name: name.into(),
            columns: indexed.into_iter().map(|(_, column)| column).collect(),
            prepared: false,
        }
    }

    /// The table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound database handle.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The declared (or adopted) columns, in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Whether [`Table::prepare`] has completed.
    #[must_use]
    pub fn prepared(&self) -> bool {
        self.prepared
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    /// Reconciles the declared column set against the live database schema.
    ///
    /// Creates the table when absent; when it exists, the declared and live
    /// column sets must match on `(name, type)` or preparation fails with
    /// [`DbError::SchemaMismatch`] carrying both one-sided difference
    /// lists. An empty declaration adopts the live column set. Preparation
    /// never alters an existing table. Idempotent while the live schema is
    /// unchanged.
    pub async fn prepare(&mut self) -> Result<()> {
        let exists = self.database.table_exists(&self.name).await?;

        if !exists {
            if self.columns.is_empty() {
                return Err(DbError::Schema(format!(
                    "table '{}' does not exist and no columns were declared",
                    self.name
                )));
            }
            let definitions = self
                .columns
                .iter()
                .map(Column::definition_sql)
                .collect::<Result<Vec<_>>>()?;
            let statement = format!(
                "CREATE TABLE IF NOT EXISTS {} ({});",
                self.name,
                definitions.join(", ")
            );
            self.database.execute(&statement, &[]).await?;
            info!(table = %self.name, "table created");
        } else {
            let live = self.database.describe_table(&self.name).await?;
            if self.columns.is_empty() {
                self.columns = live;
            } else {
                let declared_only: Vec<String> = self
                    .columns
                    .iter()
                    .filter(|column| !live.contains(column))
                    .map(describe_column)
                    .collect();
                let live_only: Vec<String> = live
                    .iter()
                    .filter(|column| !self.columns.contains(column))
                    .map(describe_column)
                    .collect();
                if !declared_only.is_empty() || !live_only.is_empty() {
                    warn!(
                        table = %self.name,
                        ?declared_only,
                        ?live_only,
                        "declared columns do not match the existing table"
                    );
                    return Err(DbError::SchemaMismatch {
                        declared_only,
                        live_only,
                    });
                }
            }
        }

        self.prepared = true;
        let name = self.name.clone();
        for column in &mut self.columns {
            column.bind_table(&name);
        }
        Ok(())
    }

    /// Starts a SELECT command against this table.
    #[must_use]
    pub fn select(&self) -> Select<'_> {
        Select::new(self)
    }

    /// Inserts one row. `None` columns means all declared columns, in
    /// order. Values are cast through each resolved column's type.
    pub async fn insert(&self, columns: Option<&[&str]>, values: Vec<SqlValue>) -> Result<u64> {
        Insert::new(self, columns, values).execute().await
    }

    /// Updates matching rows. `None` columns means all declared columns.
    pub async fn update(
        &self,
        columns: Option<&[&str]>,
        values: Vec<SqlValue>,
        filter: Option<Where>,
    ) -> Result<u64> {
        Update::new(self, columns, values, filter).execute().await
    }

    /// Deletes matching rows.
    pub async fn delete(&self, filter: Option<Where>) -> Result<u64> {
        Delete::new(self, filter).execute().await
    }

    /// Updates the row matching `filter` if one exists, otherwise inserts.
    ///
    /// Not atomic: the probing select and the subsequent write are separate
    /// statements, so a concurrent writer can slip between them. Callers
    /// needing atomicity must serialize access externally.
    pub async fn set(
        &self,
        columns: Option<&[&str]>,
        values: Vec<SqlValue>,
        filter: Option<Where>,
    ) -> Result<u64> {
        let mut probe = self.select();
        if let Some(names) = columns {
            probe = probe.columns(names);
        }
        if let Some(where_clause) = filter.clone() {
            probe = probe.filter(where_clause);
        }

        if probe.execute().await?.is_empty() {
            self.insert(columns, values).await
        } else {
            self.update(columns, values, filter).await
        }
    }

    /// Counts the table's rows.
    pub async fn count_rows(&self) -> Result<i64> {
        self.ensure_prepared()?;
        let statement = format!("SELECT COUNT(*) FROM {};", self.name);
        let result = self.database.execute(&statement, &[]).await?;
        match result.first().and_then(|row| row.first()) {
            Some(SqlValue::Int(count)) => Ok(*count),
            Some(SqlValue::Text(text)) => text.parse::<i64>().map_err(|_| {
                DbError::Schema(format!("unexpected COUNT(*) result '{text}'"))
            }),
            other => Err(DbError::Schema(format!(
                "unexpected COUNT(*) result {other:?}"
            ))),
        }
    }

    /// Resolves logical column references against the declared columns.
    ///
    /// `None` means "all columns" and is passed through as `None`; every
    /// name must resolve or the whole resolution fails with
    /// [`DbError::UnknownColumn`].
    pub(crate) fn resolve_columns(
        &self,
        columns: Option<&[&str]>,
    ) -> Result<Option<Vec<&Column>>> {
        match columns {
            None => Ok(None),
            Some(names) => names
                .iter()
                .map(|name| {
                    self.column(name).ok_or_else(|| DbError::UnknownColumn {
                        column: (*name).to_string(),
                        table: self.name.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Some),
        }
    }

    pub(crate) fn ensure_prepared(&self) -> Result<()> {
        if self.prepared {
            Ok(())
        } else {
            Err(DbError::NotPrepared(self.name.clone()))
        }
    }
}

fn describe_column(column: &Column) -> String {
    format!("{} {}", column.name(), column.sql_type().name())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use super::*;
    use crate::executor::mock::MockExecutor;
    use tabula_core::{SqlType, NOT_NULL, PRIMARY};

    fn users_columns() -> Vec<Column> {
        vec![
            Column::new("id", SqlType::integer()).tag(PRIMARY),
            Column::new("name", SqlType::string(50)).tag(NOT_NULL),
        ]
    }

    /// Declares the canonical `users` table: `id INT PRIMARY KEY`,
    /// `name VARCHAR(50) NOT NULL`.
    pub fn users_table(executor: Arc<MockExecutor>) -> Table {
        let database = Database::new(executor, "shop");
        Table::new(database, "users", users_columns())
    }

    /// Prepares `users_table` against an absent live table (SHOW TABLES
    /// comes back empty, CREATE succeeds).
    pub async fn prepared_users(executor: Arc<MockExecutor>) -> Table {
        let mut table = users_table(executor);
        table.prepare().await.expect("prepare should succeed");
        table
    }

    /// Same as `prepared_users`, with the database safety guard removed.
    pub async fn prepared_users_without_safety(executor: Arc<MockExecutor>) -> Table {
        let database = Database::new(executor, "shop").remove_safety(true);
        let mut table = Table::new(database, "users", users_columns());
        table.prepare().await.expect("prepare should succeed");
        table
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::fixtures::{prepared_users, users_table};
    use super::*;
    use crate::executor::mock::MockExecutor;
    use crate::executor::Rows;
    use tabula_core::{SqlType, NOT_NULL};

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(String::from(s))
    }

    fn live_users_response(executor: &MockExecutor) {
        executor.push_response(Rows::from_rows(vec![vec![text("users")]]));
        executor.push_response(Rows::from_rows(vec![
            vec![text("id"), text("int"), text("NO"), text("PRI"), SqlValue::Null],
            vec![
                text("name"),
                text("varchar(50)"),
                text("NO"),
                text(""),
                SqlValue::Null,
            ],
        ]));
    }

    #[tokio::test]
    async fn prepare_creates_absent_table() {
        let executor = Arc::new(MockExecutor::new());
        let mut table = users_table(executor.clone());

        table.prepare().await.unwrap();

        assert!(table.prepared());
        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1].0,
            "CREATE TABLE IF NOT EXISTS users (id INT PRIMARY KEY, name VARCHAR(50) NOT NULL);"
        );
        // Preparation binds every column to its owning table.
        assert!(table.columns().iter().all(|c| c.table() == Some("users")));
    }

    #[tokio::test]
    async fn prepare_fails_without_columns_when_table_absent() {
        let executor = Arc::new(MockExecutor::new());
        let database = Database::new(executor, "shop");
        let mut table = Table::new(database, "ghosts", vec![]);

        assert!(matches!(
            table.prepare().await,
            Err(DbError::Schema(_))
        ));
        assert!(!table.prepared());
    }

    #[tokio::test]
    async fn prepare_adopts_live_columns_when_none_declared() {
        let executor = Arc::new(MockExecutor::new());
        live_users_response(&executor);
        let database = Database::new(executor, "shop");
        let mut table = Table::new(database, "users", vec![]);

        table.prepare().await.unwrap();

        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.columns()[0].name(), "id");
        assert_eq!(table.columns()[1].sql_type().name(), "VARCHAR(50)");
    }

    #[tokio::test]
    async fn prepare_fails_on_schema_mismatch() {
        let executor = Arc::new(MockExecutor::new());
        // Live table only has the id column.
        executor.push_response(Rows::from_rows(vec![vec![text("users")]]));
        executor.push_response(Rows::from_rows(vec![vec![
            text("id"),
            text("int"),
            text("NO"),
            text("PRI"),
            SqlValue::Null,
        ]]));
        let mut table = users_table(executor);

        match table.prepare().await {
            Err(DbError::SchemaMismatch {
                declared_only,
                live_only,
            }) => {
                assert_eq!(declared_only, vec![String::from("name VARCHAR(50)")]);
                assert!(live_only.is_empty());
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
        assert!(!table.prepared());
    }

    #[tokio::test]
    async fn mismatch_is_symmetric() {
        // Declared {id, name} against live {id, email} lists one column on
        // each side; swapping the sets swaps the lists.
        let executor = Arc::new(MockExecutor::new());
        executor.push_response(Rows::from_rows(vec![vec![text("users")]]));
        executor.push_response(Rows::from_rows(vec![
            vec![text("id"), text("int"), text("NO"), text("PRI"), SqlValue::Null],
            vec![
                text("email"),
                text("varchar(50)"),
                text("YES"),
                text(""),
                SqlValue::Null,
            ],
        ]));
        let mut table = users_table(executor);

        match table.prepare().await {
            Err(DbError::SchemaMismatch {
                declared_only,
                live_only,
            }) => {
                assert_eq!(declared_only, vec![String::from("name VARCHAR(50)")]);
                assert_eq!(live_only, vec![String::from("email VARCHAR(50)")]);
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn prepare_is_idempotent() {
        let executor = Arc::new(MockExecutor::new());
        let mut table = users_table(executor.clone());
        table.prepare().await.unwrap();

        // Second round: the table now exists and matches the declaration.
        live_users_response(&executor);
        table.prepare().await.unwrap();

        assert!(table.prepared());
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.columns()[0].name(), "id");
    }

    #[tokio::test]
    async fn crud_is_guarded_before_prepare() {
        let executor = Arc::new(MockExecutor::new());
        let table = users_table(executor.clone());

        let err = table
            .insert(None, vec![SqlValue::Int(1), text("Ann")])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotPrepared(name) if name == "users"));
        // The guard fires before anything reaches the executor.
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn insert_binds_cast_parameters() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;

        table
            .insert(Some(&["id", "name"]), vec![SqlValue::Int(1), text("Ann")])
            .await
            .unwrap();

        let calls = executor.calls();
        let (statement, params) = calls.last().unwrap();
        assert_eq!(statement, "INSERT INTO users (id, name) VALUES (?, ?)");
        assert_eq!(params, &vec![SqlValue::Int(1), text("Ann")]);
    }

    #[tokio::test]
    async fn unknown_column_fails_resolution() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor).await;

        let err = table
            .insert(Some(&["id", "nickname"]), vec![SqlValue::Int(1), text("x")])
            .await
            .unwrap_err();
        assert!(
            matches!(err, DbError::UnknownColumn { column, table } if column == "nickname" && table == "users")
        );
    }

    #[tokio::test]
    async fn set_inserts_when_probe_finds_nothing() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;

        table
            .set(
                Some(&["id", "name"]),
                vec![SqlValue::Int(1), text("Ann")],
                Some(Where::eq("id", 1)),
            )
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(
            calls[calls.len() - 2].0,
            "SELECT id, name FROM users WHERE id = ?"
        );
        assert!(calls.last().unwrap().0.starts_with("INSERT INTO users"));
    }

    #[tokio::test]
    async fn set_updates_when_probe_finds_a_row() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;

        executor.push_response(Rows::from_rows(vec![vec![SqlValue::Int(1), text("Bob")]]));
        table
            .set(
                Some(&["name"]),
                vec![text("Ann")],
                Some(Where::eq("id", 1)),
            )
            .await
            .unwrap();

        let calls = executor.calls();
        assert_eq!(
            calls.last().unwrap().0,
            "UPDATE users SET name = ? WHERE id = ?"
        );
    }

    #[tokio::test]
    async fn count_rows_parses_the_scalar() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;

        executor.push_response(Rows::from_rows(vec![vec![SqlValue::Int(42)]]));
        assert_eq!(table.count_rows().await.unwrap(), 42);
        assert_eq!(
            executor.calls().last().unwrap().0,
            "SELECT COUNT(*) FROM users;"
        );
    }

    #[tokio::test]
    async fn foreign_column_requires_a_prepared_table() {
        let executor = Arc::new(MockExecutor::new());
        let unprepared = users_table(executor.clone());

        let err = Column::foreign("owner", &unprepared, "id", &[]).unwrap_err();
        assert!(matches!(err, DbError::Schema(_)));

        let prepared = prepared_users(executor).await;
        let column = Column::foreign("owner", &prepared, "id", &[NOT_NULL]).unwrap();
        assert_eq!(column.sql_type().name(), "INT");
        assert_eq!(
            column.definition_sql().unwrap(),
            "owner INT NOT NULL REFERENCES users(id)"
        );
    }

    #[tokio::test]
    async fn foreign_of_derives_the_name_from_the_reference() {
        let executor = Arc::new(MockExecutor::new());

        // Unbound columns carry no table yet, so there is nothing to
        // reference.
        let loose = Column::new("id", SqlType::integer());
        assert!(matches!(
            Column::foreign_of(&loose, &[]),
            Err(DbError::Schema(_))
        ));

        let prepared = prepared_users(executor).await;
        let column = Column::foreign_of(prepared.column("id").unwrap(), &[NOT_NULL]).unwrap();
        assert_eq!(column.name(), "id of users");
        assert_eq!(
            column.definition_sql().unwrap(),
            "id of users INT NOT NULL REFERENCES users(id)"
        );
    }

    #[tokio::test]
    async fn foreign_column_reference_must_resolve() {
        let executor = Arc::new(MockExecutor::new());
        let prepared = prepared_users(executor).await;

        let err = Column::foreign("owner", &prepared, "missing", &[]).unwrap_err();
        assert!(matches!(err, DbError::Schema(_)));
    }

    #[test]
    fn columns_are_sorted_by_declaration_order() {
        let executor = Arc::new(MockExecutor::new());
        let database = Database::new(executor, "shop");
        let table = Table::new(
            database,
            "t",
            vec![
                Column::new("c", SqlType::integer()),
                Column::new("a", SqlType::integer()).order(1),
                Column::new("b", SqlType::integer()).order(1),
            ],
        );
        let names: Vec<&str> = table.columns().iter().map(Column::name).collect();
        // Ordered columns first; ties keep declaration order; unordered last.
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
