use tracing::warn;

use tabula_core::{SqlValue, Where};

use crate::error::{DbError, Result};
use crate::executor::{Row, Rows};
use crate::table::Table;

use super::{name_refs, owned_names};

/// A single-use SELECT command.
///
/// Built through [`Table::select`], refined with the chainable methods, and
/// consumed by [`Select::execute`] or [`Select::execute_one`].
#[must_use = "a select does nothing until executed"]
pub struct Select<'t> {
    table: &'t Table,
    columns: Option<Vec<String>>,
    filter: Option<Where>,
    order: Option<String>,
    descending: bool,
    limit: Option<u64>,
    offset: Option<u64>,
    executed: bool,
}

impl<'t> Select<'t> {
    pub(crate) fn new(table: &'t Table) -> Self {
        Self {
            table,
            columns: None,
            filter: None,
            order: None,
            descending: false,
            limit: None,
            offset: None,
            executed: false,
        }
    }

    /// Restricts the projection to the named columns.
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = owned_names(Some(columns));
        self
    }

    /// Adds a WHERE clause.
    pub fn filter(mut self, filter: Where) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Orders the result by the named column, ascending by default.
    pub fn order_by(mut self, column: &str) -> Self {
        self.order = Some(column.to_string());
        self
    }

    /// Flips the ordering to descending.
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    /// Caps the number of returned rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` rows.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn render(&self) -> Result<(String, Vec<SqlValue>)> {
        let projection = match self.table.resolve_columns(name_refs(&self.columns).as_deref())? {
            Some(columns) => columns
                .iter()
                .map(|column| column.name())
                .collect::<Vec<_>>()
                .join(", "),
            None => String::from("*"),
        };

        let mut sql = format!("SELECT {projection} FROM {}", self.table.name());
        let mut params = Vec::new();

        if let Some(filter) = &self.filter {
            let (clause, clause_params) = filter.build();
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            params.extend(clause_params);
        }

        if let Some(order) = &self.order {
            let column = self.table.column(order).ok_or_else(|| DbError::UnknownColumn {
                column: order.clone(),
                table: self.table.name().to_string(),
            })?;
            sql.push_str(" ORDER BY ");
            sql.push_str(column.name());
            sql.push_str(if self.descending { " DESC" } else { " ASC" });
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // MySQL has no standalone OFFSET; the documented idiom is an
            // unbounded LIMIT in front of it.
            (None, Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {offset}", u64::MAX));
            }
            (None, None) => {}
        }

        Ok((sql, params))
    }

    /// Executes the select and buffers the result.
    pub async fn execute(mut self) -> Result<Rows> {
        self.executed = true;
        self.table.ensure_prepared()?;
        let (sql, params) = self.render()?;
        self.table.database().execute(&sql, &params).await
    }

    /// Executes the select expecting at most one row.
    ///
    /// Fails with [`DbError::MultipleRowsReturned`] when the result holds
    /// more than one.
    pub async fn execute_one(self) -> Result<Option<Row>> {
        let result = self.execute().await?;
        match result.len() {
            0 => Ok(None),
            1 => Ok(result.rows.into_iter().next()),
            _ => Err(DbError::MultipleRowsReturned),
        }
    }
}

impl Drop for Select<'_> {
    fn drop(&mut self) {
        if !self.executed && !std::thread::panicking() {
            warn!(table = %self.table.name(), "select command dropped without being executed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::error::DbError;
    use crate::executor::mock::MockExecutor;
    use crate::executor::Rows;
    use crate::table::fixtures::prepared_users;
    use tabula_core::{SqlValue, Where};

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(String::from(s))
    }

    #[tokio::test]
    async fn renders_the_full_clause_chain() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;

        table
            .select()
            .columns(&["name"])
            .filter(Where::gt("id", 10).and(Where::like("name", "A%")))
            .order_by("id")
            .descending()
            .limit(5)
            .offset(10)
            .execute()
            .await
            .unwrap();

        let (statement, params) = executor.calls().last().unwrap().clone();
        assert_eq!(
            statement,
            "SELECT name FROM users WHERE (id > ?) AND (name LIKE ?) ORDER BY id DESC LIMIT 5 OFFSET 10"
        );
        assert_eq!(params, vec![SqlValue::Int(10), text("A%")]);
    }

    #[tokio::test]
    async fn defaults_to_a_wildcard_projection() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;

        table.select().execute().await.unwrap();
        assert_eq!(executor.calls().last().unwrap().0, "SELECT * FROM users");
    }

    #[tokio::test]
    async fn execute_one_enforces_cardinality() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;

        assert_eq!(table.select().execute_one().await.unwrap(), None);

        executor.push_response(Rows::from_rows(vec![vec![SqlValue::Int(1), text("Ann")]]));
        let row = table.select().execute_one().await.unwrap();
        assert_eq!(row, Some(vec![SqlValue::Int(1), text("Ann")]));

        executor.push_response(Rows::from_rows(vec![
            vec![SqlValue::Int(1), text("Ann")],
            vec![SqlValue::Int(2), text("Bob")],
        ]));
        assert!(matches!(
            table.select().execute_one().await,
            Err(DbError::MultipleRowsReturned)
        ));
    }

    #[tokio::test]
    async fn unknown_order_column_fails() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor).await;

        let err = table.select().order_by("age").execute().await.unwrap_err();
        assert!(matches!(err, DbError::UnknownColumn { column, .. } if column == "age"));
    }

    #[tokio::test]
    async fn dropping_without_executing_reaches_no_executor() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;
        let before = executor.call_count();

        drop(table.select().filter(Where::eq("id", 1)));
        assert_eq!(executor.call_count(), before);
    }
}
