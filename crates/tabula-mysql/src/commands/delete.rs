use tracing::warn;

use tabula_core::{SqlValue, Where};

use crate::error::{DbError, Result};
use crate::table::Table;

/// A single-use DELETE command.
#[must_use = "a delete does nothing until executed"]
pub struct Delete<'t> {
    table: &'t Table,
    filter: Option<Where>,
    executed: bool,
}

impl<'t> Delete<'t> {
    pub(crate) fn new(table: &'t Table, filter: Option<Where>) -> Self {
        Self {
            table,
            filter,
            executed: false,
        }
    }

    fn render(&self) -> (String, Vec<SqlValue>) {
        let mut sql = format!("DELETE FROM {}", self.table.name());
        let mut params = Vec::new();
        if let Some(filter) = &self.filter {
            let (clause, clause_params) = filter.build();
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            params = clause_params;
        }
        (sql, params)
    }

    /// Executes the delete, returning the number of affected rows.
    ///
    /// A delete without a filter clears the table and is refused while the
    /// database safety guard is on.
    pub async fn execute(mut self) -> Result<u64> {
        self.executed = true;
        self.table.ensure_prepared()?;
        if self.filter.is_none() && self.table.database().safe() {
            return Err(DbError::SafetyGuard {
                operation: "DELETE",
                table: self.table.name().to_string(),
            });
        }
        let (sql, params) = self.render();
        let result = self.table.database().execute(&sql, &params).await?;
        Ok(result.rows_affected)
    }
}

impl Drop for Delete<'_> {
    fn drop(&mut self) {
        if !self.executed && !std::thread::panicking() {
            warn!(table = %self.table.name(), "delete command dropped without being executed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::error::DbError;
    use crate::executor::mock::MockExecutor;
    use crate::table::fixtures::{prepared_users, prepared_users_without_safety};
    use tabula_core::{SqlValue, Where};

    #[tokio::test]
    async fn filtered_delete_binds_its_parameters() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;

        table.delete(Some(Where::lt("id", 100))).await.unwrap();

        let (statement, params) = executor.calls().last().unwrap().clone();
        assert_eq!(statement, "DELETE FROM users WHERE id < ?");
        assert_eq!(params, vec![SqlValue::Int(100)]);
    }

    #[tokio::test]
    async fn unfiltered_delete_is_refused_while_safe() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users(executor.clone()).await;
        let before = executor.call_count();

        let err = table.delete(None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::SafetyGuard {
                operation: "DELETE",
                ..
            }
        ));
        assert_eq!(executor.call_count(), before);
    }

    #[tokio::test]
    async fn unfiltered_delete_runs_once_safety_is_removed() {
        let executor = Arc::new(MockExecutor::new());
        let table = prepared_users_without_safety(executor.clone()).await;

        table.delete(None).await.unwrap();
        assert_eq!(executor.calls().last().unwrap().0, "DELETE FROM users");
    }
}
