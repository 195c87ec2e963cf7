use tracing::warn;

use tabula_core::{SqlValue, Where};

use crate::column::Column;
use crate::error::{DbError, Result};
use crate::table::Table;

use super::{name_refs, owned_names};

/// A single-use UPDATE command.
#[must_use = "an update does nothing until executed"]
pub struct Update<'t> {
    table: &'t Table,
    columns: Option<Vec<String>>,
    values: Vec<SqlValue>,
    filter: Option<Where>,
    executed: bool,
}

impl<'t> Update<'t> {
    pub(crate) fn new(
        table: &'t Table,
        columns: Option<&[&str]>,
        values: Vec<SqlValue>,
        filter: Option<Where>,
    ) -> Self {
        Self {
            table,
            columns: owned_names(columns),
            values,
            filter,
            executed: false,
        }
    }

    fn render(&self) -> Result<(String, Vec<SqlValue>)> {
        let targets: Vec<&Column> =
            match self.table.resolve_columns(name_refs(&self.columns).as_deref())? {
                Some(columns) => columns,
                None => self.table.columns().iter().collect(),
            };

        if targets.len() != self.values.len() {
            return Err(DbError::ColumnCountMismatch {
                expected: targets.len(),
                actual: self.values.len(),
            });
        }

        let mut params = targets
            .iter()
            .zip(&self.values)
            .map(|(column, value)| column.cast(value))
            .collect::<Result<Vec<_>>>()?;

        let assignments = targets
            .iter()
            .map(|column| format!("{} = ?", column.name()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("UPDATE {} SET {assignments}", self.table.name());

        if let Some(filter) = &self.filter {
            let (clause, clause_params) = filter.build();
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            params.extend(clause_params);
        }

        Ok((sql, params))
    }

    /// Executes the update, returning the number of affected rows.
    ///
    /// An update without a filter rewrites every row and is refused while
    /// the database safety guard is on.
    pub async fn execute(mut self) -> Result<u64> {
        self.executed = true;
        self.table.ensure_prepared()?;
        if self.filter.is_none() && self.table.database().safe() {
            return Err(DbError::SafetyGuard {
                operation: "UPDATE",
                table: self.table.name().to_string(),
            });
        }
        let (sql, params) = self.render()?;
        let result = self.table.database().execute(&sql, &params).await?;
        Ok(result.rows_affected)
    }
}

impl Drop for Update<'_> {
    fn drop(&mut self) {
        if !self.executed && !std::thread::panicking() {
            warn!(table = %self.table.name(), "update command dropped without being executed");
        }
    }
}
