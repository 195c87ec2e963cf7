use tracing::warn;

use tabula_core::SqlValue;

use crate::column::Column;
use crate::error::{DbError, Result};
use crate::table::Table;

use super::{name_refs, owned_names};

/// A single-use INSERT command for one row.
#[must_use = "an insert does nothing until executed"]
pub struct Insert<'t> {
    table: &'t Table,
    columns: Option<Vec<String>>,
    values: Vec<SqlValue>,
    executed: bool,
}

impl<'t> Insert<'t> {
    pub(crate) fn new(
        table: &'t Table,
        columns: Option<&[&str]>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            table,
            columns: owned_names(columns),
            values,
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

        let params = targets
            .iter()
            .zip(&self.values)
            .map(|(column, value)| column.cast(value))
            .collect::<Result<Vec<_>>>()?;

        let names: Vec<&str> = targets.iter().map(|column| column.name()).collect();
        let placeholders = vec!["?"; targets.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table.name(),
            names.join(", "),
            placeholders
        );
        Ok((sql, params))
    }

    /// Executes the insert, returning the number of affected rows.
    pub async fn execute(mut self) -> Result<u64> {
        self.executed = true;
        self.table.ensure_prepared()?;
        let (sql, params) = self.render()?;
        let result = self.table.database().execute(&sql, &params).await?;
        Ok(result.rows_affected)
    }
}

impl Drop for Insert<'_> {
    fn drop(&mut self) {
        if !self.executed && !std::thread::panicking() {
            warn!(table = %self.table.name(), "insert command dropped without being executed");
        }
    }
}
