//! Column declarations.

use tabula_core::{SqlTag, SqlType, SqlValue, NOT_NULL, PRIMARY};

use crate::error::{DbError, Result};
use crate::table::Table;

/// A foreign-key reference to another table's column, stored by name so a
/// column never holds the referenced table itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignRef {
    /// Referenced table name.
    pub table: String,
    /// Referenced column name.
    pub column: String,
}

/// A declared column: a name, a typed descriptor, modifier tags, and an
/// optional default.
///
/// Identity is `(name, type)` only; tags and defaults do not participate in
/// equality or hashing, which is what schema reconciliation compares.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    sql_type: SqlType,
    tags: Vec<SqlTag>,
    default: Option<SqlValue>,
    order: Option<u32>,
    table: Option<String>,
    reference: Option<ForeignRef>,
}

impl Column {
    /// Declares a column.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            tags: Vec::new(),
            default: None,
            order: None,
            table: None,
            reference: None,
        }
    }

    /// Declares a foreign column referencing `reference` on `table`.
    ///
    /// The type is always inherited from the referenced column and only
    /// `NOT_NULL` survives from the supplied tags. Fails with
    /// [`DbError::Schema`] when the referenced table has not been prepared
    /// or the reference does not resolve to one of its columns.
    pub fn foreign(
        name: impl Into<String>,
        table: &Table,
        reference: &str,
        tags: &[SqlTag],
    ) -> Result<Self> {
        if !table.prepared() {
            return Err(DbError::Schema(format!(
                "cannot reference table '{}' before it is prepared",
                table.name()
            )));
        }
        let referenced = table.column(reference).ok_or_else(|| {
            DbError::Schema(format!(
                "reference '{reference}' does not resolve to a column of '{}'",
                table.name()
            ))
        })?;

        let mut column = Self::new(name, referenced.sql_type().clone());
        if tags.contains(&NOT_NULL) {
            column = column.tag(NOT_NULL);
        }
        column.reference = Some(ForeignRef {
            table: table.name().to_string(),
            column: referenced.name().to_string(),
        });
        Ok(column)
    }

    /// Declares a foreign column directly from the referenced column,
    /// deriving the name `"{column} of {table}"`.
    ///
    /// The referenced column must already be bound to its table, which only
    /// happens during preparation; otherwise this fails with
    /// [`DbError::Schema`]. Type inheritance and tag filtering follow
    /// [`Column::foreign`].
    pub fn foreign_of(column: &Column, tags: &[SqlTag]) -> Result<Self> {
        let table = column.table().ok_or_else(|| {
            DbError::Schema(format!(
                "column '{}' is not bound to a prepared table",
                column.name()
            ))
        })?;

        let mut foreign = Self::new(
            format!("{} of {}", column.name(), table),
            column.sql_type().clone(),
        );
        if tags.contains(&NOT_NULL) {
            foreign = foreign.tag(NOT_NULL);
        }
        foreign.reference = Some(ForeignRef {
            table: table.to_string(),
            column: column.name().to_string(),
        });
        Ok(foreign)
    }

    /// Attaches a modifier tag. `PRIMARY` drops `NOT_NULL` from the set
    /// since a primary key column need not repeat it.
    #[must_use]
    pub fn tag(mut self, tag: SqlTag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        if self.tags.contains(&PRIMARY) {
            self.tags.retain(|t| *t != NOT_NULL);
        }
        self
    }

    /// Sets an explicit default value.
    #[must_use]
    pub fn default(mut self, value: SqlValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the declaration order; unordered columns keep their declaration
    /// position and sort after ordered ones.
    #[must_use]
    pub fn order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column's type descriptor.
    #[must_use]
    pub fn sql_type(&self) -> &SqlType {
        &self.sql_type
    }

    /// The modifier tags.
    #[must_use]
    pub fn tags(&self) -> &[SqlTag] {
        &self.tags
    }

    /// The declaration order, if one was given.
    #[must_use]
    pub fn declaration_order(&self) -> Option<u32> {
        self.order
    }

    /// The foreign reference, for foreign columns.
    #[must_use]
    pub fn reference(&self) -> Option<&ForeignRef> {
        self.reference.as_ref()
    }

    /// The owning table's name, set exactly once during preparation.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// The effective default: the explicit one, or the type's own default
    /// when the column is tagged `NOT_NULL` or `PRIMARY`.
    #[must_use]
    pub fn default_value(&self) -> Option<SqlValue> {
        if let Some(default) = &self.default {
            return Some(default.clone());
        }
        if self.tags.contains(&NOT_NULL) || self.tags.contains(&PRIMARY) {
            return Some(self.sql_type.default_value().clone());
        }
        None
    }

    /// Renders the column-definition SQL fragment:
    /// `name TYPE [tags...] [DEFAULT literal] [REFERENCES table(column)]`.
    ///
    /// Only explicit defaults are rendered; the derived default exists for
    /// value semantics, not for DDL text.
    pub fn definition_sql(&self) -> Result<String> {
        let mut sql = format!("{} {}", self.name, self.sql_type.name());
        for tag in &self.tags {
            sql.push(' ');
            sql.push_str(tag.sql());
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.sql_type.parse(default)?);
        }
        if let Some(reference) = &self.reference {
            sql.push_str(&format!(
                " REFERENCES {}({})",
                reference.table, reference.column
            ));
        }
        Ok(sql)
    }

    /// Casts a value through this column's type.
    pub fn cast(&self, value: &SqlValue) -> Result<SqlValue> {
        Ok(self.sql_type.cast(value)?)
    }

    pub(crate) fn bind_table(&mut self, table: &str) {
        if self.table.is_none() {
            self.table = Some(table.to_string());
        }
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.sql_type == other.sql_type
    }
}

impl Eq for Column {}

impl std::hash::Hash for Column {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.sql_type.hash(state);
    }
}
