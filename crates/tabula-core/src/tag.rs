//! Column modifier tags.

/// A column modifier attached as metadata, carrying the literal SQL text
/// and whether it is a column-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SqlTag {
    sql: &'static str,
    column_constraint: bool,
}

impl SqlTag {
    /// Creates a tag from literal SQL text.
    #[must_use]
    pub const fn new(sql: &'static str, column_constraint: bool) -> Self {
        Self {
            sql,
            column_constraint,
        }
    }

    /// The literal SQL text of the tag.
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        self.sql
    }

    /// Whether the tag is a column-level constraint.
    #[must_use]
    pub const fn is_column_constraint(&self) -> bool {
        self.column_constraint
    }
}

/// `NOT NULL` column constraint.
pub const NOT_NULL: SqlTag = SqlTag::new("NOT NULL", true);

/// `PRIMARY KEY` column constraint. A primary key column need not repeat
/// NOT NULL; the column model drops it from the tag set.
pub const PRIMARY: SqlTag = SqlTag::new("PRIMARY KEY", true);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tags() {
        assert_eq!(NOT_NULL.sql(), "NOT NULL");
        assert_eq!(PRIMARY.sql(), "PRIMARY KEY");
        assert!(NOT_NULL.is_column_constraint());
        assert_ne!(NOT_NULL, PRIMARY);
    }
}
