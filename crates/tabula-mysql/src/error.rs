//! Error types for the database-facing layer.

use thiserror::Error;

use tabula_core::TypeError;

/// Errors raised by schema preparation and command execution.
#[derive(Debug, Error)]
pub enum DbError {
    /// Type definition or conversion failure from the core layer.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Missing columns or an invalid foreign reference at declaration or
    /// preparation time.
    #[error("schema error: {0}")]
    Schema(String),

    /// Declared and live schemas differ. Never auto-resolved; carries both
    /// one-sided difference lists for diagnostics.
    #[error(
        "declared columns do not match the existing table\n  declared only: {declared_only:?}\n  live only: {live_only:?}"
    )]
    SchemaMismatch {
        /// Columns declared in code but absent from the live table.
        declared_only: Vec<String>,
        /// Columns present in the live table but not declared.
        live_only: Vec<String>,
    },

    /// A CRUD operation was used before `prepare()`.
    #[error("table '{0}' is not prepared")]
    NotPrepared(String),

    /// A column reference did not resolve against the table's columns.
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn {
        /// The unresolved column reference.
        column: String,
        /// The table it was resolved against.
        table: String,
    },

    /// The value count does not match the resolved column count.
    #[error("column/value count mismatch: expected {expected}, got {actual}")]
    ColumnCountMismatch {
        /// Number of resolved columns.
        expected: usize,
        /// Number of supplied values.
        actual: usize,
    },

    /// An unfiltered UPDATE or DELETE was refused while the database
    /// safety guard is on.
    #[error(
        "unfiltered {operation} on table '{table}' refused; remove the database safety to allow it"
    )]
    SafetyGuard {
        /// The refused operation.
        operation: &'static str,
        /// The targeted table.
        table: String,
    },

    /// A single-row query returned more than one row.
    #[error("query returned more than one row when exactly one was expected")]
    MultipleRowsReturned,

    /// The executor could not reach the database and retries are exhausted.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
