//! # tabula-mysql
//!
//! The database-facing layer of tabula: a MySQL-backed [`Database`] handle,
//! declared [`Table`]s reconciled against the live schema, and single-use
//! SQL commands.
//!
//! This crate provides:
//! - [`Database`] — statement dispatch, `SHOW TABLES` / `DESCRIBE`
//!   introspection, and charset synchronization over a shared [`Executor`]
//! - [`Table`] — an ordered column declaration prepared against the live
//!   schema before any query runs
//! - [`Column`] — typed column declarations, including foreign columns that
//!   inherit their type from a prepared table
//! - [`Select`], [`Insert`], [`Update`], [`Delete`] — single-use commands
//!   that render `?`-placeholder statements
//!
//! ## Quick Start
//!
//! ```ignore
//! use tabula_mysql::{Column, Database, DatabaseConfig, Table, Where};
//! use tabula_mysql::{SqlType, SqlValue, NOT_NULL, PRIMARY};
//!
//! async fn example() -> tabula_mysql::Result<()> {
//!     let config = DatabaseConfig::new("shop", "secret");
//!     let database = Database::connect(&config).await?;
//!
//!     let mut users = Table::new(
//!         database,
//!         "users",
//!         vec![
//!             Column::new("id", SqlType::integer()).tag(PRIMARY),
//!             Column::new("name", SqlType::string(50)).tag(NOT_NULL),
//!         ],
//!     );
//!     users.prepare().await?;
//!
//!     users
//!         .insert(None, vec![SqlValue::Int(1), SqlValue::Text("Ann".into())])
//!         .await?;
//!
//!     let row = users
//!         .select()
//!         .filter(Where::eq("id", 1))
//!         .execute_one()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Schema reconciliation
//!
//! [`Table::prepare`] creates an absent table from the declaration, adopts
//! the live columns when the declaration is empty, and otherwise requires
//! the two column sets to agree on `(name, type)`. It never alters an
//! existing table; a disagreement fails with
//! [`DbError::SchemaMismatch`] listing both one-sided differences.

mod column;
mod commands;
mod config;
mod database;
mod error;
mod executor;
mod table;

pub use column::{Column, ForeignRef};
pub use commands::{Delete, Insert, Select, Update};
pub use config::{CharsetConfig, DatabaseConfig};
pub use database::Database;
pub use error::{DbError, Result};
pub use executor::{Executor, MySqlExecutor, Row, Rows};
pub use table::Table;

// Re-export commonly used types from tabula-core
pub use tabula_core::{
    Charset, SqlTag, SqlType, SqlValue, ToSqlValue, TypeRegistry, Where, NOT_NULL, PRIMARY,
};
