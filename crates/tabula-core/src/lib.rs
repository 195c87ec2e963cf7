//! # tabula-core
//!
//! The pure SQL-text layer of tabula: typed scalar descriptors, column
//! modifier tags, character sets, and the predicate builder. Nothing in
//! this crate performs I/O; the database-facing layer lives in
//! `tabula-mysql`.
//!
//! - [`SqlType`] describes a scalar SQL type: canonical name, cast
//!   discipline, literal rendering, and a self-consistent default.
//! - [`TypeRegistry`] maps driver-reported type names back to registered
//!   descriptors during schema introspection.
//! - [`SqlTag`] carries column modifiers such as `NOT NULL` / `PRIMARY KEY`.
//! - [`Where`] builds boolean predicates serialized as
//!   `(SQL fragment, ordered parameters)` with no inlined values.
//!
//! ## Example
//!
//! ```
//! use tabula_core::{SqlType, SqlValue, Where};
//!
//! let ty = SqlType::string(50);
//! assert_eq!(ty.name(), "VARCHAR(50)");
//! assert_eq!(ty.cast(&SqlValue::Int(7)).unwrap(), SqlValue::Text("7".into()));
//!
//! let (sql, params) = Where::eq("id", 1).build();
//! assert_eq!(sql, "id = ?");
//! assert_eq!(params.len(), 1);
//! ```

mod charset;
mod error;
mod predicate;
mod tag;
mod types;
mod value;

pub use charset::Charset;
pub use error::{Result, TypeError};
pub use predicate::{CompareOp, Where};
pub use tag::{SqlTag, NOT_NULL, PRIMARY};
pub use types::{CastKind, SqlType, TypeRegistry};
pub use value::{SqlValue, ToSqlValue};
