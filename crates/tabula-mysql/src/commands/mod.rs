//! Single-use SQL commands.
//!
//! Each command is built against a prepared [`Table`](crate::table::Table),
//! renders its statement with `?` placeholders, and is consumed by its
//! `execute` method. A command dropped without being executed logs a
//! warning, since building one and never running it is almost always a bug.

mod delete;
mod insert;
mod select;
mod update;

pub use delete::Delete;
pub use insert::Insert;
pub use select::Select;
pub use update::Update;

/// Borrows an owned column-name list as the resolver's input shape.
fn name_refs(columns: &Option<Vec<String>>) -> Option<Vec<&str>> {
    columns
        .as_ref()
        .map(|names| names.iter().map(String::as_str).collect())
}

fn owned_names(columns: Option<&[&str]>) -> Option<Vec<String>> {
    columns.map(|names| names.iter().map(|name| (*name).to_string()).collect())
}
