//! SQL fragments and a small `SELECT` builder for shared-table queries.
//!
//! Everything here is pure string work: no connection, no shared state.
//! Queries come out as [`NativeQuery`] values with `$n` placeholders and
//! positional bindings, ready to be posted to the tables service.

pub mod bindings;
pub mod ethereum;
pub mod identifier;
pub mod literal;
pub mod select;

pub use bindings::{json_path_to_pg, position_bindings};
pub use identifier::{quote_identifier, quote_qualified};
pub use literal::{array_literal, escape_literal, escape_string, interpolate};
pub use select::{BuildError, NativeQuery, Order, Select};
