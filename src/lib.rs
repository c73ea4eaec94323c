//! # sqlx-typed-bind
//!
//! Typed table mappings and statically shaped queries for MySQL over SQLx.
//!
//! A table is declared once as a list of columns, each bound to a field of a
//! plain Rust struct. Queries are composed from that table and rendered into
//! parameterized SQL with one bind slot per `?`, in text order. Rows are read
//! back into the same struct without reflection or `FromRow`.
//!
//! ## Features
//!
//! - **Typed Columns**: Field types map to SQL types through a closed set;
//!   an unsupported field type does not compile
//! - **Composable Queries**: `select`/`insert`/`update`/`delete` followed by
//!   `filter` (`WHERE`), `set` (`SET`) and `limit` (`LIMIT`)
//! - **Checked Operands**: Comparing a column with a value of another type
//!   does not compile; an `UPDATE` without `SET` cannot be executed
//! - **Variables**: [`Var`] values are re-read before every execution of a
//!   prepared statement
//! - **Schemas**: A [`Database`] holds one table per model and builds queries
//!   from the model type alone
//! - **Generic Executor Support**: Works with `MySqlPool`, `Transaction`, and
//!   any SQLx `Executor`
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["mysql", "runtime-tokio"] }
//! sqlx-typed-bind = "0.1"
//! ```
//!
//! ## Examples
//!
//! ### Declaring a Table
//!
//! ```rust
//! use sqlx_typed_bind::prelude::*;
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Record {
//!     id: u32,
//!     i: i32,
//!     s: String,
//!     note: Option<String>,
//! }
//!
//! let records = Table::builder("records")
//!     .column(make_column(
//!         "id",
//!         field!(Record, id),
//!         &[Constraint::PrimaryKey, Constraint::Autoincrement],
//!     )?)
//!     .column(make_column("i", field!(Record, i), &[])?)
//!     .column(make_column("s", field!(Record, s), &[])?)
//!     .column(make_varchar("note", 64, field!(Record, note), &[])?)
//!     .build()?;
//!
//! assert_eq!(
//!     records.schema(),
//!     "CREATE TABLE `records` (\n  \
//!      `id` INTEGER UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT,\n  \
//!      `i` INTEGER NOT NULL,\n  \
//!      `s` TEXT NOT NULL,\n  \
//!      `note` VARCHAR(64)\n)"
//! );
//! # Ok::<(), sqlx_typed_bind::Error>(())
//! ```
//!
//! ### Querying
//!
//! ```rust,no_run
//! use sqlx::MySqlPool;
//! use sqlx_typed_bind::prelude::*;
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct Record {
//!     id: u32,
//!     i: i32,
//!     s: String,
//! }
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let pool = MySqlPool::connect("mysql://localhost/test").await?;
//! let records = Table::builder("records")
//!     .column(make_column("id", field!(Record, id), &[Constraint::PrimaryKey, Constraint::Autoincrement])?)
//!     .column(make_column("i", field!(Record, i), &[])?)
//!     .column(make_column("s", field!(Record, s), &[])?)
//!     .build()?;
//! records.recreate(&pool).await?;
//!
//! let record = Record { id: 0, i: 4, s: "four".to_owned() };
//! let id = records
//!     .insert_all_but(&[field!(Record, id).attr()])?
//!     .values(&record)
//!     .prepare()?
//!     .execute(&pool)
//!     .await?;
//!
//! let fours = records
//!     .select()
//!     .filter(col(field!(Record, i)).eq(4))
//!     .prepare()?
//!     .fetch_all(&pool)
//!     .await?;
//! assert_eq!(fours[0].id as u64, id);
//!
//! let changed = records
//!     .update()
//!     .set(col(field!(Record, i)).assign(3))
//!     .filter(col(field!(Record, id)).eq(2))
//!     .prepare()?
//!     .execute(&pool)
//!     .await?;
//! println!("Updated {} rows", changed);
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **Render**: Each query layer appends its SQL fragment and reports how many
//!    `?` placeholders it added
//! 2. **Bind**: Each layer binds its parameters after the ones of the layer it
//!    wraps, so slot order equals placeholder order
//! 3. **Execute**: A fresh SQLx query is built from the stored text and slots on
//!    each execution; result rows are decoded into output slots and finalized
//!    into the model struct
//!
//! ## Limitations
//!
//! - Only MySQL is supported
//! - Table and column names must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Only single-table statements: no joins, grouping or ordering
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod bind;
pub mod builder;
pub mod column;
pub mod constraints;
pub mod continuation;
pub mod database;
pub mod datetime;
pub mod error;
pub mod expr;
pub mod query;
pub mod statement;
pub mod table;
pub mod value;

pub use column::{make_column, make_varchar, AnyColumn, Attr, Column, Field};
pub use constraints::{Constraint, Constraints, Tristate};
pub use continuation::{Limit, LimitValue, Set, Where};
pub use database::{Database, DatabaseBuilder};
pub use datetime::{MysqlTime, Tm};
pub use error::{Error, Result};
pub use expr::{col, Assignments, Col, Condition, Expression, Operand, Var};
pub use query::{Delete, Insert, Query, ReadQuery, Select, Update, WriteQuery};
pub use statement::{execute_raw, Statement};
pub use table::{make_table, Table, TableBuilder};
pub use value::{SqlField, SqlKind};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::column::{make_column, make_varchar, AnyColumn, Attr};
    pub use crate::constraints::Constraint;
    pub use crate::database::Database;
    pub use crate::datetime::Tm;
    pub use crate::error::Error;
    pub use crate::expr::{col, Expression, Var};
    pub use crate::field;
    pub use crate::query::{Query, ReadQuery, WriteQuery};
    pub use crate::statement::Statement;
    pub use crate::table::Table;
}
