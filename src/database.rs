//! A set of tables, looked up by model type.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use sqlx::{Acquire, MySql};

use crate::column::Attr;
use crate::error::{Error, Result};
use crate::query::{Delete, Insert, Select, Update};
use crate::statement::execute_raw;
use crate::table::Table;

trait AnyTable: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> String;

    fn drop_statement(&self) -> String;

    fn as_any(&self) -> &dyn Any;
}

impl<M: 'static> AnyTable for Table<M> {
    fn name(&self) -> &str {
        Table::name(self)
    }

    fn schema(&self) -> String {
        Table::schema(self)
    }

    fn drop_statement(&self) -> String {
        Table::drop_statement(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The tables of one schema, at most one per model type.
///
/// Queries are built from the model alone: `db.get_all::<Record>()` finds
/// the `Table<Record>` and starts a `SELECT` on it. Schema statements run
/// over every table, in registration order.
///
/// # Examples
///
/// ```
/// use sqlx_typed_bind::prelude::*;
///
/// #[derive(Debug, Default)]
/// struct Record {
///     id: u32,
///     s: String,
/// }
///
/// #[derive(Debug, Default)]
/// struct Tag {
///     name: String,
/// }
///
/// let db = Database::builder()
///     .table(
///         Table::builder("records")
///             .column(make_column("id", field!(Record, id), &[Constraint::PrimaryKey])?)
///             .column(make_column("s", field!(Record, s), &[])?)
///             .build()?,
///     )
///     .table(
///         Table::builder("tags")
///             .column(make_varchar("name", 16, field!(Tag, name), &[])?)
///             .build()?,
///     )
///     .build()?;
///
/// assert_eq!(db.table::<Tag>()?.name(), "tags");
/// assert_eq!(
///     db.get_all::<Record>()?.sql()?,
///     "SELECT `id`, `s` FROM `records`"
/// );
/// # Ok::<(), sqlx_typed_bind::Error>(())
/// ```
pub struct Database {
    tables: Vec<Box<dyn AnyTable>>,
    models: HashMap<TypeId, usize>,
}

/// Builds a [`Database`] one table at a time.
#[derive(Default)]
pub struct DatabaseBuilder {
    tables: Vec<Box<dyn AnyTable>>,
    models: Vec<(TypeId, &'static str)>,
}

impl DatabaseBuilder {
    pub fn table<M: 'static>(mut self, table: Table<M>) -> Self {
        self.tables.push(Box::new(table));
        self.models.push((TypeId::of::<M>(), type_name::<M>()));
        self
    }

    /// # Errors
    ///
    /// Fails with [`Error::DuplicateTable`] if two tables share a name or
    /// map the same model.
    pub fn build(self) -> Result<Database> {
        let mut models = HashMap::new();
        for (index, (model, _)) in self.models.iter().enumerate() {
            let table = self.tables[index].name();
            if models.insert(*model, index).is_some()
                || self.tables[..index].iter().any(|t| t.name() == table)
            {
                return Err(Error::DuplicateTable(table.to_owned()));
            }
        }
        Ok(Database {
            tables: self.tables,
            models,
        })
    }
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// The table mapping `M`.
    pub fn table<M: 'static>(&self) -> Result<&Table<M>> {
        self.models
            .get(&TypeId::of::<M>())
            .and_then(|&index| self.tables[index].as_any().downcast_ref::<Table<M>>())
            .ok_or(Error::TableNotFound(type_name::<M>()))
    }

    /// Table names, in registration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tables.iter().map(|table| table.name())
    }

    pub fn get_all<M: 'static>(&self) -> Result<Select<'_, M>> {
        Ok(self.table::<M>()?.get_all())
    }

    pub fn select_only<M: 'static>(&self, attrs: &[Attr<M>]) -> Result<Select<'_, M>> {
        self.table::<M>()?.select_only(attrs)
    }

    /// `INSERT` of every column, bound to `record`.
    pub fn insert<'a, M: 'static>(&'a self, record: &'a M) -> Result<Insert<'a, M>> {
        Ok(self.table::<M>()?.insert().values(record))
    }

    pub fn insert_only<'a, M: 'static>(
        &'a self,
        attrs: &[Attr<M>],
        record: &'a M,
    ) -> Result<Insert<'a, M>> {
        Ok(self.table::<M>()?.insert_only(attrs)?.values(record))
    }

    /// `INSERT` of every column but `attrs`, bound to `record`.
    pub fn insert_all_but<'a, M: 'static>(
        &'a self,
        attrs: &[Attr<M>],
        record: &'a M,
    ) -> Result<Insert<'a, M>> {
        Ok(self.table::<M>()?.insert_all_but(attrs)?.values(record))
    }

    pub fn update<M: 'static>(&self) -> Result<Update<'_, M>> {
        Ok(self.table::<M>()?.update())
    }

    pub fn delete<M: 'static>(&self) -> Result<Delete<'_, M>> {
        Ok(self.table::<M>()?.delete())
    }

    /// The `CREATE TABLE` statements [`create`](Database::create) runs.
    pub fn create_statements(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.schema()).collect()
    }

    /// The `DROP TABLE` statements [`drop`](Database::drop) runs.
    pub fn drop_statements(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.drop_statement()).collect()
    }

    /// The statements [`recreate`](Database::recreate) runs: each table is
    /// dropped then created before moving on to the next.
    pub fn recreate_statements(&self) -> Vec<String> {
        self.tables
            .iter()
            .flat_map(|table| [table.drop_statement(), table.schema()])
            .collect()
    }

    /// Creates every table.
    pub async fn create<'a, A>(&self, executor: A) -> Result<()>
    where
        A: Acquire<'a, Database = MySql>,
    {
        run_all(executor, self.create_statements()).await
    }

    /// Drops every table that exists.
    pub async fn drop<'a, A>(&self, executor: A) -> Result<()>
    where
        A: Acquire<'a, Database = MySql>,
    {
        run_all(executor, self.drop_statements()).await
    }

    /// Drops and creates every table.
    pub async fn recreate<'a, A>(&self, executor: A) -> Result<()>
    where
        A: Acquire<'a, Database = MySql>,
    {
        run_all(executor, self.recreate_statements()).await
    }
}

async fn run_all<'a, A>(executor: A, statements: Vec<String>) -> Result<()>
where
    A: Acquire<'a, Database = MySql>,
{
    let mut conn = executor.acquire().await?;
    for sql in &statements {
        execute_raw(&mut *conn, sql).await?;
    }
    Ok(())
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("tables", &self.table_names().collect::<Vec<_>>())
            .finish()
    }
}
