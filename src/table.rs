//! Tables: an ordered, named set of columns over one model type.

use std::collections::HashSet;
use std::fmt;

use sqlx::{Acquire, Executor, MySql};

use crate::builder::check_identifier;
use crate::column::{AnyColumn, Attr};
use crate::error::{Error, Result};
use crate::query::{Delete, Insert, Select, Update};
use crate::statement::execute_raw;

/// The mapping of model `M` to a database table.
///
/// Every column maps a field of the same `M`, so mixing models does not
/// compile. A table is immutable once built and is shared by reference with
/// the queries built from it.
pub struct Table<M> {
    name: String,
    columns: Vec<Box<dyn AnyColumn<M>>>,
}

/// Builds a [`Table`] one column at a time.
pub struct TableBuilder<M> {
    name: String,
    columns: Vec<Box<dyn AnyColumn<M>>>,
}

impl<M> TableBuilder<M> {
    pub fn column<C>(mut self, column: C) -> Self
    where
        C: AnyColumn<M> + 'static,
    {
        self.columns.push(Box::new(column));
        self
    }

    /// Validates the table.
    ///
    /// # Errors
    ///
    /// Fails if the name is not a plain identifier, if there are no columns,
    /// or if two columns share a name or a field.
    pub fn build(self) -> Result<Table<M>> {
        make_table(&self.name, self.columns)
    }
}

/// Builds a table from already boxed columns.
pub fn make_table<M>(name: &str, columns: Vec<Box<dyn AnyColumn<M>>>) -> Result<Table<M>> {
    check_identifier(name)?;
    if columns.is_empty() {
        return Err(Error::EmptyTable(name.to_owned()));
    }

    let mut names = HashSet::new();
    let mut fields = HashSet::new();
    for column in &columns {
        if !names.insert(column.name()) || !fields.insert(column.field_name()) {
            return Err(Error::DuplicateColumn {
                table: name.to_owned(),
                column: column.name().to_owned(),
            });
        }
    }

    Ok(Table {
        name: name.to_owned(),
        columns,
    })
}

impl<M> Table<M> {
    pub fn builder(name: impl Into<String>) -> TableBuilder<M> {
        TableBuilder {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quoted_name(&self) -> String {
        format!("`{}`", self.name)
    }

    pub fn columns(&self) -> &[Box<dyn AnyColumn<M>>] {
        &self.columns
    }

    /// `CREATE TABLE` statement, one column definition per line.
    pub fn schema(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| format!("  {}", column.schema()))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE {} (\n{}\n)", self.quoted_name(), columns)
    }

    /// `DROP TABLE IF EXISTS` statement.
    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quoted_name())
    }

    /// Position of the column mapping `attr`.
    pub fn column_index(&self, attr: impl Into<Attr<M>>) -> Result<usize> {
        let attr = attr.into();
        self.columns
            .iter()
            .position(|column| column.attr() == attr)
            .ok_or_else(|| Error::AttributeNotFound {
                table: self.name.clone(),
                attribute: attr.name(),
            })
    }

    /// The column mapping `attr`.
    pub fn column(&self, attr: impl Into<Attr<M>>) -> Result<&dyn AnyColumn<M>> {
        let index = self.column_index(attr)?;
        Ok(self.columns[index].as_ref())
    }

    fn indices(&self, attrs: &[Attr<M>]) -> Result<Vec<usize>> {
        attrs.iter().map(|&attr| self.column_index(attr)).collect()
    }

    fn all_indices(&self) -> Vec<usize> {
        (0..self.columns.len()).collect()
    }

    // An empty subset means every column.
    fn subset(&self, attrs: &[Attr<M>]) -> Result<Vec<usize>> {
        if attrs.is_empty() {
            Ok(self.all_indices())
        } else {
            self.indices(attrs)
        }
    }

    /// `SELECT` of every column, in declaration order.
    pub fn select(&self) -> Select<'_, M> {
        Select::new(self, self.all_indices())
    }

    /// Same as [`Table::select`].
    pub fn get_all(&self) -> Select<'_, M> {
        self.select()
    }

    /// `SELECT` of the given attributes, in the given order.
    pub fn select_only(&self, attrs: &[Attr<M>]) -> Result<Select<'_, M>> {
        Ok(Select::new(self, self.subset(attrs)?))
    }

    /// `INSERT` of every column.
    pub fn insert(&self) -> Insert<'_, M> {
        Insert::new(self, self.all_indices())
    }

    /// `INSERT` of the given attributes, in the given order.
    pub fn insert_only(&self, attrs: &[Attr<M>]) -> Result<Insert<'_, M>> {
        Ok(Insert::new(self, self.subset(attrs)?))
    }

    /// `INSERT` of every column except `attrs`, keeping declaration order.
    ///
    /// Typically used to leave out an auto-increment primary key.
    pub fn insert_all_but(&self, attrs: &[Attr<M>]) -> Result<Insert<'_, M>> {
        let excluded = self.indices(attrs)?;
        let columns = self
            .all_indices()
            .into_iter()
            .filter(|index| !excluded.contains(index))
            .collect();
        Ok(Insert::new(self, columns))
    }

    pub fn update(&self) -> Update<'_, M> {
        Update::new(self)
    }

    pub fn delete(&self) -> Delete<'_, M> {
        Delete::new(self)
    }

    /// Runs the `CREATE TABLE` statement.
    pub async fn create<'e, E>(&self, executor: E) -> Result<()>
    where
        E: Executor<'e, Database = MySql>,
    {
        execute_raw(executor, &self.schema()).await?;
        Ok(())
    }

    /// Runs `DROP TABLE IF EXISTS`.
    pub async fn drop<'e, E>(&self, executor: E) -> Result<()>
    where
        E: Executor<'e, Database = MySql>,
    {
        execute_raw(executor, &self.drop_statement()).await?;
        Ok(())
    }

    /// Drops then creates the table, on one connection.
    ///
    /// Accepts a pool, a connection (`&mut *conn`) or a transaction
    /// (`&mut tx`). MySQL commits an open transaction on DDL.
    pub async fn recreate<'a, A>(&self, executor: A) -> Result<()>
    where
        A: Acquire<'a, Database = MySql>,
    {
        let mut conn = executor.acquire().await?;
        self.drop(&mut *conn).await?;
        self.create(&mut *conn).await
    }
}

impl<M> fmt::Debug for Table<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field(
                "columns",
                &self.columns.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
