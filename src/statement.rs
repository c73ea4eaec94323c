use std::marker::PhantomData;

use futures_util::TryStreamExt;
use sqlx::mysql::MySqlQueryResult;
use sqlx::{Executor, MySql};

use crate::bind::{InputBindArray, OutputBindArray};
use crate::builder::count_placeholders;
use crate::error::{Error, Result};
use crate::query::{Insert, Query, ReadQuery, WriteQuery};

const TARGET: &str = "sqlx_typed_bind::sql";

/// A query rendered once, with its bind arrays, ready to be executed any
/// number of times.
///
/// `Statement` avoids self-referential lifetimes the same way for every
/// execution: the SQL text and the bound values are stored separately, and a
/// fresh `sqlx` query is built from them on each call. With
/// [`persistent`](Statement::persistent) left on, the driver keeps the server
/// side prepared statement cached, so re-executions skip the prepare step.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_typed_bind::prelude::*;
///
/// #[derive(Debug, Default, Clone)]
/// struct Record {
///     id: u32,
///     i: i32,
///     s: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let records = Table::builder("records")
///     .column(make_column("id", field!(Record, id), &[Constraint::PrimaryKey, Constraint::Autoincrement])?)
///     .column(make_column("i", field!(Record, i), &[])?)
///     .column(make_column("s", field!(Record, s), &[])?)
///     .build()?;
///
/// let i = Var::new(4);
/// let mut select = records
///     .select()
///     .filter(col(field!(Record, i)).eq(&i))
///     .prepare()?;
/// let fours: Vec<Record> = select.fetch_all(&pool).await?;
///
/// i.set(5);
/// let fives = select.fetch_all(&pool).await?;
/// # Ok(())
/// # }
/// ```
pub struct Statement<M, Q> {
    query: Q,
    sql: String,
    inputs: InputBindArray,
    outputs: OutputBindArray,
    persistent: bool,
    _model: PhantomData<fn() -> M>,
}

impl<M, Q: Query<M>> Statement<M, Q> {
    /// Renders `query` and binds its parameters.
    ///
    /// # Errors
    ///
    /// Fails if the query does not render, for instance when it names a
    /// field its table does not map, or if the rendered text disagrees with
    /// the query's own slot count.
    pub fn new(query: Q) -> Result<Self> {
        let sql = query.sql()?;
        let slots = query.input_slots();
        let placeholders = count_placeholders(&sql)?;
        if placeholders != slots {
            return Err(Error::SlotMismatch {
                placeholders,
                slots,
            });
        }

        let mut inputs = InputBindArray::new(slots);
        query.bind_inputs(&mut inputs, 0);
        let mut outputs = OutputBindArray::new(query.output_slots());
        query.bind_outputs(&mut outputs);

        tracing::debug!(
            target: TARGET,
            sql = %sql,
            input_slots = inputs.len(),
            output_slots = outputs.len(),
            "statement prepared"
        );

        Ok(Self {
            query,
            sql,
            inputs,
            outputs,
            persistent: true,
            _model: PhantomData,
        })
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn inputs(&self) -> &InputBindArray {
        &self.inputs
    }

    pub fn outputs(&self) -> &OutputBindArray {
        &self.outputs
    }

    /// Whether the driver should cache the server side prepared statement.
    /// On by default.
    pub fn persistent(mut self, value: bool) -> Self {
        self.persistent = value;
        self
    }

    /// Re-reads every [`Var`](crate::Var) the query refers to.
    ///
    /// The execute methods call this first, so it is only needed to inspect
    /// the bound values.
    pub fn rebind_references(&mut self) {
        self.query.rebind_references(&mut self.inputs, 0);
    }

    fn log_execute(&self) {
        tracing::debug!(
            target: TARGET,
            sql = %self.sql,
            params = ?self.inputs.slots().iter().map(|slot| slot.value()).collect::<Vec<_>>(),
            "executing statement"
        );
    }
}

impl<M: Default, Q: ReadQuery<M>> Statement<M, Q> {
    /// Executes the query and collects every row.
    ///
    /// Rows are decoded one at a time into the output slots, then finalized
    /// into a fresh `M::default()`. Fields the query does not select keep
    /// their default value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a row does not fit
    /// its fields.
    pub async fn fetch_all<'e, E>(&mut self, executor: E) -> Result<Vec<M>>
    where
        E: Executor<'e, Database = MySql>,
    {
        self.rebind_references();
        self.log_execute();

        let &mut Statement {
            ref query,
            ref sql,
            ref inputs,
            ref mut outputs,
            persistent,
            ..
        } = self;

        let q = inputs.apply(sqlx::query::<MySql>(sql).persistent(persistent))?;
        let mut rows = q.fetch(executor);
        let mut records = Vec::new();
        while let Some(row) = rows.try_next().await? {
            outputs.fetch(&row)?;
            let mut record = M::default();
            query.finalize_row(&mut record, outputs)?;
            records.push(record);
        }

        tracing::trace!(target: TARGET, sql = %sql, rows = records.len(), "rows fetched");
        Ok(records)
    }

    /// Executes the query and returns the first row, if any.
    pub async fn fetch_optional<'e, E>(&mut self, executor: E) -> Result<Option<M>>
    where
        E: Executor<'e, Database = MySql>,
    {
        self.rebind_references();
        self.log_execute();

        let &mut Statement {
            ref query,
            ref sql,
            ref inputs,
            ref mut outputs,
            persistent,
            ..
        } = self;

        let q = inputs.apply(sqlx::query::<MySql>(sql).persistent(persistent))?;
        match q.fetch_optional(executor).await? {
            Some(row) => {
                outputs.fetch(&row)?;
                let mut record = M::default();
                query.finalize_row(&mut record, outputs)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Executes the query and returns exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error::RowNotFound` (as [`Error::Database`]) if there
    /// is no row.
    pub async fn fetch_one<'e, E>(&mut self, executor: E) -> Result<M>
    where
        E: Executor<'e, Database = MySql>,
    {
        self.fetch_optional(executor)
            .await?
            .ok_or_else(|| Error::Database(sqlx::Error::RowNotFound))
    }
}

impl<M, Q: WriteQuery<M>> Statement<M, Q> {
    /// Executes the statement.
    ///
    /// Returns the generated id for an insert, and the number of affected
    /// rows for an update or a delete.
    pub async fn execute<'e, E>(&mut self, executor: E) -> Result<Q::Output>
    where
        E: Executor<'e, Database = MySql>,
    {
        self.rebind_references();
        self.log_execute();

        let &mut Statement {
            ref query,
            ref sql,
            ref inputs,
            persistent,
            ..
        } = self;

        let result = inputs
            .apply(sqlx::query::<MySql>(sql).persistent(persistent))?
            .execute(executor)
            .await?;
        Ok(query.output(&result))
    }
}

impl<M> Statement<M, Insert<'_, M>> {
    /// Rebinds the inserted values from `record`, so one statement can insert
    /// many records.
    pub fn bind_record(&mut self, record: &M) {
        self.query.bind_record(record, &mut self.inputs, 0);
    }
}

/// Executes `sql` directly, without parameters. Used for DDL.
pub async fn execute_raw<'e, E>(executor: E, sql: &str) -> Result<MySqlQueryResult>
where
    E: Executor<'e, Database = MySql>,
{
    tracing::debug!(target: TARGET, sql = %sql, "executing raw statement");
    Ok(sqlx::query::<MySql>(sql)
        .persistent(false)
        .execute(executor)
        .await?)
}
