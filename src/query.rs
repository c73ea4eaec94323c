use sqlx::mysql::MySqlQueryResult;

use crate::bind::{InputBindArray, OutputBindArray};
use crate::builder::push_joined;
use crate::column::AnyColumn;
use crate::continuation::{Limit, LimitValue, Set, Where};
use crate::error::{Error, Result};
use crate::expr::{Assignments, Condition};
use crate::statement::Statement;
use crate::table::Table;

/// A statement skeleton over one table, possibly wrapped by continuations.
///
/// Each layer renders its own SQL fragment after the one it wraps, and binds
/// its own parameters after the wrapped layer's, so slot order always matches
/// the order of `?` placeholders in the text.
pub trait Query<M> {
    fn table(&self) -> &Table<M>;

    /// Appends this layer's SQL text, wrapped layers first.
    fn render(&self, out: &mut String) -> Result<()>;

    /// Number of `?` placeholders in the rendered text.
    fn input_slots(&self) -> usize;

    /// Number of columns in each result row.
    fn output_slots(&self) -> usize {
        0
    }

    /// Binds parameters into `binds[offset..offset + input_slots()]`.
    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize);

    /// Re-reads every variable reference into its slot.
    fn rebind_references(&self, binds: &mut InputBindArray, offset: usize);

    /// Declares one output slot per selected column.
    fn bind_outputs(&self, _binds: &mut OutputBindArray) {}

    /// Moves a fetched row from the output slots into `record`.
    fn finalize_row(&self, _record: &mut M, _binds: &OutputBindArray) -> Result<()> {
        Ok(())
    }

    /// The full SQL text.
    fn sql(&self) -> Result<String> {
        let mut out = String::new();
        self.render(&mut out)?;
        Ok(out)
    }

    /// Renders the query and allocates its bind arrays.
    fn prepare(self) -> Result<Statement<M, Self>>
    where
        Self: Sized,
    {
        Statement::new(self)
    }
}

/// A query returning rows.
pub trait ReadQuery<M>: Query<M> {}

/// A query executed for its effect.
pub trait WriteQuery<M>: Query<M> {
    type Output;

    fn output(&self, result: &MySqlQueryResult) -> Self::Output;
}

fn push_columns<M>(out: &mut String, table: &Table<M>, columns: &[usize]) {
    push_joined(
        out,
        columns
            .iter()
            .map(|&index| table.columns()[index].quoted_name()),
    );
}

/// `SELECT` over an attribute subset.
pub struct Select<'a, M> {
    table: &'a Table<M>,
    columns: Vec<usize>,
}

impl<'a, M> Select<'a, M> {
    pub(crate) fn new(table: &'a Table<M>, columns: Vec<usize>) -> Self {
        Self { table, columns }
    }

    /// The selected columns, in output order.
    pub fn columns(&self) -> impl Iterator<Item = &dyn AnyColumn<M>> + '_ {
        self.columns
            .iter()
            .map(|&index| self.table.columns()[index].as_ref())
    }

    pub fn filter<C: Condition<M>>(self, condition: C) -> Where<Self, C> {
        Where::new(self, condition)
    }

    pub fn limit(self, value: impl Into<LimitValue>) -> Limit<Self> {
        Limit::new(self, value)
    }
}

impl<M> Query<M> for Select<'_, M> {
    fn table(&self) -> &Table<M> {
        self.table
    }

    fn render(&self, out: &mut String) -> Result<()> {
        out.push_str("SELECT ");
        push_columns(out, self.table, &self.columns);
        out.push_str(" FROM ");
        out.push_str(&self.table.quoted_name());
        Ok(())
    }

    fn input_slots(&self) -> usize {
        0
    }

    fn output_slots(&self) -> usize {
        self.columns.len()
    }

    fn bind_inputs(&self, _binds: &mut InputBindArray, _offset: usize) {}

    fn rebind_references(&self, _binds: &mut InputBindArray, _offset: usize) {}

    fn bind_outputs(&self, binds: &mut OutputBindArray) {
        for (slot, column) in self.columns().enumerate() {
            column.bind_output(binds, slot);
        }
    }

    fn finalize_row(&self, record: &mut M, binds: &OutputBindArray) -> Result<()> {
        for (slot, column) in self.columns().enumerate() {
            let output = binds.slot(slot).ok_or(Error::UnboundSlot(slot))?;
            column.finalize(record, output)?;
        }
        Ok(())
    }
}

impl<M> ReadQuery<M> for Select<'_, M> {}

/// `INSERT` of an attribute subset, optionally bound to a source record.
pub struct Insert<'a, M> {
    table: &'a Table<M>,
    columns: Vec<usize>,
    record: Option<&'a M>,
}

impl<'a, M> Insert<'a, M> {
    pub(crate) fn new(table: &'a Table<M>, columns: Vec<usize>) -> Self {
        Self {
            table,
            columns,
            record: None,
        }
    }

    /// Binds the inserted values from `record`.
    pub fn values(mut self, record: &'a M) -> Self {
        self.record = Some(record);
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &dyn AnyColumn<M>> + '_ {
        self.columns
            .iter()
            .map(|&index| self.table.columns()[index].as_ref())
    }

    /// Binds the fields of `record`, in column order, from `offset`.
    pub fn bind_record(&self, record: &M, binds: &mut InputBindArray, offset: usize) {
        for (slot, column) in self.columns().enumerate() {
            column.bind_input(record, binds, offset + slot);
        }
    }
}

impl<M> Query<M> for Insert<'_, M> {
    fn table(&self) -> &Table<M> {
        self.table
    }

    fn render(&self, out: &mut String) -> Result<()> {
        out.push_str("INSERT INTO ");
        out.push_str(&self.table.quoted_name());
        out.push_str(" (");
        push_columns(out, self.table, &self.columns);
        out.push_str(") VALUES (");
        push_joined(out, self.columns.iter().map(|_| "?"));
        out.push(')');
        Ok(())
    }

    fn input_slots(&self) -> usize {
        self.columns.len()
    }

    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize) {
        if let Some(record) = self.record {
            self.bind_record(record, binds, offset);
        }
    }

    fn rebind_references(&self, _binds: &mut InputBindArray, _offset: usize) {}
}

impl<M> WriteQuery<M> for Insert<'_, M> {
    /// The auto-increment id of the inserted row, 0 if none was generated.
    type Output = u64;

    fn output(&self, result: &MySqlQueryResult) -> u64 {
        result.last_insert_id()
    }
}

/// `UPDATE`. Not executable until given a `SET`.
pub struct Update<'a, M> {
    table: &'a Table<M>,
}

impl<'a, M> Update<'a, M> {
    pub(crate) fn new(table: &'a Table<M>) -> Self {
        Self { table }
    }

    pub fn set<A: Assignments<M>>(self, assignments: A) -> Set<Self, A> {
        Set::new(self, assignments)
    }
}

impl<M> Query<M> for Update<'_, M> {
    fn table(&self) -> &Table<M> {
        self.table
    }

    fn render(&self, out: &mut String) -> Result<()> {
        out.push_str("UPDATE ");
        out.push_str(&self.table.quoted_name());
        Ok(())
    }

    fn input_slots(&self) -> usize {
        0
    }

    fn bind_inputs(&self, _binds: &mut InputBindArray, _offset: usize) {}

    fn rebind_references(&self, _binds: &mut InputBindArray, _offset: usize) {}
}

/// `DELETE`.
pub struct Delete<'a, M> {
    table: &'a Table<M>,
}

impl<'a, M> Delete<'a, M> {
    pub(crate) fn new(table: &'a Table<M>) -> Self {
        Self { table }
    }

    pub fn filter<C: Condition<M>>(self, condition: C) -> Where<Self, C> {
        Where::new(self, condition)
    }

    pub fn limit(self, value: impl Into<LimitValue>) -> Limit<Self> {
        Limit::new(self, value)
    }
}

impl<M> Query<M> for Delete<'_, M> {
    fn table(&self) -> &Table<M> {
        self.table
    }

    fn render(&self, out: &mut String) -> Result<()> {
        out.push_str("DELETE FROM ");
        out.push_str(&self.table.quoted_name());
        Ok(())
    }

    fn input_slots(&self) -> usize {
        0
    }

    fn bind_inputs(&self, _binds: &mut InputBindArray, _offset: usize) {}

    fn rebind_references(&self, _binds: &mut InputBindArray, _offset: usize) {}
}

impl<M> WriteQuery<M> for Delete<'_, M> {
    /// Number of deleted rows.
    type Output = u64;

    fn output(&self, result: &MySqlQueryResult) -> u64 {
        result.rows_affected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::make_column;
    use crate::constraints::Constraint;
    use crate::expr::col;
    use crate::field;
    use crate::value::{SqlKind, Value};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Record {
        id: u32,
        i: i32,
        s: String,
    }

    fn records() -> Table<Record> {
        Table::builder("records")
            .column(
                make_column(
                    "id",
                    field!(Record, id),
                    &[Constraint::PrimaryKey, Constraint::Autoincrement],
                )
                .unwrap(),
            )
            .column(make_column("i", field!(Record, i), &[]).unwrap())
            .column(make_column("s", field!(Record, s), &[]).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_select_sql() {
        let table = records();
        assert_eq!(
            table.select().sql().unwrap(),
            "SELECT `id`, `i`, `s` FROM `records`"
        );
        assert_eq!(table.get_all().output_slots(), 3);

        let only = table
            .select_only(&[field!(Record, s).attr(), field!(Record, id).attr()])
            .unwrap();
        assert_eq!(only.sql().unwrap(), "SELECT `s`, `id` FROM `records`");
        assert_eq!(only.input_slots(), 0);
        assert_eq!(only.output_slots(), 2);
    }

    #[test]
    fn test_select_binds_outputs_in_select_order() {
        let table = records();
        let only = table
            .select_only(&[field!(Record, s).attr(), field!(Record, id).attr()])
            .unwrap();
        let mut outputs = OutputBindArray::new(only.output_slots());
        only.bind_outputs(&mut outputs);
        assert_eq!(outputs.slots()[0].kind(), Some(SqlKind::Text));
        assert_eq!(outputs.slots()[1].kind(), Some(SqlKind::IntegerUnsigned));
    }

    #[test]
    fn test_insert_sql() {
        let table = records();
        let record = Record {
            id: 0,
            i: 8,
            s: "eight".to_owned(),
        };
        let insert = table.insert().values(&record);
        assert_eq!(
            insert.sql().unwrap(),
            "INSERT INTO `records` (`id`, `i`, `s`) VALUES (?, ?, ?)"
        );
        assert_eq!(insert.input_slots(), 3);
        assert_eq!(insert.output_slots(), 0);

        let mut binds = InputBindArray::new(3);
        insert.bind_inputs(&mut binds, 0);
        let values: Vec<_> = binds.slots().iter().map(|s| s.value().clone()).collect();
        assert_eq!(
            values,
            vec![Value::U32(0), Value::I32(8), Value::Text("eight".into())]
        );
    }

    #[test]
    fn test_insert_all_but() {
        let table = records();
        let insert = table.insert_all_but(&[field!(Record, id).attr()]).unwrap();
        assert_eq!(
            insert.sql().unwrap(),
            "INSERT INTO `records` (`i`, `s`) VALUES (?, ?)"
        );

        let insert = table
            .insert_all_but(&[field!(Record, s).attr(), field!(Record, id).attr()])
            .unwrap();
        assert_eq!(insert.sql().unwrap(), "INSERT INTO `records` (`i`) VALUES (?)");

        let insert = table.insert_only(&[field!(Record, s).attr()]).unwrap();
        assert_eq!(insert.sql().unwrap(), "INSERT INTO `records` (`s`) VALUES (?)");
    }

    #[test]
    fn test_insert_without_record_leaves_slots_unbound() {
        let table = records();
        let insert = table.insert();
        let mut binds = InputBindArray::new(insert.input_slots());
        insert.bind_inputs(&mut binds, 0);
        assert!(binds.slots().iter().all(|slot| !slot.is_bound()));
    }

    #[test]
    fn test_update_and_delete_sql() {
        let table = records();
        assert_eq!(table.update().sql().unwrap(), "UPDATE `records`");
        assert_eq!(table.delete().sql().unwrap(), "DELETE FROM `records`");

        let update = table.update().set(col(field!(Record, i)).assign(3));
        assert_eq!(update.sql().unwrap(), "UPDATE `records` SET `i`=?");
    }

    #[test]
    fn test_render_is_idempotent() {
        let table = records();
        let query = table
            .select()
            .filter(col(field!(Record, i)).eq(4))
            .limit(2);
        assert_eq!(query.sql().unwrap(), query.sql().unwrap());
    }
}
