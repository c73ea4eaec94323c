//! `WHERE`, `SET` and `LIMIT` clauses wrapping a query.
//!
//! A continuation owns the query it wraps. Its text comes after the wrapped
//! query's text and its parameters after the wrapped query's parameters.

use sqlx::mysql::MySqlQueryResult;

use crate::bind::{InputBindArray, OutputBindArray};
use crate::error::Result;
use crate::expr::{Assignments, Condition, Var};
use crate::query::{Query, ReadQuery, Update, WriteQuery};
use crate::table::Table;
use crate::value::{SqlKind, Value};

/// `<query> WHERE <condition>`.
#[derive(Debug, Clone)]
pub struct Where<Q, C> {
    query: Q,
    condition: C,
}

impl<Q, C> Where<Q, C> {
    pub fn new(query: Q, condition: C) -> Self {
        Self { query, condition }
    }

    pub fn inner(&self) -> &Q {
        &self.query
    }

    pub fn limit(self, value: impl Into<LimitValue>) -> Limit<Self> {
        Limit::new(self, value)
    }
}

impl<M, Q: Query<M>, C: Condition<M>> Query<M> for Where<Q, C> {
    fn table(&self) -> &Table<M> {
        self.query.table()
    }

    fn render(&self, out: &mut String) -> Result<()> {
        self.query.render(out)?;
        out.push_str(" WHERE ");
        self.condition.render(self.query.table(), out)
    }

    fn input_slots(&self) -> usize {
        self.query.input_slots() + self.condition.input_slots()
    }

    fn output_slots(&self) -> usize {
        self.query.output_slots()
    }

    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize) {
        self.query.bind_inputs(binds, offset);
        self.condition
            .bind_inputs(binds, offset + self.query.input_slots());
    }

    fn rebind_references(&self, binds: &mut InputBindArray, offset: usize) {
        self.query.rebind_references(binds, offset);
        self.condition
            .rebind_references(binds, offset + self.query.input_slots());
    }

    fn bind_outputs(&self, binds: &mut OutputBindArray) {
        self.query.bind_outputs(binds);
    }

    fn finalize_row(&self, record: &mut M, binds: &OutputBindArray) -> Result<()> {
        self.query.finalize_row(record, binds)
    }
}

impl<M, Q: ReadQuery<M>, C: Condition<M>> ReadQuery<M> for Where<Q, C> {}

impl<M, Q: WriteQuery<M>, C: Condition<M>> WriteQuery<M> for Where<Q, C> {
    type Output = Q::Output;

    fn output(&self, result: &MySqlQueryResult) -> Self::Output {
        self.query.output(result)
    }
}

/// `<update> SET <assignments>`.
#[derive(Debug, Clone)]
pub struct Set<Q, A> {
    query: Q,
    assignments: A,
}

impl<Q, A> Set<Q, A> {
    pub fn new(query: Q, assignments: A) -> Self {
        Self { query, assignments }
    }

    pub fn filter<C>(self, condition: C) -> Where<Self, C> {
        Where::new(self, condition)
    }
}

impl<M, Q: Query<M>, A: Assignments<M>> Query<M> for Set<Q, A> {
    fn table(&self) -> &Table<M> {
        self.query.table()
    }

    fn render(&self, out: &mut String) -> Result<()> {
        self.query.render(out)?;
        out.push_str(" SET ");
        self.assignments.render(self.query.table(), out)
    }

    fn input_slots(&self) -> usize {
        self.query.input_slots() + self.assignments.input_slots()
    }

    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize) {
        self.query.bind_inputs(binds, offset);
        self.assignments
            .bind_inputs(binds, offset + self.query.input_slots());
    }

    fn rebind_references(&self, binds: &mut InputBindArray, offset: usize) {
        self.query.rebind_references(binds, offset);
        self.assignments
            .rebind_references(binds, offset + self.query.input_slots());
    }
}

impl<M, A: Assignments<M>> WriteQuery<M> for Set<Update<'_, M>, A> {
    /// Number of changed rows.
    type Output = u64;

    fn output(&self, result: &MySqlQueryResult) -> u64 {
        result.rows_affected()
    }
}

/// The row count of a `LIMIT`: fixed, or read from a [`Var`] before every
/// execution.
#[derive(Debug, Clone)]
pub enum LimitValue {
    Fixed(u64),
    Var(Var<u64>),
}

impl LimitValue {
    pub fn get(&self) -> u64 {
        match self {
            LimitValue::Fixed(value) => *value,
            LimitValue::Var(var) => var.get(),
        }
    }
}

impl From<u64> for LimitValue {
    fn from(value: u64) -> Self {
        LimitValue::Fixed(value)
    }
}

impl From<Var<u64>> for LimitValue {
    fn from(var: Var<u64>) -> Self {
        LimitValue::Var(var)
    }
}

impl From<&Var<u64>> for LimitValue {
    fn from(var: &Var<u64>) -> Self {
        LimitValue::Var(var.clone())
    }
}

/// `<query> LIMIT ?`. The row count is a bound parameter, so one prepared
/// statement serves any limit.
#[derive(Debug, Clone)]
pub struct Limit<Q> {
    query: Q,
    value: LimitValue,
}

impl<Q> Limit<Q> {
    pub fn new(query: Q, value: impl Into<LimitValue>) -> Self {
        Self {
            query,
            value: value.into(),
        }
    }

    pub fn value(&self) -> &LimitValue {
        &self.value
    }
}

impl<M, Q: Query<M>> Query<M> for Limit<Q> {
    fn table(&self) -> &Table<M> {
        self.query.table()
    }

    fn render(&self, out: &mut String) -> Result<()> {
        self.query.render(out)?;
        out.push_str(" LIMIT ?");
        Ok(())
    }

    fn input_slots(&self) -> usize {
        self.query.input_slots() + 1
    }

    fn output_slots(&self) -> usize {
        self.query.output_slots()
    }

    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize) {
        self.query.bind_inputs(binds, offset);
        binds.bind(
            offset + self.query.input_slots(),
            SqlKind::BigIntUnsigned,
            Value::U64(self.value.get()),
        );
    }

    fn rebind_references(&self, binds: &mut InputBindArray, offset: usize) {
        self.query.rebind_references(binds, offset);
        if let LimitValue::Var(var) = &self.value {
            binds.bind(
                offset + self.query.input_slots(),
                SqlKind::BigIntUnsigned,
                Value::U64(var.get()),
            );
        }
    }

    fn bind_outputs(&self, binds: &mut OutputBindArray) {
        self.query.bind_outputs(binds);
    }

    fn finalize_row(&self, record: &mut M, binds: &OutputBindArray) -> Result<()> {
        self.query.finalize_row(record, binds)
    }
}

impl<M, Q: ReadQuery<M>> ReadQuery<M> for Limit<Q> {}

impl<M, Q: WriteQuery<M>> WriteQuery<M> for Limit<Q> {
    type Output = Q::Output;

    fn output(&self, result: &MySqlQueryResult) -> Self::Output {
        self.query.output(result)
    }
}
