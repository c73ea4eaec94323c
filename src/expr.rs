//! Conditions and assignments over the columns of a table.
//!
//! Every node renders itself into the growing SQL text and binds its
//! parameters starting at a given offset. Parameters are always bound in the
//! order their `?` placeholders appear in the text: left operand first.
//!
//! ```
//! use sqlx_typed_bind::prelude::*;
//!
//! #[derive(Debug, Default, Clone)]
//! struct Record {
//!     id: u32,
//!     i: i32,
//!     s: String,
//! }
//!
//! let records = Table::builder("records")
//!     .column(make_column("id", field!(Record, id), &[Constraint::PrimaryKey])?)
//!     .column(make_column("i", field!(Record, i), &[])?)
//!     .column(make_column("s", field!(Record, s), &[])?)
//!     .build()?;
//!
//! let cond = col(field!(Record, i)).eq(4) | col(field!(Record, s)).ne("four");
//! assert_eq!(cond.to_sql(&records)?, "`i`=? OR `s`<>?");
//! assert_eq!(cond.input_slots(), 2);
//! # Ok::<(), sqlx_typed_bind::Error>(())
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::sync::{Arc, PoisonError, RwLock};

use crate::bind::InputBindArray;
use crate::builder::push_joined;
use crate::column::Field;
use crate::error::Result;
use crate::table::Table;
use crate::value::SqlField;

/// A node of the expression tree.
pub trait Expression<M> {
    /// Appends the SQL text of this node to `out`.
    fn render(&self, table: &Table<M>, out: &mut String) -> Result<()>;

    /// Number of `?` placeholders the node renders.
    fn input_slots(&self) -> usize;

    /// Binds the node's parameters into `binds[offset..offset + input_slots()]`.
    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize);

    /// Re-reads variable references into their slots.
    fn rebind_references(&self, binds: &mut InputBindArray, offset: usize);

    fn to_sql(&self, table: &Table<M>) -> Result<String> {
        let mut out = String::new();
        self.render(table, &mut out)?;
        Ok(out)
    }
}

/// An expression usable after `WHERE`.
pub trait Condition<M>: Expression<M> {
    /// True for an `OR` node, which needs parentheses under an `AND`.
    fn is_disjunction(&self) -> bool {
        false
    }
}

/// One or more `column=value` assignments usable after `SET`.
pub trait Assignments<M>: Expression<M> {}

/// A right-hand side accepted where a value of type `T` is expected.
///
/// Implemented for literals of `T` (and of the inner type, for optional
/// columns), for columns of type `T`, and for [`Var<T>`].
pub trait Operand<M, T> {
    type Expr: Expression<M>;

    fn into_expr(self) -> Self::Expr;
}

/// A column reference. Renders as `` `name` ``.
pub struct Col<M, T> {
    field: Field<M, T>,
}

pub fn col<M, T>(field: Field<M, T>) -> Col<M, T> {
    Col { field }
}

impl<M, T> Clone for Col<M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, T> Copy for Col<M, T> {}

impl<M, T> fmt::Debug for Col<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Col").field(&self.field.name()).finish()
    }
}

impl<M, T: SqlField> Col<M, T> {
    fn compare<O: Operand<M, T>>(self, op: CompareOp, rhs: O) -> Compare<Self, O::Expr> {
        Compare {
            op,
            lhs: self,
            rhs: rhs.into_expr(),
        }
    }

    pub fn eq<O: Operand<M, T>>(self, rhs: O) -> Compare<Self, O::Expr> {
        self.compare(CompareOp::Eq, rhs)
    }

    pub fn ne<O: Operand<M, T>>(self, rhs: O) -> Compare<Self, O::Expr> {
        self.compare(CompareOp::Ne, rhs)
    }

    pub fn gt<O: Operand<M, T>>(self, rhs: O) -> Compare<Self, O::Expr> {
        self.compare(CompareOp::Gt, rhs)
    }

    pub fn ge<O: Operand<M, T>>(self, rhs: O) -> Compare<Self, O::Expr> {
        self.compare(CompareOp::Ge, rhs)
    }

    pub fn lt<O: Operand<M, T>>(self, rhs: O) -> Compare<Self, O::Expr> {
        self.compare(CompareOp::Lt, rhs)
    }

    pub fn le<O: Operand<M, T>>(self, rhs: O) -> Compare<Self, O::Expr> {
        self.compare(CompareOp::Le, rhs)
    }

    /// `column=value`, for use in `SET`.
    pub fn assign<O: Operand<M, T>>(self, rhs: O) -> Assignment<M, T, O::Expr> {
        Assignment {
            column: self,
            value: rhs.into_expr(),
        }
    }
}

impl<M, T: SqlField> Expression<M> for Col<M, T> {
    fn render(&self, table: &Table<M>, out: &mut String) -> Result<()> {
        out.push_str(&table.column(self.field)?.quoted_name());
        Ok(())
    }

    fn input_slots(&self) -> usize {
        0
    }

    fn bind_inputs(&self, _binds: &mut InputBindArray, _offset: usize) {}

    fn rebind_references(&self, _binds: &mut InputBindArray, _offset: usize) {}
}

impl<M, T: SqlField> Operand<M, T> for Col<M, T> {
    type Expr = Self;

    fn into_expr(self) -> Self {
        self
    }
}

/// A value copied into the query at construction. Renders as `?`.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal<T> {
    value: T,
}

impl<T: SqlField> Literal<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<M, T: SqlField> Expression<M> for Literal<T> {
    fn render(&self, _table: &Table<M>, out: &mut String) -> Result<()> {
        out.push('?');
        Ok(())
    }

    fn input_slots(&self) -> usize {
        1
    }

    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize) {
        binds.bind(offset, T::KIND, self.value.to_value());
    }

    fn rebind_references(&self, _binds: &mut InputBindArray, _offset: usize) {}
}

macro_rules! impl_literal_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<M> Operand<M, $ty> for $ty {
                type Expr = Literal<$ty>;

                fn into_expr(self) -> Self::Expr {
                    Literal::new(self)
                }
            }

            impl<M> Operand<M, Option<$ty>> for $ty {
                type Expr = Literal<Option<$ty>>;

                fn into_expr(self) -> Self::Expr {
                    Literal::new(Some(self))
                }
            }

            impl<M> Operand<M, Option<$ty>> for Option<$ty> {
                type Expr = Literal<Option<$ty>>;

                fn into_expr(self) -> Self::Expr {
                    Literal::new(self)
                }
            }
        )*
    };
}

impl_literal_operand!(bool, i8, u8, i16, u16, i32, u32, i64, u64, String, crate::datetime::Tm);

impl<M> Operand<M, String> for &str {
    type Expr = Literal<String>;

    fn into_expr(self) -> Self::Expr {
        Literal::new(self.to_owned())
    }
}

impl<M> Operand<M, Option<String>> for &str {
    type Expr = Literal<Option<String>>;

    fn into_expr(self) -> Self::Expr {
        Literal::new(Some(self.to_owned()))
    }
}

/// A shared, mutable variable a query reads before every execution.
///
/// Clones share the same value: a statement built from a condition on a
/// `Var` observes later [`set`](Var::set) calls the next time it runs.
pub struct Var<T>(Arc<RwLock<T>>);

impl<T> Var<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn set(&self, value: T) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard);
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.0.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }
}

impl<T: Clone> Var<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Default> Default for Var<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|value| f.debug_tuple("Var").field(value).finish())
    }
}

/// A reference to a [`Var`] inside an expression. Renders as `?`.
#[derive(Debug, Clone)]
pub struct VarRef<T> {
    var: Var<T>,
}

impl<M, T: SqlField> Expression<M> for VarRef<T> {
    fn render(&self, _table: &Table<M>, out: &mut String) -> Result<()> {
        out.push('?');
        Ok(())
    }

    fn input_slots(&self) -> usize {
        1
    }

    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize) {
        binds.bind(offset, T::KIND, self.var.with(T::to_value));
    }

    fn rebind_references(&self, binds: &mut InputBindArray, offset: usize) {
        <Self as Expression<M>>::bind_inputs(self, binds, offset);
    }
}

impl<M, T: SqlField> Operand<M, T> for Var<T> {
    type Expr = VarRef<T>;

    fn into_expr(self) -> Self::Expr {
        VarRef { var: self }
    }
}

impl<M, T: SqlField> Operand<M, T> for &Var<T> {
    type Expr = VarRef<T>;

    fn into_expr(self) -> Self::Expr {
        VarRef { var: self.clone() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// `lhs<op>rhs`, without surrounding spaces.
#[derive(Debug, Clone)]
pub struct Compare<L, R> {
    op: CompareOp,
    lhs: L,
    rhs: R,
}

impl<L, R> Compare<L, R> {
    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn and<C>(self, rhs: C) -> Logical<Self, C> {
        Logical::new(LogicalOp::And, self, rhs)
    }

    pub fn or<C>(self, rhs: C) -> Logical<Self, C> {
        Logical::new(LogicalOp::Or, self, rhs)
    }
}

impl<M, L: Expression<M>, R: Expression<M>> Expression<M> for Compare<L, R> {
    fn render(&self, table: &Table<M>, out: &mut String) -> Result<()> {
        self.lhs.render(table, out)?;
        out.push_str(self.op.symbol());
        self.rhs.render(table, out)
    }

    fn input_slots(&self) -> usize {
        self.lhs.input_slots() + self.rhs.input_slots()
    }

    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize) {
        self.lhs.bind_inputs(binds, offset);
        self.rhs.bind_inputs(binds, offset + self.lhs.input_slots());
    }

    fn rebind_references(&self, binds: &mut InputBindArray, offset: usize) {
        self.lhs.rebind_references(binds, offset);
        self.rhs.rebind_references(binds, offset + self.lhs.input_slots());
    }
}

impl<M, L: Expression<M>, R: Expression<M>> Condition<M> for Compare<L, R> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => " AND ",
            LogicalOp::Or => " OR ",
        }
    }
}

/// Two conditions joined by `AND` or `OR`.
#[derive(Debug, Clone)]
pub struct Logical<L, R> {
    op: LogicalOp,
    lhs: L,
    rhs: R,
}

impl<L, R> Logical<L, R> {
    pub fn new(op: LogicalOp, lhs: L, rhs: R) -> Self {
        Self { op, lhs, rhs }
    }

    pub fn op(&self) -> LogicalOp {
        self.op
    }

    pub fn and<C>(self, rhs: C) -> Logical<Self, C> {
        Logical::new(LogicalOp::And, self, rhs)
    }

    pub fn or<C>(self, rhs: C) -> Logical<Self, C> {
        Logical::new(LogicalOp::Or, self, rhs)
    }

    fn render_operand<M, C: Condition<M>>(
        &self,
        operand: &C,
        table: &Table<M>,
        out: &mut String,
    ) -> Result<()> {
        if self.op == LogicalOp::And && operand.is_disjunction() {
            out.push('(');
            operand.render(table, out)?;
            out.push(')');
            Ok(())
        } else {
            operand.render(table, out)
        }
    }
}

impl<M, L: Condition<M>, R: Condition<M>> Expression<M> for Logical<L, R> {
    fn render(&self, table: &Table<M>, out: &mut String) -> Result<()> {
        self.render_operand(&self.lhs, table, out)?;
        out.push_str(self.op.keyword());
        self.render_operand(&self.rhs, table, out)
    }

    fn input_slots(&self) -> usize {
        self.lhs.input_slots() + self.rhs.input_slots()
    }

    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize) {
        self.lhs.bind_inputs(binds, offset);
        self.rhs.bind_inputs(binds, offset + self.lhs.input_slots());
    }

    fn rebind_references(&self, binds: &mut InputBindArray, offset: usize) {
        self.lhs.rebind_references(binds, offset);
        self.rhs.rebind_references(binds, offset + self.lhs.input_slots());
    }
}

impl<M, L: Condition<M>, R: Condition<M>> Condition<M> for Logical<L, R> {
    fn is_disjunction(&self) -> bool {
        self.op == LogicalOp::Or
    }
}

macro_rules! impl_logical_ops {
    ($($ty:ident),*) => {
        $(
            impl<L, R, C> BitAnd<C> for $ty<L, R> {
                type Output = Logical<Self, C>;

                fn bitand(self, rhs: C) -> Self::Output {
                    self.and(rhs)
                }
            }

            impl<L, R, C> BitOr<C> for $ty<L, R> {
                type Output = Logical<Self, C>;

                fn bitor(self, rhs: C) -> Self::Output {
                    self.or(rhs)
                }
            }
        )*
    };
}

impl_logical_ops!(Compare, Logical);

/// `` `column`=value ``.
pub struct Assignment<M, T, V> {
    column: Col<M, T>,
    value: V,
}

impl<M, T, V: fmt::Debug> fmt::Debug for Assignment<M, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assignment")
            .field("column", &self.column)
            .field("value", &self.value)
            .finish()
    }
}

impl<M, T: SqlField, V: Expression<M>> Expression<M> for Assignment<M, T, V> {
    fn render(&self, table: &Table<M>, out: &mut String) -> Result<()> {
        self.column.render(table, out)?;
        out.push('=');
        self.value.render(table, out)
    }

    fn input_slots(&self) -> usize {
        self.value.input_slots()
    }

    fn bind_inputs(&self, binds: &mut InputBindArray, offset: usize) {
        self.value.bind_inputs(binds, offset);
    }

    fn rebind_references(&self, binds: &mut InputBindArray, offset: usize) {
        self.value.rebind_references(binds, offset);
    }
}

impl<M, T: SqlField, V: Expression<M>> Assignments<M> for Assignment<M, T, V> {}

// Assignment lists are tuples; each element's slots follow the previous ones.
macro_rules! impl_assignment_list {
    ($($name:ident $idx:tt),+) => {
        impl<M, $($name: Assignments<M>),+> Expression<M> for ($($name,)+) {
            fn render(&self, table: &Table<M>, out: &mut String) -> Result<()> {
                let parts = [$(self.$idx.to_sql(table)?),+];
                push_joined(out, parts);
                Ok(())
            }

            fn input_slots(&self) -> usize {
                0 $(+ self.$idx.input_slots())+
            }

            #[allow(unused_assignments)]
            fn bind_inputs(&self, binds: &mut InputBindArray, mut offset: usize) {
                $(
                    self.$idx.bind_inputs(binds, offset);
                    offset += self.$idx.input_slots();
                )+
            }

            #[allow(unused_assignments)]
            fn rebind_references(&self, binds: &mut InputBindArray, mut offset: usize) {
                $(
                    self.$idx.rebind_references(binds, offset);
                    offset += self.$idx.input_slots();
                )+
            }
        }

        impl<M, $($name: Assignments<M>),+> Assignments<M> for ($($name,)+) {}
    };
}

impl_assignment_list!(A 0);
impl_assignment_list!(A 0, B 1);
impl_assignment_list!(A 0, B 1, C 2);
impl_assignment_list!(A 0, B 1, C 2, D 3);
impl_assignment_list!(A 0, B 1, C 2, D 3, E 4);
impl_assignment_list!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_assignment_list!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_assignment_list!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
