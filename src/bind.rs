//! Input and output bind arrays: one descriptor per `?` placeholder, and one per
//! selected column.

use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Decode, MySql, Row, Type};

use crate::datetime::MysqlTime;
use crate::error::{Error, Result};
use crate::value::{SqlKind, Value};

/// Type alias for SQLx Query with MySQL arguments
pub type Q<'q> = Query<'q, MySql, MySqlArguments>;

/// One query parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSlot {
    kind: Option<SqlKind>,
    value: Value,
}

impl InputSlot {
    /// Kind of the bound value; `None` until the slot is bound.
    pub fn kind(&self) -> Option<SqlKind> {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_bound(&self) -> bool {
        self.kind.is_some()
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn length(&self) -> usize {
        self.value.length()
    }
}

/// The parameters of a statement, in placeholder order.
#[derive(Debug, Clone, Default)]
pub struct InputBindArray {
    slots: Vec<InputSlot>,
}

impl InputBindArray {
    /// Allocates `len` unbound slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![InputSlot::default(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&InputSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[InputSlot] {
        &self.slots
    }

    /// Stores `value` in slot `index`. Indices past the end are ignored.
    pub fn bind(&mut self, index: usize, kind: SqlKind, value: Value) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.kind = Some(kind);
            slot.value = value;
        }
    }

    /// Binds every slot, in order, to a freshly built query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnboundSlot`] if a slot was never bound, and
    /// [`Error::InvalidDateTime`] if a calendar value is out of range.
    pub fn apply<'q>(&self, mut q: Q<'q>) -> Result<Q<'q>> {
        for (index, slot) in self.slots.iter().enumerate() {
            let kind = slot.kind.ok_or(Error::UnboundSlot(index))?;
            q = bind_value(q, kind, &slot.value)?;
        }
        Ok(q)
    }
}

fn bind_value<'q>(q: Q<'q>, kind: SqlKind, value: &Value) -> Result<Q<'q>> {
    let q = match value {
        Value::Null => bind_null(q, kind),
        Value::Bool(v) => q.bind(*v),
        Value::I8(v) => q.bind(*v),
        Value::U8(v) => q.bind(*v),
        Value::I16(v) => q.bind(*v),
        Value::U16(v) => q.bind(*v),
        Value::I32(v) => q.bind(*v),
        Value::U32(v) => q.bind(*v),
        Value::I64(v) => q.bind(*v),
        Value::U64(v) => q.bind(*v),
        Value::Text(v) => q.bind(v.clone()),
        Value::DateTime(v) => q.bind(v.to_naive()?),
    };
    Ok(q)
}

// NULL still carries the column's type so the server sees a typed parameter.
fn bind_null(q: Q<'_>, kind: SqlKind) -> Q<'_> {
    match kind {
        SqlKind::Boolean => q.bind(None::<bool>),
        SqlKind::TinyInt => q.bind(None::<i8>),
        SqlKind::TinyIntUnsigned => q.bind(None::<u8>),
        SqlKind::SmallInt => q.bind(None::<i16>),
        SqlKind::SmallIntUnsigned => q.bind(None::<u16>),
        SqlKind::Integer => q.bind(None::<i32>),
        SqlKind::IntegerUnsigned => q.bind(None::<u32>),
        SqlKind::BigInt => q.bind(None::<i64>),
        SqlKind::BigIntUnsigned => q.bind(None::<u64>),
        SqlKind::Text => q.bind(None::<String>),
        SqlKind::DateTime => q.bind(None::<NaiveDateTime>),
    }
}

/// One column of a fetched row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSlot {
    kind: Option<SqlKind>,
    capacity: Option<usize>,
    value: Value,
    length: usize,
    error: bool,
}

impl OutputSlot {
    pub fn kind(&self) -> Option<SqlKind> {
        self.kind
    }

    /// Declared VARCHAR width, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Length in bytes of the last fetched value.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Set when the last fetched text did not fit the declared width.
    pub fn has_errored(&self) -> bool {
        self.error
    }

    pub(crate) fn store(&mut self, value: Value) {
        self.length = value.length();
        self.error = match (&value, self.capacity) {
            (Value::Text(text), Some(capacity)) => text.chars().count() > capacity,
            _ => false,
        };
        self.value = value;
    }
}

/// The columns of a result row, in select order.
#[derive(Debug, Clone, Default)]
pub struct OutputBindArray {
    slots: Vec<OutputSlot>,
}

impl OutputBindArray {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![OutputSlot::default(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&OutputSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[OutputSlot] {
        &self.slots
    }

    /// Declares the kind and optional text width of slot `index`.
    pub fn bind(&mut self, index: usize, kind: SqlKind, capacity: Option<usize>) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.kind = Some(kind);
            slot.capacity = capacity;
        }
    }

    /// Decodes `row` into the slots. Row columns are matched by position.
    pub fn fetch(&mut self, row: &MySqlRow) -> Result<()> {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let kind = slot.kind.ok_or(Error::UnboundSlot(index))?;
            slot.store(decode(row, index, kind)?);
        }
        Ok(())
    }
}

fn get<'r, T>(row: &'r MySqlRow, index: usize) -> Result<Option<T>>
where
    T: Decode<'r, MySql> + Type<MySql>,
{
    Ok(row.try_get::<Option<T>, _>(index)?)
}

fn decode(row: &MySqlRow, index: usize, kind: SqlKind) -> Result<Value> {
    let value = match kind {
        SqlKind::Boolean => get::<bool>(row, index)?.map(Value::Bool),
        SqlKind::TinyInt => get::<i8>(row, index)?.map(Value::I8),
        SqlKind::TinyIntUnsigned => get::<u8>(row, index)?.map(Value::U8),
        SqlKind::SmallInt => get::<i16>(row, index)?.map(Value::I16),
        SqlKind::SmallIntUnsigned => get::<u16>(row, index)?.map(Value::U16),
        SqlKind::Integer => get::<i32>(row, index)?.map(Value::I32),
        SqlKind::IntegerUnsigned => get::<u32>(row, index)?.map(Value::U32),
        SqlKind::BigInt => get::<i64>(row, index)?.map(Value::I64),
        SqlKind::BigIntUnsigned => get::<u64>(row, index)?.map(Value::U64),
        SqlKind::Text => get::<String>(row, index)?.map(Value::Text),
        SqlKind::DateTime => get::<NaiveDateTime>(row, index)?
            .map(|datetime| Value::DateTime(MysqlTime::from_naive(&datetime))),
    };
    Ok(value.unwrap_or(Value::Null))
}
