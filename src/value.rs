//! The closed set of column types and their mapping to SQL and wire types.

use std::fmt;

use crate::bind::OutputSlot;
use crate::datetime::{MysqlTime, Tm};
use crate::error::{Error, Result};

/// Every kind of value a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlKind {
    Boolean,
    TinyInt,
    TinyIntUnsigned,
    SmallInt,
    SmallIntUnsigned,
    Integer,
    IntegerUnsigned,
    BigInt,
    BigIntUnsigned,
    Text,
    DateTime,
}

/// Buffer type of a bind slot, as the MySQL binary protocol names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Tiny,
    Short,
    Long,
    LongLong,
    String,
    DateTime,
}

impl SqlKind {
    /// Column type used in `CREATE TABLE`.
    pub fn sql_type(self) -> &'static str {
        match self {
            SqlKind::Boolean => "BOOLEAN",
            SqlKind::TinyInt => "TINYINT",
            SqlKind::TinyIntUnsigned => "TINYINT UNSIGNED",
            SqlKind::SmallInt => "SMALLINT",
            SqlKind::SmallIntUnsigned => "SMALLINT UNSIGNED",
            SqlKind::Integer => "INTEGER",
            SqlKind::IntegerUnsigned => "INTEGER UNSIGNED",
            SqlKind::BigInt => "BIGINT",
            SqlKind::BigIntUnsigned => "BIGINT UNSIGNED",
            SqlKind::Text => "TEXT",
            SqlKind::DateTime => "DATETIME",
        }
    }

    /// Integers map by width: 1 byte is TINY, 2 SHORT, 4 LONG, 8 LONGLONG.
    pub fn wire_type(self) -> WireType {
        match self {
            SqlKind::Boolean | SqlKind::TinyInt | SqlKind::TinyIntUnsigned => WireType::Tiny,
            SqlKind::SmallInt | SqlKind::SmallIntUnsigned => WireType::Short,
            SqlKind::Integer | SqlKind::IntegerUnsigned => WireType::Long,
            SqlKind::BigInt | SqlKind::BigIntUnsigned => WireType::LongLong,
            SqlKind::Text => WireType::String,
            SqlKind::DateTime => WireType::DateTime,
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            SqlKind::TinyIntUnsigned
                | SqlKind::SmallIntUnsigned
                | SqlKind::IntegerUnsigned
                | SqlKind::BigIntUnsigned
        )
    }

    /// Size in bytes of a fixed-width value, `None` for text.
    pub fn width(self) -> Option<usize> {
        match self.wire_type() {
            WireType::Tiny => Some(1),
            WireType::Short => Some(2),
            WireType::Long => Some(4),
            WireType::LongLong => Some(8),
            WireType::DateTime => Some(std::mem::size_of::<MysqlTime>()),
            WireType::String => None,
        }
    }
}

impl fmt::Display for SqlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

/// A value held by a bind slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    Text(String),
    DateTime(MysqlTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Length in bytes the server reports for this value.
    pub fn length(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Bool(_) | Value::I8(_) | Value::U8(_) => 1,
            Value::I16(_) | Value::U16(_) => 2,
            Value::I32(_) | Value::U32(_) => 4,
            Value::I64(_) | Value::U64(_) => 8,
            Value::Text(s) => s.len(),
            Value::DateTime(_) => std::mem::size_of::<MysqlTime>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I8(_) => "TINYINT",
            Value::U8(_) => "TINYINT UNSIGNED",
            Value::I16(_) => "SMALLINT",
            Value::U16(_) => "SMALLINT UNSIGNED",
            Value::I32(_) => "INTEGER",
            Value::U32(_) => "INTEGER UNSIGNED",
            Value::I64(_) => "BIGINT",
            Value::U64(_) => "BIGINT UNSIGNED",
            Value::Text(_) => "TEXT",
            Value::DateTime(_) => "DATETIME",
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A Rust type that can be stored in a column.
///
/// Implemented for `bool`, the fixed-width integers, `String`, [`Tm`] and
/// `Option` of any of those. The set is closed: other field types cannot be
/// mapped and fail to compile.
pub trait SqlField: sealed::Sealed + Clone + Default + Send + Sync + 'static {
    const KIND: SqlKind;
    const OPTIONAL: bool = false;

    /// Value bound to an input slot. `None` binds NULL.
    fn to_value(&self) -> Value;

    /// Moves a fetched slot into the field.
    fn finalize(&mut self, slot: &OutputSlot, column: &str) -> Result<()>;
}

/// A non-optional [`SqlField`].
pub trait Scalar: SqlField {}

/// Field types allowed in a `VARCHAR` column.
pub trait Textual: SqlField {}

fn mismatch(column: &str, kind: SqlKind, value: &Value) -> Error {
    Error::TypeMismatch {
        column: column.to_owned(),
        expected: kind.sql_type(),
        found: value.type_name(),
    }
}

macro_rules! impl_integral_field {
    ($($ty:ty => $kind:ident, $variant:ident;)*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl SqlField for $ty {
                const KIND: SqlKind = SqlKind::$kind;

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn finalize(&mut self, slot: &OutputSlot, column: &str) -> Result<()> {
                    match slot.value() {
                        Value::Null => *self = Self::default(),
                        Value::$variant(v) => *self = *v,
                        other => return Err(mismatch(column, Self::KIND, other)),
                    }
                    Ok(())
                }
            }

            impl Scalar for $ty {}
        )*
    };
}

impl_integral_field! {
    bool => Boolean, Bool;
    i8 => TinyInt, I8;
    u8 => TinyIntUnsigned, U8;
    i16 => SmallInt, I16;
    u16 => SmallIntUnsigned, U16;
    i32 => Integer, I32;
    u32 => IntegerUnsigned, U32;
    i64 => BigInt, I64;
    u64 => BigIntUnsigned, U64;
}

impl sealed::Sealed for String {}

impl SqlField for String {
    const KIND: SqlKind = SqlKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn finalize(&mut self, slot: &OutputSlot, column: &str) -> Result<()> {
        if slot.has_errored() {
            return Err(Error::Truncated {
                column: column.to_owned(),
                length: slot.length(),
                capacity: slot.capacity().unwrap_or_default(),
            });
        }
        match slot.value() {
            Value::Null => self.clear(),
            Value::Text(text) => {
                self.clear();
                self.push_str(text);
            }
            other => return Err(mismatch(column, Self::KIND, other)),
        }
        Ok(())
    }
}

impl Scalar for String {}
impl Textual for String {}

impl sealed::Sealed for Tm {}

impl SqlField for Tm {
    const KIND: SqlKind = SqlKind::DateTime;

    fn to_value(&self) -> Value {
        Value::DateTime(self.to_mysql_time())
    }

    fn finalize(&mut self, slot: &OutputSlot, column: &str) -> Result<()> {
        match slot.value() {
            Value::Null => *self = Self::default(),
            Value::DateTime(time) => *self = Tm::from_mysql_time(time)?,
            other => return Err(mismatch(column, Self::KIND, other)),
        }
        Ok(())
    }
}

impl Scalar for Tm {}

impl<T: Scalar> sealed::Sealed for Option<T> {}

impl<T: Scalar> SqlField for Option<T> {
    const KIND: SqlKind = T::KIND;
    const OPTIONAL: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }

    fn finalize(&mut self, slot: &OutputSlot, column: &str) -> Result<()> {
        if slot.is_null() {
            *self = None;
            return Ok(());
        }
        let mut value = self.take().unwrap_or_default();
        value.finalize(slot, column)?;
        *self = Some(value);
        Ok(())
    }
}

impl Textual for Option<String> {}
