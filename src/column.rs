//! Field selectors and columns.

use std::fmt;
use std::marker::PhantomData;

use crate::bind::{InputBindArray, OutputBindArray, OutputSlot};
use crate::builder::check_identifier;
use crate::constraints::{Constraint, Constraints};
use crate::error::Result;
use crate::value::{SqlField, SqlKind, Textual};

/// A typed selector for one field of the model `M`.
///
/// The name is the field's identity: two selectors naming the same field of
/// the same model select the same column. Use [`field!`](crate::field) to
/// build one.
pub struct Field<M, T> {
    name: &'static str,
    get: fn(&M) -> &T,
    get_mut: fn(&mut M) -> &mut T,
}

impl<M, T> Field<M, T> {
    pub const fn new(name: &'static str, get: fn(&M) -> &T, get_mut: fn(&mut M) -> &mut T) -> Self {
        Self { name, get, get_mut }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get<'m>(&self, model: &'m M) -> &'m T {
        (self.get)(model)
    }

    pub fn get_mut<'m>(&self, model: &'m mut M) -> &'m mut T {
        (self.get_mut)(model)
    }

    /// The type-erased identity of this field.
    pub fn attr(&self) -> Attr<M> {
        Attr::new(self.name)
    }
}

impl<M, T> Clone for Field<M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, T> Copy for Field<M, T> {}

impl<M, T> fmt::Debug for Field<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

/// Builds a [`Field`] selector: `field!(Record, id)`.
///
/// # Examples
///
/// ```
/// use sqlx_typed_bind::field;
///
/// #[derive(Default)]
/// struct Record {
///     id: u32,
/// }
///
/// let id = field!(Record, id);
/// let mut record = Record::default();
/// *id.get_mut(&mut record) = 3;
/// assert_eq!(*id.get(&record), 3);
/// assert_eq!(id.name(), "id");
/// ```
#[macro_export]
macro_rules! field {
    ($model:ty, $field:ident) => {
        $crate::Field::<$model, _>::new(
            ::std::stringify!($field),
            |model| &model.$field,
            |model| &mut model.$field,
        )
    };
}

/// Which field of `M` an attribute subset refers to, without its type.
pub struct Attr<M> {
    name: &'static str,
    _model: PhantomData<fn() -> M>,
}

impl<M> Attr<M> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _model: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<M> Clone for Attr<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Attr<M> {}

impl<M> PartialEq for Attr<M> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<M> Eq for Attr<M> {}

impl<M> fmt::Debug for Attr<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Attr").field(&self.name).finish()
    }
}

impl<M, T> From<Field<M, T>> for Attr<M> {
    fn from(field: Field<M, T>) -> Self {
        field.attr()
    }
}

/// A field of `M` mapped to a named column.
pub struct Column<M, T> {
    name: String,
    field: Field<M, T>,
    constraints: Constraints,
    varchar: Option<usize>,
}

impl<M, T: SqlField> Column<M, T> {
    pub fn field(&self) -> Field<M, T> {
        self.field
    }
}

impl<M, T> fmt::Debug for Column<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("constraints", &self.constraints)
            .field("varchar", &self.varchar)
            .finish()
    }
}

/// Maps `field` to the column `name`.
///
/// Nullability follows the field type (`Option` is nullable) unless a
/// `Nullable` or `NotNull` tag says otherwise.
///
/// # Errors
///
/// Returns an error if `name` is not a plain identifier or a tag is repeated.
///
/// # Examples
///
/// ```
/// use sqlx_typed_bind::{field, make_column, AnyColumn, Constraint};
///
/// #[derive(Default)]
/// struct Record {
///     id: u32,
///     s: String,
/// }
///
/// let s = make_column("s", field!(Record, s), &[])?;
/// assert_eq!(s.schema(), "`s` TEXT NOT NULL");
///
/// let id = make_column(
///     "id",
///     field!(Record, id),
///     &[Constraint::PrimaryKey, Constraint::Autoincrement],
/// )?;
/// assert_eq!(id.schema(), "`id` INTEGER UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT");
/// # Ok::<(), sqlx_typed_bind::Error>(())
/// ```
pub fn make_column<M, T: SqlField>(
    name: &str,
    field: Field<M, T>,
    tags: &[Constraint],
) -> Result<Column<M, T>> {
    check_identifier(name)?;
    let mut constraints = Constraints::from_tags(name, tags)?;
    constraints.resolve_nullable(T::OPTIONAL);
    Ok(Column {
        name: name.to_owned(),
        field,
        constraints,
        varchar: None,
    })
}

/// Like [`make_column`], rendering the type as `VARCHAR(size)`.
///
/// Only text fields are accepted. A size of 0 means unbounded text.
pub fn make_varchar<M, T: Textual>(
    name: &str,
    size: usize,
    field: Field<M, T>,
    tags: &[Constraint],
) -> Result<Column<M, T>> {
    let mut column = make_column(name, field, tags)?;
    column.varchar = (size > 0).then_some(size);
    Ok(column)
}

/// A column with its field type erased, as stored by a table.
pub trait AnyColumn<M>: Send + Sync {
    fn name(&self) -> &str;

    fn field_name(&self) -> &'static str;

    fn attr(&self) -> Attr<M> {
        Attr::new(self.field_name())
    }

    fn kind(&self) -> SqlKind;

    fn is_optional(&self) -> bool;

    fn constraints(&self) -> &Constraints;

    fn varchar_size(&self) -> Option<usize>;

    /// The backtick-quoted column name.
    fn quoted_name(&self) -> String {
        format!("`{}`", self.name())
    }

    /// Column definition: `` `name` TYPE[ constraints] ``.
    fn schema(&self) -> String {
        let mut schema = self.quoted_name();
        schema.push(' ');
        match self.varchar_size() {
            Some(size) => schema.push_str(&format!("VARCHAR({size})")),
            None => schema.push_str(self.kind().sql_type()),
        }
        let constraints = self.constraints().to_sql();
        if !constraints.is_empty() {
            schema.push(' ');
            schema.push_str(&constraints);
        }
        schema
    }

    /// Binds the field of `record` to input slot `index`.
    fn bind_input(&self, record: &M, binds: &mut InputBindArray, index: usize);

    /// Declares output slot `index` for this column.
    fn bind_output(&self, binds: &mut OutputBindArray, index: usize);

    /// Moves a fetched slot into the field of `record`.
    fn finalize(&self, record: &mut M, slot: &OutputSlot) -> Result<()>;
}

impl<M, T: SqlField> AnyColumn<M> for Column<M, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_name(&self) -> &'static str {
        self.field.name()
    }

    fn kind(&self) -> SqlKind {
        T::KIND
    }

    fn is_optional(&self) -> bool {
        T::OPTIONAL
    }

    fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    fn varchar_size(&self) -> Option<usize> {
        self.varchar
    }

    fn bind_input(&self, record: &M, binds: &mut InputBindArray, index: usize) {
        binds.bind(index, T::KIND, self.field.get(record).to_value());
    }

    fn bind_output(&self, binds: &mut OutputBindArray, index: usize) {
        binds.bind(index, T::KIND, self.varchar);
    }

    fn finalize(&self, record: &mut M, slot: &OutputSlot) -> Result<()> {
        self.field.get_mut(record).finalize(slot, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::Tristate;
    use crate::datetime::Tm;
    use crate::error::Error;
    use crate::value::Value;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Record {
        id: u32,
        i: i32,
        s: String,
        o: Option<i64>,
        t: Tm,
        flag: bool,
        nick: Option<String>,
    }

    #[test]
    fn test_field_access() {
        let s = field!(Record, s);
        let mut record = Record::default();
        s.get_mut(&mut record).push_str("one");
        assert_eq!(s.get(&record), "one");
        assert_eq!(s.attr(), Attr::<Record>::new("s"));
        assert_eq!(Attr::from(field!(Record, i)).name(), "i");
    }

    #[test]
    fn test_column_schema() {
        let s = make_column("s", field!(Record, s), &[]).unwrap();
        assert_eq!(s.schema(), "`s` TEXT NOT NULL");

        let o = make_column("o", field!(Record, o), &[]).unwrap();
        assert_eq!(o.schema(), "`o` BIGINT");
        assert_eq!(o.constraints().nullable, Tristate::On);

        let t = make_column("t", field!(Record, t), &[Constraint::Nullable]).unwrap();
        assert_eq!(t.schema(), "`t` DATETIME");

        let flag = make_column("flag", field!(Record, flag), &[Constraint::Unique]).unwrap();
        assert_eq!(flag.schema(), "`flag` BOOLEAN UNIQUE NOT NULL");

        let o = make_column("o", field!(Record, o), &[Constraint::NotNull]).unwrap();
        assert_eq!(o.schema(), "`o` BIGINT NOT NULL");
    }

    #[test]
    fn test_varchar_schema() {
        let s = make_varchar("s", 32, field!(Record, s), &[]).unwrap();
        assert_eq!(s.schema(), "`s` VARCHAR(32) NOT NULL");
        assert_eq!(s.varchar_size(), Some(32));

        let nick = make_varchar("nick", 16, field!(Record, nick), &[Constraint::Unique]).unwrap();
        assert_eq!(nick.schema(), "`nick` VARCHAR(16) UNIQUE");

        let s = make_varchar("s", 0, field!(Record, s), &[]).unwrap();
        assert_eq!(s.schema(), "`s` TEXT NOT NULL");
    }

    #[test]
    fn test_column_errors() {
        let err = make_column("bad name", field!(Record, i), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(_)));

        let err = make_column(
            "id",
            field!(Record, id),
            &[Constraint::PrimaryKey, Constraint::PrimaryKey],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateConstraint { .. }));
    }

    #[test]
    fn test_bind_and_finalize() {
        let column = make_column("o", field!(Record, o), &[]).unwrap();
        let record = Record {
            o: Some(-9),
            ..Record::default()
        };

        let mut inputs = InputBindArray::new(2);
        column.bind_input(&record, &mut inputs, 1);
        assert_eq!(inputs.slots()[1].kind(), Some(SqlKind::BigInt));
        assert_eq!(inputs.slots()[1].value(), &Value::I64(-9));

        let mut outputs = OutputBindArray::new(1);
        column.bind_output(&mut outputs, 0);
        let mut slot = outputs.slots()[0].clone();
        slot.store(Value::I64(12));

        let mut fetched = Record::default();
        column.finalize(&mut fetched, &slot).unwrap();
        assert_eq!(fetched.o, Some(12));
    }
}
