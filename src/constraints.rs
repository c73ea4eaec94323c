//! Column constraints and their canonical SQL rendering.

use crate::error::{Error, Result};

/// Either On, Off, or Undefined.
///
/// Undefined means the default behavior is used: nullability is then derived
/// from whether the field is an `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tristate {
    #[default]
    Undefined,
    On,
    Off,
}

/// A constraint tag applied to a column at declaration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Nullable,
    NotNull,
    PrimaryKey,
    Autoincrement,
    Unique,
}

impl Constraint {
    fn keyword(self) -> &'static str {
        match self {
            Constraint::Nullable => "NULL",
            Constraint::NotNull => "NOT NULL",
            Constraint::PrimaryKey => "PRIMARY KEY",
            Constraint::Autoincrement => "AUTO_INCREMENT",
            Constraint::Unique => "UNIQUE",
        }
    }
}

/// Aggregation of the constraints of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Constraints {
    pub nullable: Tristate,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
}

impl Constraints {
    /// Builds the constraint set of `column` from its tags.
    ///
    /// Each tag may appear once; `Nullable` and `NotNull` are mutually exclusive.
    pub fn from_tags(column: &str, tags: &[Constraint]) -> Result<Self> {
        let mut constraints = Self::default();
        for &tag in tags {
            constraints.apply(column, tag)?;
        }
        Ok(constraints)
    }

    /// Applies a single tag.
    pub fn apply(&mut self, column: &str, tag: Constraint) -> Result<()> {
        let duplicate = match tag {
            Constraint::Nullable | Constraint::NotNull => {
                let already = self.nullable != Tristate::Undefined;
                self.nullable = if tag == Constraint::Nullable {
                    Tristate::On
                } else {
                    Tristate::Off
                };
                already
            }
            Constraint::PrimaryKey => std::mem::replace(&mut self.primary_key, true),
            Constraint::Autoincrement => std::mem::replace(&mut self.auto_increment, true),
            Constraint::Unique => std::mem::replace(&mut self.unique, true),
        };
        if duplicate {
            return Err(Error::DuplicateConstraint {
                column: column.to_owned(),
                constraint: tag.keyword(),
            });
        }
        Ok(())
    }

    /// Resolves an undefined nullability from the optionality of the field.
    pub fn resolve_nullable(&mut self, optional: bool) {
        if self.nullable == Tristate::Undefined {
            self.nullable = if optional { Tristate::On } else { Tristate::Off };
        }
    }

    /// Renders `UNIQUE NOT NULL PRIMARY KEY AUTO_INCREMENT`, keeping only the set words.
    pub fn to_sql(&self) -> String {
        let words = [
            (self.unique, Constraint::Unique),
            (self.nullable == Tristate::Off, Constraint::NotNull),
            (self.primary_key, Constraint::PrimaryKey),
            (self.auto_increment, Constraint::Autoincrement),
        ];
        words
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, tag)| tag.keyword())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
