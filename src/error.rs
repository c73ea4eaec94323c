/// Error types for sqlx-typed-bind
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error while compiling an identifier or placeholder pattern
    #[error("Failed to parse SQL pattern: {0}")]
    Parse(#[from] regex::Error),

    /// Error from SQLx database operations (prepare, bind, execute, fetch)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A constraint tag was applied twice to the same column
    #[error("Constraint '{constraint}' specified multiple times on column '{column}'")]
    DuplicateConstraint {
        column: String,
        constraint: &'static str,
    },

    /// A field selector does not belong to any column of the table
    #[error("Attribute '{attribute}' is not mapped by table '{table}'")]
    AttributeNotFound {
        table: String,
        attribute: &'static str,
    },

    /// A table was declared without columns
    #[error("Table '{0}' has no columns")]
    EmptyTable(String),

    /// Two columns of a table share a name or a field
    #[error("Column '{column}' declared twice in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// No table of a database maps the requested model
    #[error("No table maps model '{0}'")]
    TableNotFound(&'static str),

    /// Two tables of a database share a name or a model
    #[error("Table '{0}' registered twice")]
    DuplicateTable(String),

    /// A table or column name is not a plain SQL identifier
    #[error("Invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    /// A bind slot was never bound before execution
    #[error("Bind slot {0} was not bound before execution")]
    UnboundSlot(usize),

    /// The rendered SQL text disagrees with the reported number of input slots
    #[error("Query renders {placeholders} placeholders but reports {slots} input slots")]
    SlotMismatch { placeholders: usize, slots: usize },

    /// A fetched value does not match the column's field type
    #[error("Column '{column}' expected a {expected} value, got {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A fetched text value is longer than the column's declared VARCHAR width
    #[error("Value of column '{column}' ({length} bytes) does not fit VARCHAR({capacity})")]
    Truncated {
        column: String,
        length: usize,
        capacity: usize,
    },

    /// A calendar value cannot be represented as a DATETIME
    #[error("Invalid DATETIME value: {0}")]
    InvalidDateTime(String),
}

/// MySQL server error number for "Table doesn't exist".
const ER_NO_SUCH_TABLE: u16 = 1146;

impl Error {
    /// Returns the MySQL error number when the error was reported by the server.
    pub fn error_number(&self) -> Option<u16> {
        match self {
            Error::Database(err) => err
                .as_database_error()
                .and_then(|db| db.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>())
                .map(|db| db.number()),
            _ => None,
        }
    }

    /// Returns true if the server reported that the queried table does not exist.
    pub fn is_table_does_not_exist(&self) -> bool {
        self.error_number() == Some(ER_NO_SUCH_TABLE)
    }
}

/// Result type alias for sqlx-typed-bind operations
pub type Result<T> = std::result::Result<T, Error>;
