//! Submodule defining the errors used across the crate.

/// Type-erased error raised by a connection back-end.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building, executing or reconciling changes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reconciliation was requested on a record set without a primary key.
    #[error("Reconciliation requires a record set with a primary key")]
    MissingPrimaryKey,

    /// The connection rejected or failed a statement.
    #[error("Statement execution failed: {source}")]
    StatementExecution {
        /// The back-end error.
        #[source]
        source: BoxedError,
    },

    /// The connection could not be opened or closed.
    #[error("Connection failure: {source}")]
    Connection {
        /// The back-end error.
        #[source]
        source: BoxedError,
    },

    /// A cancellation signal was observed before the next suspension point.
    #[error("Operation cancelled")]
    Cancelled,

    /// A blocking call was made from a thread already driving an async runtime.
    #[error("Blocking adapter call made inside an async runtime; use the `_async` form instead")]
    BlockingInAsyncContext,

    /// The runtime driving a blocking call could not be created.
    #[error("Failed to start blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// The named column does not belong to the record set.
    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    /// The provided row index is out of bounds.
    #[error("Row index {0} out of bounds for record set with {1} rows")]
    RowIndexOutOfBounds(usize, usize),

    /// The provided column index is out of bounds.
    #[error("Column index {0} out of bounds for record set with {1} columns")]
    ColumnIndexOutOfBounds(usize, usize),

    /// A row was given a number of values different from the column count.
    #[error("Expected {expected} values, got {got}")]
    ValueCountMismatch {
        /// The number of columns of the record set.
        expected: usize,
        /// The number of provided values.
        got: usize,
    },

    /// The row was deleted and can no longer be modified.
    #[error("Row {0} is deleted")]
    RowDeleted(usize),

    /// An INSERT or UPDATE was requested without any column to write.
    #[error("Changeset is empty")]
    EmptyChangeset,

    /// A model could not be reflected into a changeset.
    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

impl Error {
    /// Wraps a back-end error raised while executing a statement.
    pub(crate) fn execution(source: impl Into<BoxedError>) -> Self {
        Self::StatementExecution {
            source: source.into(),
        }
    }

    /// Wraps a back-end error raised while opening or closing the connection.
    pub(crate) fn connection(source: impl Into<BoxedError>) -> Self {
        Self::Connection {
            source: source.into(),
        }
    }

    /// Returns whether the error is a user-initiated cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
