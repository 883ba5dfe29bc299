//! SQLite back-end built on `rusqlite`.
//!
//! Pair [`SqliteConnection`] with
//! [`SqliteCommandBuilder`](crate::SqliteCommandBuilder) to get a complete
//! adapter:
//!
//! ```
//! use recordset_adapter::{
//!     Changeset, DbDataAdapter, Query, SqliteCommandBuilder, SqliteConfig, SqliteConnection,
//! };
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut connection = SqliteConnection::new(SqliteConfig::new(dir.path().join("app.db")));
//! connection.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
//!
//! let mut adapter = DbDataAdapter::new(connection, SqliteCommandBuilder::default());
//! adapter.insert("users", Changeset::new().set("id", 1i64).set("name", "Alice")).unwrap();
//!
//! let mut users = adapter.select(Query::new("users")).unwrap().record_set().unwrap();
//! users.set_primary_key(&["id"]).unwrap();
//! users.row_mut(0).unwrap().set("name", "Alicia").unwrap();
//! assert_eq!(adapter.reconcile("users", &mut users).unwrap(), 1);
//! ```

mod connection;
mod value;

pub use connection::{SqliteConfig, SqliteConnection, SqliteTransaction};

/// Errors raised by [`SqliteConnection`].
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    /// A statement was issued on a closed connection.
    #[error("Connection is not open")]
    NotOpen,

    /// The transaction handle is not the active transaction of the connection.
    #[error("Transaction {0} is not the active transaction of this connection")]
    TransactionMismatch(u64),

    /// A transaction was begun while another one is active.
    #[error("A transaction is already active on this connection")]
    TransactionActive,

    /// The driver reported a failure.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
