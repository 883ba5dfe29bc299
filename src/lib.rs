#![doc = include_str!("../README.md")]
#![deny(clippy::mod_module_files)]

pub mod adapter;
pub mod cancel;
pub mod changeset;
pub mod command;
pub mod connection;
pub mod errors;
pub mod query;
pub(crate) mod reconcile;
pub mod record_set;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod value;

// Re-export main types
pub use adapter::{DbDataAdapter, SelectQuery};
pub use cancel::CancellationToken;
pub use changeset::{Changeset, PropertyMap, QueryValue};
pub use command::{Command, CommandBuilder, Dialect, Postgres, SqlCommandBuilder, Sqlite};
pub use connection::{Connection, ConnectionState, QueryResult};
pub use query::{CompareOp, Condition, Query, SortField};
pub use record_set::{RecordSet, Row, RowMut, RowState};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConfig, SqliteConnection, SqliteError, SqliteTransaction};
pub use value::{Bindings, Value};

/// Command builder rendering SQLite-flavoured statements.
pub type SqliteCommandBuilder = SqlCommandBuilder<Sqlite>;

/// Command builder rendering PostgreSQL-flavoured statements.
pub type PostgresCommandBuilder = SqlCommandBuilder<Postgres>;

// Re-export errors
pub use errors::Error;
