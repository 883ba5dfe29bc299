//! `rusqlite`-backed [`Connection`].

use std::path::PathBuf;
use std::time::Duration;

use super::SqliteError;
use crate::cancel::CancellationToken;
use crate::command::Command;
use crate::connection::{Connection, ConnectionState, QueryResult};
use crate::value::Value;

const IN_MEMORY: &str = ":memory:";

/// Where and how to open a SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteConfig {
    /// Database file at `path`, created on first open.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Private in-memory database.
    ///
    /// Every open starts from an empty database and closing discards it, so
    /// keep the connection open across calls that must see each other's rows.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    /// How long a statement waits for a lock held by another connection.
    #[must_use]
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// The database path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// The busy timeout.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }
}

/// Handle of a transaction begun with [`SqliteConnection::begin_transaction`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SqliteTransaction {
    id: u64,
}

impl SqliteTransaction {
    /// Identifier of the transaction, unique per connection.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// A SQLite connection that can be opened and closed repeatedly.
///
/// The driver is synchronous: the asynchronous [`Connection`] methods complete
/// without suspending, and a statement once started runs to completion, so
/// the cancellation token is only observed between calls by the adapter.
#[derive(Debug)]
pub struct SqliteConnection {
    config: SqliteConfig,
    inner: Option<rusqlite::Connection>,
    active_transaction: Option<u64>,
    transaction_seq: u64,
}

impl SqliteConnection {
    /// Creates a closed connection.
    #[must_use]
    pub fn new(config: SqliteConfig) -> Self {
        Self {
            config,
            inner: None,
            active_transaction: None,
            transaction_seq: 0,
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    fn open_sync(&mut self) -> Result<(), SqliteError> {
        if self.inner.is_some() {
            return Ok(());
        }
        let conn = if self.config.is_in_memory() {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open(&self.config.path)?
        };
        conn.busy_timeout(self.config.busy_timeout)?;
        self.inner = Some(conn);
        Ok(())
    }

    fn close_sync(&mut self) -> Result<(), SqliteError> {
        let Some(conn) = self.inner.take() else {
            return Ok(());
        };
        // Closing rolls back any open transaction.
        self.active_transaction = None;
        if let Err((conn, error)) = conn.close() {
            self.inner = Some(conn);
            return Err(error.into());
        }
        Ok(())
    }

    fn driver(&self) -> Result<&rusqlite::Connection, SqliteError> {
        self.inner.as_ref().ok_or(SqliteError::NotOpen)
    }

    fn check_transaction(&self, transaction: Option<&SqliteTransaction>) -> Result<(), SqliteError> {
        match transaction {
            Some(tx) if self.active_transaction != Some(tx.id) => {
                Err(SqliteError::TransactionMismatch(tx.id))
            }
            _ => Ok(()),
        }
    }

    /// Runs semicolon-separated SQL without parameters, e.g. schema setup.
    ///
    /// A closed connection is opened for the call and closed afterwards.
    ///
    /// # Errors
    ///
    /// Driver failures.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), SqliteError> {
        let opened = self.inner.is_none();
        self.open_sync()?;
        let result = self.driver().and_then(|conn| Ok(conn.execute_batch(sql)?));
        if opened {
            let closed = self.close_sync();
            result?;
            return closed;
        }
        result
    }

    /// Begins a transaction on the open connection.
    ///
    /// Hand the returned handle to
    /// [`DbDataAdapter::set_transaction`](crate::DbDataAdapter::set_transaction)
    /// and finish it with [`commit`](Self::commit) or [`rollback`](Self::rollback).
    ///
    /// # Errors
    ///
    /// * `NotOpen` - If the connection is closed.
    /// * `TransactionActive` - If a transaction is already active.
    pub fn begin_transaction(&mut self) -> Result<SqliteTransaction, SqliteError> {
        if self.active_transaction.is_some() {
            return Err(SqliteError::TransactionActive);
        }
        self.driver()?.execute_batch("BEGIN")?;
        self.transaction_seq += 1;
        self.active_transaction = Some(self.transaction_seq);
        Ok(SqliteTransaction {
            id: self.transaction_seq,
        })
    }

    /// Commits the active transaction.
    ///
    /// # Errors
    ///
    /// * `TransactionMismatch` - If `transaction` is not the active transaction.
    /// * `NotOpen` - If the connection is closed.
    pub fn commit(&mut self, transaction: SqliteTransaction) -> Result<(), SqliteError> {
        self.finish(&transaction, "COMMIT")
    }

    /// Rolls back the active transaction.
    ///
    /// # Errors
    ///
    /// * `TransactionMismatch` - If `transaction` is not the active transaction.
    /// * `NotOpen` - If the connection is closed.
    pub fn rollback(&mut self, transaction: SqliteTransaction) -> Result<(), SqliteError> {
        self.finish(&transaction, "ROLLBACK")
    }

    fn finish(&mut self, transaction: &SqliteTransaction, sql: &str) -> Result<(), SqliteError> {
        self.check_transaction(Some(transaction))?;
        self.driver()?.execute_batch(sql)?;
        self.active_transaction = None;
        Ok(())
    }
}

impl Connection for SqliteConnection {
    type Transaction = SqliteTransaction;
    type Error = SqliteError;

    fn state(&self) -> ConnectionState {
        if self.inner.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    async fn open(&mut self, _cancel: &CancellationToken) -> Result<(), SqliteError> {
        self.open_sync()
    }

    async fn close(&mut self) -> Result<(), SqliteError> {
        self.close_sync()
    }

    async fn execute(
        &mut self,
        command: &Command,
        transaction: Option<&SqliteTransaction>,
        _cancel: &CancellationToken,
    ) -> Result<usize, SqliteError> {
        self.check_transaction(transaction)?;
        let mut stmt = self.driver()?.prepare(command.sql())?;
        Ok(stmt.execute(rusqlite::params_from_iter(command.params()))?)
    }

    async fn query(
        &mut self,
        command: &Command,
        transaction: Option<&SqliteTransaction>,
        _cancel: &CancellationToken,
    ) -> Result<QueryResult, SqliteError> {
        self.check_transaction(transaction)?;
        let mut stmt = self.driver()?.prepare(command.sql())?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(command.params()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..columns.len())
                .map(|col_idx| row.get::<_, Value>(col_idx))
                .collect::<Result<Vec<_>, _>>()?;
            result.push(values);
        }
        Ok(QueryResult {
            columns,
            rows: result,
        })
    }
}
