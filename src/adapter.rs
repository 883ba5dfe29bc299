//! Data adapter between a database connection and in-memory data.
//!
//! [`DbDataAdapter`] owns a [`Connection`], a [`CommandBuilder`] and an
//! optional caller-managed transaction. It exposes select, insert, update,
//! delete and record set reconciliation, each in a cancellable asynchronous
//! form and a blocking form running the same code.
//!
//! # Connection lifecycle
//!
//! Before a statement is issued a closed connection is opened; a connection
//! opened by the call is closed again when the call ends, on success, failure
//! and cancellation alike. An already open connection is left open, which is
//! how callers keep one transaction across several calls.
//!
//! # Transactions
//!
//! The transaction set with [`DbDataAdapter::set_transaction`] is attached to
//! every statement. The adapter never begins, commits or rolls back a
//! transaction; without one, a reconciliation failing midway leaves the rows
//! already applied in the store.

mod blocking;
mod select;
mod session;

pub use select::SelectQuery;

use serde::Serialize;

use crate::cancel::CancellationToken;
use crate::changeset::{Changeset, PropertyMap};
use crate::command::{Command, CommandBuilder};
use crate::connection::Connection;
use crate::errors::Error;
use crate::query::Query;
use crate::reconcile::{Reconciler, StatementExecutor};
use crate::record_set::RecordSet;
use session::Session;

/// Executes statements built from queries, changesets and record sets.
pub struct DbDataAdapter<C: Connection, B: CommandBuilder> {
    connection: C,
    command_builder: B,
    transaction: Option<C::Transaction>,
}

impl<C: Connection, B: CommandBuilder> DbDataAdapter<C, B> {
    /// Creates an adapter over `connection` rendering statements with `command_builder`.
    pub fn new(connection: C, command_builder: B) -> Self {
        Self {
            connection,
            command_builder,
            transaction: None,
        }
    }

    /// The connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Mutable access to the connection, e.g. to open it or manage a transaction.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// The command builder.
    pub fn command_builder(&self) -> &B {
        &self.command_builder
    }

    /// The transaction attached to every statement, if any.
    pub fn transaction(&self) -> Option<&C::Transaction> {
        self.transaction.as_ref()
    }

    /// Replaces the transaction attached to every statement.
    ///
    /// Returns the previous transaction so the caller can commit or roll it back.
    pub fn set_transaction(&mut self, transaction: Option<C::Transaction>) -> Option<C::Transaction> {
        core::mem::replace(&mut self.transaction, transaction)
    }

    /// Consumes the adapter, returning its connection and command builder.
    pub fn into_inner(self) -> (C, B) {
        (self.connection, self.command_builder)
    }

    /// Prepares a SELECT for `query` without executing it.
    ///
    /// # Errors
    ///
    /// Rendering failures of the command builder.
    pub fn select(&mut self, query: Query) -> Result<SelectQuery<'_, C>, Error> {
        let command = self.command_builder.select_command(&query)?;
        Ok(SelectQuery::new(
            &mut self.connection,
            self.transaction.as_ref(),
            query,
            command,
        ))
    }

    /// Runs one data-modifying statement under the connection lifecycle rules.
    async fn execute(&mut self, command: Command, cancel: &CancellationToken) -> Result<usize, Error> {
        let mut session = Session::new(&mut self.connection, self.transaction.as_ref(), cancel);
        let opened = session.open().await?;
        tracing::trace!(sql = %command, params = %command.bindings(), "executing statement");
        let result = session.execute(command).await;
        session.release(opened, result).await
    }

    /// Inserts one row into `table`; returns the number of inserted rows.
    ///
    /// # Errors
    ///
    /// * `EmptyChangeset` - If `changeset` has no column.
    /// * `Cancelled` - If `cancel` fires before the statement is sent.
    /// * `Connection` - If the connection cannot be opened or closed.
    /// * `StatementExecution` - If the connection rejects the statement.
    pub async fn insert_async(
        &mut self,
        table: &str,
        changeset: impl Into<Changeset>,
        cancel: &CancellationToken,
    ) -> Result<usize, Error> {
        let command = self.command_builder.insert_command(table, &changeset.into())?;
        self.execute(command, cancel).await
    }

    /// Inserts the fields of `model`, optionally restricted and renamed by
    /// `property_map`; returns the number of inserted rows.
    ///
    /// # Errors
    ///
    /// `InvalidModel` if `model` is not a struct or map, otherwise as
    /// [`insert_async`](Self::insert_async).
    pub async fn insert_model_async<T: Serialize + ?Sized>(
        &mut self,
        table: &str,
        model: &T,
        property_map: Option<&PropertyMap>,
        cancel: &CancellationToken,
    ) -> Result<usize, Error> {
        let changeset = Changeset::from_model(model, property_map)?;
        self.insert_async(table, changeset, cancel).await
    }

    /// Updates the rows matching `query`; returns the number of updated rows.
    ///
    /// # Errors
    ///
    /// As [`insert_async`](Self::insert_async).
    pub async fn update_async(
        &mut self,
        query: &Query,
        changeset: impl Into<Changeset>,
        cancel: &CancellationToken,
    ) -> Result<usize, Error> {
        let command = self.command_builder.update_command(query, &changeset.into())?;
        self.execute(command, cancel).await
    }

    /// Updates the rows matching `query` from the fields of `model`.
    ///
    /// With a `property_map` only the mapped properties are written.
    ///
    /// # Errors
    ///
    /// As [`insert_model_async`](Self::insert_model_async).
    pub async fn update_model_async<T: Serialize + ?Sized>(
        &mut self,
        query: &Query,
        model: &T,
        property_map: Option<&PropertyMap>,
        cancel: &CancellationToken,
    ) -> Result<usize, Error> {
        let changeset = Changeset::from_model(model, property_map)?;
        self.update_async(query, changeset, cancel).await
    }

    /// Deletes the rows matching `query`; returns the number of deleted rows.
    ///
    /// # Errors
    ///
    /// As [`insert_async`](Self::insert_async), without `EmptyChangeset`.
    pub async fn delete_async(&mut self, query: &Query, cancel: &CancellationToken) -> Result<usize, Error> {
        let command = self.command_builder.delete_command(query)?;
        self.execute(command, cancel).await
    }

    /// Writes every pending change of `record_set` to `table`, in row order,
    /// then accepts the changes.
    ///
    /// Added rows are inserted, Modified rows updated and Deleted rows deleted,
    /// the latter two located by the primary key values the rows were loaded
    /// with. Returns the total number of affected rows. Changes are accepted
    /// only when every statement succeeded; on failure or cancellation the
    /// record set is left untouched while statements already executed stay
    /// applied unless the caller's transaction is rolled back.
    ///
    /// # Errors
    ///
    /// * `MissingPrimaryKey` - If the record set has no primary key; nothing is executed.
    /// * `Cancelled` - If `cancel` fires before the connection is opened or a statement is sent.
    /// * `Connection` - If the connection cannot be opened or closed.
    /// * `StatementExecution` - If the connection rejects a statement; later rows are not attempted.
    #[tracing::instrument(level = "debug", skip_all, fields(table = table, rows = record_set.len()))]
    pub async fn reconcile_async(
        &mut self,
        table: &str,
        record_set: &mut RecordSet,
        cancel: &CancellationToken,
    ) -> Result<usize, Error> {
        let reconciler = Reconciler::new(table, record_set)?;
        if reconciler.changes().next().is_none() {
            tracing::debug!("no pending changes");
            record_set.accept_changes();
            return Ok(0);
        }

        let mut session = Session::new(&mut self.connection, self.transaction.as_ref(), cancel);
        let opened = session.open().await?;
        let result = reconciler.apply(&self.command_builder, &mut session).await;
        let affected = session.release(opened, result).await?;

        record_set.accept_changes();
        tracing::debug!(affected, "record set reconciled");
        Ok(affected)
    }

    /// Blocking form of [`insert_async`](Self::insert_async).
    ///
    /// # Errors
    ///
    /// As [`insert_async`](Self::insert_async), plus `Runtime`.
    pub fn insert(&mut self, table: &str, changeset: impl Into<Changeset>) -> Result<usize, Error> {
        blocking::block_on(self.insert_async(table, changeset, &CancellationToken::new()))?
    }

    /// Blocking form of [`insert_model_async`](Self::insert_model_async).
    ///
    /// # Errors
    ///
    /// As [`insert_model_async`](Self::insert_model_async), plus `Runtime`.
    pub fn insert_model<T: Serialize + ?Sized>(
        &mut self,
        table: &str,
        model: &T,
        property_map: Option<&PropertyMap>,
    ) -> Result<usize, Error> {
        blocking::block_on(self.insert_model_async(table, model, property_map, &CancellationToken::new()))?
    }

    /// Blocking form of [`update_async`](Self::update_async).
    ///
    /// # Errors
    ///
    /// As [`update_async`](Self::update_async), plus `Runtime`.
    pub fn update(&mut self, query: &Query, changeset: impl Into<Changeset>) -> Result<usize, Error> {
        blocking::block_on(self.update_async(query, changeset, &CancellationToken::new()))?
    }

    /// Blocking form of [`update_model_async`](Self::update_model_async).
    ///
    /// # Errors
    ///
    /// As [`update_model_async`](Self::update_model_async), plus `Runtime`.
    pub fn update_model<T: Serialize + ?Sized>(
        &mut self,
        query: &Query,
        model: &T,
        property_map: Option<&PropertyMap>,
    ) -> Result<usize, Error> {
        blocking::block_on(self.update_model_async(query, model, property_map, &CancellationToken::new()))?
    }

    /// Blocking form of [`delete_async`](Self::delete_async).
    ///
    /// # Errors
    ///
    /// As [`delete_async`](Self::delete_async), plus `Runtime`.
    pub fn delete(&mut self, query: &Query) -> Result<usize, Error> {
        blocking::block_on(self.delete_async(query, &CancellationToken::new()))?
    }

    /// Blocking form of [`reconcile_async`](Self::reconcile_async).
    ///
    /// # Errors
    ///
    /// As [`reconcile_async`](Self::reconcile_async), plus `Runtime`.
    pub fn reconcile(&mut self, table: &str, record_set: &mut RecordSet) -> Result<usize, Error> {
        blocking::block_on(self.reconcile_async(table, record_set, &CancellationToken::new()))?
    }
}

impl<C: Connection + core::fmt::Debug, B: CommandBuilder + core::fmt::Debug> core::fmt::Debug
    for DbDataAdapter<C, B>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DbDataAdapter")
            .field("connection", &self.connection)
            .field("command_builder", &self.command_builder)
            .field("has_transaction", &self.transaction.is_some())
            .finish()
    }
}
