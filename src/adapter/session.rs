//! Connection lifecycle for one adapter call.

use crate::cancel::CancellationToken;
use crate::command::Command;
use crate::connection::{Connection, ConnectionState, QueryResult};
use crate::errors::Error;
use crate::reconcile::StatementExecutor;

/// Borrowed connection, transaction and cancellation signal of one call.
///
/// Every statement dispatched through a session is bound to the adapter's
/// transaction, preceded by a cancellation check and handed the
/// cancellation token.
pub(crate) struct Session<'a, C: Connection> {
    connection: &'a mut C,
    transaction: Option<&'a C::Transaction>,
    cancel: &'a CancellationToken,
}

impl<'a, C: Connection> Session<'a, C> {
    pub(crate) fn new(
        connection: &'a mut C,
        transaction: Option<&'a C::Transaction>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            connection,
            transaction,
            cancel,
        }
    }

    /// Opens the connection if it is closed.
    ///
    /// Returns whether this call opened it, which is what [`release`](Self::release)
    /// needs to know.
    pub(crate) async fn open(&mut self) -> Result<bool, Error> {
        self.cancel.check()?;
        if self.connection.state() == ConnectionState::Open {
            return Ok(false);
        }
        self.connection
            .open(self.cancel)
            .await
            .map_err(|error| self.backend_error(error, Error::connection))?;
        tracing::trace!("connection opened");
        Ok(true)
    }

    /// Closes the connection if [`open`](Self::open) opened it, whatever the outcome.
    ///
    /// A close failure is reported only when `result` succeeded; otherwise the
    /// original failure wins.
    pub(crate) async fn release<T>(
        &mut self,
        opened: bool,
        result: Result<T, Error>,
    ) -> Result<T, Error> {
        if !opened {
            return result;
        }
        let closed = self.connection.close().await.map_err(Error::connection);
        tracing::trace!("connection closed");
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_error)) => Err(close_error),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(close_error)) => {
                tracing::warn!(%close_error, "failed to close connection after error");
                Err(error)
            }
        }
    }

    /// Runs a SELECT.
    pub(crate) async fn query(&mut self, command: &Command) -> Result<QueryResult, Error> {
        self.cancel.check()?;
        tracing::trace!(sql = %command, params = %command.bindings(), "executing query");
        self.connection
            .query(command, self.transaction, self.cancel)
            .await
            .map_err(|error| self.backend_error(error, Error::execution))
    }

    /// Reports a back-end failure, as a cancellation if one was requested
    /// while the call was in flight.
    fn backend_error<E>(&self, error: E, wrap: impl FnOnce(E) -> Error) -> Error
    where
        E: core::fmt::Display,
    {
        if self.cancel.is_cancelled() {
            tracing::debug!(%error, "back-end call aborted by cancellation");
            Error::Cancelled
        } else {
            wrap(error)
        }
    }
}

impl<C: Connection> StatementExecutor for Session<'_, C> {
    async fn execute(&mut self, command: Command) -> Result<usize, Error> {
        self.cancel.check()?;
        self.connection
            .execute(&command, self.transaction, self.cancel)
            .await
            .map_err(|error| self.backend_error(error, Error::execution))
    }
}
